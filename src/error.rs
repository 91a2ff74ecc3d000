//! Error types for the BiDi session engine.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use bidi_webdriver::{Error, Result};
//!
//! async fn example(session: &Session, context: &BrowsingContextId) -> Result<()> {
//!     match session.browsing_context().navigate(context, "https://example.com", None).await {
//!         Err(Error::Protocol { code, .. }) if code == "unknown error" => Ok(()),
//!         other => other.map(|_| ()),
//!     }
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::TransportClosed`], [`Error::SessionClosed`] |
//! | Command | [`Error::Protocol`], [`Error::Decode`], [`Error::Timeout`], [`Error::Cancelled`], [`Error::TooManyPendingCommands`] |
//! | Interception | [`Error::InterceptHandlerFault`], [`Error::DoubleResolution`], [`Error::InterceptNotFound`] |
//! | Input | [`Error::InvalidArgument`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::{CommandId, InterceptId, RequestId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Errors scoped to one command or one paused request never take the session
/// down. Only [`Error::TransportClosed`] is session-wide.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Connection could not be established.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection timeout while establishing the transport.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The transport closed. Fails every outstanding command.
    #[error("Transport closed")]
    TransportClosed,

    /// The session is not open (closing or closed).
    #[error("Session is not open")]
    SessionClosed,

    // ========================================================================
    // Command Errors
    // ========================================================================
    /// The remote end answered a command with an error response.
    #[error("Protocol error ({code}): {message}")]
    Protocol {
        /// BiDi error code, e.g. `no such frame`.
        code: String,
        /// Human readable message.
        message: String,
        /// Remote stack trace, when provided.
        stacktrace: Option<String>,
    },

    /// A payload did not match the expected shape.
    #[error("Decode error: {message}")]
    Decode {
        /// Description of the mismatch.
        message: String,
    },

    /// Local deadline exceeded for a command.
    #[error("Command {command_id} timed out after {timeout_ms}ms")]
    Timeout {
        /// The retired command id.
        command_id: CommandId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The command was cancelled before a response arrived.
    #[error("Command {command_id} cancelled")]
    Cancelled {
        /// The retired command id.
        command_id: CommandId,
    },

    /// Too many commands are awaiting responses.
    #[error("Too many pending commands: {pending}/{max}")]
    TooManyPendingCommands {
        /// Commands currently in flight.
        pending: usize,
        /// Configured limit.
        max: usize,
    },

    // ========================================================================
    // Interception Errors
    // ========================================================================
    /// An intercept handler failed without taking a terminal action.
    #[error("Intercept handler fault for request {request_id}: {message}")]
    InterceptHandlerFault {
        /// The paused request.
        request_id: RequestId,
        /// What the handler reported.
        message: String,
    },

    /// A terminal action was invoked twice on one paused request.
    #[error("Request {request_id} was already resolved")]
    DoubleResolution {
        /// The request that was already resolved.
        request_id: RequestId,
    },

    /// Intercept id is not registered with this session.
    #[error("Intercept not found: {intercept_id}")]
    InterceptNotFound {
        /// The missing intercept id.
        intercept_id: InterceptId,
    },

    // ========================================================================
    // Input Errors
    // ========================================================================
    /// Invalid argument for a protocol command.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a protocol error from a remote error response.
    #[inline]
    pub fn protocol(
        code: impl Into<String>,
        message: impl Into<String>,
        stacktrace: Option<String>,
    ) -> Self {
        Self::Protocol {
            code: code.into(),
            message: message.into(),
            stacktrace,
        }
    }

    /// Creates a decode error.
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a command timeout error.
    #[inline]
    pub fn timeout(command_id: CommandId, timeout_ms: u64) -> Self {
        Self::Timeout {
            command_id,
            timeout_ms,
        }
    }

    /// Creates a cancellation error.
    #[inline]
    pub fn cancelled(command_id: CommandId) -> Self {
        Self::Cancelled { command_id }
    }

    /// Creates an intercept handler fault.
    #[inline]
    pub fn intercept_handler_fault(request_id: RequestId, message: impl Into<String>) -> Self {
        Self::InterceptHandlerFault {
            request_id,
            message: message.into(),
        }
    }

    /// Creates a double resolution error.
    #[inline]
    pub fn double_resolution(request_id: RequestId) -> Self {
        Self::DoubleResolution { request_id }
    }

    /// Creates an intercept not found error.
    #[inline]
    pub fn intercept_not_found(intercept_id: InterceptId) -> Self {
        Self::InterceptNotFound { intercept_id }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectionTimeout { .. } | Self::Timeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::TransportClosed
                | Self::SessionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the remote end answered with the given error code.
    #[inline]
    #[must_use]
    pub fn is_protocol_error(&self, expected: &str) -> bool {
        matches!(self, Self::Protocol { code, .. } if code == expected)
    }

    /// Returns `true` if the failure is scoped to a single command.
    #[inline]
    #[must_use]
    pub fn is_command_scoped(&self) -> bool {
        matches!(
            self,
            Self::Protocol { .. }
                | Self::Decode { .. }
                | Self::Timeout { .. }
                | Self::Cancelled { .. }
                | Self::TooManyPendingCommands { .. }
                | Self::InvalidArgument { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::protocol("no such frame", "Context not found", None);
        assert_eq!(
            err.to_string(),
            "Protocol error (no such frame): Context not found"
        );
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::timeout(CommandId::new(7), 1500);
        assert_eq!(err.to_string(), "Command 7 timed out after 1500ms");
        assert!(err.is_timeout());
        assert!(err.is_command_scoped());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::TransportClosed.is_connection_error());
        assert!(Error::SessionClosed.is_connection_error());
        assert!(Error::connection("refused").is_connection_error());
        assert!(!Error::decode("bad tag").is_connection_error());
    }

    #[test]
    fn test_is_protocol_error() {
        let err = Error::protocol("no such intercept", "gone", None);
        assert!(err.is_protocol_error("no such intercept"));
        assert!(!err.is_protocol_error("unknown error"));
    }

    #[test]
    fn test_transport_closed_is_session_wide() {
        assert!(!Error::TransportClosed.is_command_scoped());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::BrokenPipe, "pipe closed");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
