//! Session configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use bidi_webdriver::SessionOptions;
//!
//! let options = SessionOptions::new()
//!     .with_command_timeout(Duration::from_secs(10))
//!     .with_max_pending_commands(64);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default deadline for a command response.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Default deadline for the WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default limit of in-flight commands.
pub const DEFAULT_MAX_PENDING_COMMANDS: usize = 256;

/// Default deadline for each cleanup command sent while closing.
pub const DEFAULT_TEARDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default capacity of the intercept fault channel.
pub const DEFAULT_FAULT_CAPACITY: usize = 64;

// ============================================================================
// SessionOptions
// ============================================================================

/// Session tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Deadline applied to every command; `None` waits forever.
    pub command_timeout: Option<Duration>,

    /// Deadline for establishing the transport.
    pub connect_timeout: Duration,

    /// In-flight command limit.
    pub max_pending_commands: usize,

    /// Deadline for each `removeIntercept` / `failRequest` sent on close.
    pub teardown_timeout: Duration,

    /// Buffered intercept faults per diagnostics receiver.
    pub fault_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl SessionOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            command_timeout: Some(DEFAULT_COMMAND_TIMEOUT),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_pending_commands: DEFAULT_MAX_PENDING_COMMANDS,
            teardown_timeout: DEFAULT_TEARDOWN_TIMEOUT,
            fault_capacity: DEFAULT_FAULT_CAPACITY,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl SessionOptions {
    /// Sets the per-command deadline.
    #[inline]
    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Disables the per-command deadline.
    #[inline]
    #[must_use]
    pub fn without_command_timeout(mut self) -> Self {
        self.command_timeout = None;
        self
    }

    /// Sets the connect deadline.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the in-flight command limit (at least 1).
    #[inline]
    #[must_use]
    pub fn with_max_pending_commands(mut self, max: usize) -> Self {
        self.max_pending_commands = max.max(1);
        self
    }

    /// Sets the deadline for cleanup commands sent while closing.
    #[inline]
    #[must_use]
    pub fn with_teardown_timeout(mut self, timeout: Duration) -> Self {
        self.teardown_timeout = timeout;
        self
    }

    /// Sets the fault channel capacity (at least 1).
    #[inline]
    #[must_use]
    pub fn with_fault_capacity(mut self, capacity: usize) -> Self {
        self.fault_capacity = capacity.max(1);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
