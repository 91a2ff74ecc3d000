//! Transport layer.
//!
//! This module owns the single bidirectional text channel to the remote end
//! and the machinery that turns it into concurrent request/response traffic.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   ConnectionCommand   ┌──────────────┐   text frames   ┌────────────┐
//! │ Connection (N×)  │──────────────────────►│ Dispatch Loop│◄───────────────►│ Remote End │
//! │ submit / cancel  │                       │ (one task)   │                 │ (browser)  │
//! └──────────────────┘                       └──────┬───────┘                 └────────────┘
//!          ▲ oneshot                                │
//!          │                         ┌──────────────┴─────────────┐
//!          └─────────────────────────┤ Correlator   │ EventRouter │
//!                                    └────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `channel` | In-memory transport pair |
//! | `connection` | Dispatch loop and command handles |
//! | `correlator` | Pending command table |
//! | `websocket` | WebSocket client transport |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

/// In-memory transport pair.
pub mod channel;

/// Dispatch loop and command handles.
pub mod connection;

/// Pending command table.
pub mod correlator;

/// WebSocket client transport.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::{ChannelTransport, RemoteEnd};
pub use connection::{Canceller, CommandHandle, Connection};
pub use correlator::Correlator;
pub use websocket::WebSocketTransport;

// ============================================================================
// Transport
// ============================================================================

/// A bidirectional text channel to the remote end.
///
/// The dispatch loop is the only user of a transport once a session is
/// running, so methods take `&mut self`.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Sends one text frame.
    async fn send(&mut self, text: String) -> Result<()>;

    /// Receives the next text frame.
    ///
    /// Returns `None` once the channel is closed. Must be cancel-safe: the
    /// dispatch loop races it against outgoing commands.
    async fn recv(&mut self) -> Option<Result<String>>;

    /// Closes the channel.
    async fn close(&mut self) -> Result<()>;
}
