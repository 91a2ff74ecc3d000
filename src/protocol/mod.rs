//! WebDriver BiDi message types.
//!
//! This module defines the wire envelopes and the typed payloads of every
//! protocol module this crate drives.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Local → Remote | Command with numeric `id` |
//! | `Response` | Remote → Local | `success` or `error` for one `id` |
//! | `Event` | Remote → Local | Unsolicited notification |
//!
//! # Command Naming
//!
//! Commands follow `module.methodName` format:
//!
//! - `browsingContext.navigate`
//! - `network.addIntercept`
//! - `script.callFunction`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Request, Response, Event envelopes |
//! | `command` | Command wrapper over module enums |
//! | `event` | Typed event decoding |
//! | `session`, `browser`, `browsing_context`, `network`, `script`, `input`, `storage`, `log` | Module payloads |

// ============================================================================
// Submodules
// ============================================================================

/// `browser` module payloads.
pub mod browser;

/// `browsingContext` module payloads.
pub mod browsing_context;

/// Command wrapper.
pub mod command;

/// Typed event decoding.
pub mod event;

/// `input` module payloads.
pub mod input;

/// `log` module payloads.
pub mod log;

/// Wire envelopes.
pub mod message;

/// `network` module payloads.
pub mod network;

/// `script` module payloads.
pub mod script;

/// `session` module payloads.
pub mod session;

/// `storage` module payloads.
pub mod storage;

// ============================================================================
// Re-exports
// ============================================================================

pub use browser::BrowserCommand;
pub use browsing_context::BrowsingContextCommand;
pub use command::{Command, RawCommand};
pub use event::{ParsedEvent, names};
pub use input::InputCommand;
pub use message::{Event, Incoming, Outcome, Request, Response};
pub use network::NetworkCommand;
pub use script::ScriptCommand;
pub use session::SessionCommand;
pub use storage::StorageCommand;
