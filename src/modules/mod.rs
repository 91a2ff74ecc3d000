//! Typed proxies for the protocol modules.
//!
//! Each proxy turns typed arguments into a [`Command`](crate::protocol::Command),
//! submits it through the session's connection and decodes the typed result.
//! Event methods (`on_*`) pair a local handler with a remote subscription.
//!
//! | Proxy | Protocol module |
//! |-------|-----------------|
//! | [`BrowsingContext`] | `browsingContext` |
//! | [`Network`] | `network` |
//! | [`Script`] | `script` |
//! | [`Input`] | `input` |
//! | [`Storage`] | `storage` |
//! | [`Browser`] | `browser` |
//! | [`Log`] | `log` |
//! | [`SessionModule`] | `session` |

// ============================================================================
// Submodules
// ============================================================================

pub mod browser;
pub mod browsing_context;
pub mod input;
pub mod log;
pub mod network;
pub mod script;
pub mod session;
pub mod storage;

// ============================================================================
// Re-exports
// ============================================================================

pub use browser::Browser;
pub use browsing_context::BrowsingContext;
pub use input::Input;
pub use log::Log;
pub use network::Network;
pub use script::Script;
pub use session::SessionModule;
pub use storage::Storage;
