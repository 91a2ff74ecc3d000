//! WebDriver BiDi session engine.
//!
//! Drives a remote browser over one persistent WebSocket using the
//! WebDriver BiDi JSON protocol. Typed commands go out, correlated responses
//! come back and events stream in concurrently with command traffic.
//!
//! # Architecture
//!
//! - **Transport**: one bidirectional text channel ([`transport::Transport`])
//! - **Dispatch loop**: the single task that owns the transport, writes
//!   commands and routes every inbound frame
//! - **Correlator**: matches responses to in-flight commands by id
//! - **Event router**: fans events out to subscribers, each on its own task
//! - **Module proxies**: typed `browsingContext`, `network`, `script`,
//!   `input`, `storage`, `browser`, `log` and `session` operations
//! - **Interception**: pauses matching network requests until a handler
//!   decides their fate
//!
//! # Quick Start
//!
//! ```no_run
//! use bidi_webdriver::{Result, Session};
//! use bidi_webdriver::network::InterceptPhase;
//! use bidi_webdriver::protocol::browsing_context::{CreateParameters, CreateType, ReadinessState};
//! use bidi_webdriver::protocol::network::AddInterceptParameters;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = Session::connect("ws://127.0.0.1:9222/session").await?;
//!
//!     // Block every image request.
//!     session
//!         .add_intercept(
//!             AddInterceptParameters::new(vec![InterceptPhase::BeforeRequestSent]),
//!             |request| async move {
//!                 if request.request().destination == "image" {
//!                     request.fail_request().await
//!                 } else {
//!                     request.continue_request().await
//!                 }
//!             },
//!         )
//!         .await?;
//!
//!     let context = session
//!         .browsing_context()
//!         .create(CreateParameters::new(CreateType::Tab))
//!         .await?;
//!     let navigation = session
//!         .browsing_context()
//!         .navigate(&context, "https://example.com", Some(ReadinessState::Complete))
//!         .await?;
//!     println!("Loaded {}", navigation.url);
//!
//!     session.dispose().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error types and [`Result`] alias |
//! | [`events`] | Event router and subscriptions |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`modules`] | Typed protocol module proxies |
//! | [`network`] | Network interception |
//! | [`protocol`] | Wire message and payload types |
//! | [`session`] | Session lifecycle and options |
//! | [`transport`] | Transports, dispatch loop, correlator |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Event router and remote-aware subscriptions.
pub mod events;

/// Type-safe identifiers for protocol entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Typed protocol module proxies.
pub mod modules;

/// Network interception.
pub mod network;

/// Wire message and payload types.
pub mod protocol;

/// Session lifecycle.
pub mod session;

/// Transports, dispatch loop and correlator.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, Result};

// Event types
pub use events::{EventRouter, Subscription, SubscriptionToken};

// Identifier types
pub use identifiers::{
    BrowsingContextId, CommandId, InterceptId, NavigationId, PreloadScriptId, RealmId, RequestId,
    SharedId, SubscriptionId, UserContextId,
};

// Interception types
pub use network::{InterceptFault, InterceptPhase, InterceptedRequest};

// Protocol envelopes
pub use protocol::{Command, Event, ParsedEvent};

// Session types
pub use session::{Session, SessionOptions, SessionState};

// Transport types
pub use transport::{ChannelTransport, CommandHandle, RemoteEnd, Transport, WebSocketTransport};
