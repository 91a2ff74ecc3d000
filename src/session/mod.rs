//! Session lifecycle.
//!
//! A [`Session`] owns one transport and everything built on it: the dispatch
//! loop, the correlator, the event router, the module proxies and the
//! intercept registry.
//!
//! # Example
//!
//! ```ignore
//! use bidi_webdriver::{Session, Result};
//! use bidi_webdriver::protocol::browsing_context::{CreateParameters, CreateType};
//!
//! async fn example() -> Result<()> {
//!     let session = Session::connect("ws://127.0.0.1:9222/session").await?;
//!
//!     let context = session
//!         .browsing_context()
//!         .create(CreateParameters::new(CreateType::Tab))
//!         .await?;
//!     session
//!         .browsing_context()
//!         .navigate(&context, "https://example.com", None)
//!         .await?;
//!
//!     session.dispose().await;
//!     Ok(())
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};

use futures_util::FutureExt;
use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use crate::error::Result;
use crate::events::subscription;
use crate::events::{EventHandler, Subscription};
use crate::identifiers::{BrowsingContextId, CommandId, InterceptId};
use crate::modules::{
    Browser, BrowsingContext, Input, Log, Network, Script, SessionModule, Storage,
};
use crate::network::{InterceptFault, InterceptRegistry, InterceptedRequest};
use crate::protocol::network::AddInterceptParameters;
use crate::protocol::{Command, Event};
use crate::transport::{CommandHandle, Connection, Transport, WebSocketTransport};

// ============================================================================
// Submodules
// ============================================================================

/// Session configuration.
pub mod options;

/// Lifecycle state.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use options::SessionOptions;
pub use state::SessionState;

// ============================================================================
// Session
// ============================================================================

/// A live BiDi session.
///
/// Cheap to clone; clones share the connection. The connection closes when
/// [`Session::dispose`] is called or the last clone is dropped.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    connection: Connection,
    registry: InterceptRegistry,
    browsing_context: BrowsingContext,
    network: Network,
    script: Script,
    input: Input,
    storage: Storage,
    browser: Browser,
    log: Log,
    session: SessionModule,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("pending", &self.inner.connection.pending_count())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Session - Constructors
// ============================================================================

impl Session {
    /// Connects to a WebSocket endpoint with default options.
    ///
    /// # Errors
    ///
    /// See [`Session::connect_with_options`].
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_options(url, SessionOptions::default()).await
    }

    /// Connects to a WebSocket endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`](crate::Error::Connection) if the URL is
    ///   invalid or the handshake fails
    /// - [`Error::ConnectionTimeout`](crate::Error::ConnectionTimeout) if
    ///   the handshake exceeds `options.connect_timeout`
    pub async fn connect_with_options(url: &str, options: SessionOptions) -> Result<Self> {
        let transport = WebSocketTransport::connect(url, options.connect_timeout).await?;
        info!(%url, "Session connected");
        Ok(Self::with_transport(transport, options))
    }

    /// Starts a session over an established transport.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn with_transport<T: Transport>(transport: T, options: SessionOptions) -> Self {
        let (state, _) = watch::channel(SessionState::Connecting);
        let connection = Connection::spawn(transport, &options, state);
        let registry = InterceptRegistry::new(connection.clone(), &options);

        let inner = Arc::new(SessionInner {
            browsing_context: BrowsingContext::new(connection.clone()),
            network: Network::new(connection.clone(), registry.clone()),
            script: Script::new(connection.clone()),
            input: Input::new(connection.clone()),
            storage: Storage::new(connection.clone()),
            browser: Browser::new(connection.clone()),
            log: Log::new(connection.clone()),
            session: SessionModule::new(connection.clone()),
            registry,
            connection,
        });

        spawn_loss_watcher(&inner);

        Self { inner }
    }
}

/// Clears interception once the connection ends on its own.
fn spawn_loss_watcher(inner: &Arc<SessionInner>) {
    let weak: Weak<SessionInner> = Arc::downgrade(inner);
    let mut changes = inner.connection.state_changes();

    tokio::spawn(async move {
        let _ = changes
            .wait_for(|state| *state == SessionState::Closed)
            .await;

        if let Some(inner) = weak.upgrade() {
            if inner.connection.transport_lost() {
                info!("Transport lost, session closed");
            }
            inner.registry.shutdown().await;
        }
    });
}

// ============================================================================
// Session - State
// ============================================================================

impl Session {
    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.connection.state()
    }

    /// Receiver notified on every lifecycle change.
    #[must_use]
    pub fn state_changes(&self) -> watch::Receiver<SessionState> {
        self.inner.connection.state_changes()
    }

    /// Returns `true` while commands are accepted.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    /// Number of in-flight commands.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.connection.pending_count()
    }

    /// Receives intercept handler faults raised after this call.
    #[must_use]
    pub fn faults(&self) -> broadcast::Receiver<InterceptFault> {
        self.inner.registry.faults()
    }
}

// ============================================================================
// Session - Modules
// ============================================================================

impl Session {
    /// `browsingContext` module.
    #[inline]
    #[must_use]
    pub fn browsing_context(&self) -> &BrowsingContext {
        &self.inner.browsing_context
    }

    /// `network` module.
    #[inline]
    #[must_use]
    pub fn network(&self) -> &Network {
        &self.inner.network
    }

    /// `script` module.
    #[inline]
    #[must_use]
    pub fn script(&self) -> &Script {
        &self.inner.script
    }

    /// `input` module.
    #[inline]
    #[must_use]
    pub fn input(&self) -> &Input {
        &self.inner.input
    }

    /// `storage` module.
    #[inline]
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.inner.storage
    }

    /// `browser` module.
    #[inline]
    #[must_use]
    pub fn browser(&self) -> &Browser {
        &self.inner.browser
    }

    /// `log` module.
    #[inline]
    #[must_use]
    pub fn log(&self) -> &Log {
        &self.inner.log
    }

    /// `session` module.
    #[inline]
    #[must_use]
    pub fn session_module(&self) -> &SessionModule {
        &self.inner.session
    }
}

// ============================================================================
// Session - Commands
// ============================================================================

impl Session {
    /// Sends a command and waits for its result.
    ///
    /// # Errors
    ///
    /// See [`Connection::send`].
    pub async fn send(&self, command: Command) -> Result<Value> {
        self.inner.connection.send(command).await
    }

    /// Submits a command and returns its handle without waiting.
    ///
    /// # Errors
    ///
    /// See [`Connection::submit`].
    pub fn submit(&self, command: Command) -> Result<CommandHandle> {
        self.inner.connection.submit(command)
    }

    /// Cancels a pending command. The late response is discarded.
    pub fn cancel(&self, id: CommandId) -> bool {
        self.inner.connection.cancel(id)
    }
}

// ============================================================================
// Session - Events
// ============================================================================

impl Session {
    /// Subscribes `handler` to events or whole modules (e.g. `"log"`).
    ///
    /// The handler gets raw [`Event`]s; use [`Event::parse`] or the module
    /// `on_*` methods for typed payloads.
    ///
    /// # Errors
    ///
    /// Returns the `session.subscribe` error; no local handler stays
    /// registered in that case.
    pub async fn subscribe<F, Fut>(
        &self,
        events: Vec<String>,
        contexts: Option<Vec<BrowsingContextId>>,
        handler: F,
    ) -> Result<Subscription>
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: EventHandler = Arc::new(move |event| handler(event).boxed());
        subscription::subscribe(&self.inner.connection, events, contexts, handler).await
    }

    /// Removes a subscription locally, then remotely.
    ///
    /// Handlers stop receiving new events at once.
    ///
    /// # Errors
    ///
    /// Returns the `session.unsubscribe` error.
    pub async fn unsubscribe(&self, subscription: &Subscription) -> Result<()> {
        subscription::unsubscribe(&self.inner.connection, subscription).await
    }

    /// Adds a network intercept. Shorthand for
    /// [`Network::add_intercept`].
    ///
    /// # Errors
    ///
    /// See [`InterceptRegistry::add_intercept`].
    pub async fn add_intercept<F, Fut>(
        &self,
        params: AddInterceptParameters,
        handler: F,
    ) -> Result<InterceptId>
    where
        F: Fn(InterceptedRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.inner.network.add_intercept(params, handler).await
    }

    /// Removes a network intercept.
    ///
    /// # Errors
    ///
    /// See [`InterceptRegistry::remove_intercept`].
    pub async fn remove_intercept(&self, intercept: &InterceptId) -> Result<()> {
        self.inner.registry.remove_intercept(intercept).await
    }

    /// Ids of the live intercepts.
    #[must_use]
    pub fn intercepts(&self) -> Vec<InterceptId> {
        self.inner.registry.intercepts()
    }
}

// ============================================================================
// Session - Teardown
// ============================================================================

impl Session {
    /// Closes the session.
    ///
    /// - intercepts are removed and paused requests failed
    /// - pending commands fail with [`Error::TransportClosed`](crate::Error::TransportClosed)
    /// - subscriptions are dropped and the transport closed
    ///
    /// Only the first call does anything. Safe to call from inside an event
    /// or intercept handler.
    pub async fn dispose(&self) {
        if !self.inner.connection.begin_closing() {
            debug!(state = %self.state(), "Dispose ignored, session already closing");
            return;
        }

        info!("Disposing session");
        self.inner.registry.shutdown().await;
        self.inner.connection.shutdown().await;
        info!("Session closed");
    }
}
