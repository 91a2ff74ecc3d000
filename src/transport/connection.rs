//! Dispatch loop and command submission.
//!
//! A [`Connection`] spawns one task that owns the transport. The task:
//!
//! - writes outgoing commands in submission order
//! - classifies every inbound frame as a response or an event
//! - hands responses to the [`Correlator`] and events to the [`EventRouter`]
//!
//! Neither the correlator nor the router ever wait on user code, so the loop
//! keeps reading while handlers run.

// ============================================================================
// Imports
// ============================================================================

use std::future::IntoFuture;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::events::EventRouter;
use crate::identifiers::CommandId;
use crate::protocol::{Command, Incoming, Request};
use crate::session::{SessionOptions, SessionState};

use super::Transport;
use super::correlator::{CompletionReceiver, Correlator};

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the dispatch loop.
enum ConnectionCommand {
    /// Write an encoded command.
    Send { id: CommandId, text: String },
    /// Close the transport and stop.
    Shutdown { done: oneshot::Sender<()> },
}

// ============================================================================
// Shared
// ============================================================================

struct Shared {
    correlator: Arc<Correlator>,
    router: EventRouter,
    state: watch::Sender<SessionState>,
    /// Set when the remote end, not the local end, ended the connection.
    transport_lost: AtomicBool,
    command_timeout: Option<Duration>,
}

// ============================================================================
// Connection
// ============================================================================

/// Handle to a running dispatch loop.
///
/// Cheap to clone; every clone submits through the same loop.
#[derive(Clone)]
pub struct Connection {
    shared: Arc<Shared>,
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
}

impl Connection {
    /// Spawns the dispatch loop over `transport` and marks the state `Open`.
    pub(crate) fn spawn<T: Transport>(
        transport: T,
        options: &SessionOptions,
        state: watch::Sender<SessionState>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        state.send_replace(SessionState::Open);

        let shared = Arc::new(Shared {
            correlator: Arc::new(Correlator::new(options.max_pending_commands)),
            router: EventRouter::new(),
            state,
            transport_lost: AtomicBool::new(false),
            command_timeout: options.command_timeout,
        });

        tokio::spawn(run_dispatch_loop(transport, command_rx, Arc::clone(&shared)));

        Self { shared, command_tx }
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Submits a command and returns a handle to its completion.
    ///
    /// The handle carries the session's default deadline.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionClosed`] if the session is closing or closed
    /// - [`Error::TransportClosed`] if the remote end closed the connection
    /// - [`Error::TooManyPendingCommands`] if the pending limit is reached
    pub fn submit(&self, command: Command) -> Result<CommandHandle> {
        let state = *self.shared.state.borrow();
        if !state.is_open() {
            return Err(self.closed_error());
        }
        self.submit_unchecked(command)
    }

    /// Submits while closing; used for teardown commands.
    pub(crate) fn submit_during_teardown(&self, command: Command) -> Result<CommandHandle> {
        if *self.shared.state.borrow() == SessionState::Closed {
            return Err(self.closed_error());
        }
        self.submit_unchecked(command)
    }

    fn submit_unchecked(&self, command: Command) -> Result<CommandHandle> {
        let correlator = &self.shared.correlator;
        let (id, rx) = correlator.register()?;

        let request = Request::new(id, command);
        let text = match serde_json::to_string(&request) {
            Ok(text) => text,
            Err(e) => {
                correlator.remove(id);
                return Err(Error::Json(e));
            }
        };

        if self
            .command_tx
            .send(ConnectionCommand::Send { id, text })
            .is_err()
        {
            correlator.remove(id);
            return Err(Error::TransportClosed);
        }

        trace!(%id, method = %request.command.method(), "Command submitted");

        Ok(CommandHandle {
            id,
            rx,
            correlator: Arc::clone(correlator),
            timeout: self.shared.command_timeout,
            finished: false,
        })
    }

    /// Sends a command and waits for its result with the default deadline.
    ///
    /// # Errors
    ///
    /// Any submission error, plus [`Error::Protocol`], [`Error::Timeout`],
    /// [`Error::Cancelled`] or [`Error::TransportClosed`] from the wait.
    pub async fn send(&self, command: Command) -> Result<Value> {
        self.submit(command)?.wait().await
    }

    /// Sends a command and waits with a custom deadline.
    ///
    /// # Errors
    ///
    /// As [`Connection::send`].
    pub async fn send_with_timeout(&self, command: Command, limit: Duration) -> Result<Value> {
        self.submit(command)?.with_timeout(limit).wait().await
    }

    /// Sends a command and decodes its result into `T`.
    ///
    /// # Errors
    ///
    /// As [`Connection::send`], plus [`Error::Decode`] if the result does not
    /// match `T`.
    pub async fn send_typed<T: DeserializeOwned>(&self, command: Command) -> Result<T> {
        let method = command.method();
        let value = self.send(command).await?;
        serde_json::from_value(value).map_err(|e| Error::decode(format!("{method} result: {e}")))
    }

    /// Fails a pending command with [`Error::Cancelled`].
    ///
    /// Returns `false` if it already completed. A late response is dropped.
    pub fn cancel(&self, id: CommandId) -> bool {
        self.shared.correlator.cancel(id)
    }

    // ========================================================================
    // State
    // ========================================================================

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.shared.state.borrow()
    }

    /// Returns a receiver notified on every state change.
    #[must_use]
    pub fn state_changes(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Moves `Open` (or `Connecting`) to `Closing`.
    ///
    /// Returns `true` for the single caller that performed the transition.
    pub(crate) fn begin_closing(&self) -> bool {
        self.shared.state.send_if_modified(|state| {
            if *state < SessionState::Closing {
                *state = SessionState::Closing;
                true
            } else {
                false
            }
        })
    }

    /// Stops the dispatch loop and waits until it has failed every pending
    /// command and reached `Closed`.
    pub(crate) async fn shutdown(&self) {
        let (done, finished) = oneshot::channel();
        if self
            .command_tx
            .send(ConnectionCommand::Shutdown { done })
            .is_ok()
        {
            let _ = finished.await;
        }

        // Loop already gone: wait for it to publish Closed.
        let mut changes = self.state_changes();
        let _ = changes.wait_for(|state| *state == SessionState::Closed).await;
    }

    /// Returns `true` if the remote end closed the connection.
    #[inline]
    #[must_use]
    pub fn transport_lost(&self) -> bool {
        self.shared.transport_lost.load(Ordering::Acquire)
    }

    fn closed_error(&self) -> Error {
        if self.transport_lost() {
            Error::TransportClosed
        } else {
            Error::SessionClosed
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the event router fed by this connection.
    #[inline]
    pub(crate) fn router(&self) -> &EventRouter {
        &self.shared.router
    }

    /// Returns the number of in-flight commands.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.shared.correlator.pending_count()
    }
}

// ============================================================================
// Dispatch Loop
// ============================================================================

async fn run_dispatch_loop<T: Transport>(
    mut transport: T,
    mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
    shared: Arc<Shared>,
) {
    let mut shutdown_ack = None;

    loop {
        tokio::select! {
            frame = transport.recv() => {
                match frame {
                    Some(Ok(text)) => handle_frame(&text, &shared),

                    Some(Err(e)) => {
                        error!(error = %e, "Transport error");
                        shared.transport_lost.store(true, Ordering::Release);
                        break;
                    }

                    None => {
                        debug!("Transport closed by remote");
                        shared.transport_lost.store(true, Ordering::Release);
                        break;
                    }
                }
            }

            command = command_rx.recv() => {
                match command {
                    Some(ConnectionCommand::Send { id, text }) => {
                        if let Err(e) = transport.send(text).await {
                            warn!(%id, error = %e, "Failed to write command");
                            shared.correlator.fail(id, Error::connection(e.to_string()));
                        } else {
                            trace!(%id, "Command written");
                        }
                    }

                    Some(ConnectionCommand::Shutdown { done }) => {
                        debug!("Shutdown requested");
                        if let Err(e) = transport.close().await {
                            debug!(error = %e, "Transport close failed");
                        }
                        shutdown_ack = Some(done);
                        break;
                    }

                    // Every Connection clone is gone.
                    None => {
                        debug!("Command channel closed");
                        let _ = transport.close().await;
                        break;
                    }
                }
            }
        }
    }

    shared.state.send_if_modified(|state| {
        if *state < SessionState::Closing {
            *state = SessionState::Closing;
            true
        } else {
            false
        }
    });

    shared.correlator.fail_all(|| Error::TransportClosed);
    shared.router.clear();
    shared.state.send_replace(SessionState::Closed);

    if let Some(done) = shutdown_ack {
        let _ = done.send(());
    }

    debug!("Dispatch loop terminated");
}

/// Routes one inbound frame.
fn handle_frame(text: &str, shared: &Shared) {
    match Incoming::parse(text) {
        Ok(Incoming::Response(response)) => {
            trace!(id = %response.id, "Response received");
            shared.correlator.resolve(response);
        }

        Ok(Incoming::Event(event)) => {
            trace!(method = %event.method, "Event received");
            shared.router.dispatch(event);
        }

        Err(e) => {
            // A malformed response still retires its command.
            let id = serde_json::from_str::<Value>(text)
                .ok()
                .and_then(|value| value.get("id").and_then(Value::as_u64))
                .map(CommandId::new);

            match id {
                Some(id) => {
                    warn!(%id, error = %e, "Malformed response");
                    shared.correlator.fail(id, e);
                }
                None => warn!(error = %e, "Dropping unclassifiable frame"),
            }
        }
    }
}

// ============================================================================
// CommandHandle
// ============================================================================

/// Completion handle of a submitted command.
///
/// Await it (or call [`CommandHandle::wait`]) for the result. Dropping an
/// unfinished handle retires the command; a late response is ignored.
pub struct CommandHandle {
    id: CommandId,
    rx: CompletionReceiver,
    correlator: Arc<Correlator>,
    timeout: Option<Duration>,
    finished: bool,
}

impl CommandHandle {
    /// Returns the command id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> CommandId {
        self.id
    }

    /// Overrides the deadline.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Removes the deadline.
    #[inline]
    #[must_use]
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Returns a handle that can cancel this command from elsewhere.
    #[must_use]
    pub fn canceller(&self) -> Canceller {
        Canceller {
            id: self.id,
            correlator: Arc::clone(&self.correlator),
        }
    }

    /// Waits for the result.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] if the remote end answered with an error
    /// - [`Error::Timeout`] if the deadline passed first
    /// - [`Error::Cancelled`] if the command was cancelled
    /// - [`Error::TransportClosed`] if the connection ended first
    pub async fn wait(mut self) -> Result<Value> {
        let id = self.id;

        let received = match self.timeout {
            Some(limit) => match timeout(limit, &mut self.rx).await {
                Ok(received) => received,
                Err(_) => {
                    // Whoever removes the entry first decides the outcome.
                    let timeout_ms = millis(limit);
                    if self.correlator.fail(id, Error::timeout(id, timeout_ms)) {
                        debug!(%id, timeout_ms, "Command timed out");
                    }
                    (&mut self.rx).await
                }
            },
            None => (&mut self.rx).await,
        };

        self.finished = true;
        received.unwrap_or(Err(Error::TransportClosed))
    }
}

impl IntoFuture for CommandHandle {
    type Output = Result<Value>;
    type IntoFuture = BoxFuture<'static, Result<Value>>;

    fn into_future(self) -> Self::IntoFuture {
        self.wait().boxed()
    }
}

impl Drop for CommandHandle {
    fn drop(&mut self) {
        if !self.finished && self.correlator.remove(self.id) {
            trace!(id = %self.id, "Command abandoned");
        }
    }
}

/// Cancels one pending command.
#[derive(Clone)]
pub struct Canceller {
    id: CommandId,
    correlator: Arc<Correlator>,
}

impl Canceller {
    /// Returns the command id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> CommandId {
        self.id
    }

    /// Fails the command with [`Error::Cancelled`].
    ///
    /// Returns `false` if it already completed.
    pub fn cancel(&self) -> bool {
        self.correlator.cancel(self.id)
    }
}

/// Whole milliseconds in `limit`, saturating at `u64::MAX`.
fn millis(limit: Duration) -> u64 {
    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{RawCommand, SessionCommand};
    use crate::transport::{ChannelTransport, RemoteEnd};
    use serde_json::json;

    fn open(options: SessionOptions) -> (Connection, RemoteEnd) {
        let (transport, remote) = ChannelTransport::pair();
        let (state, _) = watch::channel(SessionState::Connecting);
        (Connection::spawn(transport, &options, state), remote)
    }

    fn status() -> Command {
        Command::Session(SessionCommand::Status {})
    }

    #[test]
    fn test_timeout_millis_saturate() {
        assert_eq!(millis(Duration::from_millis(1500)), 1500);
        assert_eq!(millis(Duration::from_micros(999)), 0);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }

    #[tokio::test]
    async fn test_request_response_roundtrip() {
        let (connection, mut remote) = open(SessionOptions::new());
        assert_eq!(connection.state(), SessionState::Open);

        let pending = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send(status()).await }
        });

        let (id, method, params) = remote.recv_command().await.expect("command");
        assert_eq!(method, "session.status");
        assert_eq!(params, json!({}));
        remote
            .respond_success(id, json!({ "ready": true, "message": "" }))
            .expect("respond");

        let result = pending.await.expect("join").expect("result");
        assert_eq!(result["ready"], true);
        assert_eq!(connection.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_protocol_error_is_command_scoped() {
        let (connection, mut remote) = open(SessionOptions::new());

        let handle = connection.submit(status()).expect("submit");
        let (id, _, _) = remote.recv_command().await.expect("command");
        remote
            .respond_error(id, "unknown command", "nope")
            .expect("respond");

        let err = handle.await.expect_err("protocol error");
        assert!(err.is_protocol_error("unknown command"));
        assert_eq!(connection.state(), SessionState::Open);
    }

    #[tokio::test]
    async fn test_timeout_retires_id_and_ignores_late_response() {
        let (connection, mut remote) = open(SessionOptions::new());

        let err = connection
            .send_with_timeout(status(), Duration::from_millis(20))
            .await
            .expect_err("timeout");
        let Error::Timeout { command_id, .. } = err else {
            panic!("expected timeout, got {err:?}");
        };

        let (id, _, _) = remote.recv_command().await.expect("command");
        assert_eq!(id, command_id);
        remote.respond_success(id, json!({})).expect("late response");

        // The session keeps working after the late response.
        let next = connection.submit(status()).expect("submit");
        let (next_id, _, _) = remote.recv_command().await.expect("command");
        assert!(next_id > id);
        remote.respond_success(next_id, json!({ "ok": 1 })).expect("respond");
        assert_eq!(next.await.expect("result")["ok"], 1);
    }

    #[tokio::test]
    async fn test_cancel() {
        let (connection, mut remote) = open(SessionOptions::new());

        let handle = connection.submit(status()).expect("submit");
        let canceller = handle.canceller();
        let (id, _, _) = remote.recv_command().await.expect("command");

        assert!(canceller.cancel());
        assert!(!connection.cancel(id));
        assert!(matches!(handle.await, Err(Error::Cancelled { command_id }) if command_id == id));
    }

    #[tokio::test]
    async fn test_dropped_handle_retires_command() {
        let (connection, _remote) = open(SessionOptions::new());
        let handle = connection.submit(status()).expect("submit");
        assert_eq!(connection.pending_count(), 1);
        drop(handle);
        assert_eq!(connection.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_remote_close_fails_pending() {
        let (connection, mut remote) = open(SessionOptions::new());

        let first = connection.submit(status()).expect("submit");
        let second = connection.submit(status()).expect("submit");
        remote.recv_command().await.expect("command");
        remote.recv_command().await.expect("command");
        remote.close();

        assert!(matches!(first.await, Err(Error::TransportClosed)));
        assert!(matches!(second.await, Err(Error::TransportClosed)));

        let mut changes = connection.state_changes();
        changes
            .wait_for(|state| *state == SessionState::Closed)
            .await
            .expect("closed");
        assert!(matches!(connection.submit(status()), Err(Error::TransportClosed)));
    }

    #[tokio::test]
    async fn test_malformed_response_fails_only_its_command() {
        let (connection, mut remote) = open(SessionOptions::new());

        let handle = connection.submit(status()).expect("submit");
        let (id, _, _) = remote.recv_command().await.expect("command");
        remote
            .send_json(&json!({ "id": id, "type": "strange" }))
            .expect("send");

        assert!(matches!(handle.await, Err(Error::Decode { .. })));
        assert_eq!(connection.state(), SessionState::Open);
    }

    #[tokio::test]
    async fn test_send_typed_decode_error() {
        #[derive(Debug, serde::Deserialize)]
        struct Expected {
            #[allow(dead_code)]
            ready: bool,
        }

        let (connection, mut remote) = open(SessionOptions::new());
        let pending = tokio::spawn({
            let connection = connection.clone();
            async move {
                connection
                    .send_typed::<Expected>(Command::Raw(RawCommand::new("session.status", json!({}))))
                    .await
            }
        });

        let (id, _, _) = remote.recv_command().await.expect("command");
        remote.respond_success(id, json!({ "ready": "yes" })).expect("respond");

        let err = pending.await.expect("join").expect_err("decode");
        assert!(matches!(err, Error::Decode { ref message } if message.starts_with("session.status")));
    }

    #[tokio::test]
    async fn test_shutdown_reaches_closed() {
        let (connection, mut remote) = open(SessionOptions::new());
        assert!(connection.begin_closing());
        assert!(!connection.begin_closing());
        assert!(matches!(connection.submit(status()), Err(Error::SessionClosed)));

        connection.shutdown().await;
        assert_eq!(connection.state(), SessionState::Closed);
        assert!(remote.recv().await.is_none());
    }
}
