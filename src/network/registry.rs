//! Live intercepts and blocked-event routing.
//!
//! The registry subscribes to the blocked network events on demand. Each
//! blocked event is matched to one live intercept and that intercept's
//! handler runs on its own task, so a slow decision for one request never
//! delays another. Only the browser waits on the handler.
//!
//! A blocked event can name an intercept whose `network.addIntercept`
//! response has not been processed yet. Such events are held until the
//! registration finishes.

// ============================================================================
// Imports
// ============================================================================

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::join_all;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::broadcast;
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::events::EventHandler;
use crate::events::subscription;
use crate::identifiers::{BrowsingContextId, InterceptId};
use crate::protocol::network::{
    AddInterceptParameters, AddInterceptResult, BeforeRequestSent, NetworkEventBase,
    ResponseEvent, UrlPattern,
};
use crate::protocol::{Command, Event, NetworkCommand};
use crate::session::SessionOptions;
use crate::transport::Connection;

use super::pattern;
use super::request::{fail_command, pass_command};
use super::{InterceptFault, InterceptHandler, InterceptPhase, InterceptedRequest, PausedEvent};

// ============================================================================
// Table
// ============================================================================

struct InterceptEntry {
    id: InterceptId,
    phases: Vec<InterceptPhase>,
    url_patterns: Option<Vec<UrlPattern>>,
    contexts: Option<Vec<BrowsingContextId>>,
    handler: InterceptHandler,
}

impl InterceptEntry {
    fn matches_locally(&self, base: &NetworkEventBase) -> bool {
        let context_ok = match (&self.contexts, &base.context) {
            (None, _) => true,
            (Some(contexts), Some(context)) => contexts.contains(context),
            (Some(_), None) => false,
        };
        context_ok && pattern::matches_any(self.url_patterns.as_deref(), &base.request.url)
    }
}

#[derive(Default)]
struct InterceptTable {
    /// Live intercepts in registration order.
    intercepts: Vec<InterceptEntry>,
    /// Requests whose handler has not finished.
    paused: FxHashMap<u64, InterceptedRequest>,
    /// `network.addIntercept` calls awaiting their response.
    registering: usize,
    /// Blocked events naming an intercept still being registered.
    orphans: Vec<(InterceptPhase, PausedEvent)>,
    closed: bool,
}

impl InterceptTable {
    fn select(&self, phase: InterceptPhase, base: &NetworkEventBase) -> Option<&InterceptEntry> {
        let mut live = self.intercepts.iter().filter(|entry| entry.phases.contains(&phase));
        match &base.intercepts {
            Some(ids) => live.find(|entry| ids.contains(&entry.id)),
            None => live.find(|entry| entry.matches_locally(base)),
        }
    }
}

// ============================================================================
// InterceptRegistry
// ============================================================================

/// Registry of the session's live intercepts.
#[derive(Clone)]
pub struct InterceptRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    connection: Connection,
    table: Mutex<InterceptTable>,
    /// Phases whose events the registry already subscribed to.
    subscribed: tokio::sync::Mutex<Vec<InterceptPhase>>,
    faults: broadcast::Sender<InterceptFault>,
    teardown_timeout: Duration,
    next_pause: AtomicU64,
}

impl InterceptRegistry {
    pub(crate) fn new(connection: Connection, options: &SessionOptions) -> Self {
        let (faults, _) = broadcast::channel(options.fault_capacity);
        Self {
            inner: Arc::new(RegistryInner {
                connection,
                table: Mutex::new(InterceptTable::default()),
                subscribed: tokio::sync::Mutex::new(Vec::new()),
                faults,
                teardown_timeout: options.teardown_timeout,
                next_pause: AtomicU64::new(0),
            }),
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Adds an intercept and routes its paused requests to `handler`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `params.phases` is empty
    /// - [`Error::SessionClosed`] if the session is closing or closed
    /// - any error of `session.subscribe` or `network.addIntercept`
    pub async fn add_intercept(
        &self,
        params: AddInterceptParameters,
        handler: InterceptHandler,
    ) -> Result<InterceptId> {
        if params.phases.is_empty() {
            return Err(Error::invalid_argument("intercept needs at least one phase"));
        }
        if self.inner.table.lock().closed {
            return Err(Error::SessionClosed);
        }

        self.ensure_subscribed(&params.phases).await?;

        self.inner.table.lock().registering += 1;

        let result = self
            .inner
            .connection
            .send_typed::<AddInterceptResult>(Command::Network(NetworkCommand::AddIntercept(
                params.clone(),
            )))
            .await;

        let (result, released) = {
            let mut table = self.inner.table.lock();
            table.registering -= 1;

            let result = match result {
                Ok(_) if table.closed => Err(Error::SessionClosed),
                Ok(added) => {
                    table.intercepts.push(InterceptEntry {
                        id: added.intercept.clone(),
                        phases: params.phases,
                        url_patterns: params.url_patterns,
                        contexts: params.contexts,
                        handler,
                    });
                    Ok(added.intercept)
                }
                Err(e) => Err(e),
            };

            // Held events become routable once their intercept is known or
            // no registration is left that could claim them.
            let orphans = std::mem::take(&mut table.orphans);
            let (released, held): (Vec<_>, Vec<_>) = if table.registering == 0 {
                (orphans, Vec::new())
            } else {
                orphans.into_iter().partition(|(_, paused)| match &result {
                    Ok(id) => paused.base().intercepts.as_ref().is_some_and(|ids| ids.contains(id)),
                    Err(_) => false,
                })
            };
            table.orphans = held;

            (result, released)
        };

        for (phase, paused) in released {
            self.inner.route(phase, paused);
        }

        if let Ok(id) = &result {
            debug!(intercept = %id, "Intercept added");
        }
        result
    }

    /// Removes an intercept.
    ///
    /// New requests stop pausing on it at once. Requests already paused under
    /// it stay with their handler.
    ///
    /// # Errors
    ///
    /// - [`Error::InterceptNotFound`] if the id is not live
    /// - any error of `network.removeIntercept`
    pub async fn remove_intercept(&self, id: &InterceptId) -> Result<()> {
        let removed = {
            let mut table = self.inner.table.lock();
            let index = table.intercepts.iter().position(|entry| &entry.id == id);
            index.map(|index| table.intercepts.remove(index))
        };

        if removed.is_none() {
            return Err(Error::intercept_not_found(id.clone()));
        }

        debug!(intercept = %id, "Removing intercept");
        self.inner
            .connection
            .send(Command::Network(NetworkCommand::RemoveIntercept {
                intercept: id.clone(),
            }))
            .await?;
        Ok(())
    }

    async fn ensure_subscribed(&self, phases: &[InterceptPhase]) -> Result<()> {
        let mut subscribed = self.inner.subscribed.lock().await;

        let mut missing: Vec<InterceptPhase> = Vec::new();
        for phase in phases {
            if !subscribed.contains(phase) && !missing.contains(phase) {
                missing.push(*phase);
            }
        }
        if missing.is_empty() {
            return Ok(());
        }

        let weak: Weak<RegistryInner> = Arc::downgrade(&self.inner);
        let handler: EventHandler = Arc::new(move |event: Event| {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    inner.on_event(&event);
                }
            }
            .boxed()
        });

        let events = missing.iter().map(|phase| phase.event_method().to_owned()).collect();
        subscription::subscribe(&self.inner.connection, events, None, handler).await?;

        subscribed.extend(missing);
        Ok(())
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Ids of the live intercepts, in registration order.
    #[must_use]
    pub fn intercepts(&self) -> Vec<InterceptId> {
        self.inner
            .table
            .lock()
            .intercepts
            .iter()
            .map(|entry| entry.id.clone())
            .collect()
    }

    /// Number of requests whose handler is still running.
    #[must_use]
    pub fn paused_count(&self) -> usize {
        self.inner.table.lock().paused.len()
    }

    /// Receives every [`InterceptFault`] raised after this call.
    #[must_use]
    pub fn faults(&self) -> broadcast::Receiver<InterceptFault> {
        self.inner.faults.subscribe()
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Clears every intercept and fails every request still paused.
    ///
    /// Commands go out best effort, bounded by the teardown timeout. Safe to
    /// call more than once and from inside an intercept handler.
    pub(crate) async fn shutdown(&self) {
        let (intercepts, paused, orphans) = {
            let mut table = self.inner.table.lock();
            if table.closed {
                return;
            }
            table.closed = true;
            (
                std::mem::take(&mut table.intercepts),
                std::mem::take(&mut table.paused),
                std::mem::take(&mut table.orphans),
            )
        };

        let mut commands: Vec<Command> = paused.values().filter_map(InterceptedRequest::abort).collect();
        commands.extend(orphans.into_iter().map(|(phase, event)| {
            Command::Network(fail_command(phase, event.base().request.request.clone()))
        }));
        commands.extend(intercepts.into_iter().map(|entry| {
            Command::Network(NetworkCommand::RemoveIntercept { intercept: entry.id })
        }));

        debug!(commands = commands.len(), "Tearing down interception");

        let timeout = self.inner.teardown_timeout;
        let connection = &self.inner.connection;
        join_all(commands.into_iter().map(|command| async move {
            let method = command.method();
            match connection.submit_during_teardown(command) {
                Ok(handle) => {
                    if let Err(e) = handle.with_timeout(timeout).await {
                        debug!(%method, error = %e, "Teardown command failed");
                    }
                }
                Err(e) => debug!(%method, error = %e, "Teardown command not sent"),
            }
        }))
        .await;
    }
}

// ============================================================================
// Routing
// ============================================================================

impl RegistryInner {
    fn on_event(self: &Arc<Self>, event: &Event) {
        let Some(phase) = InterceptPhase::from_event_method(&event.method) else {
            return;
        };

        let paused = match phase {
            InterceptPhase::BeforeRequestSent => {
                event.decode::<BeforeRequestSent>().map(PausedEvent::Request)
            }
            InterceptPhase::ResponseStarted | InterceptPhase::AuthRequired => {
                event.decode::<ResponseEvent>().map(PausedEvent::Response)
            }
        };

        match paused {
            Ok(paused) if paused.base().is_blocked => self.route(phase, paused),
            Ok(_) => {}
            Err(e) => warn!(method = %event.method, error = %e, "Undecodable network event"),
        }
    }

    fn route(self: &Arc<Self>, phase: InterceptPhase, paused: PausedEvent) {
        // Selection and the paused entry share one lock so teardown sees
        // every request it has to fail.
        let (key, request, handler) = {
            let mut table = self.table.lock();
            if table.closed {
                return;
            }

            let selected = table
                .select(phase, paused.base())
                .map(|entry| (entry.id.clone(), Arc::clone(&entry.handler)));

            match selected {
                Some((intercept, handler)) => {
                    let request =
                        InterceptedRequest::new(intercept, phase, paused, self.connection.clone());
                    let key = self.next_pause.fetch_add(1, Ordering::Relaxed);
                    table.paused.insert(key, request.clone());
                    (key, request, handler)
                }
                None if table.registering > 0 && paused.base().intercepts.is_some() => {
                    trace!(request = %paused.base().request.request, "Holding event for pending intercept");
                    table.orphans.push((phase, paused));
                    return;
                }
                None => {
                    drop(table);
                    self.pass_unclaimed(phase, &paused);
                    return;
                }
            }
        };

        self.spawn_handler(key, request, handler);
    }

    /// Continues a blocked request no live intercept claims.
    fn pass_unclaimed(&self, phase: InterceptPhase, paused: &PausedEvent) {
        let request = paused.base().request.request.clone();
        debug!(%request, ?phase, "No live intercept for blocked request, continuing");

        let command = Command::Network(pass_command(phase, request.clone()));
        let connection = self.connection.clone();
        tokio::spawn(async move {
            if let Err(e) = connection.send(command).await {
                debug!(%request, error = %e, "Failed to continue unclaimed request");
            }
        });
    }

    fn spawn_handler(self: &Arc<Self>, key: u64, request: InterceptedRequest, handler: InterceptHandler) {
        let phase = request.phase();
        trace!(request = %request.request_id(), ?phase, "Invoking intercept handler");

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = match std::panic::catch_unwind(AssertUnwindSafe(|| handler(request.clone())))
            {
                Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
                Err(panic) => Err(panic),
            };

            match outcome {
                Ok(Ok(())) => match request.undelivered() {
                    Some(message) => inner.fault(&request, message).await,
                    None if request.is_paused() => {
                        warn!(
                            request = %request.request_id(),
                            ?phase,
                            "Intercept handler returned without resolving, continuing"
                        );
                        if let Err(e) = request.resolve_default().await {
                            inner.fault(&request, e.to_string()).await;
                        }
                    }
                    None => {}
                },
                Ok(Err(e)) => inner.fault(&request, e.to_string()).await,
                Err(panic) => inner.fault(&request, panic_message(panic.as_ref())).await,
            }

            inner.table.lock().paused.remove(&key);
        });
    }

    /// Reports a request the handler left undecided and fails it.
    async fn fault(&self, request: &InterceptedRequest, message: String) {
        if !request.is_paused() {
            warn!(request = %request.request_id(), error = %message, "Intercept handler failed after resolving");
            return;
        }

        error!(
            intercept = %request.intercept_id(),
            request = %request.request_id(),
            phase = ?request.phase(),
            error = %message,
            "Intercept handler failed, failing request"
        );

        let _ = self.faults.send(InterceptFault {
            intercept: request.intercept_id().clone(),
            request: request.request_id().clone(),
            phase: request.phase(),
            message,
        });

        if let Err(e) = request.force_fail().await {
            debug!(request = %request.request_id(), error = %e, "Force-fail not delivered");
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("handler panicked: {message}")
    } else {
        "handler panicked".to_owned()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::intercept_handler;
    use crate::session::SessionState;
    use crate::transport::{ChannelTransport, RemoteEnd};
    use serde_json::{Value, json};
    use tokio::sync::watch;

    fn open() -> (InterceptRegistry, Connection, RemoteEnd) {
        let (transport, remote) = ChannelTransport::pair();
        let (state, _) = watch::channel(SessionState::Connecting);
        let options = SessionOptions::new().with_teardown_timeout(Duration::from_millis(200));
        let connection = Connection::spawn(transport, &options, state);
        (InterceptRegistry::new(connection.clone(), &options), connection, remote)
    }

    fn blocked(request: &str, intercepts: Option<Vec<&str>>) -> Value {
        json!({
            "context": "ctx-1",
            "isBlocked": true,
            "navigation": null,
            "redirectCount": 0,
            "request": {
                "request": request,
                "url": "https://example.test/app.js",
                "method": "GET",
                "headers": [],
                "cookies": [],
                "headersSize": 0,
                "bodySize": 0,
                "destination": "script",
                "initiatorType": null,
                "timings": {}
            },
            "timestamp": 0,
            "intercepts": intercepts
        })
    }

    /// Answers `session.subscribe` then `network.addIntercept`.
    async fn accept_intercept(remote: &mut RemoteEnd, id: &str) {
        let (sub_id, method, _) = remote.recv_command().await.expect("subscribe");
        assert_eq!(method, "session.subscribe");
        remote.respond_success(sub_id, json!({ "subscription": "sub-1" })).expect("respond");

        let (add_id, method, params) = remote.recv_command().await.expect("addIntercept");
        assert_eq!(method, "network.addIntercept");
        assert_eq!(params["phases"], json!(["beforeRequestSent"]));
        remote.respond_success(add_id, json!({ "intercept": id })).expect("respond");
    }

    fn before_request_sent() -> AddInterceptParameters {
        AddInterceptParameters::new(vec![InterceptPhase::BeforeRequestSent])
    }

    #[tokio::test]
    async fn test_empty_phases_rejected() {
        let (registry, _connection, _remote) = open();
        let result = registry
            .add_intercept(
                AddInterceptParameters::new(Vec::new()),
                intercept_handler(|_| async { Ok(()) }),
            )
            .await;
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }

    #[tokio::test]
    async fn test_handler_continues_request() {
        let (registry, _connection, mut remote) = open();

        let add = tokio::spawn({
            let registry = registry.clone();
            async move {
                registry
                    .add_intercept(
                        before_request_sent(),
                        intercept_handler(|request| async move {
                            request.continue_request().await
                        }),
                    )
                    .await
            }
        });
        accept_intercept(&mut remote, "int-1").await;
        let id = add.await.expect("join").expect("added");
        assert_eq!(id.as_str(), "int-1");

        remote
            .emit_event("network.beforeRequestSent", blocked("req-1", Some(vec!["int-1"])))
            .expect("emit");

        let (cmd, method, params) = remote.recv_command().await.expect("continue");
        assert_eq!(method, "network.continueRequest");
        assert_eq!(params["request"], "req-1");
        remote.respond_success(cmd, json!({})).expect("respond");
    }

    #[tokio::test]
    async fn test_failing_handler_force_fails_and_reports() {
        let (registry, _connection, mut remote) = open();
        let mut faults = registry.faults();

        let add = tokio::spawn({
            let registry = registry.clone();
            async move {
                registry
                    .add_intercept(
                        before_request_sent(),
                        intercept_handler(|_| async {
                            Err(Error::invalid_argument("rejected by test"))
                        }),
                    )
                    .await
            }
        });
        accept_intercept(&mut remote, "int-1").await;
        add.await.expect("join").expect("added");

        remote
            .emit_event("network.beforeRequestSent", blocked("req-7", Some(vec!["int-1"])))
            .expect("emit");

        let (cmd, method, params) = remote.recv_command().await.expect("fail");
        assert_eq!(method, "network.failRequest");
        assert_eq!(params["request"], "req-7");
        remote.respond_success(cmd, json!({})).expect("respond");

        let fault = faults.recv().await.expect("fault");
        assert_eq!(fault.request.as_str(), "req-7");
        assert_eq!(fault.phase, InterceptPhase::BeforeRequestSent);
        assert!(fault.message.contains("rejected by test"));
    }

    #[tokio::test]
    async fn test_panicking_handler_is_a_fault() {
        let (registry, _connection, mut remote) = open();
        let mut faults = registry.faults();

        let add = tokio::spawn({
            let registry = registry.clone();
            async move {
                registry
                    .add_intercept(
                        before_request_sent(),
                        intercept_handler(|_| async { panic!("boom") }),
                    )
                    .await
            }
        });
        accept_intercept(&mut remote, "int-1").await;
        add.await.expect("join").expect("added");

        remote
            .emit_event("network.beforeRequestSent", blocked("req-2", Some(vec!["int-1"])))
            .expect("emit");

        let (cmd, method, _) = remote.recv_command().await.expect("fail");
        assert_eq!(method, "network.failRequest");
        remote.respond_success(cmd, json!({})).expect("respond");

        let fault = faults.recv().await.expect("fault");
        assert!(fault.message.contains("boom"));
    }

    #[tokio::test]
    async fn test_unclaimed_blocked_request_is_continued() {
        let (registry, _connection, mut remote) = open();

        // Subscribe through a registration, then remove the intercept.
        let add = tokio::spawn({
            let registry = registry.clone();
            async move {
                registry
                    .add_intercept(
                        before_request_sent(),
                        intercept_handler(|_| async { Ok(()) }),
                    )
                    .await
            }
        });
        accept_intercept(&mut remote, "int-1").await;
        let id = add.await.expect("join").expect("added");

        let remove = tokio::spawn({
            let registry = registry.clone();
            async move { registry.remove_intercept(&id).await }
        });
        let (cmd, method, _) = remote.recv_command().await.expect("remove");
        assert_eq!(method, "network.removeIntercept");
        remote.respond_success(cmd, json!({})).expect("respond");
        remove.await.expect("join").expect("removed");

        remote
            .emit_event("network.beforeRequestSent", blocked("req-3", Some(vec!["int-1"])))
            .expect("emit");
        let (_, method, params) = remote.recv_command().await.expect("continue");
        assert_eq!(method, "network.continueRequest");
        assert_eq!(params["request"], "req-3");
        assert!(registry.intercepts().is_empty());
    }

    #[tokio::test]
    async fn test_remove_unknown_intercept() {
        let (registry, _connection, _remote) = open();
        let result = registry.remove_intercept(&InterceptId::new("missing")).await;
        assert!(matches!(result, Err(Error::InterceptNotFound { .. })));
    }

    #[tokio::test]
    async fn test_event_before_registration_completes_is_held() {
        let (registry, _connection, mut remote) = open();
        let (seen_tx, mut seen_rx) = tokio::sync::mpsc::unbounded_channel();

        let add = tokio::spawn({
            let registry = registry.clone();
            async move {
                registry
                    .add_intercept(
                        before_request_sent(),
                        intercept_handler(move |request| {
                            let seen_tx = seen_tx.clone();
                            async move {
                                let _ = seen_tx.send(request.request_id().clone());
                                request.continue_request().await
                            }
                        }),
                    )
                    .await
            }
        });

        let (sub_id, _, _) = remote.recv_command().await.expect("subscribe");
        remote.respond_success(sub_id, json!({})).expect("respond");
        let (add_id, _, _) = remote.recv_command().await.expect("addIntercept");

        // The browser pauses a request before the response is processed.
        remote
            .emit_event("network.beforeRequestSent", blocked("req-early", Some(vec!["int-9"])))
            .expect("emit");
        remote.respond_success(add_id, json!({ "intercept": "int-9" })).expect("respond");

        add.await.expect("join").expect("added");
        let seen = seen_rx.recv().await.expect("handler ran");
        assert_eq!(seen.as_str(), "req-early");

        let (_, method, _) = remote.recv_command().await.expect("continue");
        assert_eq!(method, "network.continueRequest");
    }

    #[tokio::test]
    async fn test_shutdown_fails_paused_and_removes_intercepts() {
        let (registry, _connection, mut remote) = open();
        let (entered_tx, mut entered_rx) = tokio::sync::mpsc::unbounded_channel();
        let (release_tx, release_rx) = tokio::sync::watch::channel(false);

        let add = tokio::spawn({
            let registry = registry.clone();
            async move {
                registry
                    .add_intercept(
                        before_request_sent(),
                        intercept_handler(move |request| {
                            let entered_tx = entered_tx.clone();
                            let mut release_rx = release_rx.clone();
                            async move {
                                let _ = entered_tx.send(());
                                let _ = release_rx.wait_for(|released| *released).await;
                                request.continue_request().await
                            }
                        }),
                    )
                    .await
            }
        });
        accept_intercept(&mut remote, "int-1").await;
        add.await.expect("join").expect("added");

        remote
            .emit_event("network.beforeRequestSent", blocked("req-4", Some(vec!["int-1"])))
            .expect("emit");
        entered_rx.recv().await.expect("handler entered");
        assert_eq!(registry.paused_count(), 1);

        let shutdown = tokio::spawn({
            let registry = registry.clone();
            async move { registry.shutdown().await }
        });

        let mut methods = Vec::new();
        for _ in 0..2 {
            let (cmd, method, _) = remote.recv_command().await.expect("teardown command");
            remote.respond_success(cmd, json!({})).expect("respond");
            methods.push(method);
        }
        methods.sort();
        assert_eq!(methods, vec!["network.failRequest", "network.removeIntercept"]);
        shutdown.await.expect("join");
        assert!(registry.intercepts().is_empty());

        // The handler's late action sees the session gone.
        let _ = release_tx.send(true);
    }

    #[tokio::test]
    async fn test_rejected_action_is_failed_even_if_swallowed() {
        let (registry, _connection, mut remote) = open();
        let mut faults = registry.faults();

        let add = tokio::spawn({
            let registry = registry.clone();
            async move {
                registry
                    .add_intercept(
                        before_request_sent(),
                        intercept_handler(|request| async move {
                            let _ = request.continue_request().await;
                            Ok(())
                        }),
                    )
                    .await
            }
        });
        accept_intercept(&mut remote, "int-1").await;
        add.await.expect("join").expect("added");

        remote
            .emit_event("network.beforeRequestSent", blocked("req-5", Some(vec!["int-1"])))
            .expect("emit");

        let (cmd, method, _) = remote.recv_command().await.expect("continue");
        assert_eq!(method, "network.continueRequest");
        remote
            .respond_error(cmd, "invalid argument", "bad header")
            .expect("respond");

        let (cmd, method, params) = remote.recv_command().await.expect("fail");
        assert_eq!(method, "network.failRequest");
        assert_eq!(params["request"], "req-5");
        remote.respond_success(cmd, json!({})).expect("respond");

        let fault = faults.recv().await.expect("fault");
        assert_eq!(fault.request.as_str(), "req-5");
        assert!(fault.message.contains("bad header"));
    }

    #[tokio::test]
    async fn test_routed_request_is_visible_to_shutdown() {
        let (registry, _connection, mut remote) = open();
        registry.inner.table.lock().intercepts.push(InterceptEntry {
            id: InterceptId::new("int-1"),
            phases: vec![InterceptPhase::BeforeRequestSent],
            url_patterns: None,
            contexts: None,
            handler: intercept_handler(|_| std::future::pending()),
        });

        let event: BeforeRequestSent =
            serde_json::from_value(blocked("req-6", Some(vec!["int-1"]))).expect("event");
        registry
            .inner
            .route(InterceptPhase::BeforeRequestSent, PausedEvent::Request(event));
        assert_eq!(registry.paused_count(), 1);

        let shutdown = tokio::spawn({
            let registry = registry.clone();
            async move { registry.shutdown().await }
        });

        let mut methods = Vec::new();
        for _ in 0..2 {
            let (cmd, method, params) = remote.recv_command().await.expect("teardown command");
            if method == "network.failRequest" {
                assert_eq!(params["request"], "req-6");
            }
            remote.respond_success(cmd, json!({})).expect("respond");
            methods.push(method);
        }
        methods.sort();
        assert_eq!(methods, vec!["network.failRequest", "network.removeIntercept"]);
        shutdown.await.expect("join");
    }
}
