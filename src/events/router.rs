//! Event subscriber registry.
//!
//! Each subscription owns a worker task fed by an unbounded queue, so the
//! dispatch loop never waits on a handler and one slow handler never delays
//! another subscriber. Events for one subscription arrive in dispatch order.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, error, trace};

use crate::identifiers::BrowsingContextId;
use crate::protocol::Event;

// ============================================================================
// Types
// ============================================================================

/// Event handler callback.
///
/// Invoked on the subscription's worker task, one event at a time.
pub type EventHandler = Arc<dyn Fn(Event) -> BoxFuture<'static, ()> + Send + Sync>;

/// Handle returned by [`EventRouter::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Entry {
    token: SubscriptionToken,
    event: String,
    context: Option<BrowsingContextId>,
    queue: mpsc::UnboundedSender<Event>,
}

impl Entry {
    fn matches(&self, event: &Event, context: Option<&BrowsingContextId>) -> bool {
        let name_matches = self.event == event.method
            || (!self.event.contains('.') && self.event == event.module());

        name_matches
            && match &self.context {
                None => true,
                Some(filter) => context == Some(filter),
            }
    }
}

// ============================================================================
// EventRouter
// ============================================================================

/// Routes inbound events to subscribers by name and browsing context.
///
/// A subscription name is either a full event name (`network.responseStarted`)
/// or a module name (`network`) matching every event of that module.
pub struct EventRouter {
    next_token: AtomicU64,
    entries: Mutex<Vec<Entry>>,
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRouter {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_token: AtomicU64::new(1),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Registers a handler.
    ///
    /// Spawns the subscription's worker task, so this must run inside a
    /// Tokio runtime.
    pub fn subscribe(
        &self,
        event: impl Into<String>,
        context: Option<BrowsingContextId>,
        handler: EventHandler,
    ) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let event = event.into();
        let (queue, rx) = mpsc::unbounded_channel();

        tokio::spawn(run_worker(token, rx, handler));

        debug!(%token, %event, context = ?context, "Subscribed");
        self.entries.lock().push(Entry {
            token,
            event,
            context,
            queue,
        });

        token
    }

    /// Registers an async closure as a handler.
    pub fn subscribe_fn<F, Fut>(
        &self,
        event: impl Into<String>,
        context: Option<BrowsingContextId>,
        handler: F,
    ) -> SubscriptionToken
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: EventHandler = Arc::new(move |event| handler(event).boxed());
        self.subscribe(event, context, handler)
    }

    /// Removes a subscription.
    ///
    /// Returns `false` if the token is unknown or already removed. Events
    /// already queued for the subscription are still delivered.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|entry| entry.token != token);
        let removed = entries.len() != before;

        if removed {
            debug!(%token, "Unsubscribed");
        }
        removed
    }

    /// Queues `event` for every matching subscription.
    ///
    /// Never blocks. Returns the number of subscriptions the event was
    /// queued for.
    pub fn dispatch(&self, event: Event) -> usize {
        let context = event.context();
        let entries = self.entries.lock();

        let mut delivered = 0;
        for entry in entries.iter().filter(|e| e.matches(&event, context.as_ref())) {
            if entry.queue.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }

        trace!(method = %event.method, delivered, "Event dispatched");
        delivered
    }

    /// Returns `true` if any subscription listens to exactly `event`.
    #[must_use]
    pub fn has_subscribers(&self, event: &str) -> bool {
        self.entries.lock().iter().any(|entry| entry.event == event)
    }

    /// Removes every subscription.
    pub fn clear(&self) {
        let drained = std::mem::take(&mut *self.entries.lock());
        if !drained.is_empty() {
            debug!(count = drained.len(), "Cleared subscriptions");
        }
    }

    /// Returns the number of subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if there are no subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

// ============================================================================
// Worker
// ============================================================================

async fn run_worker(
    token: SubscriptionToken,
    mut rx: mpsc::UnboundedReceiver<Event>,
    handler: EventHandler,
) {
    while let Some(event) = rx.recv().await {
        let method = event.method.clone();

        // A panic while building the future is as fatal as one while polling it.
        let outcome = match std::panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
            Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
            Err(panic) => Err(panic),
        };

        if outcome.is_err() {
            error!(%token, %method, "Event handler panicked");
        }
    }

    trace!(%token, "Subscription worker finished");
}

// ============================================================================
// Tests
// ============================================================================
