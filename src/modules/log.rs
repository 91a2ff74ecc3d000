//! `log` module.

use std::future::Future;

use crate::error::Result;
use crate::events::Subscription;
use crate::events::subscription::subscribe_typed;
use crate::identifiers::BrowsingContextId;
use crate::protocol::event::names;
use crate::protocol::log::LogEntry;
use crate::transport::Connection;

/// Typed access to `log.*` events.
#[derive(Clone)]
pub struct Log {
    connection: Connection,
}

impl Log {
    pub(crate) fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Subscribes to `log.entryAdded`.
    pub async fn on_entry_added<F, Fut>(
        &self,
        contexts: Option<Vec<BrowsingContextId>>,
        handler: F,
    ) -> Result<Subscription>
    where
        F: Fn(LogEntry) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        subscribe_typed(&self.connection, names::LOG_ENTRY_ADDED, contexts, handler).await
    }
}
