//! Pending command table.
//!
//! Every in-flight command owns exactly one entry. Whoever removes the entry
//! (response, timeout, cancellation or teardown) completes the caller; every
//! other party finds the entry gone and does nothing.

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::identifiers::CommandId;
use crate::protocol::Response;

// ============================================================================
// Types
// ============================================================================

/// Completion side of a pending command.
type Completion = oneshot::Sender<Result<Value>>;

/// Receiving side handed to the submitter.
pub(crate) type CompletionReceiver = oneshot::Receiver<Result<Value>>;

#[derive(Default)]
struct PendingTable {
    entries: FxHashMap<CommandId, Completion>,
    /// Set by teardown; later registrations fail immediately.
    closed: bool,
}

// ============================================================================
// Correlator
// ============================================================================

/// Allocates command ids and matches responses to waiting callers.
pub struct Correlator {
    next_id: AtomicU64,
    pending: Mutex<PendingTable>,
    max_pending: usize,
}

impl Correlator {
    /// Creates a correlator accepting at most `max_pending` in-flight commands.
    #[must_use]
    pub fn new(max_pending: usize) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            pending: Mutex::new(PendingTable::default()),
            max_pending,
        }
    }

    /// Allocates a fresh id and registers a pending entry for it.
    ///
    /// # Errors
    ///
    /// - [`Error::TransportClosed`] after [`Correlator::fail_all`]
    /// - [`Error::TooManyPendingCommands`] if the table is full
    pub(crate) fn register(&self) -> Result<(CommandId, CompletionReceiver)> {
        let mut table = self.pending.lock();

        if table.closed {
            return Err(Error::TransportClosed);
        }

        if table.entries.len() >= self.max_pending {
            warn!(
                pending = table.entries.len(),
                max = self.max_pending,
                "Too many pending commands"
            );
            return Err(Error::TooManyPendingCommands {
                pending: table.entries.len(),
                max: self.max_pending,
            });
        }

        let id = CommandId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        table.entries.insert(id, tx);

        Ok((id, rx))
    }

    /// Completes the command a response belongs to.
    ///
    /// Returns `false` and logs if the id is unknown or already retired.
    pub fn resolve(&self, response: Response) -> bool {
        let id = response.id;
        let Some(tx) = self.pending.lock().entries.remove(&id) else {
            warn!(%id, "Response for unknown or retired command");
            return false;
        };

        let _ = tx.send(response.into_result());
        true
    }

    /// Fails one command with `error`.
    ///
    /// Returns `false` if the command already completed.
    pub fn fail(&self, id: CommandId, error: Error) -> bool {
        let Some(tx) = self.pending.lock().entries.remove(&id) else {
            return false;
        };

        let _ = tx.send(Err(error));
        true
    }

    /// Fails one command with [`Error::Cancelled`].
    pub fn cancel(&self, id: CommandId) -> bool {
        let cancelled = self.fail(id, Error::cancelled(id));
        if cancelled {
            debug!(%id, "Command cancelled");
        }
        cancelled
    }

    /// Drops an entry without completing it.
    ///
    /// Used when the submitter itself went away.
    pub(crate) fn remove(&self, id: CommandId) -> bool {
        self.pending.lock().entries.remove(&id).is_some()
    }

    /// Fails every pending command and rejects later registrations.
    ///
    /// Returns the number of commands failed.
    pub fn fail_all(&self, make_error: impl Fn() -> Error) -> usize {
        let drained: Vec<_> = {
            let mut table = self.pending.lock();
            table.closed = true;
            table.entries.drain().collect()
        };

        let count = drained.len();
        for (_, tx) in drained {
            let _ = tx.send(Err(make_error()));
        }

        if count > 0 {
            debug!(count, "Failed pending commands");
        }
        count
    }

    /// Returns `true` if `id` is still awaiting completion.
    #[must_use]
    pub fn is_pending(&self, id: CommandId) -> bool {
        self.pending.lock().entries.contains_key(&id)
    }

    /// Returns the number of in-flight commands.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().entries.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
