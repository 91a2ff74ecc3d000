//! `session` module.
//!
//! These are the raw `session.*` commands. Subscribing here tells the remote
//! end to emit events without registering a local handler; use
//! [`Session::subscribe`](crate::Session::subscribe) for both.

use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::{BrowsingContextId, SubscriptionId};
use crate::protocol::session::{
    SessionStatus, SubscribeParameters, SubscribeResult, UnsubscribeParameters,
};
use crate::protocol::{Command, SessionCommand};
use crate::transport::Connection;

/// Typed access to `session.*` commands.
#[derive(Clone)]
pub struct SessionModule {
    connection: Connection,
}

impl SessionModule {
    pub(crate) fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Returns whether the remote end accepts new sessions.
    pub async fn status(&self) -> Result<SessionStatus> {
        self.connection
            .send_typed(Command::Session(SessionCommand::Status {}))
            .await
    }

    /// Enables events remotely.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `events` is empty.
    pub async fn subscribe(
        &self,
        events: Vec<String>,
        contexts: Option<Vec<BrowsingContextId>>,
    ) -> Result<Option<SubscriptionId>> {
        if events.is_empty() {
            return Err(Error::invalid_argument("subscribe needs at least one event"));
        }

        debug!(?events, "Subscribing remotely");
        let result: SubscribeResult = self
            .connection
            .send_typed(Command::Session(SessionCommand::Subscribe(SubscribeParameters {
                events,
                contexts,
                user_contexts: None,
            })))
            .await?;
        Ok(result.subscription)
    }

    /// Disables events remotely by name.
    pub async fn unsubscribe(
        &self,
        events: Vec<String>,
        contexts: Option<Vec<BrowsingContextId>>,
    ) -> Result<()> {
        self.connection
            .send(Command::Session(SessionCommand::Unsubscribe(
                UnsubscribeParameters::ByAttributes { events, contexts },
            )))
            .await?;
        Ok(())
    }

    /// Removes remote subscriptions by id.
    pub async fn unsubscribe_by_id(&self, subscriptions: Vec<SubscriptionId>) -> Result<()> {
        self.connection
            .send(Command::Session(SessionCommand::Unsubscribe(
                UnsubscribeParameters::ById { subscriptions },
            )))
            .await?;
        Ok(())
    }

    /// Ends the session on the remote end.
    ///
    /// The connection stays up until the remote end closes it; prefer
    /// [`Session::dispose`](crate::Session::dispose) for local teardown.
    pub async fn end(&self) -> Result<()> {
        self.connection
            .send(Command::Session(SessionCommand::End {}))
            .await?;
        Ok(())
    }
}
