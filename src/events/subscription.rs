//! Remote-aware subscriptions.
//!
//! The remote end only emits events the session subscribed to with
//! `session.subscribe`. A [`Subscription`] pairs the local router entries
//! with that remote subscription so both are released together.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::Result;
use crate::identifiers::{BrowsingContextId, SubscriptionId};
use crate::protocol::session::{
    SubscribeParameters, SubscribeResult, UnsubscribeParameters,
};
use crate::protocol::{Command, Event, SessionCommand};
use crate::transport::Connection;

use super::router::{EventHandler, SubscriptionToken};

// ============================================================================
// Subscription
// ============================================================================

/// A set of local handlers plus the remote subscription feeding them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    tokens: Vec<SubscriptionToken>,
    remote_id: Option<SubscriptionId>,
    events: Vec<String>,
    contexts: Option<Vec<BrowsingContextId>>,
}

impl Subscription {
    /// Local router tokens.
    #[inline]
    #[must_use]
    pub fn tokens(&self) -> &[SubscriptionToken] {
        &self.tokens
    }

    /// Id assigned by `session.subscribe`, if the remote end returned one.
    #[inline]
    #[must_use]
    pub fn remote_id(&self) -> Option<&SubscriptionId> {
        self.remote_id.as_ref()
    }

    /// Subscribed event or module names.
    #[inline]
    #[must_use]
    pub fn events(&self) -> &[String] {
        &self.events
    }
}

// ============================================================================
// Subscribe / Unsubscribe
// ============================================================================

/// Registers `handler` locally for every event/context pair, then subscribes
/// remotely. Local entries are rolled back if the remote call fails.
pub(crate) async fn subscribe(
    connection: &Connection,
    events: Vec<String>,
    contexts: Option<Vec<BrowsingContextId>>,
    handler: EventHandler,
) -> Result<Subscription> {
    let router = connection.router();

    let tokens: Vec<_> = match &contexts {
        None => events
            .iter()
            .map(|event| router.subscribe(event.clone(), None, Arc::clone(&handler)))
            .collect(),
        Some(contexts) => events
            .iter()
            .flat_map(|event| {
                contexts.iter().map(|context| {
                    router.subscribe(event.clone(), Some(context.clone()), Arc::clone(&handler))
                })
            })
            .collect(),
    };

    let command = Command::Session(SessionCommand::Subscribe(SubscribeParameters {
        events: events.clone(),
        contexts: contexts.clone(),
        user_contexts: None,
    }));

    let result: SubscribeResult = match connection.send_typed(command).await {
        Ok(result) => result,
        Err(e) => {
            for token in &tokens {
                router.unsubscribe(*token);
            }
            return Err(e);
        }
    };

    debug!(?events, remote_id = ?result.subscription, "Remote subscription created");

    Ok(Subscription {
        tokens,
        remote_id: result.subscription,
        events,
        contexts,
    })
}

/// Subscribes a handler receiving `T` decoded from the event params.
///
/// Events whose params do not decode are logged and skipped.
pub(crate) async fn subscribe_typed<T, F, Fut>(
    connection: &Connection,
    event: &'static str,
    contexts: Option<Vec<BrowsingContextId>>,
    handler: F,
) -> Result<Subscription>
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let handler = Arc::new(handler);
    let raw: EventHandler = Arc::new(move |event: Event| {
        let handler = Arc::clone(&handler);
        async move {
            match event.decode::<T>() {
                Ok(payload) => handler(payload).await,
                Err(e) => warn!(method = %event.method, error = %e, "Skipping undecodable event"),
            }
        }
        .boxed()
    });

    subscribe(connection, vec![event.to_owned()], contexts, raw).await
}

/// Removes the local entries, then the remote subscription.
///
/// Without a remote id, the legacy attribute form is sent only for events no
/// other local subscriber still needs. While the session is not open only
/// the local entries are removed.
pub(crate) async fn unsubscribe(connection: &Connection, subscription: &Subscription) -> Result<()> {
    let router = connection.router();
    for token in &subscription.tokens {
        router.unsubscribe(*token);
    }

    if !connection.state().is_open() {
        return Ok(());
    }

    let params = match &subscription.remote_id {
        Some(id) => UnsubscribeParameters::ById {
            subscriptions: vec![id.clone()],
        },
        None => {
            let unused: Vec<String> = subscription
                .events
                .iter()
                .filter(|event| !router.has_subscribers(event))
                .cloned()
                .collect();

            if unused.is_empty() {
                return Ok(());
            }

            UnsubscribeParameters::ByAttributes {
                events: unused,
                contexts: subscription.contexts.clone(),
            }
        }
    };

    connection
        .send(Command::Session(SessionCommand::Unsubscribe(params)))
        .await?;
    Ok(())
}
