//! `network` module.
//!
//! Intercepts registered here are owned by the session's
//! [`InterceptRegistry`]. The raw continuation commands are for requests the
//! caller tracks itself, e.g. from [`Network::on_before_request_sent`].

use std::future::Future;

use tracing::debug;

use crate::error::Result;
use crate::events::Subscription;
use crate::events::subscription::subscribe_typed;
use crate::identifiers::{BrowsingContextId, InterceptId, RequestId};
use crate::network::{InterceptRegistry, InterceptedRequest, intercept_handler};
use crate::protocol::event::names;
use crate::protocol::network::{
    AddInterceptParameters, AuthAction, BeforeRequestSent, CacheBehavior,
    ContinueRequestParameters, ContinueResponseParameters, ContinueWithAuthParameters, FetchError,
    ProvideResponseParameters, ResponseEvent,
};
use crate::protocol::{Command, NetworkCommand};
use crate::transport::Connection;

// ============================================================================
// Network
// ============================================================================

/// Typed access to `network.*` commands and events.
#[derive(Clone)]
pub struct Network {
    connection: Connection,
    registry: InterceptRegistry,
}

impl Network {
    pub(crate) fn new(connection: Connection, registry: InterceptRegistry) -> Self {
        Self {
            connection,
            registry,
        }
    }

    async fn send(&self, command: NetworkCommand) -> Result<()> {
        self.connection.send(Command::Network(command)).await?;
        Ok(())
    }

    // ========================================================================
    // Intercepts
    // ========================================================================

    /// Adds an intercept; `handler` runs once per paused request.
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
        self.registry
            .add_intercept(params, intercept_handler(handler))
            .await
    }

    /// Removes an intercept. Already-paused requests stay with their handler.
    ///
    /// # Errors
    ///
    /// See [`InterceptRegistry::remove_intercept`].
    pub async fn remove_intercept(&self, intercept: &InterceptId) -> Result<()> {
        self.registry.remove_intercept(intercept).await
    }

    // ========================================================================
    // Raw Continuations
    // ========================================================================

    /// Sends `network.continueRequest`.
    pub async fn continue_request(&self, params: ContinueRequestParameters) -> Result<()> {
        debug!(request = %params.request, "Continuing request");
        self.send(NetworkCommand::ContinueRequest(params)).await
    }

    /// Sends `network.continueResponse`.
    pub async fn continue_response(&self, params: ContinueResponseParameters) -> Result<()> {
        debug!(request = %params.request, "Continuing response");
        self.send(NetworkCommand::ContinueResponse(params)).await
    }

    /// Sends `network.continueWithAuth`.
    pub async fn continue_with_auth(&self, request: &RequestId, action: AuthAction) -> Result<()> {
        self.send(NetworkCommand::ContinueWithAuth(ContinueWithAuthParameters {
            request: request.clone(),
            action,
        }))
        .await
    }

    /// Sends `network.failRequest`.
    pub async fn fail_request(&self, request: &RequestId) -> Result<()> {
        debug!(%request, "Failing request");
        self.send(NetworkCommand::FailRequest {
            request: request.clone(),
        })
        .await
    }

    /// Sends `network.provideResponse`.
    pub async fn provide_response(&self, params: ProvideResponseParameters) -> Result<()> {
        self.send(NetworkCommand::ProvideResponse(params)).await
    }

    /// Sets cache behavior globally, or for the given top-level contexts.
    pub async fn set_cache_behavior(
        &self,
        cache_behavior: CacheBehavior,
        contexts: Option<Vec<BrowsingContextId>>,
    ) -> Result<()> {
        self.send(NetworkCommand::SetCacheBehavior {
            cache_behavior,
            contexts,
        })
        .await
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Subscribes to `network.beforeRequestSent`.
    pub async fn on_before_request_sent<F, Fut>(
        &self,
        contexts: Option<Vec<BrowsingContextId>>,
        handler: F,
    ) -> Result<Subscription>
    where
        F: Fn(BeforeRequestSent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        subscribe_typed(&self.connection, names::BEFORE_REQUEST_SENT, contexts, handler).await
    }

    /// Subscribes to `network.responseStarted`.
    pub async fn on_response_started<F, Fut>(
        &self,
        contexts: Option<Vec<BrowsingContextId>>,
        handler: F,
    ) -> Result<Subscription>
    where
        F: Fn(ResponseEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        subscribe_typed(&self.connection, names::RESPONSE_STARTED, contexts, handler).await
    }

    /// Subscribes to `network.responseCompleted`.
    pub async fn on_response_completed<F, Fut>(
        &self,
        contexts: Option<Vec<BrowsingContextId>>,
        handler: F,
    ) -> Result<Subscription>
    where
        F: Fn(ResponseEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        subscribe_typed(&self.connection, names::RESPONSE_COMPLETED, contexts, handler).await
    }

    /// Subscribes to `network.authRequired`.
    pub async fn on_auth_required<F, Fut>(
        &self,
        contexts: Option<Vec<BrowsingContextId>>,
        handler: F,
    ) -> Result<Subscription>
    where
        F: Fn(ResponseEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        subscribe_typed(&self.connection, names::AUTH_REQUIRED, contexts, handler).await
    }

    /// Subscribes to `network.fetchError`.
    pub async fn on_fetch_error<F, Fut>(
        &self,
        contexts: Option<Vec<BrowsingContextId>>,
        handler: F,
    ) -> Result<Subscription>
    where
        F: Fn(FetchError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        subscribe_typed(&self.connection, names::FETCH_ERROR, contexts, handler).await
    }
}
