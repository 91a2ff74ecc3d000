//! `browsingContext` module.

use std::future::Future;

use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::events::Subscription;
use crate::events::subscription::subscribe_typed;
use crate::identifiers::BrowsingContextId;
use crate::protocol::browsing_context::{
    BrowsingContextInfo, CaptureScreenshotParameters, ClipRectangle, CreateParameters,
    CreateResult, DataResult, DownloadWillBegin, GetTreeResult, LocateNodesParameters,
    LocateNodesResult, NavigateResult, NavigationInfo, PrintParameters, ReadinessState,
    SetViewportParameters, UserPromptClosed, UserPromptOpened,
};
use crate::protocol::event::names;
use crate::protocol::script::NodeRemoteValue;
use crate::protocol::{BrowsingContextCommand, Command};
use crate::transport::Connection;

// ============================================================================
// BrowsingContext
// ============================================================================

/// Typed access to `browsingContext.*` commands and events.
#[derive(Clone)]
pub struct BrowsingContext {
    connection: Connection,
}

impl BrowsingContext {
    pub(crate) fn new(connection: Connection) -> Self {
        Self { connection }
    }

    async fn send(&self, command: BrowsingContextCommand) -> Result<()> {
        self.connection
            .send(Command::BrowsingContext(command))
            .await?;
        Ok(())
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Brings a top-level context to the foreground.
    pub async fn activate(&self, context: &BrowsingContextId) -> Result<()> {
        debug!(%context, "Activating context");
        self.send(BrowsingContextCommand::Activate {
            context: context.clone(),
        })
        .await
    }

    /// Captures a screenshot and returns the base64 image data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if a box clip has a non-positive
    /// size.
    pub async fn capture_screenshot(&self, params: CaptureScreenshotParameters) -> Result<String> {
        if let Some(ClipRectangle::Box { width, height, .. }) = &params.clip
            && (*width <= 0.0 || *height <= 0.0)
        {
            return Err(Error::invalid_argument("screenshot clip must have a positive size"));
        }

        debug!(context = %params.context, "Capturing screenshot");
        let result: DataResult = self
            .connection
            .send_typed(Command::BrowsingContext(
                BrowsingContextCommand::CaptureScreenshot(params),
            ))
            .await?;
        Ok(result.data)
    }

    /// Closes a top-level context.
    pub async fn close(&self, context: &BrowsingContextId, prompt_unload: Option<bool>) -> Result<()> {
        debug!(%context, "Closing context");
        self.send(BrowsingContextCommand::Close {
            context: context.clone(),
            prompt_unload,
        })
        .await
    }

    /// Opens a tab or window and returns its id.
    pub async fn create(&self, params: CreateParameters) -> Result<BrowsingContextId> {
        debug!(create_type = ?params.create_type, "Creating context");
        let result: CreateResult = self
            .connection
            .send_typed(Command::BrowsingContext(BrowsingContextCommand::Create(params)))
            .await?;
        Ok(result.context)
    }

    /// Returns the context tree, from `root` or from every top-level context.
    pub async fn get_tree(
        &self,
        max_depth: Option<u32>,
        root: Option<&BrowsingContextId>,
    ) -> Result<Vec<BrowsingContextInfo>> {
        let result: GetTreeResult = self
            .connection
            .send_typed(Command::BrowsingContext(BrowsingContextCommand::GetTree {
                max_depth,
                root: root.cloned(),
            }))
            .await?;
        Ok(result.contexts)
    }

    /// Accepts or dismisses the open user prompt.
    pub async fn handle_user_prompt(
        &self,
        context: &BrowsingContextId,
        accept: Option<bool>,
        user_text: Option<String>,
    ) -> Result<()> {
        debug!(%context, ?accept, "Handling user prompt");
        self.send(BrowsingContextCommand::HandleUserPrompt {
            context: context.clone(),
            accept,
            user_text,
        })
        .await
    }

    /// Finds nodes matching a locator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `max_node_count` is zero.
    pub async fn locate_nodes(&self, params: LocateNodesParameters) -> Result<Vec<NodeRemoteValue>> {
        if params.max_node_count == Some(0) {
            return Err(Error::invalid_argument("max_node_count must be at least 1"));
        }

        debug!(context = %params.context, locator = ?params.locator, "Locating nodes");
        let result: LocateNodesResult = self
            .connection
            .send_typed(Command::BrowsingContext(BrowsingContextCommand::LocateNodes(
                params,
            )))
            .await?;
        Ok(result.nodes)
    }

    /// Navigates `context` to `url`.
    ///
    /// # Arguments
    ///
    /// * `wait` - readiness to wait for; the remote end's default when `None`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `url` is not an absolute URL.
    pub async fn navigate(
        &self,
        context: &BrowsingContextId,
        url: &str,
        wait: Option<ReadinessState>,
    ) -> Result<NavigateResult> {
        Url::parse(url).map_err(|e| Error::invalid_argument(format!("invalid URL {url:?}: {e}")))?;

        debug!(%context, %url, ?wait, "Navigating");
        self.connection
            .send_typed(Command::BrowsingContext(BrowsingContextCommand::Navigate {
                context: context.clone(),
                url: url.to_owned(),
                wait,
            }))
            .await
    }

    /// Prints the page to PDF and returns the base64 document.
    pub async fn print(&self, params: PrintParameters) -> Result<String> {
        if params.scale.is_some_and(|scale| !(0.1..=2.0).contains(&scale)) {
            return Err(Error::invalid_argument("print scale must be within 0.1..=2.0"));
        }

        let result: DataResult = self
            .connection
            .send_typed(Command::BrowsingContext(BrowsingContextCommand::Print(params)))
            .await?;
        Ok(result.data)
    }

    /// Reloads the page.
    pub async fn reload(
        &self,
        context: &BrowsingContextId,
        ignore_cache: Option<bool>,
        wait: Option<ReadinessState>,
    ) -> Result<NavigateResult> {
        debug!(%context, "Reloading");
        self.connection
            .send_typed(Command::BrowsingContext(BrowsingContextCommand::Reload {
                context: context.clone(),
                ignore_cache,
                wait,
            }))
            .await
    }

    /// Sets or resets the viewport size.
    pub async fn set_viewport(&self, params: SetViewportParameters) -> Result<()> {
        self.send(BrowsingContextCommand::SetViewport(params)).await
    }

    /// Moves `delta` steps through session history.
    pub async fn traverse_history(&self, context: &BrowsingContextId, delta: i64) -> Result<()> {
        debug!(%context, delta, "Traversing history");
        self.send(BrowsingContextCommand::TraverseHistory {
            context: context.clone(),
            delta,
        })
        .await
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Subscribes to `browsingContext.contextCreated`.
    pub async fn on_context_created<F, Fut>(
        &self,
        contexts: Option<Vec<BrowsingContextId>>,
        handler: F,
    ) -> Result<Subscription>
    where
        F: Fn(BrowsingContextInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        subscribe_typed(&self.connection, names::CONTEXT_CREATED, contexts, handler).await
    }

    /// Subscribes to `browsingContext.contextDestroyed`.
    pub async fn on_context_destroyed<F, Fut>(
        &self,
        contexts: Option<Vec<BrowsingContextId>>,
        handler: F,
    ) -> Result<Subscription>
    where
        F: Fn(BrowsingContextInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        subscribe_typed(&self.connection, names::CONTEXT_DESTROYED, contexts, handler).await
    }

    /// Subscribes to `browsingContext.navigationStarted`.
    pub async fn on_navigation_started<F, Fut>(
        &self,
        contexts: Option<Vec<BrowsingContextId>>,
        handler: F,
    ) -> Result<Subscription>
    where
        F: Fn(NavigationInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        subscribe_typed(&self.connection, names::NAVIGATION_STARTED, contexts, handler).await
    }

    /// Subscribes to `browsingContext.fragmentNavigated`.
    pub async fn on_fragment_navigated<F, Fut>(
        &self,
        contexts: Option<Vec<BrowsingContextId>>,
        handler: F,
    ) -> Result<Subscription>
    where
        F: Fn(NavigationInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        subscribe_typed(&self.connection, names::FRAGMENT_NAVIGATED, contexts, handler).await
    }

    /// Subscribes to `browsingContext.domContentLoaded`.
    pub async fn on_dom_content_loaded<F, Fut>(
        &self,
        contexts: Option<Vec<BrowsingContextId>>,
        handler: F,
    ) -> Result<Subscription>
    where
        F: Fn(NavigationInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        subscribe_typed(&self.connection, names::DOM_CONTENT_LOADED, contexts, handler).await
    }

    /// Subscribes to `browsingContext.load`.
    pub async fn on_load<F, Fut>(
        &self,
        contexts: Option<Vec<BrowsingContextId>>,
        handler: F,
    ) -> Result<Subscription>
    where
        F: Fn(NavigationInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        subscribe_typed(&self.connection, names::LOAD, contexts, handler).await
    }

    /// Subscribes to `browsingContext.downloadWillBegin`.
    pub async fn on_download_will_begin<F, Fut>(
        &self,
        contexts: Option<Vec<BrowsingContextId>>,
        handler: F,
    ) -> Result<Subscription>
    where
        F: Fn(DownloadWillBegin) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        subscribe_typed(&self.connection, names::DOWNLOAD_WILL_BEGIN, contexts, handler).await
    }

    /// Subscribes to `browsingContext.navigationAborted`.
    pub async fn on_navigation_aborted<F, Fut>(
        &self,
        contexts: Option<Vec<BrowsingContextId>>,
        handler: F,
    ) -> Result<Subscription>
    where
        F: Fn(NavigationInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        subscribe_typed(&self.connection, names::NAVIGATION_ABORTED, contexts, handler).await
    }

    /// Subscribes to `browsingContext.navigationFailed`.
    pub async fn on_navigation_failed<F, Fut>(
        &self,
        contexts: Option<Vec<BrowsingContextId>>,
        handler: F,
    ) -> Result<Subscription>
    where
        F: Fn(NavigationInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        subscribe_typed(&self.connection, names::NAVIGATION_FAILED, contexts, handler).await
    }

    /// Subscribes to `browsingContext.userPromptOpened`.
    pub async fn on_user_prompt_opened<F, Fut>(
        &self,
        contexts: Option<Vec<BrowsingContextId>>,
        handler: F,
    ) -> Result<Subscription>
    where
        F: Fn(UserPromptOpened) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        subscribe_typed(&self.connection, names::USER_PROMPT_OPENED, contexts, handler).await
    }

    /// Subscribes to `browsingContext.userPromptClosed`.
    pub async fn on_user_prompt_closed<F, Fut>(
        &self,
        contexts: Option<Vec<BrowsingContextId>>,
        handler: F,
    ) -> Result<Subscription>
    where
        F: Fn(UserPromptClosed) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        subscribe_typed(&self.connection, names::USER_PROMPT_CLOSED, contexts, handler).await
    }
}
