//! `script` module.

use std::future::Future;

use tracing::debug;

use crate::error::{Error, Result};
use crate::events::Subscription;
use crate::events::subscription::subscribe_typed;
use crate::identifiers::{BrowsingContextId, PreloadScriptId};
use crate::protocol::event::names;
use crate::protocol::script::{
    AddPreloadScriptParameters, AddPreloadScriptResult, CallFunctionParameters,
    EvaluateParameters, EvaluateResult, GetRealmsResult, RealmDestroyed, RealmInfo, RealmType,
    ScriptMessage, Target,
};
use crate::protocol::{Command, ScriptCommand};
use crate::transport::Connection;

// ============================================================================
// Script
// ============================================================================

/// Typed access to `script.*` commands and events.
#[derive(Clone)]
pub struct Script {
    connection: Connection,
}

impl Script {
    pub(crate) fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Evaluates an expression.
    ///
    /// A thrown exception is a successful command: it comes back as
    /// [`EvaluateResult::Exception`].
    pub async fn evaluate(&self, params: EvaluateParameters) -> Result<EvaluateResult> {
        debug!(target = ?params.target, len = params.expression.len(), "Evaluating script");
        self.connection
            .send_typed(Command::Script(ScriptCommand::Evaluate(params)))
            .await
    }

    /// Calls a function declaration with serialized arguments.
    pub async fn call_function(&self, params: CallFunctionParameters) -> Result<EvaluateResult> {
        debug!(target = ?params.target, "Calling function");
        self.connection
            .send_typed(Command::Script(ScriptCommand::CallFunction(params)))
            .await
    }

    /// Registers a script that runs in every new matching realm.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if both `contexts` and
    /// `user_contexts` are set.
    pub async fn add_preload_script(
        &self,
        params: AddPreloadScriptParameters,
    ) -> Result<PreloadScriptId> {
        if params.contexts.is_some() && params.user_contexts.is_some() {
            return Err(Error::invalid_argument(
                "preload script takes contexts or user contexts, not both",
            ));
        }

        let result: AddPreloadScriptResult = self
            .connection
            .send_typed(Command::Script(ScriptCommand::AddPreloadScript(params)))
            .await?;
        debug!(script = %result.script, "Preload script added");
        Ok(result.script)
    }

    /// Removes a preload script.
    pub async fn remove_preload_script(&self, script: &PreloadScriptId) -> Result<()> {
        self.connection
            .send(Command::Script(ScriptCommand::RemovePreloadScript {
                script: script.clone(),
            }))
            .await?;
        Ok(())
    }

    /// Releases remote object handles.
    pub async fn disown(&self, handles: Vec<String>, target: Target) -> Result<()> {
        if handles.is_empty() {
            return Ok(());
        }
        self.connection
            .send(Command::Script(ScriptCommand::Disown { handles, target }))
            .await?;
        Ok(())
    }

    /// Lists realms, optionally narrowed by context and type.
    pub async fn get_realms(
        &self,
        context: Option<&BrowsingContextId>,
        realm_type: Option<RealmType>,
    ) -> Result<Vec<RealmInfo>> {
        let result: GetRealmsResult = self
            .connection
            .send_typed(Command::Script(ScriptCommand::GetRealms {
                context: context.cloned(),
                realm_type,
            }))
            .await?;
        Ok(result.realms)
    }

    /// Subscribes to `script.message`.
    pub async fn on_message<F, Fut>(
        &self,
        contexts: Option<Vec<BrowsingContextId>>,
        handler: F,
    ) -> Result<Subscription>
    where
        F: Fn(ScriptMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        subscribe_typed(&self.connection, names::SCRIPT_MESSAGE, contexts, handler).await
    }

    /// Subscribes to `script.realmCreated`.
    pub async fn on_realm_created<F, Fut>(
        &self,
        contexts: Option<Vec<BrowsingContextId>>,
        handler: F,
    ) -> Result<Subscription>
    where
        F: Fn(RealmInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        subscribe_typed(&self.connection, names::REALM_CREATED, contexts, handler).await
    }

    /// Subscribes to `script.realmDestroyed`.
    pub async fn on_realm_destroyed<F, Fut>(&self, handler: F) -> Result<Subscription>
    where
        F: Fn(RealmDestroyed) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        subscribe_typed(&self.connection, names::REALM_DESTROYED, None, handler).await
    }
}
