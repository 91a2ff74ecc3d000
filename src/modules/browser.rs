//! `browser` module.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::identifiers::UserContextId;
use crate::protocol::browser::{
    ClientWindowInfo, GetClientWindowsResult, GetUserContextsResult, UserContextInfo,
};
use crate::protocol::{BrowserCommand, Command};
use crate::transport::Connection;

/// Id of the user context every browser starts with.
pub const DEFAULT_USER_CONTEXT: &str = "default";

/// Typed access to `browser.*` commands.
#[derive(Clone)]
pub struct Browser {
    connection: Connection,
}

impl Browser {
    pub(crate) fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Closes the browser. The connection ends shortly after.
    pub async fn close(&self) -> Result<()> {
        info!("Closing browser");
        self.connection
            .send(Command::Browser(BrowserCommand::Close {}))
            .await?;
        Ok(())
    }

    /// Creates an isolated user context.
    pub async fn create_user_context(&self) -> Result<UserContextId> {
        let info: UserContextInfo = self
            .connection
            .send_typed(Command::Browser(BrowserCommand::CreateUserContext {}))
            .await?;
        debug!(user_context = %info.user_context, "User context created");
        Ok(info.user_context)
    }

    /// Lists user contexts.
    pub async fn get_user_contexts(&self) -> Result<Vec<UserContextId>> {
        let result: GetUserContextsResult = self
            .connection
            .send_typed(Command::Browser(BrowserCommand::GetUserContexts {}))
            .await?;
        Ok(result
            .user_contexts
            .into_iter()
            .map(|info| info.user_context)
            .collect())
    }

    /// Removes a user context and closes its contexts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for the default user context.
    pub async fn remove_user_context(&self, user_context: &UserContextId) -> Result<()> {
        if user_context.as_str() == DEFAULT_USER_CONTEXT {
            return Err(Error::invalid_argument("the default user context cannot be removed"));
        }

        self.connection
            .send(Command::Browser(BrowserCommand::RemoveUserContext {
                user_context: user_context.clone(),
            }))
            .await?;
        Ok(())
    }

    /// Lists client windows.
    pub async fn get_client_windows(&self) -> Result<Vec<ClientWindowInfo>> {
        let result: GetClientWindowsResult = self
            .connection
            .send_typed(Command::Browser(BrowserCommand::GetClientWindows {}))
            .await?;
        Ok(result.client_windows)
    }
}
