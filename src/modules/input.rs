//! `input` module.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::BrowsingContextId;
use crate::protocol::input::SourceActions;
use crate::protocol::script::SharedReference;
use crate::protocol::{Command, InputCommand};
use crate::transport::Connection;

/// Typed access to `input.*` commands.
#[derive(Clone)]
pub struct Input {
    connection: Connection,
}

impl Input {
    pub(crate) fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Performs a sequence of input source actions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if two sources share an id.
    pub async fn perform_actions(
        &self,
        context: &BrowsingContextId,
        actions: Vec<SourceActions>,
    ) -> Result<()> {
        let mut ids = FxHashSet::default();
        if let Some(duplicate) = actions.iter().find(|source| !ids.insert(source.id())) {
            return Err(Error::invalid_argument(format!(
                "duplicate input source id {:?}",
                duplicate.id()
            )));
        }

        debug!(%context, sources = actions.len(), "Performing actions");
        self.connection
            .send(Command::Input(InputCommand::PerformActions {
                context: context.clone(),
                actions,
            }))
            .await?;
        Ok(())
    }

    /// Releases every pressed key and button.
    pub async fn release_actions(&self, context: &BrowsingContextId) -> Result<()> {
        self.connection
            .send(Command::Input(InputCommand::ReleaseActions {
                context: context.clone(),
            }))
            .await?;
        Ok(())
    }

    /// Sets the files of an `<input type="file">` element.
    pub async fn set_files(
        &self,
        context: &BrowsingContextId,
        element: SharedReference,
        files: Vec<String>,
    ) -> Result<()> {
        debug!(%context, files = files.len(), "Setting files");
        self.connection
            .send(Command::Input(InputCommand::SetFiles {
                context: context.clone(),
                element,
                files,
            }))
            .await?;
        Ok(())
    }
}
