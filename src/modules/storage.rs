//! `storage` module.

use tracing::debug;

use crate::error::Result;
use crate::protocol::network::Cookie;
use crate::protocol::storage::{
    CookieFilter, GetCookiesResult, PartialCookie, PartitionDescriptor, PartitionKey,
    PartitionKeyResult,
};
use crate::protocol::{Command, StorageCommand};
use crate::transport::Connection;

/// Typed access to `storage.*` commands.
#[derive(Clone)]
pub struct Storage {
    connection: Connection,
}

impl Storage {
    pub(crate) fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Returns cookies matching `filter` in `partition`.
    pub async fn get_cookies(
        &self,
        filter: Option<CookieFilter>,
        partition: Option<PartitionDescriptor>,
    ) -> Result<Vec<Cookie>> {
        let result: GetCookiesResult = self
            .connection
            .send_typed(Command::Storage(StorageCommand::GetCookies { filter, partition }))
            .await?;
        Ok(result.cookies)
    }

    /// Stores a cookie and returns the partition it landed in.
    pub async fn set_cookie(
        &self,
        cookie: PartialCookie,
        partition: Option<PartitionDescriptor>,
    ) -> Result<PartitionKey> {
        debug!(name = %cookie.name, domain = %cookie.domain, "Setting cookie");
        let result: PartitionKeyResult = self
            .connection
            .send_typed(Command::Storage(StorageCommand::SetCookie { cookie, partition }))
            .await?;
        Ok(result.partition_key)
    }

    /// Deletes cookies matching `filter` in `partition`.
    pub async fn delete_cookies(
        &self,
        filter: Option<CookieFilter>,
        partition: Option<PartitionDescriptor>,
    ) -> Result<PartitionKey> {
        let result: PartitionKeyResult = self
            .connection
            .send_typed(Command::Storage(StorageCommand::DeleteCookies { filter, partition }))
            .await?;
        Ok(result.partition_key)
    }
}
