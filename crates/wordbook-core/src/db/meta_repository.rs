//! Local sync bookkeeping (last server timestamp, device id)

use crate::error::Result;
use libsql::Connection;

pub const LAST_SYNC_TIMESTAMP: &str = "last_sync_timestamp";
pub const DEVICE_ID: &str = "device_id";

/// Trait for key/value sync metadata (async)
#[allow(async_fn_in_trait)]
pub trait MetaRepository {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

/// libSQL implementation of `MetaRepository`
pub struct LibSqlMetaRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlMetaRepository<'a> {
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl MetaRepository for LibSqlMetaRepository<'_> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM sync_meta WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            let value: String = row.get(0)?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO sync_meta (key, value) VALUES (?, ?)",
                [key, value],
            )
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM sync_meta WHERE key = ?", [key])
            .await?;
        Ok(())
    }
}
