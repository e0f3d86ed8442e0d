//! Operation queue access

use libsql::{params, Connection, Row};

use crate::error::{Error, Result};
use crate::models::{EntryId, Operation, OperationKind};

/// Fields of an operation before the queue assigns its sequence id
#[derive(Debug, Clone)]
pub struct NewOperation<'a> {
    pub kind: OperationKind,
    pub user_id: &'a str,
    pub entry_id: EntryId,
    pub headword: &'a str,
    pub payload: serde_json::Value,
    pub timestamp: &'a str,
}

/// Trait for the append-only operation queue (async)
#[allow(async_fn_in_trait)]
pub trait OperationRepository {
    /// Append one operation and return it with its sequence id
    async fn append(&self, operation: NewOperation<'_>) -> Result<Operation>;

    /// Queued operations in replay order
    async fn list(&self) -> Result<Vec<Operation>>;

    async fn count(&self) -> Result<usize>;

    /// Remove operations with `sequence_id <= through`
    async fn clear_through(&self, through: i64) -> Result<u64>;

    async fn clear(&self) -> Result<()>;
}

/// libSQL implementation of `OperationRepository`
pub struct LibSqlOperationRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlOperationRepository<'a> {
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_operation(row: &Row) -> Result<Operation> {
        let kind: String = row.get(1)?;
        let payload: String = row.get(5)?;
        Ok(Operation {
            sequence_id: row.get(0)?,
            kind: kind.parse().map_err(Error::Database)?,
            user_id: row.get(2)?,
            entry_id: EntryId::new(row.get::<i64>(3)?),
            headword: row.get(4)?,
            payload: serde_json::from_str(&payload)?,
            timestamp: row.get(6)?,
        })
    }
}

impl OperationRepository for LibSqlOperationRepository<'_> {
    async fn append(&self, operation: NewOperation<'_>) -> Result<Operation> {
        let payload = serde_json::to_string(&operation.payload)?;
        self.conn
            .execute(
                "INSERT INTO operations (kind, user_id, entry_id, headword, payload, timestamp)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    operation.kind.as_str(),
                    operation.user_id,
                    operation.entry_id.get(),
                    operation.headword,
                    payload,
                    operation.timestamp,
                ],
            )
            .await?;

        Ok(Operation {
            sequence_id: self.conn.last_insert_rowid(),
            kind: operation.kind,
            user_id: operation.user_id.to_string(),
            entry_id: operation.entry_id,
            headword: operation.headword.to_string(),
            payload: operation.payload,
            timestamp: operation.timestamp.to_string(),
        })
    }

    async fn list(&self) -> Result<Vec<Operation>> {
        let mut rows = self
            .conn
            .query(
                "SELECT sequence_id, kind, user_id, entry_id, headword, payload, timestamp
                 FROM operations
                 ORDER BY sequence_id ASC",
                (),
            )
            .await?;

        let mut operations = Vec::new();
        while let Some(row) = rows.next().await? {
            operations.push(Self::parse_operation(&row)?);
        }
        Ok(operations)
    }

    async fn count(&self) -> Result<usize> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM operations", ())
            .await?;
        let count = match rows.next().await? {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn clear_through(&self, through: i64) -> Result<u64> {
        let rows = self
            .conn
            .execute(
                "DELETE FROM operations WHERE sequence_id <= ?",
                params![through],
            )
            .await?;
        Ok(rows)
    }

    async fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM operations", ()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use serde_json::json;

    fn new_op<'a>(kind: OperationKind, entry_id: i64, headword: &'a str) -> NewOperation<'a> {
        NewOperation {
            kind,
            user_id: "u1",
            entry_id: EntryId::new(entry_id),
            headword,
            payload: json!({ "wordid": entry_id, "word": headword }),
            timestamp: "2024-01-01 00:00:00.000",
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn append_assigns_increasing_sequence_ids() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlOperationRepository::new(db.connection());

        let first = repo
            .append(new_op(OperationKind::Create, 1, "sugar"))
            .await
            .unwrap();
        let second = repo
            .append(new_op(OperationKind::Update, 1, "sugar"))
            .await
            .unwrap();

        assert!(second.sequence_id > first.sequence_id);

        let listed = repo.list().await.unwrap();
        assert_eq!(listed, vec![first, second]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn clear_through_keeps_later_operations() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlOperationRepository::new(db.connection());

        let first = repo
            .append(new_op(OperationKind::Create, 1, "sugar"))
            .await
            .unwrap();
        let later = repo
            .append(new_op(OperationKind::Delete, 1, "sugar"))
            .await
            .unwrap();

        assert_eq!(repo.clear_through(first.sequence_id).await.unwrap(), 1);
        assert_eq!(repo.list().await.unwrap(), vec![later]);
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
