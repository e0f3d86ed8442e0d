//! User-scoped entry store.
//!
//! Every mutation writes the entry row and appends exactly one operation to
//! the queue inside a single transaction, so the two tables never drift
//! apart. Reads degrade to empty results and log instead of failing.

use std::path::Path;
use std::sync::Arc;

use libsql::Connection;
use tokio::sync::Mutex;

use crate::db::{
    Database, EntryRepository, LibSqlEntryRepository, LibSqlMetaRepository,
    LibSqlOperationRepository, MetaRepository, NewOperation, OperationRepository, DEVICE_ID,
    LAST_SYNC_TIMESTAMP,
};
use crate::error::{Error, Result};
use crate::models::{
    DeletePayload, Entry, EntryId, EntryPatch, EntryPayload, NewEntry, Operation, OperationKind,
};
use crate::util::timestamp_now;

/// Work waiting for the next reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingWork {
    pub queued_operations: usize,
    pub untranslated_entries: usize,
}

impl PendingWork {
    pub const fn is_empty(&self) -> bool {
        self.queued_operations == 0 && self.untranslated_entries == 0
    }
}

/// Thread-safe entry store bound to one user.
#[derive(Clone)]
pub struct EntryStore {
    db: Arc<Mutex<Database>>,
    user_id: Arc<str>,
}

impl EntryStore {
    pub fn new(db: Database, user_id: impl Into<String>) -> Self {
        let user_id: String = user_id.into();
        Self {
            db: Arc::new(Mutex::new(db)),
            user_id: Arc::from(user_id.trim()),
        }
    }

    /// Open the durable store for `user_id` under `data_dir`.
    pub async fn open_for_user(data_dir: impl AsRef<Path>, user_id: &str) -> Result<Self> {
        let db = Database::open_for_user(data_dir, user_id).await?;
        Ok(Self::new(db, user_id))
    }

    /// Open an in-memory store (primarily for tests).
    pub async fn open_in_memory(user_id: &str) -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self::new(db, user_id))
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Insert a new entry and queue a `create` operation.
    pub async fn create(&self, data: NewEntry) -> Result<Entry> {
        let headword = normalize_headword(&data.headword)?;
        let db = self.db.lock().await;
        let conn = db.connection();

        begin(conn).await?;
        let outcome = self.create_in_transaction(conn, headword, data).await;
        let entry = finish(conn, outcome).await?;

        tracing::debug!("Created entry {} ({})", entry.id, entry.headword);
        Ok(entry)
    }

    async fn create_in_transaction(
        &self,
        conn: &Connection,
        headword: String,
        data: NewEntry,
    ) -> Result<Entry> {
        let entries = LibSqlEntryRepository::new(conn);
        if entries.get_by_headword(&headword).await?.is_some() {
            return Err(Error::DuplicateEntry(headword));
        }

        let entry = Entry {
            id: entries.next_id().await?,
            headword,
            meanings_by_source_lang: data.meanings_by_source_lang,
            meanings_by_target_lang: data.meanings_by_target_lang,
            parts_of_speech: data.parts_of_speech,
            updated_at: timestamp_now(),
            is_synced: false,
            is_translated: data.is_translated,
        };
        entries
            .insert(&entry)
            .await
            .map_err(|error| map_unique_violation(error, &entry.headword))?;

        let payload = serde_json::to_value(EntryPayload::from(&entry))?;
        self.append(conn, OperationKind::Create, &entry, payload)
            .await?;
        Ok(entry)
    }

    /// Apply the provided fields. Returns `Ok(false)` when `id` is absent.
    pub async fn update(&self, id: EntryId, patch: &EntryPatch) -> Result<bool> {
        let headword = patch
            .headword
            .as_deref()
            .map(normalize_headword)
            .transpose()?;
        let db = self.db.lock().await;
        let conn = db.connection();

        begin(conn).await?;
        let outcome = self
            .update_in_transaction(conn, id, headword, patch)
            .await;
        let updated = finish(conn, outcome).await?;

        if updated {
            tracing::debug!("Updated entry {id}");
        }
        Ok(updated)
    }

    async fn update_in_transaction(
        &self,
        conn: &Connection,
        id: EntryId,
        headword: Option<String>,
        patch: &EntryPatch,
    ) -> Result<bool> {
        let entries = LibSqlEntryRepository::new(conn);
        let Some(current) = entries.get(id).await? else {
            return Ok(false);
        };

        if let Some(headword) = &headword {
            if let Some(owner) = entries.get_by_headword(headword).await? {
                if owner.id != id {
                    return Err(Error::DuplicateEntry(headword.clone()));
                }
            }
        }

        let mut merged = patch.apply_to(&current);
        if let Some(headword) = headword {
            merged.headword = headword;
        }
        merged.updated_at = timestamp_now();
        merged.is_synced = false;

        let changed = entries
            .replace(&merged)
            .await
            .map_err(|error| map_unique_violation(error, &merged.headword))?;
        if changed == 0 {
            return Ok(false);
        }

        let payload = serde_json::to_value(EntryPayload::from(&merged))?;
        self.append(conn, OperationKind::Update, &merged, payload)
            .await?;
        Ok(true)
    }

    /// Remove the row and queue a `delete` operation. Returns `Ok(false)`
    /// when `id` is absent.
    pub async fn delete(&self, id: EntryId) -> Result<bool> {
        let db = self.db.lock().await;
        let conn = db.connection();

        begin(conn).await?;
        let outcome = self.delete_in_transaction(conn, id).await;
        let deleted = finish(conn, outcome).await?;

        if deleted {
            tracing::debug!("Deleted entry {id}");
        }
        Ok(deleted)
    }

    async fn delete_in_transaction(&self, conn: &Connection, id: EntryId) -> Result<bool> {
        let entries = LibSqlEntryRepository::new(conn);
        let Some(current) = entries.get(id).await? else {
            return Ok(false);
        };
        if entries.remove(id).await? == 0 {
            return Ok(false);
        }

        let timestamp = timestamp_now();
        let payload = serde_json::to_value(DeletePayload {
            id,
            headword: current.headword.clone(),
            operation: OperationKind::Delete,
            timestamp,
        })?;
        self.append(conn, OperationKind::Delete, &current, payload)
            .await?;
        Ok(true)
    }

    async fn append(
        &self,
        conn: &Connection,
        kind: OperationKind,
        entry: &Entry,
        payload: serde_json::Value,
    ) -> Result<Operation> {
        let timestamp = timestamp_now();
        LibSqlOperationRepository::new(conn)
            .append(NewOperation {
                kind,
                user_id: self.user_id(),
                entry_id: entry.id,
                headword: &entry.headword,
                payload,
                timestamp: &timestamp,
            })
            .await
            .map_err(|error| {
                tracing::error!("Operation log append failed for entry {}: {error}", entry.id);
                Error::Database(format!(
                    "operation log append failed, entry change rolled back: {error}"
                ))
            })
    }

    pub async fn get(&self, id: EntryId) -> Option<Entry> {
        let db = self.db.lock().await;
        let result = LibSqlEntryRepository::new(db.connection()).get(id).await;
        degrade(result, "get entry")
    }

    pub async fn get_by_headword(&self, headword: &str) -> Option<Entry> {
        let db = self.db.lock().await;
        let result = LibSqlEntryRepository::new(db.connection())
            .get_by_headword(headword.trim())
            .await;
        degrade(result, "get entry by headword")
    }

    /// All entries ordered by headword.
    pub async fn list(&self) -> Vec<Entry> {
        let db = self.db.lock().await;
        let result = LibSqlEntryRepository::new(db.connection()).list().await;
        degrade(result, "list entries")
    }

    /// Most recently updated entries first.
    pub async fn list_recent(&self, limit: usize) -> Vec<Entry> {
        let db = self.db.lock().await;
        let result = LibSqlEntryRepository::new(db.connection())
            .list_recent(limit)
            .await;
        degrade(result, "list recent entries")
    }

    /// Case-insensitive substring match on the headword. The query is used
    /// as typed, so whitespace is part of the match.
    pub async fn search(&self, query: &str) -> Vec<Entry> {
        let needle = query.to_lowercase();
        let entries = self.list().await;
        if needle.is_empty() {
            return entries;
        }
        entries
            .into_iter()
            .filter(|entry| entry.headword.to_lowercase().contains(&needle))
            .collect()
    }

    pub async fn count(&self) -> usize {
        let db = self.db.lock().await;
        let result = LibSqlEntryRepository::new(db.connection()).count().await;
        degrade(result, "count entries")
    }

    /// Entries still waiting for translation backfill.
    pub async fn untranslated(&self) -> Result<Vec<Entry>> {
        let db = self.db.lock().await;
        LibSqlEntryRepository::new(db.connection())
            .list_untranslated()
            .await
    }

    /// Queued operations in replay order.
    pub async fn pending_operations(&self) -> Result<Vec<Operation>> {
        let db = self.db.lock().await;
        LibSqlOperationRepository::new(db.connection()).list().await
    }

    pub async fn pending_work(&self) -> Result<PendingWork> {
        let db = self.db.lock().await;
        let conn = db.connection();
        Ok(PendingWork {
            queued_operations: LibSqlOperationRepository::new(conn).count().await?,
            untranslated_entries: LibSqlEntryRepository::new(conn)
                .count_untranslated()
                .await?,
        })
    }

    /// Server timestamp of the last accepted push.
    pub async fn last_sync_timestamp(&self) -> Result<Option<String>> {
        let db = self.db.lock().await;
        LibSqlMetaRepository::new(db.connection())
            .get(LAST_SYNC_TIMESTAMP)
            .await
    }

    /// Stable identifier of this installation, generated on first use.
    pub async fn device_id(&self) -> Result<String> {
        let db = self.db.lock().await;
        let meta = LibSqlMetaRepository::new(db.connection());
        if let Some(device_id) = meta.get(DEVICE_ID).await? {
            return Ok(device_id);
        }
        let device_id = uuid::Uuid::now_v7().to_string();
        meta.set(DEVICE_ID, &device_id).await?;
        Ok(device_id)
    }

    /// Drop the pushed operations, flag entries without queued work as
    /// synced and remember the server timestamp, all in one transaction.
    pub async fn complete_sync(
        &self,
        through_sequence_id: i64,
        sync_timestamp: &str,
    ) -> Result<()> {
        let db = self.db.lock().await;
        let conn = db.connection();

        begin(conn).await?;
        let outcome = async {
            let cleared = LibSqlOperationRepository::new(conn)
                .clear_through(through_sequence_id)
                .await?;
            LibSqlEntryRepository::new(conn)
                .mark_synced_without_pending()
                .await?;
            LibSqlMetaRepository::new(conn)
                .set(LAST_SYNC_TIMESTAMP, sync_timestamp)
                .await?;
            Ok::<_, Error>(cleared)
        }
        .await;
        let cleared = finish(conn, outcome).await?;

        tracing::debug!("Cleared {cleared} synced operations");
        Ok(())
    }

    /// Remove every entry and queued operation for this user.
    pub async fn reset(&self) -> Result<()> {
        let db = self.db.lock().await;
        let conn = db.connection();

        begin(conn).await?;
        let outcome = async {
            LibSqlOperationRepository::new(conn).clear().await?;
            LibSqlEntryRepository::new(conn).clear().await?;
            LibSqlMetaRepository::new(conn)
                .remove(LAST_SYNC_TIMESTAMP)
                .await
        }
        .await;
        finish(conn, outcome).await?;

        tracing::info!("Reset entry store for user {}", self.user_id);
        Ok(())
    }
}

fn normalize_headword(raw: &str) -> Result<String> {
    let headword = raw.trim();
    if headword.is_empty() {
        return Err(Error::InvalidInput("headword cannot be empty".into()));
    }
    Ok(headword.to_string())
}

fn map_unique_violation(error: Error, headword: &str) -> Error {
    if error.to_string().contains("UNIQUE constraint failed") {
        Error::DuplicateEntry(headword.to_string())
    } else {
        error
    }
}

fn degrade<T: Default>(result: Result<T>, action: &str) -> T {
    result.unwrap_or_else(|error| {
        tracing::warn!("Failed to {action}: {error}");
        T::default()
    })
}

async fn begin(conn: &Connection) -> Result<()> {
    conn.execute("BEGIN IMMEDIATE", ()).await?;
    Ok(())
}

async fn finish<T>(conn: &Connection, outcome: Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => {
            if let Err(error) = conn.execute("COMMIT", ()).await {
                conn.execute("ROLLBACK", ()).await.ok();
                return Err(error.into());
            }
            Ok(value)
        }
        Err(error) => {
            conn.execute("ROLLBACK", ()).await.ok();
            Err(error)
        }
    }
}
