//! Entry table access

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/COUNT

use libsql::{params, Connection, Row};
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::models::{Entry, EntryId};

const ENTRY_COLUMNS: &str = "id, headword, meanings_by_source_lang, meanings_by_target_lang, \
     parts_of_speech, updated_at, is_synced, is_translated";

/// Trait for entry storage operations (async)
#[allow(async_fn_in_trait)]
pub trait EntryRepository {
    /// Next free id: max existing + 1, starting at 1
    async fn next_id(&self) -> Result<EntryId>;

    /// Insert a fully-formed entry row
    async fn insert(&self, entry: &Entry) -> Result<()>;

    /// Overwrite every column of an existing row, returning affected rows
    async fn replace(&self, entry: &Entry) -> Result<u64>;

    /// Physically remove a row, returning affected rows
    async fn remove(&self, id: EntryId) -> Result<u64>;

    async fn get(&self, id: EntryId) -> Result<Option<Entry>>;

    async fn get_by_headword(&self, headword: &str) -> Result<Option<Entry>>;

    /// All entries ordered by headword
    async fn list(&self) -> Result<Vec<Entry>>;

    /// Most recently updated first
    async fn list_recent(&self, limit: usize) -> Result<Vec<Entry>>;

    /// Entries still waiting for translation backfill
    async fn list_untranslated(&self) -> Result<Vec<Entry>>;

    async fn count(&self) -> Result<usize>;

    async fn count_untranslated(&self) -> Result<usize>;

    /// Flag as synced every entry that has no queued operation left
    async fn mark_synced_without_pending(&self) -> Result<u64>;

    async fn clear(&self) -> Result<()>;
}

/// libSQL implementation of `EntryRepository`
pub struct LibSqlEntryRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlEntryRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    async fn query_entries(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Entry>> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(Self::parse_entry(&row)?);
        }
        Ok(entries)
    }

    async fn query_count(&self, sql: &str) -> Result<usize> {
        let mut rows = self.conn.query(sql, ()).await?;
        let count = match rows.next().await? {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn parse_entry(row: &Row) -> Result<Entry> {
        let source: String = row.get(2)?;
        let target: String = row.get(3)?;
        let parts: String = row.get(4)?;
        Ok(Entry {
            id: EntryId::new(row.get::<i64>(0)?),
            headword: row.get(1)?,
            meanings_by_source_lang: parse_json_column(&source, "meanings_by_source_lang"),
            meanings_by_target_lang: parse_json_column(&target, "meanings_by_target_lang"),
            parts_of_speech: parse_json_column(&parts, "parts_of_speech"),
            updated_at: row.get(5)?,
            is_synced: row.get::<i32>(6)? != 0,
            is_translated: row.get::<i32>(7)? != 0,
        })
    }
}

/// Decode a JSON column, falling back to the empty value on malformed data.
fn parse_json_column<T: DeserializeOwned + Default>(raw: &str, column: &str) -> T {
    if raw.trim().is_empty() {
        return T::default();
    }
    serde_json::from_str(raw).unwrap_or_else(|error| {
        tracing::warn!("Malformed JSON in column {column}: {error}");
        T::default()
    })
}

impl EntryRepository for LibSqlEntryRepository<'_> {
    async fn next_id(&self) -> Result<EntryId> {
        let mut rows = self
            .conn
            .query("SELECT COALESCE(MAX(id), 0) FROM entries", ())
            .await?;
        let max_id = match rows.next().await? {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        Ok(EntryId::new(max_id + 1))
    }

    async fn insert(&self, entry: &Entry) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO entries (id, headword, meanings_by_source_lang, meanings_by_target_lang,
                     parts_of_speech, updated_at, is_synced, is_translated)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    entry.id.get(),
                    entry.headword.as_str(),
                    serde_json::to_string(&entry.meanings_by_source_lang)?,
                    serde_json::to_string(&entry.meanings_by_target_lang)?,
                    serde_json::to_string(&entry.parts_of_speech)?,
                    entry.updated_at.as_str(),
                    i32::from(entry.is_synced),
                    i32::from(entry.is_translated),
                ],
            )
            .await?;
        Ok(())
    }

    async fn replace(&self, entry: &Entry) -> Result<u64> {
        let rows = self
            .conn
            .execute(
                "UPDATE entries SET headword = ?, meanings_by_source_lang = ?,
                     meanings_by_target_lang = ?, parts_of_speech = ?, updated_at = ?,
                     is_synced = ?, is_translated = ?
                 WHERE id = ?",
                params![
                    entry.headword.as_str(),
                    serde_json::to_string(&entry.meanings_by_source_lang)?,
                    serde_json::to_string(&entry.meanings_by_target_lang)?,
                    serde_json::to_string(&entry.parts_of_speech)?,
                    entry.updated_at.as_str(),
                    i32::from(entry.is_synced),
                    i32::from(entry.is_translated),
                    entry.id.get(),
                ],
            )
            .await?;
        Ok(rows)
    }

    async fn remove(&self, id: EntryId) -> Result<u64> {
        let rows = self
            .conn
            .execute("DELETE FROM entries WHERE id = ?", params![id.get()])
            .await?;
        Ok(rows)
    }

    async fn get(&self, id: EntryId) -> Result<Option<Entry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?");
        let mut entries = self.query_entries(&sql, params![id.get()]).await?;
        Ok(entries.pop())
    }

    async fn get_by_headword(&self, headword: &str) -> Result<Option<Entry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE headword = ?");
        let mut entries = self.query_entries(&sql, params![headword]).await?;
        Ok(entries.pop())
    }

    async fn list(&self) -> Result<Vec<Entry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries ORDER BY headword");
        self.query_entries(&sql, ()).await
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Entry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM entries ORDER BY updated_at DESC, id DESC LIMIT ?"
        );
        self.query_entries(&sql, params![limit as i64]).await
    }

    async fn list_untranslated(&self) -> Result<Vec<Entry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE is_translated = 0 ORDER BY id");
        self.query_entries(&sql, ()).await
    }

    async fn count(&self) -> Result<usize> {
        self.query_count("SELECT COUNT(*) FROM entries").await
    }

    async fn count_untranslated(&self) -> Result<usize> {
        self.query_count("SELECT COUNT(*) FROM entries WHERE is_translated = 0")
            .await
    }

    async fn mark_synced_without_pending(&self) -> Result<u64> {
        let rows = self
            .conn
            .execute(
                "UPDATE entries SET is_synced = 1
                 WHERE id NOT IN (SELECT entry_id FROM operations)",
                (),
            )
            .await?;
        Ok(rows)
    }

    async fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM entries", ()).await?;
        Ok(())
    }
}
