//! Translation backfill.
//!
//! Entries created offline (or whose lookup failed) are stored with
//! `is_translated = false`. Once online, the processor asks the translation
//! collaborator for each of them and merges the answer into the entry
//! without dropping anything the user typed.

mod shape;

use std::sync::Arc;

pub use shape::{
    expand_part_of_speech, merge_glosses, merge_parts_of_speech, merge_source_meanings,
    shape_translation, ShapedTranslation,
};

use crate::config::DEFAULT_TARGET_LANGUAGE;
use crate::connectivity::ConnectivityMonitor;
use crate::error::{Error, Result};
use crate::models::{Entry, EntryPatch, NewEntry};
use crate::notify::EventNotifier;
use crate::remote::TranslationRemote;
use crate::store::EntryStore;
use crate::sync::SessionContext;

/// Outcome of one completed backfill batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub attempted: usize,
    pub translated: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct TranslationBackfill {
    store: EntryStore,
    remote: Arc<dyn TranslationRemote>,
    connectivity: ConnectivityMonitor,
    session: SessionContext,
    notifier: EventNotifier,
    target_language: String,
}

impl TranslationBackfill {
    pub fn new(
        store: EntryStore,
        remote: Arc<dyn TranslationRemote>,
        connectivity: ConnectivityMonitor,
        session: SessionContext,
        notifier: EventNotifier,
    ) -> Self {
        Self {
            store,
            remote,
            connectivity,
            session,
            notifier,
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
        }
    }

    #[must_use]
    pub fn with_target_language(mut self, target_language: impl Into<String>) -> Self {
        self.target_language = target_language.into();
        self
    }

    /// Translate every pending entry. Returns `false` only when the batch
    /// could not run at all.
    pub async fn process_pending(&self, user_id: &str) -> bool {
        self.run(user_id).await.is_some()
    }

    /// Like [`Self::process_pending`], reporting per-entry outcomes.
    pub async fn run(&self, user_id: &str) -> Option<BackfillReport> {
        if !self.connectivity.is_online() {
            tracing::debug!("Skipping translation backfill: offline");
            return None;
        }
        if !self.session.is_user(user_id) || self.store.user_id() != self.session.user_id() {
            tracing::warn!("Skipping translation backfill: no store for user {user_id}");
            return None;
        }
        let token = match self.session.token() {
            Ok(token) => token,
            Err(error) => {
                tracing::warn!("Skipping translation backfill: {error}");
                return None;
            }
        };
        let pending = match self.store.untranslated().await {
            Ok(pending) => pending,
            Err(error) => {
                tracing::error!("Failed to load untranslated entries: {error}");
                return None;
            }
        };

        let mut report = BackfillReport {
            attempted: pending.len(),
            ..BackfillReport::default()
        };
        for entry in &pending {
            match self.backfill_entry(&token, entry).await {
                Ok(true) => report.translated += 1,
                // Deleted while the request was in flight
                Ok(false) => {}
                Err(error) => {
                    report.failed += 1;
                    tracing::warn!("Translation failed for '{}': {error}", entry.headword);
                }
            }
        }

        if report.translated > 0 {
            self.notifier.publish();
        }
        if report.attempted > 0 {
            tracing::info!(
                "Translation backfill: {} translated, {} failed",
                report.translated,
                report.failed
            );
        }
        Some(report)
    }

    async fn backfill_entry(&self, token: &str, entry: &Entry) -> Result<bool> {
        let shaped = self.fetch(token, &entry.headword).await?;
        let patch = EntryPatch::default()
            .target_meanings(merge_glosses(
                &entry.meanings_by_target_lang,
                &shaped.target_meanings,
            ))
            .parts_of_speech(merge_parts_of_speech(
                &entry.parts_of_speech,
                &shaped.parts_of_speech,
            ))
            .source_meanings(merge_source_meanings(
                &entry.meanings_by_source_lang,
                &shaped.source_meanings,
            ))
            .translated(true);
        self.store.update(entry.id, &patch).await
    }

    /// Translate `headword` into a ready-to-create entry.
    pub async fn lookup(&self, headword: &str) -> Result<NewEntry> {
        let headword = headword.trim();
        if headword.is_empty() {
            return Err(Error::InvalidInput("headword cannot be empty".into()));
        }
        let token = self.session.token()?;
        let shaped = self.fetch(&token, headword).await?;
        Ok(shaped.into_new_entry(headword))
    }

    async fn fetch(&self, token: &str, headword: &str) -> Result<ShapedTranslation> {
        let response = self
            .remote
            .translate(token, headword, &self.target_language)
            .await?;
        let shaped = shape_translation(&response);
        if shaped.is_empty() {
            return Err(Error::RemoteRejected(format!(
                "empty translation for '{headword}'"
            )));
        }
        Ok(shaped)
    }
}
