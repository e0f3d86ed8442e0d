use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use wordbook_core::connectivity::HttpReachabilityProbe;
use wordbook_core::remote::{HttpRemote, StaticTokenProvider};
use wordbook_core::util::{normalize_text_option, TIMESTAMP_FORMAT};
use wordbook_core::{
    ConnectivityMonitor, EngineConfig, Entry, EntryId, EntryStore, EventNotifier, SessionContext,
    SyncOrchestrator, TranslationBackfill,
};

use crate::error::CliError;

const ENV_USER: &str = "WORDBOOK_USER";
const ENV_AUTH_TOKEN: &str = "WORDBOOK_AUTH_TOKEN";

/// Who and where this invocation operates on.
pub struct Workspace {
    pub user_id: String,
    pub data_dir: PathBuf,
    pub config: EngineConfig,
    pub auth_token: Option<String>,
}

/// Remote-backed components for commands that talk to the server.
pub struct Engine {
    pub orchestrator: SyncOrchestrator,
    pub backfill: TranslationBackfill,
    pub connectivity: ConnectivityMonitor,
}

impl Workspace {
    pub fn resolve(
        user: Option<String>,
        data_dir: Option<PathBuf>,
        config: EngineConfig,
    ) -> Result<Self, CliError> {
        let user_id = normalize_text_option(user)
            .or_else(|| normalize_text_option(env::var(ENV_USER).ok()))
            .ok_or(CliError::NoUser)?;
        let data_dir = data_dir
            .or_else(|| config.resolve_data_dir())
            .ok_or(CliError::NoDataDir)?;

        Ok(Self {
            user_id,
            data_dir,
            config,
            auth_token: normalize_text_option(env::var(ENV_AUTH_TOKEN).ok()),
        })
    }

    pub async fn open_store(&self) -> Result<EntryStore, CliError> {
        Ok(EntryStore::open_for_user(&self.data_dir, &self.user_id).await?)
    }

    /// Wire the sync and translation components against the configured
    /// server, probing reachability once.
    pub async fn engine(&self, store: &EntryStore) -> Result<Engine, CliError> {
        let base_url = self
            .config
            .api_base_url
            .clone()
            .ok_or(CliError::RemoteNotConfigured)?;
        let token = self
            .auth_token
            .clone()
            .ok_or(CliError::NotAuthenticated)?;
        let timeout = self.config.request_timeout();

        let connectivity = ConnectivityMonitor::new();
        let probe = HttpReachabilityProbe::new(base_url.clone(), timeout)?;
        connectivity.poll_once(&probe).await;

        let remote = Arc::new(HttpRemote::new(base_url, timeout)?);
        let session = SessionContext::new(
            &self.user_id,
            Arc::new(StaticTokenProvider::new(Some(token))),
        );
        let notifier = EventNotifier::new();
        let backfill = TranslationBackfill::new(
            store.clone(),
            remote.clone(),
            connectivity.clone(),
            session.clone(),
            notifier.clone(),
        )
        .with_target_language(self.config.target_language.clone());
        let orchestrator = SyncOrchestrator::new(
            store.clone(),
            remote,
            backfill.clone(),
            connectivity.clone(),
            session,
            notifier,
        );

        Ok(Engine {
            orchestrator,
            backfill,
            connectivity,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct EntryListItem {
    pub id: i64,
    pub headword: String,
    pub parts_of_speech: Vec<String>,
    pub meanings: Vec<String>,
    pub updated_at: String,
    pub relative_time: String,
    pub is_synced: bool,
    pub is_translated: bool,
}

pub fn entry_to_list_item(entry: &Entry) -> EntryListItem {
    let now = Utc::now().naive_utc();
    EntryListItem {
        id: entry.id.get(),
        headword: entry.headword.clone(),
        parts_of_speech: entry.parts_of_speech.clone(),
        meanings: entry.meanings_by_target_lang.clone(),
        updated_at: entry.updated_at.clone(),
        relative_time: format_relative_time(&entry.updated_at, now),
        is_synced: entry.is_synced,
        is_translated: entry.is_translated,
    }
}

pub fn format_entry_lines(entries: &[Entry]) -> Vec<String> {
    let now = Utc::now().naive_utc();
    entries
        .iter()
        .map(|entry| {
            let id = entry.id.get();
            let headword = &entry.headword;
            let meanings = truncate(&entry.meanings_by_target_lang.join(", "), 30);
            let relative_time = format_relative_time(&entry.updated_at, now);
            let flags = entry_flags(entry);

            if flags.is_empty() {
                format!("{id:>5}  {headword:<24}  {meanings:<30}  {relative_time}")
            } else {
                format!("{id:>5}  {headword:<24}  {meanings:<30}  {relative_time:<10}  {flags}")
            }
        })
        .collect()
}

pub fn format_entry_detail(entry: &Entry) -> Vec<String> {
    let mut lines = vec![
        format!("{} (#{})", entry.headword, entry.id),
        format!("  part of speech: {}", entry.parts_of_speech.join(", ")),
        format!("  meanings:       {}", entry.meanings_by_target_lang.join(", ")),
    ];
    for (tag, glosses) in &entry.meanings_by_source_lang {
        lines.push(format!("  {tag}: {}", glosses.replace(',', ", ")));
    }
    lines.push(format!("  updated:        {}", entry.updated_at));
    let flags = entry_flags(entry);
    if !flags.is_empty() {
        lines.push(format!("  {flags}"));
    }
    lines
}

fn entry_flags(entry: &Entry) -> String {
    let mut flags = Vec::new();
    if !entry.is_synced {
        flags.push("unsynced");
    }
    if !entry.is_translated {
        flags.push("untranslated");
    }
    flags
        .into_iter()
        .map(|flag| format!("[{flag}]"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn print_entries(entries: &[Entry], as_json: bool) -> Result<(), CliError> {
    if as_json {
        let json_items = entries
            .iter()
            .map(entry_to_list_item)
            .collect::<Vec<EntryListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_entry_lines(entries) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Find an entry by numeric id first, then by headword.
pub async fn resolve_entry(store: &EntryStore, query: &str) -> Result<Entry, CliError> {
    let query = normalize_entry_identifier(query)?;
    if let Ok(id) = query.parse::<EntryId>() {
        if let Some(entry) = store.get(id).await {
            return Ok(entry);
        }
    }
    store
        .get_by_headword(&query)
        .await
        .ok_or_else(|| CliError::EntryNotFound(query))
}

pub fn format_relative_time(timestamp: &str, now: NaiveDateTime) -> String {
    let Ok(then) = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT) else {
        return timestamp.to_string();
    };
    let diff = now.signed_duration_since(then).num_milliseconds();
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let mut truncated = value
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn normalize_headword(headword: &str) -> Result<String, CliError> {
    normalize_text_option(Some(headword.to_string())).ok_or(CliError::EmptyHeadword)
}

pub fn normalize_search_query(query: &str) -> Result<String, CliError> {
    normalize_text_option(Some(query.to_string())).ok_or(CliError::EmptySearchQuery)
}

pub fn normalize_entry_identifier(id: &str) -> Result<String, CliError> {
    normalize_text_option(Some(id.to_string())).ok_or(CliError::EmptyEntryId)
}

/// Trim repeated flag values and drop blanks.
pub fn normalize_values(values: &[String]) -> Vec<String> {
    values
        .iter()
        .filter_map(|value| normalize_text_option(Some(value.clone())))
        .collect()
}
