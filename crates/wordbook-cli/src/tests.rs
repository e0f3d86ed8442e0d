use chrono::NaiveDateTime;
use pretty_assertions::assert_eq;
use tempfile::{tempdir, TempDir};
use wordbook_core::util::TIMESTAMP_FORMAT;
use wordbook_core::{EngineConfig, EntryPatch, NewEntry, PendingWork};

use crate::commands::add::{build_new_entry, run_add};
use crate::commands::common::{
    format_entry_detail, format_relative_time, normalize_entry_identifier, normalize_headword,
    normalize_search_query, normalize_values, resolve_entry, Workspace,
};
use crate::commands::delete::run_delete;
use crate::commands::edit::{build_patch, run_edit};
use crate::commands::reset::run_reset;
use crate::commands::status::format_last_sync;
use crate::commands::sync::{format_sync_outcome, run_sync};
use crate::error::CliError;

fn workspace(dir: &TempDir) -> Workspace {
    Workspace {
        user_id: "u1".to_string(),
        data_dir: dir.path().to_path_buf(),
        config: EngineConfig::default(),
        auth_token: None,
    }
}

fn at(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).unwrap()
}

#[test]
fn normalize_headword_trims_and_rejects_empty() {
    assert_eq!(normalize_headword("  sugar ").unwrap(), "sugar");
    assert!(matches!(
        normalize_headword(" \t "),
        Err(CliError::EmptyHeadword)
    ));
}

#[test]
fn normalize_query_and_identifier_reject_blank() {
    assert!(matches!(
        normalize_search_query("  "),
        Err(CliError::EmptySearchQuery)
    ));
    assert!(matches!(
        normalize_entry_identifier(""),
        Err(CliError::EmptyEntryId)
    ));
    assert_eq!(normalize_entry_identifier(" 12 ").unwrap(), "12");
}

#[test]
fn normalize_values_drops_blanks() {
    let values = vec![" noun ".to_string(), "  ".to_string(), "verb".to_string()];
    assert_eq!(normalize_values(&values), vec!["noun", "verb"]);
}

#[test]
fn relative_time_buckets() {
    let now = at("2024-06-10 12:00:00.000");
    assert_eq!(format_relative_time("2024-06-10 11:59:30.000", now), "just now");
    assert_eq!(format_relative_time("2024-06-10 11:45:00.000", now), "15m ago");
    assert_eq!(format_relative_time("2024-06-10 09:00:00.000", now), "3h ago");
    assert_eq!(format_relative_time("2024-06-08 12:00:00.000", now), "2d ago");
    assert_eq!(format_relative_time("2024-05-27 12:00:00.000", now), "2w ago");
}

#[test]
fn relative_time_keeps_unparseable_input() {
    let now = at("2024-06-10 12:00:00.000");
    assert_eq!(
        format_relative_time("2024-06-01T12:00:00", now),
        "2024-06-01T12:00:00"
    );
}

#[test]
fn last_sync_reads_never_without_timestamp() {
    assert_eq!(format_last_sync(None), "never");
    assert_eq!(
        format_last_sync(Some("2024-06-01T12:00:00")),
        "2024-06-01T12:00:00"
    );
}

#[test]
fn new_entry_without_translation_stays_untranslated() {
    let entry = build_new_entry(
        "sugar",
        None,
        &["noun".to_string()],
        &["砂糖".to_string()],
    );
    assert_eq!(entry.headword, "sugar");
    assert_eq!(entry.parts_of_speech, vec!["noun"]);
    assert_eq!(entry.meanings_by_target_lang, vec!["砂糖"]);
    assert!(!entry.is_translated);
}

#[test]
fn new_entry_with_translation_keeps_user_values_first() {
    let translated = NewEntry::new("sugar")
        .with_parts_of_speech(["Noun"])
        .with_target_meanings(["糖", "砂糖"])
        .with_source_meaning("Noun", "sweetener");

    let entry = build_new_entry("sugar", Some(translated), &[], &["砂糖".to_string()]);

    assert_eq!(entry.meanings_by_target_lang, vec!["砂糖", "糖"]);
    assert_eq!(entry.parts_of_speech, vec!["Noun"]);
    assert_eq!(entry.meanings_by_source_lang["Noun"], "sweetener");
    assert!(entry.is_translated);
}

#[test]
fn patch_requires_a_change() {
    assert!(matches!(
        build_patch(None, &[], &["  ".to_string()]),
        Err(CliError::NothingToEdit)
    ));
    assert!(matches!(
        build_patch(Some("  "), &[], &[]),
        Err(CliError::EmptyHeadword)
    ));

    let patch = build_patch(Some(" stand "), &[], &["站".to_string()]).unwrap();
    assert_eq!(
        patch,
        EntryPatch::default().headword("stand").target_meanings(["站"])
    );
}

#[test]
fn detail_lists_flags_for_pending_entries() {
    let entry = wordbook_core::Entry {
        id: wordbook_core::EntryId::new(3),
        headword: "light".to_string(),
        meanings_by_source_lang: std::collections::BTreeMap::new(),
        meanings_by_target_lang: vec!["光".to_string()],
        parts_of_speech: vec!["Noun".to_string()],
        updated_at: "2024-06-10 12:00:00.000".to_string(),
        is_synced: false,
        is_translated: false,
    };
    let lines = format_entry_detail(&entry);
    assert_eq!(lines[0], "light (#3)");
    assert_eq!(lines.last().unwrap(), "  [unsynced] [untranslated]");
}

#[tokio::test(flavor = "multi_thread")]
async fn add_without_remote_creates_untranslated_entry() {
    let dir = tempdir().unwrap();
    let workspace = workspace(&dir);

    run_add(&workspace, " sugar ", &[], &["砂糖".to_string()], false)
        .await
        .unwrap();

    let store = workspace.open_store().await.unwrap();
    let entry = store.get_by_headword("sugar").await.unwrap();
    assert!(!entry.is_translated);
    assert_eq!(entry.meanings_by_target_lang, vec!["砂糖"]);
    assert_eq!(store.pending_work().await.unwrap().queued_operations, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn resolve_entry_prefers_id_then_headword() {
    let dir = tempdir().unwrap();
    let workspace = workspace(&dir);
    run_add(&workspace, "sugar", &[], &[], true).await.unwrap();

    let store = workspace.open_store().await.unwrap();
    let by_headword = resolve_entry(&store, "sugar").await.unwrap();
    let by_id = resolve_entry(&store, &by_headword.id.to_string())
        .await
        .unwrap();
    assert_eq!(by_id, by_headword);
    assert!(matches!(
        resolve_entry(&store, "salt").await,
        Err(CliError::EntryNotFound(ref query)) if query == "salt"
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn edit_and_delete_queue_operations() {
    let dir = tempdir().unwrap();
    let workspace = workspace(&dir);
    run_add(&workspace, "sugar", &[], &[], true).await.unwrap();

    run_edit(&workspace, "sugar", None, &[], &["糖".to_string()])
        .await
        .unwrap();
    run_delete(&workspace, "sugar").await.unwrap();

    let store = workspace.open_store().await.unwrap();
    assert_eq!(store.count().await, 0);
    assert_eq!(store.pending_operations().await.unwrap().len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn reset_requires_confirmation() {
    let dir = tempdir().unwrap();
    let workspace = workspace(&dir);
    run_add(&workspace, "sugar", &[], &[], true).await.unwrap();

    assert!(matches!(
        run_reset(&workspace, false).await,
        Err(CliError::ConfirmationRequired)
    ));
    run_reset(&workspace, true).await.unwrap();

    let store = workspace.open_store().await.unwrap();
    assert_eq!(store.count().await, 0);
    assert!(store.pending_operations().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_requires_configured_remote() {
    let dir = tempdir().unwrap();
    let workspace = workspace(&dir);

    assert!(matches!(
        run_sync(&workspace).await,
        Err(CliError::RemoteNotConfigured)
    ));
}

fn pending(queued_operations: usize, untranslated_entries: usize) -> PendingWork {
    PendingWork {
        queued_operations,
        untranslated_entries,
    }
}

#[test]
fn sync_outcome_reports_untranslated_only_batches() {
    assert_eq!(
        format_sync_outcome(pending(0, 0), pending(0, 0)),
        "Nothing to sync"
    );
    assert_eq!(
        format_sync_outcome(pending(0, 2), pending(0, 2)),
        "Nothing pushed: 2 word(s) still waiting for translation"
    );
    assert_eq!(
        format_sync_outcome(pending(0, 2), pending(1, 1)),
        "Translated 1 word(s); 1 change(s) queued for the next sync"
    );
    assert_eq!(
        format_sync_outcome(pending(3, 1), pending(0, 0)),
        "Sync completed: 3 change(s) pushed, 0 word(s) still untranslated"
    );
}
