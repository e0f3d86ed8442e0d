use wordbook_core::translation::{merge_glosses, merge_parts_of_speech};
use wordbook_core::{EntryStore, NewEntry};

use crate::commands::common::{normalize_headword, normalize_values, Workspace};
use crate::error::CliError;

pub async fn run_add(
    workspace: &Workspace,
    headword: &str,
    parts_of_speech: &[String],
    meanings: &[String],
    no_translate: bool,
) -> Result<(), CliError> {
    let headword = normalize_headword(headword)?;
    let store = workspace.open_store().await?;

    let translated = if no_translate {
        None
    } else {
        lookup_translation(workspace, &store, &headword).await
    };
    let new_entry = build_new_entry(
        &headword,
        translated,
        &normalize_values(parts_of_speech),
        &normalize_values(meanings),
    );
    let entry = store.create(new_entry).await?;

    println!("{}", entry.id);
    Ok(())
}

async fn lookup_translation(
    workspace: &Workspace,
    store: &EntryStore,
    headword: &str,
) -> Option<NewEntry> {
    let engine = match workspace.engine(store).await {
        Ok(engine) => engine,
        Err(error) => {
            tracing::debug!("Adding without translation: {error}");
            return None;
        }
    };
    if !engine.connectivity.is_online() {
        tracing::info!("Offline; '{headword}' will be translated on the next sync");
        return None;
    }
    match engine.backfill.lookup(headword).await {
        Ok(entry) => Some(entry),
        Err(error) => {
            tracing::warn!("Lookup for '{headword}' failed: {error}");
            None
        }
    }
}

/// Combine what the user typed with an optional translation. The user's
/// values come first; without a translation the entry stays untranslated.
pub fn build_new_entry(
    headword: &str,
    translated: Option<NewEntry>,
    parts_of_speech: &[String],
    meanings: &[String],
) -> NewEntry {
    match translated {
        Some(translated) => NewEntry {
            headword: headword.to_string(),
            parts_of_speech: merge_parts_of_speech(parts_of_speech, &translated.parts_of_speech),
            meanings_by_target_lang: merge_glosses(meanings, &translated.meanings_by_target_lang),
            meanings_by_source_lang: translated.meanings_by_source_lang,
            is_translated: true,
        },
        None => NewEntry::new(headword)
            .with_parts_of_speech(parts_of_speech.iter().cloned())
            .with_target_meanings(meanings.iter().cloned()),
    }
}
