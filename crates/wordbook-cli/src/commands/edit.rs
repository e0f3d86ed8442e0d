use wordbook_core::EntryPatch;

use crate::commands::common::{normalize_headword, normalize_values, resolve_entry, Workspace};
use crate::error::CliError;

pub async fn run_edit(
    workspace: &Workspace,
    query: &str,
    headword: Option<&str>,
    parts_of_speech: &[String],
    meanings: &[String],
) -> Result<(), CliError> {
    let patch = build_patch(headword, parts_of_speech, meanings)?;
    let store = workspace.open_store().await?;
    let entry = resolve_entry(&store, query).await?;

    if !store.update(entry.id, &patch).await? {
        return Err(CliError::EntryNotFound(entry.id.to_string()));
    }
    println!("{}", entry.id);
    Ok(())
}

pub fn build_patch(
    headword: Option<&str>,
    parts_of_speech: &[String],
    meanings: &[String],
) -> Result<EntryPatch, CliError> {
    let mut patch = EntryPatch::default();
    if let Some(headword) = headword {
        patch = patch.headword(normalize_headword(headword)?);
    }
    let parts_of_speech = normalize_values(parts_of_speech);
    if !parts_of_speech.is_empty() {
        patch = patch.parts_of_speech(parts_of_speech);
    }
    let meanings = normalize_values(meanings);
    if !meanings.is_empty() {
        patch = patch.target_meanings(meanings);
    }

    if patch == EntryPatch::default() {
        return Err(CliError::NothingToEdit);
    }
    Ok(patch)
}
