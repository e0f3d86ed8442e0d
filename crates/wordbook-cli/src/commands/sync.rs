use wordbook_core::PendingWork;

use crate::commands::common::Workspace;
use crate::error::CliError;

pub async fn run_sync(workspace: &Workspace) -> Result<(), CliError> {
    let store = workspace.open_store().await?;
    let engine = workspace.engine(&store).await?;
    let before = store.pending_work().await?;

    if !engine.orchestrator.request_sync(&workspace.user_id).await {
        return Err(CliError::SyncFailed(
            engine.orchestrator.status().to_string(),
        ));
    }

    let after = store.pending_work().await?;
    println!("{}", format_sync_outcome(before, after));
    Ok(())
}

/// Summary line for a completed sync, from the pending work seen before
/// and after it ran.
pub fn format_sync_outcome(before: PendingWork, after: PendingWork) -> String {
    if before.is_empty() {
        return "Nothing to sync".to_string();
    }

    let translated = before
        .untranslated_entries
        .saturating_sub(after.untranslated_entries);
    if before.queued_operations == 0 {
        return if translated == 0 {
            format!(
                "Nothing pushed: {} word(s) still waiting for translation",
                after.untranslated_entries
            )
        } else {
            format!(
                "Translated {translated} word(s); {} change(s) queued for the next sync",
                after.queued_operations
            )
        };
    }

    format!(
        "Sync completed: {} change(s) pushed, {} word(s) still untranslated",
        before.queued_operations, after.untranslated_entries
    )
}
