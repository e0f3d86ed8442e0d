use crate::commands::common::{print_entries, Workspace};
use crate::error::CliError;

pub async fn run_list(workspace: &Workspace, as_json: bool) -> Result<(), CliError> {
    let store = workspace.open_store().await?;
    let entries = store.list().await;

    if entries.is_empty() && !as_json {
        println!("No words yet. Add one with `wordbook add <word>`.");
        return Ok(());
    }
    print_entries(&entries, as_json)
}

pub async fn run_recent(workspace: &Workspace, limit: usize, as_json: bool) -> Result<(), CliError> {
    let store = workspace.open_store().await?;
    let entries = store.list_recent(limit).await;
    print_entries(&entries, as_json)
}
