use crate::commands::common::{resolve_entry, Workspace};
use crate::error::CliError;

pub async fn run_delete(workspace: &Workspace, query: &str) -> Result<(), CliError> {
    let store = workspace.open_store().await?;
    let entry = resolve_entry(&store, query).await?;

    if !store.delete(entry.id).await? {
        return Err(CliError::EntryNotFound(entry.id.to_string()));
    }
    println!("{}", entry.id);
    Ok(())
}
