use crate::commands::common::{format_entry_detail, resolve_entry, Workspace};
use crate::error::CliError;

pub async fn run_show(workspace: &Workspace, query: &str) -> Result<(), CliError> {
    let store = workspace.open_store().await?;
    let entry = resolve_entry(&store, query).await?;

    for line in format_entry_detail(&entry) {
        println!("{line}");
    }
    Ok(())
}
