use crate::commands::common::{normalize_search_query, print_entries, Workspace};
use crate::error::CliError;

pub async fn run_search(workspace: &Workspace, query: &str, as_json: bool) -> Result<(), CliError> {
    let query = normalize_search_query(query)?;
    let store = workspace.open_store().await?;
    let entries = store.search(&query).await;

    if entries.is_empty() && !as_json {
        println!("No words match '{query}'.");
        return Ok(());
    }
    print_entries(&entries, as_json)
}
