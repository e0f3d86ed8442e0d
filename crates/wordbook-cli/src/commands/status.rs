use chrono::Utc;

use crate::commands::common::{format_relative_time, Workspace};
use crate::error::CliError;

pub async fn run_status(workspace: &Workspace) -> Result<(), CliError> {
    let store = workspace.open_store().await?;
    let pending = store.pending_work().await?;
    let last_sync = store.last_sync_timestamp().await?;
    let device_id = store.device_id().await?;
    let words = store.count().await;

    println!("User:          {}", workspace.user_id);
    println!("Device:        {device_id}");
    println!("Words:         {words}");
    println!("Queued:        {}", pending.queued_operations);
    println!("Untranslated:  {}", pending.untranslated_entries);
    println!("Last sync:     {}", format_last_sync(last_sync.as_deref()));
    println!(
        "Remote:        {}",
        workspace
            .config
            .api_base_url
            .as_deref()
            .unwrap_or("not configured")
    );
    Ok(())
}

pub fn format_last_sync(timestamp: Option<&str>) -> String {
    timestamp.map_or_else(
        || "never".to_string(),
        |timestamp| {
            let relative = format_relative_time(timestamp, Utc::now().naive_utc());
            if relative == timestamp {
                timestamp.to_string()
            } else {
                format!("{timestamp} ({relative})")
            }
        },
    )
}
