use crate::commands::common::Workspace;
use crate::error::CliError;

pub async fn run_reset(workspace: &Workspace, confirmed: bool) -> Result<(), CliError> {
    if !confirmed {
        return Err(CliError::ConfirmationRequired);
    }
    let store = workspace.open_store().await?;
    store.reset().await?;
    println!("Wordbook for {} cleared", workspace.user_id);
    Ok(())
}
