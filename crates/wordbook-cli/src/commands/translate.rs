use crate::commands::common::Workspace;
use crate::error::CliError;

pub async fn run_translate(workspace: &Workspace) -> Result<(), CliError> {
    let store = workspace.open_store().await?;
    let engine = workspace.engine(&store).await?;
    if !engine.connectivity.is_online() {
        return Err(CliError::TranslationUnavailable("offline".to_string()));
    }

    let report = engine
        .backfill
        .run(&workspace.user_id)
        .await
        .ok_or_else(|| CliError::TranslationUnavailable("see log for details".to_string()))?;

    if report.attempted == 0 {
        println!("Every word is already translated");
    } else {
        println!(
            "Translated {} of {} word(s), {} failed",
            report.translated, report.attempted, report.failed
        );
    }
    Ok(())
}
