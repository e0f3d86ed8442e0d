use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] wordbook_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Headword cannot be empty")]
    EmptyHeadword,
    #[error("Entry ID or headword cannot be empty")]
    EmptyEntryId,
    #[error("Search query cannot be empty")]
    EmptySearchQuery,
    #[error("Entry not found: {0}")]
    EntryNotFound(String),
    #[error("Nothing to change. Pass --headword, --pos or --meaning.")]
    NothingToEdit,
    #[error("No user selected. Pass --user or set WORDBOOK_USER.")]
    NoUser,
    #[error("No data directory available. Pass --data-dir or set WORDBOOK_DATA_DIR.")]
    NoDataDir,
    #[error("Remote service is not configured. Set WORDBOOK_API_BASE_URL.")]
    RemoteNotConfigured,
    #[error("Not signed in. Set WORDBOOK_AUTH_TOKEN.")]
    NotAuthenticated,
    #[error("Sync did not complete: {0}")]
    SyncFailed(String),
    #[error("Translation could not run: {0}")]
    TranslationUnavailable(String),
    #[error("Reset deletes every word for this user. Re-run with --yes to confirm.")]
    ConfirmationRequired,
}
