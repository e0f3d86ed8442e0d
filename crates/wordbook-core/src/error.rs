//! Error types for wordbook-core

use thiserror::Error;

/// Result type alias using wordbook-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in wordbook-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// An entry with this headword already exists
    #[error("Entry already exists: {0}")]
    DuplicateEntry(String),

    /// Entry or record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No bearer token is available for a remote call
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Transport-level failure talking to the remote service
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Remote call exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Remote service answered but refused the request
    #[error("Remote rejected request: {0}")]
    RemoteRejected(String),

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Whether a later attempt may succeed without any local change.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout | Self::RemoteRejected(_)
        )
    }
}
