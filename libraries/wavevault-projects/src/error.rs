/// Project store errors
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `ProjectStoreError`
pub type Result<T> = std::result::Result<T, ProjectStoreError>;

#[derive(Error, Debug)]
pub enum ProjectStoreError {
    /// Reading the persisted document failed
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the persisted document failed
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON or has the wrong shape
    #[error("Malformed projects document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Backend-specific failure
    #[error("Persistence backend error: {0}")]
    Backend(String),
}

impl From<ProjectStoreError> for wavevault_core::VaultError {
    fn from(err: ProjectStoreError) -> Self {
        wavevault_core::VaultError::persistence(err.to_string())
    }
}
