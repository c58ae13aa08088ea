/// Metadata-specific errors
use thiserror::Error;

/// Result type alias using `MetadataError`
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Metadata error types
#[derive(Error, Debug)]
pub enum MetadataError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Path exists but cannot be scanned
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Tag parsing error
    #[error("Tag parsing error: {0}")]
    ParseError(String),

    /// A worker thread could not be started
    #[error("Failed to spawn metadata worker: {0}")]
    WorkerSpawn(std::io::Error),

    /// The file-record sink rejected an operation
    #[error("Sink error: {0}")]
    Sink(#[from] wavevault_core::VaultError),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Lofty error
    #[error(transparent)]
    Lofty(#[from] lofty::error::LoftyError),
}

impl From<MetadataError> for wavevault_core::VaultError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::Sink(inner) => inner,
            other => wavevault_core::VaultError::metadata(other.to_string()),
        }
    }
}
