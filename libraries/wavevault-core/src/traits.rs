/// Core traits for WaveVault
use crate::error::Result;
use crate::types::{AudioMetadata, Classification, LibraryEntry, LibraryFolder};
use async_trait::async_trait;
use std::path::Path;

/// Metadata parser trait
///
/// Implementers extract duration, tempo and key from an audio file. Parsing runs
/// on metadata worker threads, so implementations must be shareable across threads.
pub trait MetadataParser: Send + Sync {
    /// Read lightweight metadata from an audio file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    fn parse(&self, path: &Path) -> Result<AudioMetadata>;
}

/// Track classifier trait
///
/// Implementers label a file with a category and may estimate its tempo from
/// the signal. Classification never fails: an unavailable classifier answers
/// with an empty `Classification`.
pub trait TrackClassifier: Send + Sync {
    fn classify(&self, path: &Path) -> Classification;
}

/// File-record sink
///
/// Consumer side of the library indexer: stores one entry per scanned path,
/// keyed by path, overwritten on rescan.
#[async_trait]
pub trait FileRecordSink: Send + Sync {
    /// Register (or look up) the folder a scan starts from
    async fn upsert_folder(&self, path: &Path, name: &str) -> Result<LibraryFolder>;

    /// Insert or replace the entry for `entry.record.path`
    async fn upsert_entry(&self, entry: &LibraryEntry) -> Result<()>;
}
