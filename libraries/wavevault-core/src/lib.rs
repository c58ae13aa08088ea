//! WaveVault Core
//!
//! Shared types, traits, and error handling for the WaveVault library engine.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Project hierarchy**: `Album` → `Track` → `Version`, plus the `unorganized` inbox,
//!   aggregated in `ProjectsDb`
//! - **Library index**: `FileRecord` (per-path extraction result), `LibraryEntry`, `LibraryFolder`
//! - **Seam traits**: `MetadataParser`, `TrackClassifier`, `FileRecordSink`
//! - **Error Handling**: Unified `VaultError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use wavevault_core::types::{Album, AlbumId, Track, TrackId};
//!
//! let mut album = Album::new(AlbumId::new("ALB-1"), "EP1", "Artist");
//! album.tracks.push(Track::new(TrackId::new("TRK-1"), "Song A"));
//! assert_eq!(album.tracks.len(), 1);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{Result, VaultError};
pub use traits::{FileRecordSink, MetadataParser, TrackClassifier};

pub use types::{
    // Project hierarchy
    Album, AlbumId, ProjectsDb, Track, TrackId, TrackStatus, Version, VersionId, VersionKind,
    VersionLocation,
    // Library index
    AudioMetadata, Classification, FileRecord, FolderId, Instrument, LibraryEntry, LibraryFolder,
    SampleKind,
};
