mod file_record;
mod ids;
mod project;

pub use file_record::{
    round_bpm, AudioMetadata, Classification, FileRecord, Instrument, LibraryEntry, LibraryFolder,
    SampleKind,
};
pub use ids::{AlbumId, FolderId, TrackId, VersionId};
pub use project::{Album, ProjectsDb, Track, TrackStatus, Version, VersionKind, VersionLocation};
