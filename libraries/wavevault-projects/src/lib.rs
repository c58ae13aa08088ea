//! WaveVault Projects
//!
//! Organisation of DAW project files into albums and tracks.
//!
//! The [`ProjectStore`] owns the whole [`ProjectsDb`](wavevault_core::ProjectsDb)
//! document and persists it after every mutation through a
//! [`PersistenceBackend`]. The store is a plain owned value: callers that share
//! it across threads wrap it in a mutex around load/mutate/save.
//!
//! # Example
//!
//! ```rust,no_run
//! use wavevault_projects::{JsonFileBackend, ProjectStore};
//!
//! let mut store = ProjectStore::open(JsonFileBackend::new("data/projects_v2.json"));
//! let album = store.create_album("EP1", "Artist");
//! let track = store.create_track("Song A", &album.id).expect("album exists");
//! println!("{} / {}", album.name, track.name);
//! ```

mod document;
mod error;

pub mod backend;
pub mod ids;
pub mod scanner;
pub mod store;

pub use backend::{JsonFileBackend, MemoryBackend, PersistenceBackend};
pub use error::{ProjectStoreError, Result};
pub use ids::{IdGenerator, TimestampIdGenerator};
pub use scanner::{ImportSummary, ProjectScanner, ScannedProject};
pub use store::{AlbumUpdate, LoadOutcome, ProjectStore, TrackUpdate};
