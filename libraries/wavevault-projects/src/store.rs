//! Project store
//!
//! Owns the albums → tracks → versions hierarchy plus the inbox of
//! unorganised versions. Every successful mutation is persisted immediately.
//! Persistence failures are logged and never surface to the caller: the
//! in-memory document stays authoritative until the next successful save.
//!
//! Lookups that miss are not errors. Operations report them as `false` or
//! `None` and leave the document untouched.

use crate::backend::{JsonFileBackend, PersistenceBackend};
use crate::document;
use crate::error::Result;
use crate::ids::{IdGenerator, TimestampIdGenerator};
use std::sync::atomic::{AtomicBool, Ordering};
use wavevault_core::{
    Album, AlbumId, ProjectsDb, Track, TrackId, TrackStatus, Version, VersionId, VersionLocation,
};

/// What `try_load` found in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing persisted yet; the store is empty
    Missing,
    /// Document loaded as-is
    Loaded,
    /// Document used a legacy inbox field and was rewritten
    Migrated,
}

/// Partial update of a track; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackUpdate {
    pub name: Option<String>,
    pub status: Option<TrackStatus>,
    /// `Some(None)` clears the tempo
    pub bpm: Option<Option<f64>>,
    /// `Some(None)` clears the key
    pub key: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

impl TrackUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Partial update of an album; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlbumUpdate {
    pub name: Option<String>,
    pub artist: Option<String>,
    /// `Some(None)` removes the artwork
    pub artwork: Option<Option<String>>,
}

impl AlbumUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

pub struct ProjectStore<B: PersistenceBackend = JsonFileBackend> {
    backend: B,
    ids: Box<dyn IdGenerator>,
    db: ProjectsDb,
    /// Set when `load` fell back to an empty document
    preserve_before_save: AtomicBool,
}

impl<B: PersistenceBackend> ProjectStore<B> {
    /// Empty store over `backend`; nothing is read until `load`
    pub fn new(backend: B) -> Self {
        Self::with_id_generator(backend, TimestampIdGenerator::new())
    }

    pub fn with_id_generator(backend: B, ids: impl IdGenerator + 'static) -> Self {
        Self {
            backend,
            ids: Box::new(ids),
            db: ProjectsDb::default(),
            preserve_before_save: AtomicBool::new(false),
        }
    }

    /// Create a store and load whatever the backend holds
    pub fn open(backend: B) -> Self {
        let mut store = Self::new(backend);
        store.load();
        store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Load the persisted document, falling back to an empty one on any error
    ///
    /// After a fallback the backend sets the unreadable document aside before
    /// the next save overwrites it.
    pub fn load(&mut self) {
        if let Err(e) = self.try_load() {
            tracing::error!(
                location = %self.backend.describe(),
                "Failed to load projects document, starting empty: {}",
                e
            );
            self.db = ProjectsDb::default();
            self.preserve_before_save.store(true, Ordering::SeqCst);
        } else {
            self.preserve_before_save.store(false, Ordering::SeqCst);
        }
    }

    /// Load the persisted document, migrating legacy inbox fields
    ///
    /// On error the in-memory document is left as it was.
    pub fn try_load(&mut self) -> Result<LoadOutcome> {
        let Some(text) = self.backend.read()? else {
            tracing::debug!(location = %self.backend.describe(), "No projects document yet");
            self.db = ProjectsDb::default();
            return Ok(LoadOutcome::Missing);
        };

        let decoded = document::decode(&text)?;
        self.db = decoded.db;

        let duplicates = self.db.duplicate_version_ids();
        if !duplicates.is_empty() {
            tracing::warn!(?duplicates, "Projects document holds duplicate version ids");
        }

        tracing::debug!(
            albums = self.db.albums.len(),
            unorganized = self.db.unorganized.len(),
            "Projects document loaded"
        );

        if decoded.migrated {
            tracing::info!("Migrating legacy inbox field to `unorganized`");
            self.save();
            return Ok(LoadOutcome::Migrated);
        }
        Ok(LoadOutcome::Loaded)
    }

    /// Persist the whole document, logging any failure
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            tracing::error!(
                location = %self.backend.describe(),
                "Failed to save projects document: {}",
                e
            );
        }
    }

    /// Persist the whole document
    pub fn try_save(&self) -> Result<()> {
        let text = document::encode(&self.db)?;
        if self.preserve_before_save.load(Ordering::SeqCst) {
            self.backend.preserve()?;
            self.preserve_before_save.store(false, Ordering::SeqCst);
        }
        self.backend.write(&text)
    }

    pub fn db(&self) -> &ProjectsDb {
        &self.db
    }

    pub fn album(&self, id: &AlbumId) -> Option<&Album> {
        self.db.album(id)
    }

    pub fn track(&self, id: &TrackId) -> Option<&Track> {
        self.db.track(id)
    }

    pub fn find_version(&self, id: &VersionId) -> Option<(VersionLocation, &Version)> {
        self.db.find_version(id)
    }

    /// Put a version in the inbox unless one with the same path is already
    /// there, or its id is taken anywhere in the store
    ///
    /// Paths that are not valid UTF-8 are refused: the document could no
    /// longer be saved.
    pub fn add_to_unorganized(&mut self, version: Version) -> bool {
        if version.path.to_str().is_none() {
            tracing::warn!(path = %version.path.display(), "Refusing version with a non UTF-8 path");
            return false;
        }
        if self.db.unorganized.iter().any(|v| v.path == version.path) {
            tracing::trace!(path = %version.path.display(), "Version already in inbox");
            return false;
        }
        if self.db.contains_version_id(&version.id) {
            tracing::warn!(id = %version.id, "Version id already in use, not adding to inbox");
            return false;
        }

        tracing::debug!(id = %version.id, path = %version.path.display(), "Version added to inbox");
        self.db.unorganized.push(version);
        self.save();
        true
    }

    pub fn create_album(&mut self, name: impl Into<String>, artist: impl Into<String>) -> Album {
        let album = Album::new(self.ids.album_id(), name, artist);
        tracing::debug!(id = %album.id, name = %album.name, "Album created");
        self.db.albums.push(album.clone());
        self.save();
        album
    }

    /// Create a track in an album; `None` when the album does not exist
    pub fn create_track(&mut self, name: impl Into<String>, album_id: &AlbumId) -> Option<Track> {
        if self.db.album(album_id).is_none() {
            tracing::debug!(album = %album_id, "Cannot create track, album not found");
            return None;
        }

        let track = Track::new(self.ids.track_id(), name);
        let album = self.db.album_mut(album_id)?;
        album.tracks.push(track.clone());
        tracing::debug!(id = %track.id, album = %album_id, "Track created");
        self.save();
        Some(track)
    }

    /// Move a version from the inbox to the end of a track's version list
    ///
    /// Only inbox versions can be moved; a version already inside a track
    /// must be brought back with `unorganize_version` first.
    pub fn move_version_to_track(&mut self, version_id: &VersionId, track_id: &TrackId) -> bool {
        let Some(index) = self.db.unorganized.iter().position(|v| &v.id == version_id) else {
            tracing::debug!(version = %version_id, "Version not in inbox");
            return false;
        };
        if self.db.track(track_id).is_none() {
            tracing::debug!(track = %track_id, "Target track not found");
            return false;
        }

        let version = self.db.unorganized.remove(index);
        match self.db.track_mut(track_id) {
            Some(track) => track.versions.push(version),
            None => {
                // Unreachable after the lookup above; keep the version anyway
                self.db.unorganized.insert(index, version);
                return false;
            }
        }

        tracing::debug!(version = %version_id, track = %track_id, "Version moved to track");
        self.save();
        true
    }

    /// Move a version out of its track back to the end of the inbox
    pub fn unorganize_version(&mut self, version_id: &VersionId) -> bool {
        let Some((VersionLocation::Track { track_id, .. }, version)) =
            self.db.find_version(version_id)
        else {
            tracing::debug!(version = %version_id, "Version not nested in any track");
            return false;
        };

        if self.db.unorganized.iter().any(|v| v.path == version.path) {
            tracing::warn!(version = %version_id, "Inbox already holds this path");
            return false;
        }

        let Some(track) = self.db.track_mut(&track_id) else {
            return false;
        };
        let Some(index) = track.versions.iter().position(|v| &v.id == version_id) else {
            return false;
        };
        let version = track.versions.remove(index);
        self.db.unorganized.push(version);

        tracing::debug!(version = %version_id, track = %track_id, "Version moved back to inbox");
        self.save();
        true
    }

    /// Apply a partial update; `false` if the track is missing or the update is empty
    pub fn update_track(&mut self, track_id: &TrackId, update: TrackUpdate) -> bool {
        if update.is_empty() {
            return false;
        }
        let Some(track) = self.db.track_mut(track_id) else {
            tracing::debug!(track = %track_id, "Cannot update, track not found");
            return false;
        };

        if let Some(name) = update.name {
            track.name = name;
        }
        if let Some(status) = update.status {
            track.status = status;
        }
        if let Some(bpm) = update.bpm {
            track.bpm = bpm;
        }
        if let Some(key) = update.key {
            track.key = key;
        }
        if let Some(tags) = update.tags {
            track.tags = dedup_tags(tags);
        }

        tracing::debug!(track = %track_id, "Track updated");
        self.save();
        true
    }

    /// Apply a partial update; `false` if the album is missing or the update is empty
    pub fn update_album(&mut self, album_id: &AlbumId, update: AlbumUpdate) -> bool {
        if update.is_empty() {
            return false;
        }
        let Some(album) = self.db.album_mut(album_id) else {
            tracing::debug!(album = %album_id, "Cannot update, album not found");
            return false;
        };

        if let Some(name) = update.name {
            album.name = name;
        }
        if let Some(artist) = update.artist {
            album.artist = artist;
        }
        if let Some(artwork) = update.artwork {
            album.artwork = artwork;
        }

        tracing::debug!(album = %album_id, "Album updated");
        self.save();
        true
    }

    /// Remove an album together with its tracks and their versions
    pub fn delete_album(&mut self, album_id: &AlbumId) -> bool {
        let before = self.db.albums.len();
        self.db.albums.retain(|a| &a.id != album_id);
        if self.db.albums.len() == before {
            return false;
        }

        tracing::debug!(album = %album_id, "Album deleted");
        self.save();
        true
    }

    /// Remove a track together with its versions
    pub fn delete_track(&mut self, track_id: &TrackId) -> bool {
        let removed = self.db.albums.iter_mut().any(|album| {
            match album.tracks.iter().position(|t| &t.id == track_id) {
                Some(index) => {
                    album.tracks.remove(index);
                    true
                }
                None => false,
            }
        });
        if !removed {
            return false;
        }

        tracing::debug!(track = %track_id, "Track deleted");
        self.save();
        true
    }

    /// Remove a version reference, wherever it lives. The file itself is untouched.
    pub fn delete_version(&mut self, version_id: &VersionId) -> bool {
        let Some((location, _)) = self.db.find_version(version_id) else {
            return false;
        };

        match location {
            VersionLocation::Unorganized { index } => {
                self.db.unorganized.remove(index);
            }
            VersionLocation::Track { track_id, .. } => {
                let Some(track) = self.db.track_mut(&track_id) else {
                    return false;
                };
                track.versions.retain(|v| &v.id != version_id);
            }
        }

        tracing::debug!(version = %version_id, "Version deleted");
        self.save();
        true
    }
}

/// Drop blank and repeated tags, keeping first-occurrence order
fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut kept: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !kept.contains(&tag) {
            kept.push(tag);
        }
    }
    kept
}
