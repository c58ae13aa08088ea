//! Project hierarchy types
//!
//! The persisted document is the JSON shape
//! `{ "albums": [ { ..., "tracks": [ { ..., "versions": [..] } ] } ], "unorganized": [..] }`.
//! Field names are camelCase on disk.

use super::{AlbumId, TrackId, VersionId};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// Kind of physical artifact a `Version` points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionKind {
    /// DAW project file (`.flp`)
    Flp,
    /// Archived project bundle (`.zip`)
    Zip,
}

impl VersionKind {
    /// Map a file extension (without the dot, any case) to a kind
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "flp" => Some(Self::Flp),
            "zip" => Some(Self::Zip),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Flp => "flp",
            Self::Zip => "zip",
        }
    }
}

/// One physical file artifact, owned either by the inbox or by exactly one track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: VersionId,
    pub name: String,
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub kind: VersionKind,
    /// Milliseconds since the Unix epoch
    ///
    /// Whole milliseconds only. A fractional `lastModified` (a float mtime from
    /// another writer) loads truncated and is written back without the fraction.
    #[serde(default, deserialize_with = "millis_from_number")]
    pub last_modified: i64,
}

impl Version {
    pub fn new(
        id: impl Into<VersionId>,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        kind: VersionKind,
        last_modified: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: path.into(),
            kind,
            last_modified,
        }
    }
}

/// Accepts integral or fractional JSON numbers
///
/// Fractions are truncated toward zero, so sub-millisecond precision does not
/// survive a load and save.
fn millis_from_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    number
        .as_i64()
        .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
        .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", number)))
}

/// Workflow status of a track. Any transition is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TrackStatus {
    #[default]
    Idea,
    Arreglo,
    Mezcla,
    Master,
    Terminado,
}

impl TrackStatus {
    pub const ALL: [TrackStatus; 5] = [
        TrackStatus::Idea,
        TrackStatus::Arreglo,
        TrackStatus::Mezcla,
        TrackStatus::Master,
        TrackStatus::Terminado,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idea => "Idea",
            Self::Arreglo => "Arreglo",
            Self::Mezcla => "Mezcla",
            Self::Master => "Master",
            Self::Terminado => "Terminado",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A creative unit in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    #[serde(default)]
    pub status: TrackStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Chronological add order
    #[serde(default)]
    pub versions: Vec<Version>,
}

impl Track {
    /// A fresh track: status `Idea`, no tags, no versions
    pub fn new(id: TrackId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            status: TrackStatus::Idea,
            bpm: None,
            key: None,
            tags: Vec::new(),
            versions: Vec::new(),
        }
    }
}

/// A collection of tracks, analogous to a release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: AlbumId,
    pub name: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork: Option<String>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Album {
    pub fn new(id: AlbumId, name: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            artist: artist.into(),
            artwork: None,
            tracks: Vec::new(),
        }
    }
}

/// Where a version currently lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionLocation {
    Unorganized { index: usize },
    Track { album_id: AlbumId, track_id: TrackId },
}

/// Root aggregate of the project hierarchy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectsDb {
    #[serde(default)]
    pub albums: Vec<Album>,
    /// Versions not yet assigned to a track
    #[serde(default)]
    pub unorganized: Vec<Version>,
}

impl ProjectsDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn album(&self, id: &AlbumId) -> Option<&Album> {
        self.albums.iter().find(|a| &a.id == id)
    }

    pub fn album_mut(&mut self, id: &AlbumId) -> Option<&mut Album> {
        self.albums.iter_mut().find(|a| &a.id == id)
    }

    /// First track with this id across all albums
    pub fn track(&self, id: &TrackId) -> Option<&Track> {
        self.albums
            .iter()
            .flat_map(|a| a.tracks.iter())
            .find(|t| &t.id == id)
    }

    pub fn track_mut(&mut self, id: &TrackId) -> Option<&mut Track> {
        self.albums
            .iter_mut()
            .flat_map(|a| a.tracks.iter_mut())
            .find(|t| &t.id == id)
    }

    /// Locate a version in the inbox first, then inside tracks
    pub fn find_version(&self, id: &VersionId) -> Option<(VersionLocation, &Version)> {
        if let Some((index, version)) = self
            .unorganized
            .iter()
            .enumerate()
            .find(|(_, v)| &v.id == id)
        {
            return Some((VersionLocation::Unorganized { index }, version));
        }

        for album in &self.albums {
            for track in &album.tracks {
                if let Some(version) = track.versions.iter().find(|v| &v.id == id) {
                    return Some((
                        VersionLocation::Track {
                            album_id: album.id.clone(),
                            track_id: track.id.clone(),
                        },
                        version,
                    ));
                }
            }
        }

        None
    }

    pub fn contains_version_id(&self, id: &VersionId) -> bool {
        self.find_version(id).is_some()
    }

    /// Every version in the store: inbox first, then album/track order
    pub fn all_versions(&self) -> impl Iterator<Item = &Version> {
        self.unorganized.iter().chain(
            self.albums
                .iter()
                .flat_map(|a| a.tracks.iter())
                .flat_map(|t| t.versions.iter()),
        )
    }

    /// Version ids that appear more than once anywhere in the store
    pub fn duplicate_version_ids(&self) -> Vec<VersionId> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for version in self.all_versions() {
            if !seen.insert(&version.id) && !duplicates.contains(&version.id) {
                duplicates.push(version.id.clone());
            }
        }
        duplicates
    }
}
