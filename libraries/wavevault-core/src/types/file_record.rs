//! Library index types

use super::FolderId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Raw output of a metadata parser, before rounding and defaulting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioMetadata {
    /// Duration in seconds
    pub duration_secs: Option<f64>,
    /// Tempo as tagged (may be fractional)
    pub bpm: Option<f64>,
    /// Musical key, raw string from the tag
    pub key: Option<String>,
}

/// Output of an external classifier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub category: Option<String>,
    /// Tempo estimated from the audio signal
    pub bpm: Option<f64>,
}

/// Round a tempo to the nearest integer; unknown, non-finite or non-positive values become 0
pub fn round_bpm(bpm: Option<f64>) -> u32 {
    bpm.filter(|b| b.is_finite() && *b > 0.0)
        .map(|b| b.round() as u32)
        .unwrap_or(0)
}

/// Per-path extraction result; also the response message of the metadata worker pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: PathBuf,
    /// Seconds, 0 when unknown
    #[serde(default)]
    pub duration: f64,
    /// Rounded tempo, 0 when unknown
    #[serde(default)]
    pub bpm: u32,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileRecord {
    /// Successful extraction
    pub fn extracted(path: impl Into<PathBuf>, metadata: &AudioMetadata) -> Self {
        Self {
            path: path.into(),
            duration: metadata
                .duration_secs
                .filter(|d| d.is_finite() && *d >= 0.0)
                .unwrap_or(0.0),
            bpm: round_bpm(metadata.bpm),
            key: metadata.key.clone().filter(|k| !k.trim().is_empty()),
            category: None,
            success: true,
            error: None,
        }
    }

    /// Failed extraction. The error message is never empty.
    pub fn failed(path: impl Into<PathBuf>, error: impl Into<String>) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "unknown extraction error".to_string();
        }
        Self {
            path: path.into(),
            duration: 0.0,
            bpm: 0,
            key: None,
            category: None,
            success: false,
            error: Some(error),
        }
    }

    /// Merge a classifier result: category always, tempo only when the tags had none
    pub fn apply_classification(&mut self, classification: &Classification) {
        if classification.category.is_some() {
            self.category = classification.category.clone();
        }
        if self.bpm == 0 {
            self.bpm = round_bpm(classification.bpm);
        }
    }
}

/// Instrument guessed from a sample's file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instrument {
    Kick,
    Snare,
    #[serde(rename = "Hi-Hat")]
    HiHat,
    Bass,
    Percussion,
    Vocal,
    #[serde(rename = "FX")]
    Fx,
    Pad,
    Synth,
}

impl Instrument {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kick => "Kick",
            Self::Snare => "Snare",
            Self::HiHat => "Hi-Hat",
            Self::Bass => "Bass",
            Self::Percussion => "Percussion",
            Self::Vocal => "Vocal",
            Self::Fx => "FX",
            Self::Pad => "Pad",
            Self::Synth => "Synth",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Kick" => Some(Self::Kick),
            "Snare" => Some(Self::Snare),
            "Hi-Hat" => Some(Self::HiHat),
            "Bass" => Some(Self::Bass),
            "Percussion" => Some(Self::Percussion),
            "Vocal" => Some(Self::Vocal),
            "FX" => Some(Self::Fx),
            "Pad" => Some(Self::Pad),
            "Synth" => Some(Self::Synth),
            _ => None,
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a sample is a single hit or a loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleKind {
    #[serde(rename = "One-Shot")]
    OneShot,
    Loop,
}

impl SampleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneShot => "One-Shot",
            Self::Loop => "Loop",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "One-Shot" => Some(Self::OneShot),
            "Loop" => Some(Self::Loop),
            _ => None,
        }
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scanned root folder of the local library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryFolder {
    pub id: FolderId,
    pub path: PathBuf,
    pub name: String,
}

/// One row of the file-record table: the extraction result plus index-side enrichment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub record: FileRecord,
    pub folder_id: FolderId,
    pub file_name: String,
    pub size_bytes: u64,
    pub instrument: Option<Instrument>,
    pub sample_kind: SampleKind,
    /// Tag key, or a key parsed from the file name when the tags had none
    pub key: Option<String>,
}
