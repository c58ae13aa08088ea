/// Metadata reader implementation using lofty
use crate::error::MetadataError;
use lofty::prelude::*;
use lofty::tag::{ItemKey, Tag};
use std::path::Path;
use wavevault_core::{AudioMetadata, MetadataParser};

/// Tag reader using the lofty library
///
/// Reads only what the index needs: duration from the stream properties,
/// tempo and key from the primary tag (or the first tag present).
pub struct LoftyMetadataReader;

impl LoftyMetadataReader {
    /// Create a new metadata reader
    pub fn new() -> Self {
        Self
    }

    fn extract_from_tag(tag: &Tag, metadata: &mut AudioMetadata) {
        for item in tag.items() {
            match item.key() {
                // ID3v2 TBPM is exposed as IntegerBpm, free-form BPM frames as Bpm
                ItemKey::Bpm | ItemKey::IntegerBpm => {
                    if metadata.bpm.is_none() {
                        metadata.bpm = item.value().text().and_then(parse_tempo);
                    }
                }
                ItemKey::InitialKey => {
                    metadata.key = item
                        .value()
                        .text()
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                        .map(ToString::to_string);
                }
                _ => {}
            }
        }
    }
}

impl Default for LoftyMetadataReader {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataParser for LoftyMetadataReader {
    fn parse(&self, path: &Path) -> wavevault_core::Result<AudioMetadata> {
        if !path.exists() {
            return Err(MetadataError::FileNotFound(path.display().to_string()).into());
        }

        let tagged_file = lofty::read_from_path(path).map_err(MetadataError::from)?;

        let mut metadata = AudioMetadata {
            duration_secs: Some(tagged_file.properties().duration().as_secs_f64()),
            ..AudioMetadata::default()
        };

        if let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
            Self::extract_from_tag(tag, &mut metadata);
        }

        Ok(metadata)
    }
}

/// Parse a tagged tempo such as `"128"`, `"127.5"` or `"174 BPM"`
fn parse_tempo(text: &str) -> Option<f64> {
    let text = text.trim();
    let end = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    text[..end].parse::<f64>().ok().filter(|bpm| *bpm > 0.0)
}
