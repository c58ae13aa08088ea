//! On-disk shape of the projects document, including legacy inbox names

use crate::error::Result;
use serde::Deserialize;
use wavevault_core::{Album, ProjectsDb, Version};

/// Every shape the document has had. A field that is absent or `null` falls
/// through to the next alias; an empty list does not.
#[derive(Debug, Default, Deserialize)]
struct StoredDocument {
    #[serde(default)]
    albums: Option<Vec<Album>>,
    #[serde(default)]
    unorganized: Option<Vec<Version>>,
    #[serde(default)]
    inbox: Option<Vec<Version>>,
    #[serde(default, rename = "looseTracks")]
    loose_tracks: Option<Vec<Version>>,
}

/// A decoded document
#[derive(Debug)]
pub(crate) struct Decoded {
    pub db: ProjectsDb,
    /// A legacy inbox field was present; the document should be rewritten
    pub migrated: bool,
}

pub(crate) fn decode(text: &str) -> Result<Decoded> {
    let stored: StoredDocument = serde_json::from_str(text)?;
    let migrated = stored.inbox.is_some() || stored.loose_tracks.is_some();

    let unorganized = stored
        .unorganized
        .or(stored.inbox)
        .or(stored.loose_tracks)
        .unwrap_or_default();

    Ok(Decoded {
        db: ProjectsDb {
            albums: stored.albums.unwrap_or_default(),
            unorganized,
        },
        migrated,
    })
}

pub(crate) fn encode(db: &ProjectsDb) -> Result<String> {
    Ok(serde_json::to_string_pretty(db)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERSION: &str =
        r#"{"id":"v1","name":"a","path":"/a.flp","type":"flp","lastModified":1}"#;

    #[test]
    fn current_shape() {
        let decoded = decode(&format!(r#"{{"albums":[],"unorganized":[{VERSION}]}}"#)).unwrap();
        assert!(!decoded.migrated);
        assert_eq!(decoded.db.unorganized.len(), 1);
    }

    #[test]
    fn empty_object_defaults_everything() {
        let decoded = decode("{}").unwrap();
        assert!(!decoded.migrated);
        assert_eq!(decoded.db, ProjectsDb::default());
    }

    #[test]
    fn null_fields_default() {
        let decoded = decode(r#"{"albums":null,"unorganized":null}"#).unwrap();
        assert_eq!(decoded.db, ProjectsDb::default());
    }

    #[test]
    fn inbox_alias_migrates() {
        let decoded = decode(&format!(r#"{{"inbox":[{VERSION}]}}"#)).unwrap();
        assert!(decoded.migrated);
        assert_eq!(decoded.db.unorganized[0].id.as_str(), "v1");
    }

    #[test]
    fn loose_tracks_alias_migrates() {
        let decoded = decode(&format!(r#"{{"looseTracks":[{VERSION}]}}"#)).unwrap();
        assert!(decoded.migrated);
        assert_eq!(decoded.db.unorganized.len(), 1);
    }

    #[test]
    fn empty_unorganized_wins_over_inbox() {
        let decoded = decode(&format!(r#"{{"unorganized":[],"inbox":[{VERSION}]}}"#)).unwrap();
        assert!(decoded.migrated);
        assert!(decoded.db.unorganized.is_empty());
    }

    #[test]
    fn encoded_document_has_no_legacy_fields() {
        let text = encode(&ProjectsDb::default()).unwrap();
        assert!(text.contains("\"unorganized\""));
        assert!(!text.contains("inbox"));
        assert!(!text.contains("looseTracks"));
    }
}
