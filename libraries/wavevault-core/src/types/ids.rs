/// ID types for WaveVault entities
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the inner string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Album (collection) identifier, `ALB-<millis>` when generated by the store
    AlbumId
);

string_id!(
    /// Track identifier, `TRK-<millis>` when generated by the store
    TrackId
);

string_id!(
    /// Version identifier, `VER-<inode>` when produced by the project scanner
    VersionId
);

string_id!(
    /// Library folder identifier
    FolderId
);

impl FolderId {
    /// Generate a new random folder ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}
