/// DAW project-file scanner
use crate::backend::PersistenceBackend;
use crate::store::ProjectStore;
use chrono::{DateTime, Utc};
use std::fs::Metadata;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};
use wavevault_core::{Version, VersionId, VersionKind};

/// Folder names never descended into
const SKIPPED_DIRS: &[&str] = &["node_modules", "Backup"];

/// A project file found on disk
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedProject {
    pub version: Version,
    /// First folder below the scan root, a natural album name
    pub album_hint: Option<String>,
}

/// Outcome of scanning a root into a store
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub scanned: Vec<ScannedProject>,
    /// Versions that were not in the inbox yet
    pub added: usize,
}

/// Finds `.flp` project files and `.zip` project archives under a root folder
#[derive(Debug, Clone, Default)]
pub struct ProjectScanner;

impl ProjectScanner {
    pub fn new() -> Self {
        Self
    }

    /// Walk `root` and describe every project file found
    ///
    /// Hidden folders, `node_modules` and `Backup` are skipped, as are files
    /// whose path is not valid UTF-8. An unreadable root yields an empty list.
    pub fn scan(&self, root: &Path) -> Vec<ScannedProject> {
        if let Err(e) = std::fs::read_dir(root) {
            tracing::error!(root = %root.display(), "Cannot scan for projects: {}", e);
            return Vec::new();
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped_dir(e))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(kind) = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(VersionKind::from_extension)
            else {
                continue;
            };

            // The projects document is JSON and cannot hold such a path
            if entry.path().to_str().is_none() {
                tracing::warn!(path = %entry.path().display(), "Skipping project file with a non UTF-8 path");
                continue;
            }

            match entry.metadata() {
                Ok(metadata) => found.push(describe(root, entry.path(), kind, &metadata)),
                Err(e) => tracing::warn!(path = %entry.path().display(), "Cannot stat project file: {}", e),
            }
        }

        tracing::info!(root = %root.display(), projects = found.len(), "Project scan finished");
        found
    }

    /// Scan `root` and add every project file to the store's inbox
    ///
    /// Files already in the inbox (same path) are left alone.
    pub fn import_into<B: PersistenceBackend>(
        &self,
        root: &Path,
        store: &mut ProjectStore<B>,
    ) -> ImportSummary {
        let scanned = self.scan(root);
        let added = scanned
            .iter()
            .filter(|project| store.add_to_unorganized(project.version.clone()))
            .count();

        ImportSummary { scanned, added }
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

fn describe(root: &Path, path: &Path, kind: VersionKind, metadata: &Metadata) -> ScannedProject {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let last_modified = metadata
        .modified()
        .map(|t| DateTime::<Utc>::from(t).timestamp_millis())
        .unwrap_or(0);

    // Only folders count: a file directly under the root has no hint
    let album_hint = path
        .strip_prefix(root)
        .ok()
        .and_then(Path::parent)
        .and_then(|parent| parent.components().next())
        .map(|c| c.as_os_str().to_string_lossy().into_owned());

    ScannedProject {
        version: Version::new(
            version_id(path, metadata),
            name,
            path.to_path_buf(),
            kind,
            last_modified,
        ),
        album_hint,
    }
}

/// `VER-<inode>`: stable across renames within the same filesystem
#[cfg(unix)]
fn version_id(_path: &Path, metadata: &Metadata) -> VersionId {
    use std::os::unix::fs::MetadataExt;
    VersionId::new(format!("VER-{}", metadata.ino()))
}

/// No inode available: derive the id from the path instead
#[cfg(not(unix))]
fn version_id(path: &Path, _metadata: &Metadata) -> VersionId {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    VersionId::new(format!("VER-{:x}", hasher.finish()))
}
