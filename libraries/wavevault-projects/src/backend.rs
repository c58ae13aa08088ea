//! Persistence backends for the projects document
//!
//! A backend stores one opaque text document. `read` answers `None` when
//! nothing has been persisted yet.

use crate::error::{ProjectStoreError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

pub trait PersistenceBackend: Send + Sync {
    /// Read the whole document, `None` if it does not exist yet
    fn read(&self) -> Result<Option<String>>;

    /// Replace the whole document
    fn write(&self, contents: &str) -> Result<()>;

    /// Human-readable location for log messages
    fn describe(&self) -> String;

    /// Set the current document aside before it gets overwritten
    ///
    /// Called before the first save that follows a failed load.
    fn preserve(&self) -> Result<()> {
        Ok(())
    }
}

/// Document stored as a JSON file on disk
///
/// Writes go to a sibling temporary file that is then renamed over the
/// target, so a crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where [`preserve`](PersistenceBackend::preserve) moves an unreadable document
    pub fn backup_path(&self) -> PathBuf {
        self.sibling(".bak")
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

impl PersistenceBackend for JsonFileBackend {
    fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ProjectStoreError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write(&self, contents: &str) -> Result<()> {
        let write_err = |source| ProjectStoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let temp = self.temp_path();
        fs::write(&temp, contents).map_err(write_err)?;
        fs::rename(&temp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp);
            write_err(e)
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn preserve(&self) -> Result<()> {
        let backup = self.backup_path();
        match fs::rename(&self.path, &backup) {
            Ok(()) => {
                tracing::warn!(backup = %backup.display(), "Unreadable projects document moved aside");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ProjectStoreError::Write {
                path: backup,
                source,
            }),
        }
    }
}

/// In-memory document, shared between clones
///
/// Clone it before handing it to a store to keep a handle for inspecting
/// what was written or for injecting failures.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    contents: Arc<Mutex<Option<String>>>,
    backup: Arc<Mutex<Option<String>>>,
    writes: Arc<AtomicUsize>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that already holds a persisted document
    pub fn with_contents(contents: impl Into<String>) -> Self {
        let backend = Self::default();
        *backend.lock() = Some(contents.into());
        backend
    }

    /// Current document, if any
    pub fn contents(&self) -> Option<String> {
        self.lock().clone()
    }

    /// Document set aside by `preserve`, if any
    pub fn backup(&self) -> Option<String> {
        self.backup
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of successful writes
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.contents.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PersistenceBackend for MemoryBackend {
    fn read(&self) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ProjectStoreError::Backend("simulated read failure".to_string()));
        }
        Ok(self.contents())
    }

    fn write(&self, contents: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ProjectStoreError::Backend("simulated write failure".to_string()));
        }
        *self.lock() = Some(contents.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn preserve(&self) -> Result<()> {
        let current = self.contents();
        if current.is_some() {
            *self.backup.lock().unwrap_or_else(PoisonError::into_inner) = current;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("projects_v2.json"));
        assert!(backend.read().unwrap().is_none());
    }

    #[test]
    fn write_creates_parent_and_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/data/projects_v2.json");
        let backend = JsonFileBackend::new(&path);

        backend.write("{\"albums\":[]}").unwrap();
        backend.write("{\"albums\":[],\"unorganized\":[]}").unwrap();

        assert_eq!(
            backend.read().unwrap().as_deref(),
            Some("{\"albums\":[],\"unorganized\":[]}")
        );
        assert!(!dir.path().join("nested/data/projects_v2.json.tmp").exists());
    }

    #[test]
    fn preserve_moves_the_document_to_a_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("projects_v2.json");
        fs::write(&path, "{broken").unwrap();
        let backend = JsonFileBackend::new(&path);

        backend.preserve().unwrap();
        assert!(!path.exists());
        assert_eq!(fs::read_to_string(backend.backup_path()).unwrap(), "{broken");

        // Nothing left to move
        backend.preserve().unwrap();
    }

    #[test]
    fn memory_backend_clones_share_contents() {
        let backend = MemoryBackend::new();
        let handle = backend.clone();

        backend.write("x").unwrap();
        assert_eq!(handle.contents().as_deref(), Some("x"));
        assert_eq!(handle.write_count(), 1);

        handle.set_fail_writes(true);
        assert!(backend.write("y").is_err());
        assert_eq!(backend.contents().as_deref(), Some("x"));
    }
}
