/// Local library indexer
use crate::error::{MetadataError, Result};
use crate::heuristics::{guess_instrument, guess_sample_kind, key_from_file_name};
use crate::pool::MetadataWorkerPool;
use crate::DEFAULT_AUDIO_EXTENSIONS;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use walkdir::{DirEntry, WalkDir};
use wavevault_core::{FileRecord, FileRecordSink, FolderId, LibraryEntry, LibraryFolder};
use wavevault_tasks::BoundedTaskQueue;

/// Index configuration
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Audio file extensions, lower-case, without the dot
    pub extensions: Vec<String>,

    /// Maximum extractions in flight (default: 8, capped by the pool's worker count)
    pub concurrency: usize,

    /// Skip directories whose name starts with a dot (default: true)
    pub skip_hidden: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_AUDIO_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
            concurrency: 8,
            skip_hidden: true,
        }
    }
}

/// Index progress updates
#[derive(Debug, Clone)]
pub enum IndexProgress {
    /// Discovery finished, extraction starting
    Started { total_files: usize },

    /// One file extracted (sent in completion order)
    FileIndexed {
        path: PathBuf,
        success: bool,
        error: Option<String>,
    },

    /// Indexing completed
    Completed { stats: IndexStats },
}

/// Index statistics
#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    /// Number of audio files discovered
    pub files_discovered: usize,

    /// Files whose metadata was extracted
    pub files_indexed: usize,

    /// Files whose extraction failed (still stored, with `success == false`)
    pub files_failed: usize,

    /// Entries the sink refused to store
    pub store_errors: Vec<(PathBuf, String)>,
}

/// Result of indexing one folder
#[derive(Debug, Clone)]
pub struct IndexReport {
    pub folder: LibraryFolder,
    /// One entry per discovered file, in discovery order
    pub entries: Vec<LibraryEntry>,
    pub stats: IndexStats,
}

/// Scans a folder, extracts metadata through the worker pool and hands every
/// entry to a [`FileRecordSink`]
pub struct LibraryIndexer<S: FileRecordSink> {
    pool: Arc<MetadataWorkerPool>,
    sink: Arc<S>,
    config: IndexConfig,
}

impl<S: FileRecordSink> LibraryIndexer<S> {
    /// Create an indexer with the default configuration
    pub fn new(pool: Arc<MetadataWorkerPool>, sink: Arc<S>) -> Self {
        Self::with_config(pool, sink, IndexConfig::default())
    }

    /// Create an indexer with custom configuration
    pub fn with_config(pool: Arc<MetadataWorkerPool>, sink: Arc<S>, config: IndexConfig) -> Self {
        Self { pool, sink, config }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Index a folder (or a single file, registered under its parent folder)
    ///
    /// Extraction failures never abort the run; they are stored as failed
    /// entries. Only discovery and folder registration errors are returned.
    pub async fn index(
        &self,
        path: &Path,
        progress_tx: Option<mpsc::Sender<IndexProgress>>,
    ) -> Result<IndexReport> {
        let files = self.discover_files(path)?;
        let root = if path.is_file() {
            path.parent().unwrap_or(path)
        } else {
            path
        };

        let folder_name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        let folder = self.sink.upsert_folder(root, &folder_name).await?;

        let mut stats = IndexStats {
            files_discovered: files.len(),
            ..IndexStats::default()
        };

        tracing::info!(
            folder = %root.display(),
            files = files.len(),
            "Indexing library folder"
        );

        if let Some(ref tx) = progress_tx {
            let _ = tx
                .send(IndexProgress::Started {
                    total_files: files.len(),
                })
                .await;
        }

        let limit = self.config.concurrency.min(self.pool.workers()).max(1);
        let queue = BoundedTaskQueue::new(limit);
        let tasks: Vec<_> = files
            .into_iter()
            .map(|file| {
                let tx = progress_tx.clone();
                let pool = &self.pool;
                move || async move {
                    let record = pool.extract(file).await;
                    if let Some(tx) = tx {
                        let _ = tx
                            .send(IndexProgress::FileIndexed {
                                path: record.path.clone(),
                                success: record.success,
                                error: record.error.clone(),
                            })
                            .await;
                    }
                    record
                }
            })
            .collect();
        let records = queue.run_infallible(tasks).await;

        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            if record.success {
                stats.files_indexed += 1;
            } else {
                stats.files_failed += 1;
                tracing::debug!(
                    path = %record.path.display(),
                    error = record.error.as_deref().unwrap_or_default(),
                    "Metadata extraction failed"
                );
            }

            let entry = build_entry(&folder.id, record).await;
            if let Err(e) = self.sink.upsert_entry(&entry).await {
                tracing::warn!(path = %entry.record.path.display(), "Failed to store library entry: {}", e);
                stats
                    .store_errors
                    .push((entry.record.path.clone(), e.to_string()));
            }
            entries.push(entry);
        }

        tracing::info!(
            folder = %root.display(),
            indexed = stats.files_indexed,
            failed = stats.files_failed,
            store_errors = stats.store_errors.len(),
            "Library folder indexed"
        );

        if let Some(ref tx) = progress_tx {
            let _ = tx
                .send(IndexProgress::Completed {
                    stats: stats.clone(),
                })
                .await;
        }

        Ok(IndexReport {
            folder,
            entries,
            stats,
        })
    }

    /// Discover audio files recursively, sorted by path within each directory
    fn discover_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if !path.exists() {
            return Err(MetadataError::FileNotFound(path.display().to_string()));
        }

        if path.is_file() {
            return if self.is_supported_file(path) {
                Ok(vec![path.to_path_buf()])
            } else {
                Err(MetadataError::InvalidPath(format!(
                    "not a supported audio file: {}",
                    path.display()
                )))
            };
        }

        let skip_hidden = self.config.skip_hidden;
        let mut files = Vec::new();

        for entry in WalkDir::new(path)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !(skip_hidden && is_hidden_dir(e)))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if entry.file_type().is_file() && self.is_supported_file(entry.path()) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    fn is_supported_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.config.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
            })
            .unwrap_or(false)
    }
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_string_lossy().starts_with('.')
}

/// Enrich an extraction result with file-name heuristics and the file size
async fn build_entry(folder_id: &FolderId, record: FileRecord) -> LibraryEntry {
    let file_name = record
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let size_bytes = tokio::fs::metadata(&record.path)
        .await
        .map(|m| m.len())
        .unwrap_or(0);

    LibraryEntry {
        folder_id: folder_id.clone(),
        instrument: guess_instrument(&file_name),
        sample_kind: guess_sample_kind(&file_name, record.duration),
        key: record.key.clone().or_else(|| key_from_file_name(&file_name)),
        file_name,
        size_bytes,
        record,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavevault_core::{Instrument, SampleKind};

    #[test]
    fn test_index_config_default() {
        let config = IndexConfig::default();
        assert_eq!(config.concurrency, 8);
        assert!(config.skip_hidden);
        assert!(config.extensions.contains(&"aiff".to_string()));
        assert!(!config.extensions.contains(&"flp".to_string()));
    }

    #[tokio::test]
    async fn entry_takes_key_from_name_when_tags_have_none() {
        let record = FileRecord {
            path: PathBuf::from("/nowhere/Bass_Loop_Fmin_124.wav"),
            duration: 7.7,
            bpm: 124,
            key: None,
            category: None,
            success: true,
            error: None,
        };

        let entry = build_entry(&FolderId::new("f1"), record).await;
        assert_eq!(entry.file_name, "Bass_Loop_Fmin_124.wav");
        assert_eq!(entry.key.as_deref(), Some("F Minor"));
        assert_eq!(entry.instrument, Some(Instrument::Bass));
        assert_eq!(entry.sample_kind, SampleKind::Loop);
        assert_eq!(entry.size_bytes, 0);
    }

    #[tokio::test]
    async fn tagged_key_wins_over_file_name() {
        let mut record = FileRecord::failed("/x/Lead_Cmin.wav", "boom");
        record.key = Some("8A".to_string());

        let entry = build_entry(&FolderId::new("f1"), record).await;
        assert_eq!(entry.key.as_deref(), Some("8A"));
        assert_eq!(entry.sample_kind, SampleKind::OneShot);
    }
}
