//! Subcommand implementations
//!
//! Reorganisation commands work on any [`ProjectStore`] so they can be driven
//! over an in-memory backend; `index` wires the metadata pool to `SQLite`.

use crate::config::VaultConfig;
use crate::error::Result;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use wavevault_core::{AlbumId, ProjectsDb, TrackId, VersionId};
use wavevault_metadata::indexer::IndexStats;
use wavevault_metadata::{
    IndexProgress, LibraryIndexer, LoftyMetadataReader, MetadataWorkerPool, ProcessClassifier,
};
use wavevault_projects::{PersistenceBackend, ProjectScanner, ProjectStore};
use wavevault_storage::SqliteLibraryIndex;

/// Result of a single command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done(String),
    /// The referenced entity was missing or the move was refused
    NotFound(String),
}

impl Outcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Outcome::Done(msg) | Outcome::NotFound(msg) => msg,
        }
    }
}

pub fn create_album<B: PersistenceBackend>(
    store: &mut ProjectStore<B>,
    name: &str,
    artist: &str,
) -> Outcome {
    let album = store.create_album(name, artist);
    Outcome::Done(format!("Created album {} ({})", album.id, album.name))
}

pub fn create_track<B: PersistenceBackend>(
    store: &mut ProjectStore<B>,
    name: &str,
    album_id: &str,
) -> Outcome {
    match store.create_track(name, &AlbumId::new(album_id)) {
        Some(track) => Outcome::Done(format!("Created track {} ({})", track.id, track.name)),
        None => Outcome::NotFound(format!("Album not found: {album_id}")),
    }
}

pub fn move_version<B: PersistenceBackend>(
    store: &mut ProjectStore<B>,
    version_id: &str,
    track_id: &str,
) -> Outcome {
    if store.move_version_to_track(&VersionId::new(version_id), &TrackId::new(track_id)) {
        Outcome::Done(format!("Moved {version_id} to track {track_id}"))
    } else {
        Outcome::NotFound(format!(
            "Version {version_id} is not in the inbox or track {track_id} does not exist"
        ))
    }
}

pub fn unorganize_version<B: PersistenceBackend>(
    store: &mut ProjectStore<B>,
    version_id: &str,
) -> Outcome {
    if store.unorganize_version(&VersionId::new(version_id)) {
        Outcome::Done(format!("Moved {version_id} back to the inbox"))
    } else {
        Outcome::NotFound(format!("Version {version_id} is not inside a track"))
    }
}

pub fn delete_version<B: PersistenceBackend>(
    store: &mut ProjectStore<B>,
    version_id: &str,
) -> Outcome {
    if store.delete_version(&VersionId::new(version_id)) {
        Outcome::Done(format!("Deleted version {version_id}"))
    } else {
        Outcome::NotFound(format!("Version not found: {version_id}"))
    }
}

/// Import every project file under `root` into the inbox
pub fn scan_projects<B: PersistenceBackend>(store: &mut ProjectStore<B>, root: &Path) -> Outcome {
    let summary = ProjectScanner::new().import_into(root, store);
    Outcome::Done(format!(
        "Found {} project files, {} new in the inbox",
        summary.scanned.len(),
        summary.added
    ))
}

/// Indented tree of albums, tracks and the inbox
pub fn render_tree(db: &ProjectsDb) -> String {
    let mut out = String::new();

    for album in &db.albums {
        let _ = writeln!(out, "{} [{}] by {}", album.name, album.id, album.artist);
        for track in &album.tracks {
            let _ = writeln!(
                out,
                "  {} [{}] {} ({} versions)",
                track.name,
                track.id,
                track.status,
                track.versions.len()
            );
            for version in &track.versions {
                let _ = writeln!(out, "    {} [{}] {}", version.name, version.id, version.path.display());
            }
        }
    }

    let _ = writeln!(out, "Inbox ({})", db.unorganized.len());
    for version in &db.unorganized {
        let _ = writeln!(out, "  {} [{}] {}", version.name, version.id, version.path.display());
    }

    out
}

/// Index a sample folder into the `SQLite` library database
pub async fn index(config: &VaultConfig, folder: &Path) -> Result<IndexStats> {
    let url = &config.paths.library_db_url;
    ensure_sqlite_parent(url).await?;

    let db = wavevault_storage::create_pool(url).await?;
    wavevault_storage::run_migrations(&db).await?;
    let sink = Arc::new(SqliteLibraryIndex::new(db));

    let mut builder = MetadataWorkerPool::builder(Arc::new(LoftyMetadataReader::new()))
        .workers(config.scan.workers)
        .task_timeout(config.scan.task_timeout());
    if config.classifier.enabled {
        tracing::info!(program = %config.classifier.program.display(), "Using external classifier");
        builder = builder.classifier(Arc::new(
            ProcessClassifier::new(&config.classifier.program)
                .with_args(config.classifier.args.iter().cloned())
                .with_timeout(config.classifier.timeout()),
        ));
    }
    let pool = Arc::new(builder.build()?);

    let indexer = LibraryIndexer::with_config(pool, sink, config.scan.index_config());

    let (tx, mut rx) = mpsc::channel(100);
    let progress = tokio::spawn(async move {
        let mut total = 0;
        let mut done = 0;
        while let Some(event) = rx.recv().await {
            match event {
                IndexProgress::Started { total_files } => {
                    total = total_files;
                    tracing::info!("Found {} audio files", total_files);
                }
                IndexProgress::FileIndexed { path, success, error } => {
                    done += 1;
                    if success {
                        tracing::debug!("[{}/{}] {}", done, total, path.display());
                    } else {
                        tracing::warn!(
                            "[{}/{}] {}: {}",
                            done,
                            total,
                            path.display(),
                            error.unwrap_or_default()
                        );
                    }
                }
                IndexProgress::Completed { .. } => {}
            }
        }
    });

    let report = indexer.index(folder, Some(tx)).await;
    // The indexer dropped its sender, so the progress task drains and ends
    let _ = progress.await;
    let report = report?;

    Ok(report.stats)
}

/// `SQLite` creates the database file but not its directory
async fn ensure_sqlite_parent(url: &str) -> Result<()> {
    let Some(path) = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
    else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}
