//! Library files storage (one row per indexed audio file)
//!
//! Rows are keyed by path. Indexing the same file again replaces its row.

use crate::Result;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use wavevault_core::{FileRecord, FolderId, Instrument, LibraryEntry, SampleKind};

#[derive(sqlx::FromRow)]
struct FileRow {
    path: String,
    folder_id: String,
    file_name: String,
    size_bytes: i64,
    duration: f64,
    bpm: i64,
    tag_key: Option<String>,
    musical_key: Option<String>,
    category: Option<String>,
    instrument: Option<String>,
    sample_kind: String,
    success: bool,
    error: Option<String>,
}

impl From<FileRow> for LibraryEntry {
    fn from(r: FileRow) -> Self {
        LibraryEntry {
            record: FileRecord {
                path: PathBuf::from(r.path),
                duration: r.duration,
                bpm: u32::try_from(r.bpm).unwrap_or(0),
                key: r.tag_key,
                category: r.category,
                success: r.success,
                error: r.error,
            },
            folder_id: FolderId::new(r.folder_id),
            file_name: r.file_name,
            size_bytes: u64::try_from(r.size_bytes).unwrap_or(0),
            instrument: r.instrument.as_deref().and_then(Instrument::parse),
            sample_kind: SampleKind::parse(&r.sample_kind).unwrap_or(SampleKind::OneShot),
            key: r.musical_key,
        }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT path, folder_id, file_name, size_bytes, duration, bpm, tag_key,
           musical_key, category, instrument, sample_kind, success, error
    FROM library_files
"#;

/// Insert or replace the row for `entry.record.path`
pub async fn upsert(pool: &SqlitePool, entry: &LibraryEntry) -> Result<()> {
    let record = &entry.record;

    sqlx::query(
        r#"
        INSERT INTO library_files (
            path, folder_id, file_name, size_bytes, duration, bpm, tag_key,
            musical_key, category, instrument, sample_kind, success, error, indexed_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(path) DO UPDATE SET
            folder_id = excluded.folder_id,
            file_name = excluded.file_name,
            size_bytes = excluded.size_bytes,
            duration = excluded.duration,
            bpm = excluded.bpm,
            tag_key = excluded.tag_key,
            musical_key = excluded.musical_key,
            category = excluded.category,
            instrument = excluded.instrument,
            sample_kind = excluded.sample_kind,
            success = excluded.success,
            error = excluded.error,
            indexed_at = excluded.indexed_at
        "#,
    )
    .bind(record.path.to_string_lossy().into_owned())
    .bind(entry.folder_id.as_str())
    .bind(entry.file_name.as_str())
    .bind(i64::try_from(entry.size_bytes).unwrap_or(i64::MAX))
    .bind(record.duration)
    .bind(i64::from(record.bpm))
    .bind(record.key.as_deref())
    .bind(entry.key.as_deref())
    .bind(record.category.as_deref())
    .bind(entry.instrument.map(Instrument::as_str))
    .bind(entry.sample_kind.as_str())
    .bind(record.success)
    .bind(record.error.as_deref())
    .bind(chrono::Utc::now().timestamp())
    .execute(pool)
    .await?;

    Ok(())
}

/// Get the row for one file
pub async fn get_by_path(pool: &SqlitePool, path: &Path) -> Result<Option<LibraryEntry>> {
    let row = sqlx::query_as::<_, FileRow>(&format!("{SELECT_COLUMNS} WHERE path = ?"))
        .bind(path.to_string_lossy().into_owned())
        .fetch_optional(pool)
        .await?;

    Ok(row.map(LibraryEntry::from))
}

/// All files indexed under a folder, ordered by path
pub async fn get_by_folder(pool: &SqlitePool, folder_id: &FolderId) -> Result<Vec<LibraryEntry>> {
    let rows = sqlx::query_as::<_, FileRow>(&format!(
        "{SELECT_COLUMNS} WHERE folder_id = ? ORDER BY path"
    ))
    .bind(folder_id.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(LibraryEntry::from).collect())
}

/// Number of indexed files
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM library_files")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
