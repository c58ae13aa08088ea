//! Library folders storage (scanned roots)
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use wavevault_storage::library_folders;
//!
//! # async fn example(pool: &sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
//! let folder = library_folders::upsert(pool, Path::new("/samples/drums"), "drums").await?;
//! let all = library_folders::get_all(pool).await?;
//! # Ok(())
//! # }
//! ```

use crate::Result;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use wavevault_core::{FolderId, LibraryFolder};

#[derive(sqlx::FromRow)]
struct FolderRow {
    id: String,
    path: String,
    name: String,
}

impl From<FolderRow> for LibraryFolder {
    fn from(r: FolderRow) -> Self {
        LibraryFolder {
            id: FolderId::new(r.id),
            path: PathBuf::from(r.path),
            name: r.name,
        }
    }
}

/// Register a folder, or rename it if its path is already known
///
/// The folder id is assigned once and stays stable across rescans.
pub async fn upsert(pool: &SqlitePool, path: &Path, name: &str) -> Result<LibraryFolder> {
    let path_str = path.to_string_lossy();

    sqlx::query(
        r#"
        INSERT INTO library_folders (id, path, name)
        VALUES (?, ?, ?)
        ON CONFLICT(path) DO UPDATE SET name = excluded.name
        "#,
    )
    .bind(FolderId::generate().to_string())
    .bind(&*path_str)
    .bind(name)
    .execute(pool)
    .await?;

    get_by_path(pool, path)
        .await?
        .ok_or_else(|| crate::StorageError::not_found("library folder", path_str.into_owned()))
}

/// Get a folder by its path
pub async fn get_by_path(pool: &SqlitePool, path: &Path) -> Result<Option<LibraryFolder>> {
    let row = sqlx::query_as::<_, FolderRow>(
        r#"
        SELECT id, path, name
        FROM library_folders
        WHERE path = ?
        "#,
    )
    .bind(path.to_string_lossy().into_owned())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(LibraryFolder::from))
}

/// Get all registered folders
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<LibraryFolder>> {
    let rows = sqlx::query_as::<_, FolderRow>(
        r#"
        SELECT id, path, name
        FROM library_folders
        ORDER BY name, path
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(LibraryFolder::from).collect())
}
