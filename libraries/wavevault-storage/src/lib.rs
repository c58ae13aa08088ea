//! WaveVault Storage
//!
//! `SQLite` tables for the local sample library index.
//!
//! # Architecture
//!
//! - **Vertical Slicing**: each table owns its own queries (`library_folders`, `library_files`)
//! - **Keyed by path**: rescanning a file overwrites its row, last write wins
//! - **Sink adapter**: [`SqliteLibraryIndex`] plugs the tables into the library indexer
//!
//! # Example
//!
//! ```rust,no_run
//! use wavevault_storage::{create_pool, library_files, run_migrations};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://data/wavevault.db").await?;
//! run_migrations(&pool).await?;
//!
//! let indexed = library_files::count(&pool).await?;
//! println!("{indexed} files indexed");
//! # Ok(())
//! # }
//! ```

mod error;
mod index;

// Vertical slices
pub mod library_files;
pub mod library_folders;

pub use error::{Result, StorageError};
pub use index::SqliteLibraryIndex;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// Safe to call on every start; applied migrations are skipped.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `sqlite://data/wavevault.db`)
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!(url = database_url, "Creating SQLite pool");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}
