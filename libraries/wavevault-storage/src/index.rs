//! `FileRecordSink` backed by the library tables

use crate::{library_files, library_folders};
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::path::Path;
use wavevault_core::{FileRecordSink, LibraryEntry, LibraryFolder};

/// Library index stored in `SQLite`
#[derive(Clone)]
pub struct SqliteLibraryIndex {
    pool: SqlitePool,
}

impl SqliteLibraryIndex {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl FileRecordSink for SqliteLibraryIndex {
    async fn upsert_folder(&self, path: &Path, name: &str) -> wavevault_core::Result<LibraryFolder> {
        Ok(library_folders::upsert(&self.pool, path, name).await?)
    }

    async fn upsert_entry(&self, entry: &LibraryEntry) -> wavevault_core::Result<()> {
        Ok(library_files::upsert(&self.pool, entry).await?)
    }
}
