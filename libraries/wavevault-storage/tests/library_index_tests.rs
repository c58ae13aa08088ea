//! Integration tests for the library index tables


use std::path::Path;
use test_helpers::{entry, setup_test_db};
use wavevault_core::{FileRecord, FileRecordSink, Instrument, SampleKind};
use wavevault_storage::{library_files, library_folders, run_migrations, SqliteLibraryIndex};

#[tokio::test]
async fn migrations_are_idempotent() {
    let pool = setup_test_db().await;
    run_migrations(&pool).await.unwrap();
    assert_eq!(library_files::count(&pool).await.unwrap(), 0);
}

#[tokio::test]
async fn folder_upsert_keeps_id_stable() {
    let pool = setup_test_db().await;

    let first = library_folders::upsert(&pool, Path::new("/samples/drums"), "drums")
        .await
        .unwrap();
    let again = library_folders::upsert(&pool, Path::new("/samples/drums"), "Drums")
        .await
        .unwrap();

    assert_eq!(first.id, again.id);
    assert_eq!(again.name, "Drums");
    assert_eq!(library_folders::get_all(&pool).await.unwrap().len(), 1);
}

#[tokio::test]
async fn folder_lookup_by_path() {
    let pool = setup_test_db().await;
    library_folders::upsert(&pool, Path::new("/b"), "b").await.unwrap();
    library_folders::upsert(&pool, Path::new("/a"), "a").await.unwrap();

    let names: Vec<String> = library_folders::get_all(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(names, vec!["a", "b"]);

    assert!(library_folders::get_by_path(&pool, Path::new("/c"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn file_round_trips_through_table() {
    let pool = setup_test_db().await;
    let folder = library_folders::upsert(&pool, Path::new("/samples"), "samples")
        .await
        .unwrap();
    let stored = entry(&folder.id, "/samples/Kick_Cmin.wav", 0);

    library_files::upsert(&pool, &stored).await.unwrap();

    let loaded = library_files::get_by_path(&pool, Path::new("/samples/Kick_Cmin.wav"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded, stored);
}

#[tokio::test]
async fn rescan_overwrites_by_path() {
    let pool = setup_test_db().await;
    let folder = library_folders::upsert(&pool, Path::new("/samples"), "samples")
        .await
        .unwrap();

    library_files::upsert(&pool, &entry(&folder.id, "/samples/loop.wav", 120))
        .await
        .unwrap();

    let mut failed = entry(&folder.id, "/samples/loop.wav", 0);
    failed.record = FileRecord::failed("/samples/loop.wav", "corrupt header");
    failed.instrument = None;
    failed.sample_kind = SampleKind::Loop;
    library_files::upsert(&pool, &failed).await.unwrap();

    assert_eq!(library_files::count(&pool).await.unwrap(), 1);
    let loaded = library_files::get_by_path(&pool, Path::new("/samples/loop.wav"))
        .await
        .unwrap()
        .unwrap();
    assert!(!loaded.record.success);
    assert_eq!(loaded.record.error.as_deref(), Some("corrupt header"));
    assert_eq!(loaded.instrument, None);
    assert_eq!(loaded.sample_kind, SampleKind::Loop);
}

#[tokio::test]
async fn files_are_listed_per_folder() {
    let pool = setup_test_db().await;
    let drums = library_folders::upsert(&pool, Path::new("/drums"), "drums")
        .await
        .unwrap();
    let keys = library_folders::upsert(&pool, Path::new("/keys"), "keys")
        .await
        .unwrap();

    for path in ["/drums/b.wav", "/drums/a.wav"] {
        library_files::upsert(&pool, &entry(&drums.id, path, 90))
            .await
            .unwrap();
    }
    library_files::upsert(&pool, &entry(&keys.id, "/keys/c.wav", 90))
        .await
        .unwrap();

    let listed: Vec<String> = library_files::get_by_folder(&pool, &drums.id)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.file_name)
        .collect();
    assert_eq!(listed, vec!["a.wav", "b.wav"]);
    assert_eq!(library_files::count(&pool).await.unwrap(), 3);
}

#[tokio::test]
async fn sqlite_index_implements_sink() {
    let pool = setup_test_db().await;
    let index = SqliteLibraryIndex::new(pool.clone());

    let folder = index
        .upsert_folder(Path::new("/samples"), "samples")
        .await
        .unwrap();
    let mut e = entry(&folder.id, "/samples/Hat.wav", 0);
    e.instrument = Some(Instrument::HiHat);
    index.upsert_entry(&e).await.unwrap();

    let loaded = library_files::get_by_folder(&pool, &folder.id).await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].instrument, Some(Instrument::HiHat));
}

#[tokio::test]
async fn entry_for_unknown_folder_is_rejected() {
    let pool = setup_test_db().await;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .unwrap();
    let index = SqliteLibraryIndex::new(pool);

    let orphan = entry(&wavevault_core::FolderId::new("missing"), "/x.wav", 0);
    assert!(index.upsert_entry(&orphan).await.is_err());
}
