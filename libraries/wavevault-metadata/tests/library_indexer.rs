//! Integration tests for the library indexer
//!
//! Real directories, scripted parser, in-memory sink


use std::fs;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use test_helpers::{init_tracing, MemorySink, ScriptedParser};
use tokio::sync::mpsc;
use wavevault_core::{Instrument, SampleKind};
use wavevault_metadata::{IndexConfig, IndexProgress, LibraryIndexer, MetadataError, MetadataWorkerPool};

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"RIFF\x00\x00\x00\x00WAVE").unwrap();
}

/// Layout used by most tests:
/// two good samples, one broken one, a text file and a hidden folder
fn sample_library() -> TempDir {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "Kick_01.wav");
    touch(dir.path(), "broken_fail.wav");
    touch(dir.path(), "sub/Bass_Loop_Fmin.AIFF");
    touch(dir.path(), "notes.txt");
    touch(dir.path(), ".cache/ghost.wav");
    dir
}

fn indexer(parser: Arc<ScriptedParser>, workers: usize, sink: Arc<MemorySink>) -> LibraryIndexer<MemorySink> {
    let pool = MetadataWorkerPool::builder(parser)
        .workers(workers)
        .task_timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    LibraryIndexer::new(Arc::new(pool), sink)
}

#[tokio::test]
async fn indexes_audio_files_and_skips_the_rest() {
    init_tracing();
    let dir = sample_library();
    let sink = Arc::new(MemorySink::default());
    let indexer = indexer(Arc::new(ScriptedParser::new()), 2, sink.clone());

    let report = indexer.index(dir.path(), None).await.unwrap();

    let names: Vec<&str> = report.entries.iter().map(|e| e.file_name.as_str()).collect();
    assert_eq!(names, vec!["Kick_01.wav", "broken_fail.wav", "Bass_Loop_Fmin.AIFF"]);
    assert_eq!(report.stats.files_discovered, 3);
    assert_eq!(report.stats.files_indexed, 2);
    assert_eq!(report.stats.files_failed, 1);
    assert!(report.stats.store_errors.is_empty());

    let folder_name = dir.path().file_name().unwrap().to_string_lossy().to_string();
    assert_eq!(report.folder.name, folder_name);

    // Failed extractions are stored too
    let entries = sink.entries.lock().await;
    assert_eq!(entries.len(), 3);
    let broken = &entries[&dir.path().join("broken_fail.wav")];
    assert!(!broken.record.success);
    assert_eq!(broken.folder_id, report.folder.id);
}

#[tokio::test]
async fn entries_carry_file_name_heuristics() {
    init_tracing();
    let dir = sample_library();
    let sink = Arc::new(MemorySink::default());
    let indexer = indexer(Arc::new(ScriptedParser::new()), 2, sink.clone());

    let report = indexer.index(dir.path(), None).await.unwrap();

    let kick = &report.entries[0];
    assert_eq!(kick.instrument, Some(Instrument::Kick));
    assert_eq!(kick.sample_kind, SampleKind::OneShot);
    assert_eq!(kick.record.bpm, 120);
    assert_eq!(kick.size_bytes, 12);

    let bass = &report.entries[2];
    assert_eq!(bass.instrument, Some(Instrument::Bass));
    assert_eq!(bass.sample_kind, SampleKind::Loop);
    assert_eq!(bass.key.as_deref(), Some("F Minor"));
}

#[tokio::test]
async fn reports_progress() {
    init_tracing();
    let dir = sample_library();
    let sink = Arc::new(MemorySink::default());
    let indexer = indexer(Arc::new(ScriptedParser::new()), 2, sink);

    let (tx, mut rx) = mpsc::channel(32);
    indexer.index(dir.path(), Some(tx)).await.unwrap();

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert!(matches!(events.first(), Some(IndexProgress::Started { total_files: 3 })));
    let indexed = events
        .iter()
        .filter(|e| matches!(e, IndexProgress::FileIndexed { .. }))
        .count();
    assert_eq!(indexed, 3);
    match events.last() {
        Some(IndexProgress::Completed { stats }) => assert_eq!(stats.files_failed, 1),
        other => panic!("expected Completed, got {:?}", other),
    }
}

#[tokio::test]
async fn sink_failures_are_counted_not_fatal() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "a_kick.wav");
    touch(dir.path(), "b_reject.wav");
    touch(dir.path(), "c_snare.wav");
    let sink = Arc::new(MemorySink::default());
    let indexer = indexer(Arc::new(ScriptedParser::new()), 2, sink.clone());

    let report = indexer.index(dir.path(), None).await.unwrap();

    assert_eq!(report.stats.store_errors.len(), 1);
    assert_eq!(report.stats.store_errors[0].0, dir.path().join("b_reject.wav"));
    assert!(report.stats.store_errors[0].1.contains("disk full"));
    assert_eq!(sink.entries.lock().await.len(), 2);
}

#[tokio::test]
async fn rescan_overwrites_by_path() {
    init_tracing();
    let dir = sample_library();
    let sink = Arc::new(MemorySink::default());
    let indexer = indexer(Arc::new(ScriptedParser::new()), 2, sink.clone());

    let first = indexer.index(dir.path(), None).await.unwrap();
    let second = indexer.index(dir.path(), None).await.unwrap();

    assert_eq!(first.folder.id, second.folder.id);
    assert_eq!(sink.folders.lock().await.len(), 1);
    assert_eq!(sink.entries.lock().await.len(), 3);
}

#[tokio::test]
async fn in_flight_extractions_respect_concurrency() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    for i in 0..8 {
        touch(dir.path(), &format!("hit_{i}.wav"));
    }
    let parser = Arc::new(ScriptedParser::new().working_for(Duration::from_millis(20)));
    let pool = MetadataWorkerPool::builder(parser.clone())
        .workers(4)
        .build()
        .unwrap();
    let config = IndexConfig {
        concurrency: 2,
        ..IndexConfig::default()
    };
    let indexer = LibraryIndexer::with_config(Arc::new(pool), Arc::new(MemorySink::default()), config);

    let report = indexer.index(dir.path(), None).await.unwrap();

    assert_eq!(report.stats.files_indexed, 8);
    assert!(parser.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(parser.calls.load(Ordering::SeqCst), 8);
}

#[tokio::test]
async fn single_file_is_registered_under_its_folder() {
    init_tracing();
    let dir = sample_library();
    let sink = Arc::new(MemorySink::default());
    let indexer = indexer(Arc::new(ScriptedParser::new()), 1, sink.clone());

    let report = indexer
        .index(&dir.path().join("Kick_01.wav"), None)
        .await
        .unwrap();

    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.folder.path, dir.path());
}

#[tokio::test]
async fn missing_root_is_an_error() {
    init_tracing();
    let sink = Arc::new(MemorySink::default());
    let indexer = indexer(Arc::new(ScriptedParser::new()), 1, sink);

    let result = indexer.index(Path::new("/definitely/not/here"), None).await;
    assert!(matches!(result, Err(MetadataError::FileNotFound(_))));
}
