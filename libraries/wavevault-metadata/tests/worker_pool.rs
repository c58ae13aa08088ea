//! Integration tests for the metadata worker pool


use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use test_helpers::{init_tracing, CannedClassifier, ScriptedParser};
use wavevault_metadata::MetadataWorkerPool;

fn pool(parser: Arc<ScriptedParser>, workers: usize) -> MetadataWorkerPool {
    MetadataWorkerPool::builder(parser)
        .workers(workers)
        .task_timeout(Duration::from_secs(5))
        .build()
        .expect("pool should start")
}

#[tokio::test]
async fn parse_error_becomes_failed_record() {
    init_tracing();
    let pool = pool(Arc::new(ScriptedParser::new()), 2);

    let record = pool.extract("/lib/fail_me.wav").await;

    assert!(!record.success);
    assert_eq!(record.path, PathBuf::from("/lib/fail_me.wav"));
    assert!(record.error.as_deref().unwrap().contains("corrupt header"));
    assert_eq!(record.bpm, 0);
    assert_eq!(record.duration, 0.0);
}

#[tokio::test]
async fn panicking_parser_is_contained() {
    init_tracing();
    let pool = pool(Arc::new(ScriptedParser::new()), 1);

    let crashed = pool.extract("/lib/panic.wav").await;
    assert!(!crashed.success);
    assert_eq!(
        crashed.error.as_deref(),
        Some("metadata parser panicked: decoder exploded")
    );

    // The single worker survived and keeps serving
    let next = pool.extract("/lib/kick.wav").await;
    assert!(next.success);
    assert_eq!(next.bpm, 120);
    assert_eq!(pool.live_workers(), 1);
}

#[tokio::test]
async fn hung_worker_times_out_and_is_replaced() {
    init_tracing();
    let parser = Arc::new(ScriptedParser::new().hanging_for(Duration::from_millis(800)));
    let pool = MetadataWorkerPool::builder(parser.clone())
        .workers(1)
        .task_timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let started = Instant::now();
    let hung = pool.extract("/lib/hang.wav").await;
    assert!(!hung.success);
    assert_eq!(
        hung.error.as_deref(),
        Some("metadata extraction timed out after 100ms")
    );

    // A replacement picks up new work while the stuck thread is still parsing
    let next = pool.extract("/lib/snare.wav").await;
    assert!(next.success);
    assert!(started.elapsed() < Duration::from_millis(600));
    assert_eq!(pool.live_workers(), 2);

    // Once the stuck parse returns, the abandoned worker retires
    let deadline = Instant::now() + Duration::from_secs(5);
    while pool.live_workers() > 1 && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(pool.live_workers(), 1);
}

#[tokio::test]
async fn queue_wait_does_not_count_towards_the_timeout() {
    init_tracing();
    let parser = Arc::new(ScriptedParser::new().working_for(Duration::from_millis(60)));
    let pool = MetadataWorkerPool::builder(parser.clone())
        .workers(1)
        .task_timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    // Each parse fits the timeout, but the last one waits ~120ms for the worker
    let (a, b, c) = tokio::join!(
        pool.extract("/lib/a.wav"),
        pool.extract("/lib/b.wav"),
        pool.extract("/lib/c.wav"),
    );

    for record in [&a, &b, &c] {
        assert!(record.success, "{}: {:?}", record.path.display(), record.error);
    }
    assert_eq!(parser.calls.load(Ordering::SeqCst), 3);
    assert_eq!(pool.live_workers(), 1);
}

#[tokio::test]
async fn workers_are_named_threads() {
    init_tracing();
    let parser = Arc::new(ScriptedParser::new());
    let pool = pool(parser.clone(), 2);

    pool.extract("/lib/a.wav").await;

    let names = parser.thread_names.lock().unwrap().clone();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("metadata-worker-"), "got {:?}", names[0]);
}

#[tokio::test]
async fn extract_many_keeps_input_order() {
    init_tracing();
    let parser = Arc::new(ScriptedParser::new().working_for(Duration::from_millis(10)));
    let pool = pool(parser.clone(), 3);

    let paths: Vec<PathBuf> = ["a.wav", "fail.wav", "c.wav", "panic.wav", "e.wav", "f.wav"]
        .iter()
        .map(|n| PathBuf::from("/lib").join(n))
        .collect();

    let records = pool.extract_many(paths.clone()).await;

    let returned: Vec<PathBuf> = records.iter().map(|r| r.path.clone()).collect();
    assert_eq!(returned, paths);
    let ok: Vec<bool> = records.iter().map(|r| r.success).collect();
    assert_eq!(ok, vec![true, false, true, false, true, true]);
    assert!(parser.peak.load(Ordering::SeqCst) <= 3);
}

#[tokio::test]
async fn classifier_fills_category_and_missing_tempo() {
    init_tracing();
    let classifier = Arc::new(CannedClassifier::new("Drum Loop", Some(89.6)));
    let pool = MetadataWorkerPool::builder(Arc::new(ScriptedParser::new()))
        .workers(1)
        .classifier(classifier.clone())
        .build()
        .unwrap();

    let untagged = pool.extract("/lib/untagged_loop.wav").await;
    assert_eq!(untagged.category.as_deref(), Some("Drum Loop"));
    assert_eq!(untagged.bpm, 90);

    let tagged = pool.extract("/lib/tagged_loop.wav").await;
    assert_eq!(tagged.category.as_deref(), Some("Drum Loop"));
    assert_eq!(tagged.bpm, 120);

    // Failed parses skip classification
    let failed = pool.extract("/lib/fail.wav").await;
    assert_eq!(failed.category, None);
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 2);
}
