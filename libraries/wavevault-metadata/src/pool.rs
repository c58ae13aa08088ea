//! Metadata Worker Pool
//!
//! Tag parsing runs on a fixed set of dedicated threads so that a slow,
//! hanging or panicking parser never blocks the async runtime or takes the
//! caller down with it. Callers and workers share nothing but two channels.
//!
//! ## Architecture
//!
//! ```text
//!   extract(path)                    metadata-worker-N
//!        │                                  │
//!        │  ExtractRequest { path, reply }  │
//!        │─────────────────────────────────>│ parser.parse(path)
//!        │                                  │ classifier.classify(path)
//!        │                                  │
//!        │  FileRecord (oneshot reply)      │
//!        │<─────────────────────────────────│
//! ```
//!
//! The task timeout starts when a worker picks a request up; time spent
//! waiting behind other requests does not count. A request still running when
//! the timeout expires is answered with a failed record.
//! The worker stuck on it is marked abandoned: it retires once the parser
//! returns, and a replacement thread is started immediately so the pool keeps
//! its capacity. A parser that never returns leaks its thread; memory-safety
//! crashes inside native decoders are not contained by threads at all, only
//! the external classifier runs out of process.

use crate::error::{MetadataError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::oneshot;
use wavevault_core::{FileRecord, MetadataParser, TrackClassifier};
use wavevault_tasks::BoundedTaskQueue;

/// Default per-file extraction timeout
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(30);

const QUEUED: u8 = 0;
const RUNNING: u8 = 1;
const DONE: u8 = 2;
const ABANDONED: u8 = 3;

/// Request message: one path in, one `FileRecord` out
struct ExtractRequest {
    path: PathBuf,
    /// Signalled when a worker starts on the request
    started: oneshot::Sender<()>,
    reply: oneshot::Sender<FileRecord>,
    state: Arc<AtomicU8>,
}

/// Marks a still-queued request abandoned when the caller stops waiting,
/// so no worker spends time on it
struct QueuedGuard(Arc<AtomicU8>);

impl Drop for QueuedGuard {
    fn drop(&mut self) {
        let _ = self
            .0
            .compare_exchange(QUEUED, ABANDONED, Ordering::AcqRel, Ordering::Acquire);
    }
}

/// What a worker runs for each request
struct Stages {
    parser: Arc<dyn MetadataParser>,
    classifier: Option<Arc<dyn TrackClassifier>>,
}

impl Stages {
    fn extract(&self, path: &Path) -> FileRecord {
        let parsed = panic::catch_unwind(AssertUnwindSafe(|| self.parser.parse(path)));

        let mut record = match parsed {
            Ok(Ok(metadata)) => FileRecord::extracted(path, &metadata),
            Ok(Err(e)) => return FileRecord::failed(path, e.to_string()),
            Err(payload) => {
                return FileRecord::failed(
                    path,
                    format!("metadata parser panicked: {}", panic_message(payload.as_ref())),
                )
            }
        };

        if let Some(classifier) = &self.classifier {
            match panic::catch_unwind(AssertUnwindSafe(|| classifier.classify(path))) {
                Ok(classification) => record.apply_classification(&classification),
                Err(payload) => tracing::warn!(
                    path = %path.display(),
                    "Classifier panicked: {}",
                    panic_message(payload.as_ref())
                ),
            }
        }

        record
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Decrements the live-worker count when a worker thread ends
struct LiveGuard(Arc<AtomicUsize>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Builder for [`MetadataWorkerPool`]
pub struct PoolBuilder {
    parser: Arc<dyn MetadataParser>,
    classifier: Option<Arc<dyn TrackClassifier>>,
    workers: usize,
    task_timeout: Option<Duration>,
}

impl PoolBuilder {
    /// Number of worker threads (at least 1)
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Per-file timeout, measured from when a worker starts on the file
    pub fn task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = Some(timeout);
        self
    }

    /// Wait for workers indefinitely
    pub fn without_task_timeout(mut self) -> Self {
        self.task_timeout = None;
        self
    }

    /// Run a classifier after every successful parse
    pub fn classifier(mut self, classifier: Arc<dyn TrackClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Spawn the worker threads
    pub fn build(self) -> Result<MetadataWorkerPool> {
        let (request_tx, request_rx) = unbounded();
        let pool = MetadataWorkerPool {
            request_tx,
            request_rx,
            stages: Arc::new(Stages {
                parser: self.parser,
                classifier: self.classifier,
            }),
            workers: self.workers,
            task_timeout: self.task_timeout,
            next_worker_id: AtomicUsize::new(0),
            live_workers: Arc::new(AtomicUsize::new(0)),
        };

        for _ in 0..pool.workers {
            pool.spawn_worker()?;
        }

        tracing::debug!(workers = pool.workers, "Metadata worker pool started");
        Ok(pool)
    }
}

/// Fixed-size pool of metadata worker threads
///
/// `extract` never fails: parse errors, panics and timeouts all come back as a
/// `FileRecord` with `success == false`. Dropping the pool closes the request
/// channel and idle workers exit.
pub struct MetadataWorkerPool {
    request_tx: Sender<ExtractRequest>,
    request_rx: Receiver<ExtractRequest>,
    stages: Arc<Stages>,
    workers: usize,
    task_timeout: Option<Duration>,
    next_worker_id: AtomicUsize,
    live_workers: Arc<AtomicUsize>,
}

impl MetadataWorkerPool {
    /// Start configuring a pool around `parser`
    ///
    /// Defaults to one worker per CPU and a 30 second task timeout.
    pub fn builder(parser: Arc<dyn MetadataParser>) -> PoolBuilder {
        PoolBuilder {
            parser,
            classifier: None,
            workers: num_cpus::get().max(1),
            task_timeout: Some(DEFAULT_TASK_TIMEOUT),
        }
    }

    /// Configured number of workers
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Worker threads currently alive, including abandoned ones still stuck in a parser
    pub fn live_workers(&self) -> usize {
        self.live_workers.load(Ordering::Acquire)
    }

    /// Extract metadata for one file
    pub async fn extract(&self, path: impl Into<PathBuf>) -> FileRecord {
        let path = path.into();
        let (started_tx, started) = oneshot::channel();
        let (reply, mut response) = oneshot::channel();
        let state = Arc::new(AtomicU8::new(QUEUED));

        let request = ExtractRequest {
            path: path.clone(),
            started: started_tx,
            reply,
            state: Arc::clone(&state),
        };
        if self.request_tx.send(request).is_err() {
            return FileRecord::failed(path, "metadata worker pool is shut down");
        }
        let _queued = QueuedGuard(Arc::clone(&state));

        let Some(limit) = self.task_timeout else {
            return Self::await_reply(&path, response).await;
        };

        // Waiting for a free worker is not bounded by the task timeout
        if started.await.is_err() {
            return Self::await_reply(&path, response).await;
        }

        match tokio::time::timeout(limit, &mut response).await {
            Ok(Ok(record)) => return record,
            Ok(Err(_)) => return Self::worker_gone(&path),
            Err(_) => {}
        }

        if state
            .compare_exchange(RUNNING, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            tracing::warn!(
                path = %path.display(),
                timeout_ms = limit.as_millis() as u64,
                "Metadata worker timed out, starting a replacement"
            );
            if let Err(e) = self.spawn_worker() {
                tracing::error!("Failed to replace abandoned metadata worker: {}", e);
            }
            return FileRecord::failed(
                &path,
                format!("metadata extraction timed out after {}ms", limit.as_millis()),
            );
        }

        // Finished right at the deadline; the reply is already on its way
        Self::await_reply(&path, response).await
    }

    /// Extract many files, at most `workers()` in flight, results in input order
    pub async fn extract_many(&self, paths: Vec<PathBuf>) -> Vec<FileRecord> {
        let queue = BoundedTaskQueue::new(self.workers);
        let tasks: Vec<_> = paths
            .into_iter()
            .map(|path| move || self.extract(path))
            .collect();
        queue.run_infallible(tasks).await
    }

    async fn await_reply(path: &Path, response: oneshot::Receiver<FileRecord>) -> FileRecord {
        match response.await {
            Ok(record) => record,
            Err(_) => Self::worker_gone(path),
        }
    }

    fn worker_gone(path: &Path) -> FileRecord {
        FileRecord::failed(path, "metadata worker exited before replying")
    }

    fn spawn_worker(&self) -> Result<()> {
        let id = self.next_worker_id.fetch_add(1, Ordering::AcqRel);
        let requests = self.request_rx.clone();
        let stages = Arc::clone(&self.stages);
        let live = Arc::clone(&self.live_workers);

        live.fetch_add(1, Ordering::AcqRel);
        let spawned = thread::Builder::new()
            .name(format!("metadata-worker-{id}"))
            .spawn(move || {
                let _guard = LiveGuard(live);
                Self::worker_thread(id, &requests, &stages);
            });

        match spawned {
            Ok(_handle) => Ok(()),
            Err(e) => {
                self.live_workers.fetch_sub(1, Ordering::AcqRel);
                Err(MetadataError::WorkerSpawn(e))
            }
        }
    }

    fn worker_thread(id: usize, requests: &Receiver<ExtractRequest>, stages: &Stages) {
        tracing::trace!(worker = id, "Metadata worker started");

        while let Ok(request) = requests.recv() {
            let ExtractRequest {
                path,
                started,
                reply,
                state,
            } = request;

            if state
                .compare_exchange(QUEUED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                // Caller gave up while the request was queued
                continue;
            }
            let _ = started.send(());

            let record = stages.extract(&path);
            let previous = state.swap(DONE, Ordering::AcqRel);
            let _ = reply.send(record);

            if previous == ABANDONED {
                tracing::debug!(worker = id, path = %path.display(), "Abandoned metadata worker retiring");
                return;
            }
        }

        tracing::trace!(worker = id, "Metadata worker exiting, request channel closed");
    }
}
