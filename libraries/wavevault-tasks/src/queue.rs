//! Bounded task queue
//!
//! A shared cursor hands out operations to `min(limit, count)` workers. Each worker
//! claims the next unclaimed index, awaits that operation, writes the result into
//! the slot for that index and claims again until the cursor is exhausted, so one
//! slow operation never holds back later indices on other workers.
//!
//! Workers are multiplexed on the caller's task. CPU-heavy operations should hand
//! their work to threads themselves (the metadata worker pool does).

use crate::error::TaskTimeout;
use futures_util::future::join_all;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Executes independent asynchronous operations with a maximum concurrency,
/// returning results in submission order.
#[derive(Debug, Clone, Copy)]
pub struct BoundedTaskQueue {
    limit: usize,
}

impl BoundedTaskQueue {
    /// Create a queue; a limit of 0 is treated as 1
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run all operations, at most `limit` at a time.
    ///
    /// The i-th result belongs to the i-th operation. On the first failure no new
    /// operation is started, operations already in flight run to completion, and
    /// the first error is returned.
    pub async fn run<T, E, F, Fut>(&self, tasks: Vec<F>) -> Result<Vec<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let count = tasks.len();
        if count == 0 {
            return Ok(Vec::new());
        }

        let state = RunState {
            cursor: Mutex::new(tasks.into_iter().enumerate()),
            slots: Mutex::new((0..count).map(|_| None).collect()),
            first_error: Mutex::new(None),
            failed: AtomicBool::new(false),
        };

        let workers = self.limit.min(count);
        join_all((0..workers).map(|_| state.worker())).await;

        let RunState {
            slots, first_error, ..
        } = state;

        if let Some(err) = first_error
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
        {
            return Err(err);
        }

        let results: Vec<T> = slots
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_iter()
            .flatten()
            .collect();
        debug_assert_eq!(results.len(), count);
        Ok(results)
    }

    /// Like [`run`](Self::run), but each operation is raced against `timeout`.
    ///
    /// An operation that does not finish in time is dropped and fails the run
    /// with [`TaskTimeout`], converted into the caller's error type.
    pub async fn run_with_timeout<T, E, F, Fut>(
        &self,
        tasks: Vec<F>,
        timeout: Duration,
    ) -> Result<Vec<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<TaskTimeout>,
    {
        let guarded: Vec<_> = tasks
            .into_iter()
            .enumerate()
            .map(|(index, task)| {
                move || async move {
                    match tokio::time::timeout(timeout, task()).await {
                        Ok(result) => result,
                        Err(_) => Err(E::from(TaskTimeout {
                            index,
                            after: timeout,
                        })),
                    }
                }
            })
            .collect();

        self.run(guarded).await
    }

    /// Run operations that cannot fail
    pub async fn run_infallible<T, F, Fut>(&self, tasks: Vec<F>) -> Vec<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let wrapped: Vec<_> = tasks
            .into_iter()
            .map(|task| move || async move { Ok::<T, std::convert::Infallible>(task().await) })
            .collect();

        match self.run(wrapped).await {
            Ok(results) => results,
            Err(never) => match never {},
        }
    }
}

impl Default for BoundedTaskQueue {
    fn default() -> Self {
        Self::new(num_workers_default())
    }
}

fn num_workers_default() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Run `tasks` with at most `limit` in flight; results keep submission order.
pub async fn with_concurrency<T, E, F, Fut>(tasks: Vec<F>, limit: usize) -> Result<Vec<T>, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    BoundedTaskQueue::new(limit).run(tasks).await
}

struct RunState<T, E, I> {
    cursor: Mutex<I>,
    slots: Mutex<Vec<Option<T>>>,
    first_error: Mutex<Option<E>>,
    failed: AtomicBool,
}

impl<T, E, F, Fut, I> RunState<T, E, I>
where
    I: Iterator<Item = (usize, F)>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    fn claim(&self) -> Option<(usize, F)> {
        if self.failed.load(Ordering::Acquire) {
            return None;
        }
        self.cursor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next()
    }

    async fn worker(&self) {
        while let Some((index, task)) = self.claim() {
            match task().await {
                Ok(value) => {
                    self.slots.lock().unwrap_or_else(PoisonError::into_inner)[index] = Some(value);
                }
                Err(err) => {
                    tracing::debug!("Queued task {} failed, draining in-flight work", index);
                    self.failed.store(true, Ordering::Release);
                    let mut first = self
                        .first_error
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner);
                    if first.is_none() {
                        *first = Some(err);
                    }
                }
            }
        }
    }
}
