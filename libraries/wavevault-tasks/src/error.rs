use std::time::Duration;
use thiserror::Error;

/// A queued operation did not finish within the configured per-task timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("task {index} timed out after {}ms", .after.as_millis())]
pub struct TaskTimeout {
    /// Position of the operation in the submitted sequence
    pub index: usize,
    pub after: Duration,
}
