//! WaveVault Tasks
//!
//! Fixed-concurrency execution of independent asynchronous operations.
//!
//! # Example
//!
//! ```rust
//! use wavevault_tasks::BoundedTaskQueue;
//!
//! # async fn example() {
//! let tasks: Vec<_> = (0..5u64)
//!     .map(|i| move || async move { Ok::<_, std::io::Error>(i * 2) })
//!     .collect();
//!
//! let results = BoundedTaskQueue::new(2).run(tasks).await.unwrap();
//! assert_eq!(results, vec![0, 2, 4, 6, 8]);
//! # }
//! ```

mod error;
mod queue;

pub use error::TaskTimeout;
pub use queue::{with_concurrency, BoundedTaskQueue};
