//! WaveVault Metadata
//!
//! Metadata extraction and local library indexing.
//!
//! This crate provides:
//! - Tag reading (duration, tempo, key) through lofty
//! - A pool of isolated metadata worker threads fed over a request/response channel
//! - An optional external classifier process (category, fallback tempo)
//! - File-name heuristics for sample libraries (instrument, one-shot/loop, key)
//! - Folder indexing with bounded fan-out and progress reporting
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wavevault_metadata::{LoftyMetadataReader, MetadataWorkerPool};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = MetadataWorkerPool::builder(Arc::new(LoftyMetadataReader::new()))
//!     .workers(4)
//!     .build()?;
//!
//! let record = pool.extract("/samples/kick_01.wav").await;
//! println!("{} -> {} bpm (ok: {})", record.path.display(), record.bpm, record.success);
//! # Ok(())
//! # }
//! ```

mod error;

pub mod classifier;
pub mod heuristics;
pub mod indexer;
pub mod pool;
pub mod reader;

pub use classifier::ProcessClassifier;
pub use error::{MetadataError, Result};
pub use indexer::{IndexConfig, IndexProgress, IndexReport, LibraryIndexer};
pub use pool::{MetadataWorkerPool, PoolBuilder};
pub use reader::LoftyMetadataReader;

/// Audio extensions indexed when no explicit list is configured
pub const DEFAULT_AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "aif", "aiff", "ogg", "m4a"];
