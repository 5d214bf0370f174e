//! Crash-safe persistence of crawl progress
//!
//! A checkpoint is a JSON file holding the crawl counters and, in local mode,
//! the visited URLs and a snapshot of the pending frontier. Files are written
//! to a temporary sibling and renamed into place, so a crash mid-write never
//! leaves a truncated checkpoint.

mod manager;
mod record;

pub use manager::{CheckpointManager, RestoredProgress};
pub use record::CheckpointRecord;

use thiserror::Error;

/// Errors raised while reading or writing checkpoints
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize checkpoint: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Corrupt checkpoint: {0}")]
    Corrupt(String),
}

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;
