//! Storage module for persisting crawl results
//!
//! The default [`Store`](crate::capability::Store) collaborator writes one
//! SQLite row per URL. Writes are upserts keyed by URL, so the duplicate
//! fetches that concurrent workers occasionally produce are harmless.

mod schema;
mod sqlite;

pub use sqlite::{DocumentRow, SqliteStore};

use std::path::Path;
use thiserror::Error;

/// File name of the results database inside the output directory
pub const DATABASE_FILE: &str = "harvest.db";

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Opens (or creates) the results database under `output_dir`
///
/// # Arguments
///
/// * `output_dir` - Directory that holds crawl output; created if missing
pub fn open_store(output_dir: &Path) -> StorageResult<SqliteStore> {
    std::fs::create_dir_all(output_dir)?;
    SqliteStore::open(&output_dir.join(DATABASE_FILE))
}
