//! Crawl counters shared by all workers

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live crawl counters
///
/// `processed` counts every task taken from the frontier, including ones
/// skipped as visited, trapped or soft-404. `success` and `errors` count
/// pipeline outcomes and need not sum to `processed`.
#[derive(Debug, Default)]
pub struct CrawlStats {
    processed: AtomicU64,
    success: AtomicU64,
    errors: AtomicU64,
    bytes_downloaded: AtomicU64,
}

/// Point-in-time copy of [`CrawlStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub processed: u64,
    pub success: u64,
    pub errors: u64,
    pub bytes_downloaded: u64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments `processed` and returns the new value
    pub fn record_processed(&self) -> u64 {
        self.processed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn record_success(&self) {
        self.success.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }

    pub fn add_bytes(&self, bytes: u64) {
        self.bytes_downloaded.fetch_add(bytes, Ordering::SeqCst);
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::SeqCst)
    }

    /// Overwrites the counters restored from a checkpoint
    pub fn restore(&self, processed: u64, success: u64, errors: u64) {
        self.processed.store(processed, Ordering::SeqCst);
        self.success.store(success, Ordering::SeqCst);
        self.errors.store(errors, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            processed: self.processed.load(Ordering::SeqCst),
            success: self.success.load(Ordering::SeqCst),
            errors: self.errors.load(Ordering::SeqCst),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::SeqCst),
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Processed:        {}", self.processed)?;
        writeln!(f, "Succeeded:        {}", self.success)?;
        writeln!(f, "Errors:           {}", self.errors)?;
        write!(f, "Bytes downloaded: {}", self.bytes_downloaded)
    }
}
