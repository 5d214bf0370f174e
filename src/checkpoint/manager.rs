use crate::checkpoint::{CheckpointError, CheckpointRecord, CheckpointResult};
use crate::crawler::StatsSnapshot;
use crate::frontier::Frontier;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Progress recovered from a checkpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoredProgress {
    pub processed: u64,
    pub success: u64,
    pub errors: u64,
    /// Present only for local-mode checkpoints that recorded it
    pub visited: Option<Vec<String>>,
    /// Whether pending tasks were pushed back into the frontier
    pub frontier_restored: bool,
}

/// Saves and loads crawl checkpoints at one path
///
/// In distributed mode only the counters are recorded; queue and visited
/// state live in the shared store.
#[derive(Debug)]
pub struct CheckpointManager {
    path: PathBuf,
    distributed: bool,
    frontier_restored: AtomicBool,
}

impl CheckpointManager {
    pub fn new(path: impl Into<PathBuf>, distributed: bool) -> Self {
        Self {
            path: path.into(),
            distributed,
            frontier_restored: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once `load()` has pushed a saved frontier back into the queue
    ///
    /// Seeds must not be enqueued again in that case: any pending seed work is
    /// already part of the restored tasks.
    pub fn frontier_restored(&self) -> bool {
        self.frontier_restored.load(Ordering::SeqCst)
    }

    /// Captures current progress and writes it atomically
    ///
    /// # Arguments
    ///
    /// * `stats` - Counter values to record
    /// * `visited` - Visited URLs; ignored in distributed mode
    /// * `frontier` - Frontier to snapshot; ignored in distributed mode
    pub async fn save(
        &self,
        stats: StatsSnapshot,
        visited: Option<Vec<String>>,
        frontier: &dyn Frontier,
    ) -> CheckpointResult<()> {
        let record = if self.distributed {
            CheckpointRecord::new(stats, None, None)
        } else {
            let pending = match frontier.snapshot().await {
                Ok(pending) => Some(pending),
                Err(e) => {
                    warn!("Could not snapshot frontier for checkpoint: {}", e);
                    None
                }
            };
            CheckpointRecord::new(stats, Some(visited.unwrap_or_default()), pending)
        };

        self.write(&record).await?;

        info!(
            "Checkpoint saved to {} ({} processed, {} pending)",
            self.path.display(),
            record.processed,
            record.frontier.as_ref().map_or(0, Vec::len)
        );
        Ok(())
    }

    /// Writes a record via a temporary file and rename
    pub async fn write(&self, record: &CheckpointRecord) -> CheckpointResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(record)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Reads the checkpoint file
    ///
    /// # Returns
    ///
    /// * `Ok(Some(record))` - A valid checkpoint
    /// * `Ok(None)` - No checkpoint file exists
    /// * `Err(CheckpointError)` - Unreadable or corrupt file
    pub async fn read(&self) -> CheckpointResult<Option<CheckpointRecord>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CheckpointError::Io(e)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| CheckpointError::Corrupt(e.to_string()))
    }

    /// Loads progress and restores pending tasks into `frontier`
    ///
    /// Never fails: a missing, unreadable or corrupt file is a cold start.
    pub async fn load(&self, frontier: &dyn Frontier) -> Option<RestoredProgress> {
        let record = match self.read().await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!("No checkpoint at {}, starting fresh", self.path.display());
                return None;
            }
            Err(e) => {
                warn!(
                    "Ignoring checkpoint at {}: {}; starting fresh",
                    self.path.display(),
                    e
                );
                return None;
            }
        };

        let mut progress = RestoredProgress {
            processed: record.processed,
            success: record.success,
            errors: record.errors,
            visited: None,
            frontier_restored: false,
        };

        if !self.distributed {
            progress.visited = record.visited;

            if let Some(tasks) = record.frontier {
                let count = tasks.len();
                match frontier.restore(tasks).await {
                    Ok(()) => {
                        self.frontier_restored.store(true, Ordering::SeqCst);
                        progress.frontier_restored = true;
                        info!("Restored {} pending tasks from checkpoint", count);
                    }
                    Err(e) => warn!("Could not restore frontier from checkpoint: {}", e),
                }
            }
        }

        info!(
            "Checkpoint loaded: {} URLs processed (saved {})",
            progress.processed, record.timestamp
        );
        Some(progress)
    }

    /// Deletes the checkpoint file if present
    pub async fn clear(&self) -> CheckpointResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("Removed checkpoint {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
