//! Frontier: the ordered store of pending crawl work
//!
//! Two implementations share the [`Frontier`] contract:
//! - [`LocalFrontier`]: in-process queue with FIFO, LIFO or priority ordering
//! - [`RedisFrontier`]: shared Redis store for multi-process / multi-node crawls,
//!   which additionally owns the visited-URL record
//!
//! A frontier never deduplicates. Adding the same URL twice is legal; the
//! orchestrator's visit check filters duplicates downstream.
//!
//! Lifecycle: `Running -> Stopping (stop()) -> Drained (stopped and empty)`.
//! A local frontier also stops itself once it is empty and no dequeued task is
//! still outstanding, since nothing can add work at that point.

mod distributed;
mod local;

pub use distributed::{DistributedStats, RedisFrontier};
pub use local::LocalFrontier;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised by frontier operations
#[derive(Debug, Error)]
pub enum FrontierError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Frontier is stopped")]
    Stopped,
}

/// Result type for frontier operations
pub type FrontierResult<T> = Result<T, FrontierError>;

/// Ordering discipline, selected at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// FIFO
    #[default]
    BreadthFirst,
    /// LIFO
    DepthFirst,
    /// Highest priority first, ties in insertion order
    Priority,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BreadthFirst => "breadth_first",
            Self::DepthFirst => "depth_first",
            Self::Priority => "priority",
        };
        f.write_str(name)
    }
}

/// A unit of pending work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlTask {
    pub url: String,
    /// Hops from a seed (seeds are depth 0)
    pub depth: u32,
    /// Always within [0, 1]
    pub priority: f64,
}

impl CrawlTask {
    /// Creates a task, clamping `priority` into [0, 1]
    ///
    /// A NaN priority becomes the neutral 0.5.
    pub fn new(url: impl Into<String>, depth: u32, priority: f64) -> Self {
        let priority = if priority.is_nan() {
            0.5
        } else {
            priority.clamp(0.0, 1.0)
        };

        Self {
            url: url.into(),
            depth,
            priority,
        }
    }

    /// Creates a depth-0 seed task at full priority
    pub fn seed(url: impl Into<String>) -> Self {
        Self::new(url, 0, 1.0)
    }
}

/// Shared contract for pending-work stores
///
/// Every method is safe to call from many workers at once; each individual
/// call is atomic, but sequences of calls are not.
#[async_trait]
pub trait Frontier: Send + Sync {
    /// Enqueues a task; a no-op once the frontier is stopped
    async fn add(&self, task: CrawlTask) -> FrontierResult<()>;

    /// Returns the next task, or `None` once stopped and drained
    ///
    /// Waits in bounded slices while the queue is momentarily empty but other
    /// work is still outstanding, so callers never block forever.
    async fn get(&self) -> Option<CrawlTask>;

    /// Releases the outstanding-work slot taken by `get()`
    async fn mark_done(&self, task: &CrawlTask);

    /// Hands a dequeued task back unprocessed
    ///
    /// Accepted even after `stop()` so that work interrupted by a crawl limit
    /// survives into the next checkpoint.
    async fn requeue(&self, task: CrawlTask) -> FrontierResult<()>;

    /// Stops accepting new tasks; queued tasks still drain through `get()`
    fn stop(&self);

    fn is_stopped(&self) -> bool;

    /// Copies the pending tasks, in insertion order, without removing them
    async fn snapshot(&self) -> FrontierResult<Vec<CrawlTask>>;

    /// Imports tasks, e.g. from a checkpoint, preserving their order
    async fn restore(&self, tasks: Vec<CrawlTask>) -> FrontierResult<()>;

    /// Number of tasks currently queued
    async fn len(&self) -> usize;

    /// True when the frontier is shared across processes and owns the
    /// visited record; local frontiers leave visit tracking to the caller
    fn is_distributed(&self) -> bool {
        false
    }

    /// Cheap pre-filter against the shared visited record
    async fn is_visited(&self, _url: &str) -> FrontierResult<bool> {
        Ok(false)
    }

    /// Atomic set-if-absent on the shared visited record
    ///
    /// Returns `true` if this call claimed the URL.
    async fn mark_visited(&self, _url: &str) -> FrontierResult<bool> {
        Ok(true)
    }
}
