use crate::crawler::StatsSnapshot;
use crate::frontier::CrawlTask;
use serde::{Deserialize, Serialize};

/// On-disk checkpoint
///
/// `visited` and `frontier` are omitted from the file in distributed mode.
/// A file without a `frontier` key is a legacy checkpoint: counters and
/// visited URLs are restored but seeds are enqueued as usual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    #[serde(default)]
    pub processed: u64,

    #[serde(default)]
    pub success: u64,

    #[serde(default)]
    pub errors: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visited: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontier: Option<Vec<CrawlTask>>,

    /// RFC 3339 when written by this crate; older files may lack a zone
    #[serde(default)]
    pub timestamp: String,
}

impl CheckpointRecord {
    /// Builds a record stamped with the current time
    pub fn new(
        stats: StatsSnapshot,
        visited: Option<Vec<String>>,
        frontier: Option<Vec<CrawlTask>>,
    ) -> Self {
        Self {
            processed: stats.processed,
            success: stats.success,
            errors: stats.errors,
            visited,
            frontier,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
