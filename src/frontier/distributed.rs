//! Redis-backed frontier shared by many crawl processes
//!
//! Layout under `<prefix>:`
//! - `queue`: list of task JSON; LPUSH to add, RPOP (FIFO) or LPOP (LIFO) to take
//! - `pqueue`: sorted set scored by priority; ZPOPMAX to take
//! - `visited`: set of claimed URLs; SADD is the dedup gate
//! - `in_progress`, `processed`: counters
//! - `seq`: insertion counter for `pqueue` members
//!
//! Members of `pqueue` are `<rank>|<task json>` where `rank` is
//! `u64::MAX - seq` zero-padded to 20 digits. Redis orders equal scores by
//! member bytes and ZPOPMAX takes the greatest, so among equal priorities
//! the oldest entry is popped first.
//!
//! Queue durability belongs to Redis. Tasks whose `add()` or `requeue()`
//! fails on a connectivity error are held in a local buffer, and counter
//! updates that fail are owed; both are settled on the next successful
//! operation.

use crate::frontier::{CrawlTask, Frontier, FrontierError, FrontierResult, Strategy};
use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, Client};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Consecutive store failures after which `get()` gives up
const MAX_CONSECUTIVE_FAILURES: u32 = 20;

/// Pops one task and counts it as in progress in a single round trip
const POP_SCRIPT: &str = r#"
local item
if ARGV[1] == 'fifo' then
  item = redis.call('RPOP', KEYS[1])
elseif ARGV[1] == 'lifo' then
  item = redis.call('LPOP', KEYS[1])
else
  local popped = redis.call('ZPOPMAX', KEYS[1])
  item = popped[1]
end
if item then
  redis.call('INCR', KEYS[2])
end
return item
"#;

/// Redis key names for one crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FrontierKeys {
    pub queue: String,
    pub pqueue: String,
    pub visited: String,
    pub in_progress: String,
    pub processed: String,
    pub seq: String,
}

impl FrontierKeys {
    pub(crate) fn new(prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches(':');
        Self {
            queue: format!("{}:queue", prefix),
            pqueue: format!("{}:pqueue", prefix),
            visited: format!("{}:visited", prefix),
            in_progress: format!("{}:in_progress", prefix),
            processed: format!("{}:processed", prefix),
            seq: format!("{}:seq", prefix),
        }
    }

    /// Key holding pending tasks for the given strategy
    fn pending(&self, strategy: Strategy) -> &str {
        match strategy {
            Strategy::Priority => &self.pqueue,
            Strategy::BreadthFirst | Strategy::DepthFirst => &self.queue,
        }
    }

    fn all(&self) -> [&str; 6] {
        [
            &self.queue,
            &self.pqueue,
            &self.visited,
            &self.in_progress,
            &self.processed,
            &self.seq,
        ]
    }
}

/// Encodes a `pqueue` member so older entries sort after newer ones
fn encode_ranked(seq: u64, task: &CrawlTask) -> FrontierResult<String> {
    Ok(format!("{:020}|{}", u64::MAX - seq, serde_json::to_string(task)?))
}

/// Inverse of [`encode_ranked`]
fn decode_ranked(raw: &str) -> FrontierResult<(u64, CrawlTask)> {
    let malformed = || {
        FrontierError::Serialization(<serde_json::Error as serde::de::Error>::custom(format!(
            "malformed priority entry: {}",
            raw
        )))
    };

    let (rank, json) = raw.split_once('|').ok_or_else(malformed)?;
    let rank: u64 = rank.parse().map_err(|_| malformed())?;
    Ok((u64::MAX - rank, serde_json::from_str(json)?))
}

/// Counter updates that failed and still have to reach Redis
#[derive(Debug, Default)]
struct OwedCounters {
    releases: AtomicI64,
    processed: AtomicU64,
}

impl OwedCounters {
    fn owe_release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }

    fn owe_done(&self) {
        self.owe_release();
        self.processed.fetch_add(1, Ordering::SeqCst);
    }

    fn take(&self) -> (i64, u64) {
        (
            self.releases.swap(0, Ordering::SeqCst),
            self.processed.swap(0, Ordering::SeqCst),
        )
    }

    fn give_back(&self, releases: i64, processed: u64) {
        self.releases.fetch_add(releases, Ordering::SeqCst);
        self.processed.fetch_add(processed, Ordering::SeqCst);
    }

    fn is_settled(&self) -> bool {
        self.releases.load(Ordering::SeqCst) == 0 && self.processed.load(Ordering::SeqCst) == 0
    }
}

/// Counters reported by the shared store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DistributedStats {
    pub queued: usize,
    pub processed: u64,
    pub in_progress: i64,
    pub visited: usize,
}

/// Frontier shared across processes through Redis
pub struct RedisFrontier {
    keys: FrontierKeys,
    strategy: Strategy,
    conn: Arc<Mutex<MultiplexedConnection>>,
    pop_script: redis::Script,
    /// Tasks accepted by `add()` or `requeue()` that could not reach Redis yet
    retry_buffer: Mutex<Vec<CrawlTask>>,
    owed: OwedCounters,
    stopped: AtomicBool,
    poll_interval: Duration,
    worker_id: String,
}

impl RedisFrontier {
    /// Connects to Redis and prepares the key layout under `key_prefix`
    ///
    /// # Arguments
    ///
    /// * `redis_url` - `redis://` or `rediss://` address
    /// * `key_prefix` - namespace shared by every worker of one crawl
    /// * `strategy` - ordering discipline; all workers must agree on it
    pub async fn connect(
        redis_url: &str,
        key_prefix: &str,
        strategy: Strategy,
    ) -> FrontierResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;

        info!("Connected to Redis frontier at {} ({})", redis_url, key_prefix);

        Ok(Self {
            keys: FrontierKeys::new(key_prefix),
            strategy,
            conn: Arc::new(Mutex::new(conn)),
            pop_script: redis::Script::new(POP_SCRIPT),
            retry_buffer: Mutex::new(Vec::new()),
            owed: OwedCounters::default(),
            stopped: AtomicBool::new(false),
            poll_interval: DEFAULT_POLL_INTERVAL,
            worker_id: format!("worker-{}", std::process::id()),
        })
    }

    /// Names this worker in log output
    pub fn with_worker_id(mut self, worker_id: impl Into<String>) -> Self {
        self.worker_id = worker_id.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Reads the shared counters
    pub async fn stats(&self) -> FrontierResult<DistributedStats> {
        let mut conn = self.conn.lock().await;

        let queue_len_cmd = match self.strategy {
            Strategy::Priority => "ZCARD",
            Strategy::BreadthFirst | Strategy::DepthFirst => "LLEN",
        };

        let (queued, processed, in_progress, visited): (usize, Option<u64>, Option<i64>, usize) =
            redis::pipe()
                .cmd(queue_len_cmd)
                .arg(self.keys.pending(self.strategy))
                .cmd("GET")
                .arg(&self.keys.processed)
                .cmd("GET")
                .arg(&self.keys.in_progress)
                .cmd("SCARD")
                .arg(&self.keys.visited)
                .query_async(&mut *conn)
                .await?;

        Ok(DistributedStats {
            queued,
            processed: processed.unwrap_or(0),
            in_progress: in_progress.unwrap_or(0),
            visited,
        })
    }

    /// Deletes every key of this crawl, e.g. before a fresh start
    pub async fn clear(&self) -> FrontierResult<()> {
        let mut conn = self.conn.lock().await;
        redis::cmd("DEL")
            .arg(&self.keys.all()[..])
            .query_async::<_, ()>(&mut *conn)
            .await?;
        self.retry_buffer.lock().await.clear();
        self.owed.take();
        info!("Cleared shared frontier {}", self.keys.queue.trim_end_matches(":queue"));
        Ok(())
    }

    /// Writes one task to the shared queue
    async fn push(&self, conn: &mut MultiplexedConnection, task: &CrawlTask) -> FrontierResult<()> {
        match self.strategy {
            Strategy::Priority => {
                let seq: u64 = redis::cmd("INCR")
                    .arg(&self.keys.seq)
                    .query_async(conn)
                    .await?;
                let member = encode_ranked(seq, task)?;
                redis::cmd("ZADD")
                    .arg(&self.keys.pqueue)
                    .arg(task.priority)
                    .arg(member)
                    .query_async::<_, ()>(conn)
                    .await?;
            }
            Strategy::BreadthFirst | Strategy::DepthFirst => {
                let json = serde_json::to_string(task)?;
                redis::cmd("LPUSH")
                    .arg(&self.keys.queue)
                    .arg(json)
                    .query_async::<_, ()>(conn)
                    .await?;
            }
        }
        Ok(())
    }

    /// Applies counter updates that failed earlier
    async fn settle_counters(&self, conn: &mut MultiplexedConnection) -> FrontierResult<()> {
        let (releases, processed) = self.owed.take();
        if releases == 0 && processed == 0 {
            return Ok(());
        }

        let result = redis::pipe()
            .atomic()
            .cmd("DECRBY")
            .arg(&self.keys.in_progress)
            .arg(releases)
            .ignore()
            .cmd("INCRBY")
            .arg(&self.keys.processed)
            .arg(processed)
            .ignore()
            .query_async::<_, ()>(conn)
            .await;

        if let Err(e) = result {
            self.owed.give_back(releases, processed);
            return Err(e.into());
        }
        debug!("Settled {} owed releases", releases);
        Ok(())
    }

    /// Settles owed counters, then pushes buffered tasks
    async fn flush_pending(&self, conn: &mut MultiplexedConnection) -> FrontierResult<()> {
        self.settle_counters(conn).await?;
        self.flush_retry_buffer(conn).await
    }

    /// Pushes buffered tasks; stops at the first failure and keeps the rest
    async fn flush_retry_buffer(&self, conn: &mut MultiplexedConnection) -> FrontierResult<()> {
        let mut buffer = self.retry_buffer.lock().await;
        if buffer.is_empty() {
            return Ok(());
        }

        let pending = std::mem::take(&mut *buffer);
        let total = pending.len();
        let mut remaining = pending.into_iter();

        while let Some(task) = remaining.next() {
            if let Err(e) = self.push(conn, &task).await {
                buffer.push(task);
                buffer.extend(remaining);
                return Err(e);
            }
        }

        debug!("Flushed {} buffered tasks to Redis", total);
        Ok(())
    }

    /// Pops the next task and counts it as in progress
    async fn pop(&self) -> FrontierResult<Option<CrawlTask>> {
        let mut conn = self.conn.lock().await;

        if let Err(e) = self.flush_pending(&mut conn).await {
            warn!("Could not flush buffered frontier state: {}", e);
        }

        let mode = match self.strategy {
            Strategy::BreadthFirst => "fifo",
            Strategy::DepthFirst => "lifo",
            Strategy::Priority => "priority",
        };

        let raw: Option<String> = self
            .pop_script
            .key(self.keys.pending(self.strategy))
            .key(&self.keys.in_progress)
            .arg(mode)
            .invoke_async(&mut *conn)
            .await?;

        raw.map(|raw| self.decode(&raw)).transpose()
    }

    fn decode(&self, raw: &str) -> FrontierResult<CrawlTask> {
        match self.strategy {
            Strategy::Priority => Ok(decode_ranked(raw)?.1),
            Strategy::BreadthFirst | Strategy::DepthFirst => Ok(serde_json::from_str(raw)?),
        }
    }

    /// True when no worker holds a task and nothing is queued anywhere
    async fn is_quiescent(&self) -> FrontierResult<bool> {
        if !self.retry_buffer.lock().await.is_empty() || !self.owed.is_settled() {
            return Ok(false);
        }
        let stats = self.stats().await?;
        Ok(stats.queued == 0 && stats.in_progress <= 0)
    }
}

#[async_trait]
impl Frontier for RedisFrontier {
    async fn add(&self, task: CrawlTask) -> FrontierResult<()> {
        if self.is_stopped() {
            return Ok(());
        }

        let mut conn = self.conn.lock().await;

        let result = match self.flush_pending(&mut conn).await {
            Ok(()) => self.push(&mut conn, &task).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => Ok(()),
            Err(FrontierError::Redis(e)) => {
                warn!("Redis add failed for {}, buffering: {}", task.url, e);
                self.retry_buffer.lock().await.push(task);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn get(&self) -> Option<CrawlTask> {
        let mut failures = 0;

        loop {
            match self.pop().await {
                Ok(Some(task)) => return Some(task),
                Ok(None) => {
                    failures = 0;
                    if self.is_stopped() {
                        return None;
                    }
                    match self.is_quiescent().await {
                        Ok(true) => {
                            info!("[{}] Shared frontier drained, stopping", self.worker_id);
                            self.stop();
                            return None;
                        }
                        Ok(false) => {}
                        Err(e) => warn!("Could not read frontier stats: {}", e),
                    }
                }
                Err(FrontierError::Serialization(e)) => {
                    // A malformed entry is already removed from the queue
                    warn!("Dropping undecodable frontier entry: {}", e);
                    continue;
                }
                Err(e) => {
                    failures += 1;
                    warn!("Frontier dequeue failed ({}/{}): {}", failures, MAX_CONSECUTIVE_FAILURES, e);
                    if self.is_stopped() {
                        return None;
                    }
                    if failures >= MAX_CONSECUTIVE_FAILURES {
                        error!("[{}] Redis unavailable, giving up on the frontier", self.worker_id);
                        self.stop();
                        return None;
                    }
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn mark_done(&self, task: &CrawlTask) {
        let mut conn = self.conn.lock().await;
        let result = redis::pipe()
            .atomic()
            .cmd("DECR")
            .arg(&self.keys.in_progress)
            .ignore()
            .cmd("INCR")
            .arg(&self.keys.processed)
            .ignore()
            .query_async::<_, ()>(&mut *conn)
            .await;

        if let Err(e) = result {
            warn!("Could not release {} in Redis, deferring: {}", task.url, e);
            self.owed.owe_done();
        }
    }

    async fn requeue(&self, task: CrawlTask) -> FrontierResult<()> {
        let mut conn = self.conn.lock().await;

        // Queue before release so in_progress never reads zero while the task is in neither
        if let Err(e) = self.push(&mut conn, &task).await {
            warn!("Redis requeue failed for {}, buffering: {}", task.url, e);
            self.retry_buffer.lock().await.push(task);
        }

        let released = redis::cmd("DECR")
            .arg(&self.keys.in_progress)
            .query_async::<_, ()>(&mut *conn)
            .await;
        if let Err(e) = released {
            warn!("Could not release requeued task in Redis, deferring: {}", e);
            self.owed.owe_release();
        }
        Ok(())
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    async fn snapshot(&self) -> FrontierResult<Vec<CrawlTask>> {
        let mut conn = self.conn.lock().await;

        let mut tasks = match self.strategy {
            Strategy::Priority => {
                let raw: Vec<String> = redis::cmd("ZRANGE")
                    .arg(&self.keys.pqueue)
                    .arg(0)
                    .arg(-1)
                    .query_async(&mut *conn)
                    .await?;
                let mut entries = raw
                    .iter()
                    .map(|r| decode_ranked(r))
                    .collect::<FrontierResult<Vec<_>>>()?;
                entries.sort_by_key(|(seq, _)| *seq);
                entries.into_iter().map(|(_, task)| task).collect::<Vec<_>>()
            }
            Strategy::BreadthFirst | Strategy::DepthFirst => {
                let raw: Vec<String> = redis::cmd("LRANGE")
                    .arg(&self.keys.queue)
                    .arg(0)
                    .arg(-1)
                    .query_async(&mut *conn)
                    .await?;
                // LPUSH puts the newest entry at the head
                raw.iter()
                    .rev()
                    .map(|r| serde_json::from_str::<CrawlTask>(r))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        tasks.extend(self.retry_buffer.lock().await.iter().cloned());
        Ok(tasks)
    }

    async fn restore(&self, tasks: Vec<CrawlTask>) -> FrontierResult<()> {
        let mut conn = self.conn.lock().await;
        for task in &tasks {
            self.push(&mut conn, task).await?;
        }
        Ok(())
    }

    async fn len(&self) -> usize {
        let buffered = self.retry_buffer.lock().await.len();
        match self.stats().await {
            Ok(stats) => stats.queued + buffered,
            Err(_) => buffered,
        }
    }

    fn is_distributed(&self) -> bool {
        true
    }

    async fn is_visited(&self, url: &str) -> FrontierResult<bool> {
        let mut conn = self.conn.lock().await;
        let member: bool = redis::cmd("SISMEMBER")
            .arg(&self.keys.visited)
            .arg(url)
            .query_async(&mut *conn)
            .await?;
        Ok(member)
    }

    async fn mark_visited(&self, url: &str) -> FrontierResult<bool> {
        let mut conn = self.conn.lock().await;
        let added: usize = redis::cmd("SADD")
            .arg(&self.keys.visited)
            .arg(url)
            .query_async(&mut *conn)
            .await?;
        Ok(added == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::CheckpointManager;
    use crate::crawler::StatsSnapshot;
    use tempfile::TempDir;

    #[test]
    fn test_key_layout() {
        let keys = FrontierKeys::new("deepharvest");
        assert_eq!(keys.queue, "deepharvest:queue");
        assert_eq!(keys.pqueue, "deepharvest:pqueue");
        assert_eq!(keys.visited, "deepharvest:visited");
        assert_eq!(keys.in_progress, "deepharvest:in_progress");
        assert_eq!(keys.processed, "deepharvest:processed");
        assert_eq!(keys.all().len(), 6);
    }

    #[test]
    fn test_key_prefix_trailing_colon() {
        assert_eq!(FrontierKeys::new("crawl:").queue, "crawl:queue");
    }

    #[test]
    fn test_pending_key_by_strategy() {
        let keys = FrontierKeys::new("p");
        assert_eq!(keys.pending(Strategy::BreadthFirst), "p:queue");
        assert_eq!(keys.pending(Strategy::DepthFirst), "p:queue");
        assert_eq!(keys.pending(Strategy::Priority), "p:pqueue");
    }

    #[test]
    fn test_ranked_members_put_older_entries_last() {
        let task = |url: &str| CrawlTask::new(url, 1, 0.5);

        // ZPOPMAX takes the greatest member among equal scores
        let first = encode_ranked(1, &task("https://a.com/1")).unwrap();
        let second = encode_ranked(2, &task("https://a.com/2")).unwrap();
        assert!(first > second);

        let ninth = encode_ranked(9, &task("https://a.com/z")).unwrap();
        let tenth = encode_ranked(10, &task("https://a.com/a")).unwrap();
        assert!(ninth > tenth);
    }

    #[test]
    fn test_ranked_member_decodes() {
        let member = encode_ranked(42, &CrawlTask::new("https://a.com/x|y", 3, 0.25)).unwrap();
        let (seq, task) = decode_ranked(&member).unwrap();
        assert_eq!(seq, 42);
        assert_eq!(task.url, "https://a.com/x|y");
        assert_eq!(task.depth, 3);

        assert!(matches!(
            decode_ranked("not-a-member"),
            Err(FrontierError::Serialization(_))
        ));
    }

    #[test]
    fn test_owed_counters_settle_and_roll_back() {
        let owed = OwedCounters::default();
        assert!(owed.is_settled());

        owed.owe_done();
        owed.owe_release();
        assert!(!owed.is_settled());

        let (releases, processed) = owed.take();
        assert_eq!((releases, processed), (2, 1));
        assert!(owed.is_settled());

        owed.give_back(releases, processed);
        assert_eq!(owed.take(), (2, 1));
    }

    /// Connects to `REDIS_URL` with a clean key space, or skips when unset
    async fn live_frontier(prefix: &str, strategy: Strategy) -> Option<RedisFrontier> {
        let Ok(url) = std::env::var("REDIS_URL") else {
            eprintln!("REDIS_URL not set, skipping");
            return None;
        };
        let frontier = RedisFrontier::connect(&url, prefix, strategy)
            .await
            .expect("REDIS_URL must be reachable")
            .with_poll_interval(Duration::from_millis(20));
        frontier.clear().await.unwrap();
        Some(frontier)
    }

    #[tokio::test]
    async fn test_redis_fifo_and_counters() {
        let Some(frontier) = live_frontier("deepharvest-test-fifo", Strategy::BreadthFirst).await
        else {
            return;
        };
        frontier.add(CrawlTask::new("https://a.com/1", 0, 0.5)).await.unwrap();
        frontier.add(CrawlTask::new("https://a.com/2", 0, 0.5)).await.unwrap();

        let snapshot = frontier.snapshot().await.unwrap();
        assert_eq!(snapshot[0].url, "https://a.com/1");

        let first = frontier.get().await.unwrap();
        assert_eq!(first.url, "https://a.com/1");
        assert_eq!(frontier.stats().await.unwrap().in_progress, 1);

        frontier.mark_done(&first).await;
        let stats = frontier.stats().await.unwrap();
        assert_eq!(stats.in_progress, 0);
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.queued, 1);
    }

    #[tokio::test]
    async fn test_redis_mark_visited_is_set_if_absent() {
        let Some(frontier) =
            live_frontier("deepharvest-test-visited", Strategy::BreadthFirst).await
        else {
            return;
        };
        assert!(!frontier.is_visited("https://a.com/").await.unwrap());
        assert!(frontier.mark_visited("https://a.com/").await.unwrap());
        assert!(!frontier.mark_visited("https://a.com/").await.unwrap());
        assert!(frontier.is_visited("https://a.com/").await.unwrap());
    }

    #[tokio::test]
    async fn test_redis_priority_ties_in_insertion_order() {
        let Some(frontier) = live_frontier("deepharvest-test-priority", Strategy::Priority).await
        else {
            return;
        };
        for i in 1..=11 {
            frontier
                .add(CrawlTask::new(format!("https://a.com/{}", i), 1, 0.5))
                .await
                .unwrap();
        }
        frontier.add(CrawlTask::new("https://a.com/high", 1, 0.9)).await.unwrap();

        let high = frontier.get().await.unwrap();
        assert_eq!(high.url, "https://a.com/high");
        frontier.mark_done(&high).await;

        for i in 1..=11 {
            let task = frontier.get().await.unwrap();
            assert_eq!(task.url, format!("https://a.com/{}", i));
            frontier.mark_done(&task).await;
        }

        assert!(frontier.get().await.is_none());
        assert!(frontier.is_stopped());
    }

    #[tokio::test]
    async fn test_redis_requeue_returns_task_and_slot() {
        let Some(frontier) = live_frontier("deepharvest-test-requeue", Strategy::BreadthFirst).await
        else {
            return;
        };
        frontier.add(CrawlTask::new("https://a.com/1", 0, 0.5)).await.unwrap();

        let task = frontier.get().await.unwrap();
        frontier.stop();
        frontier.requeue(task).await.unwrap();

        let stats = frontier.stats().await.unwrap();
        assert_eq!(stats.queued, 1);
        assert_eq!(stats.in_progress, 0);
        assert_eq!(frontier.snapshot().await.unwrap()[0].url, "https://a.com/1");
    }

    #[tokio::test]
    async fn test_redis_checkpoint_keeps_counters_only() {
        let Some(frontier) =
            live_frontier("deepharvest-test-checkpoint", Strategy::BreadthFirst).await
        else {
            return;
        };
        frontier.add(CrawlTask::new("https://a.com/1", 0, 0.5)).await.unwrap();

        let dir = TempDir::new().unwrap();
        let manager = CheckpointManager::new(dir.path().join("state.json"), frontier.is_distributed());
        let stats = StatsSnapshot {
            processed: 3,
            success: 2,
            errors: 1,
            bytes_downloaded: 0,
        };
        manager.save(stats, None, &frontier).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(manager.path()).unwrap()).unwrap();
        assert_eq!(raw["processed"], 3);
        assert!(raw.get("visited").is_none());
        assert!(raw.get("frontier").is_none());
    }

    #[tokio::test]
    async fn test_redis_clear_removes_crawl_state() {
        let Some(frontier) = live_frontier("deepharvest-test-clear", Strategy::Priority).await
        else {
            return;
        };
        frontier.add(CrawlTask::new("https://a.com/1", 0, 0.5)).await.unwrap();
        frontier.mark_visited("https://a.com/0").await.unwrap();

        frontier.clear().await.unwrap();

        assert_eq!(frontier.stats().await.unwrap(), DistributedStats::default());
    }
}
