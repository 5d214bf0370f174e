//! Crawl orchestration
//!
//! The orchestrator runs `concurrent-requests` workers against one shared
//! frontier. Each worker loops:
//! 1. Take a task (`None` means the crawl is over for this worker)
//! 2. Enforce crawl-wide limits, handing the task back when one is hit
//! 3. Run the per-URL pipeline, catching and counting any failure, panics
//!    included
//! 4. Release the task and bump `processed`
//!
//! Checkpoints are written by a single dedicated task that workers notify
//! every `checkpoint.interval` processed URLs, so there is never more than
//! one writer.

use crate::capability::{Capabilities, ContentClass, StoredDocument};
use crate::checkpoint::CheckpointManager;
use crate::config::CrawlConfig;
use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::crawler::parser::discover_links;
use crate::crawler::policy::{compute_priority, needs_render, should_follow};
use crate::crawler::stats::{CrawlStats, StatsSnapshot};
use crate::frontier::{CrawlTask, Frontier, LocalFrontier, RedisFrontier};
use crate::storage::open_store;
use crate::url::{extract_domain, host_of, normalize_url};
use crate::{ConfigError, HarvestError};
use futures::FutureExt;
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use url::Url;

/// How one task left the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Stored,
    AlreadyVisited,
    FetchFailed,
    Trap,
    Soft404,
}

/// State shared by the workers and the checkpoint task
struct Shared {
    config: CrawlConfig,
    frontier: Arc<dyn Frontier>,
    fetcher: Fetcher,
    capabilities: Capabilities,
    /// Local-mode visited record; distributed crawls use the frontier's
    visited: Mutex<HashSet<String>>,
    stats: CrawlStats,
    checkpoint: CheckpointManager,
    started: OnceLock<Instant>,
}

/// Drives a crawl from seeds (or a restored checkpoint) to completion
pub struct Orchestrator {
    shared: Arc<Shared>,
    initialized: AtomicBool,
    closed: AtomicBool,
}

impl Orchestrator {
    /// Creates an orchestrator over an existing frontier and collaborator table
    ///
    /// # Arguments
    ///
    /// * `config` - Validated crawl configuration
    /// * `frontier` - Pending-work store shared by all workers
    /// * `capabilities` - Extractors, detectors, renderer and store
    pub fn new(
        config: CrawlConfig,
        frontier: Arc<dyn Frontier>,
        capabilities: Capabilities,
    ) -> Self {
        let checkpoint = CheckpointManager::new(
            config.checkpoint.state_file.clone(),
            frontier.is_distributed(),
        );
        let fetcher = Fetcher::new(config.fetch.clone());

        Self {
            shared: Arc::new(Shared {
                config,
                frontier,
                fetcher,
                capabilities,
                visited: Mutex::new(HashSet::new()),
                stats: CrawlStats::new(),
                checkpoint,
                started: OnceLock::new(),
            }),
            initialized: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Builds the frontier, store and default collaborators from configuration
    ///
    /// Distributed mode connects to Redis; otherwise an in-process frontier is
    /// used. Results go to `harvest.db` under the output directory.
    pub async fn from_config(config: CrawlConfig) -> crate::Result<Self> {
        let frontier: Arc<dyn Frontier> = if config.distributed.enabled {
            let redis_url = config.distributed.redis_url.as_deref().ok_or_else(|| {
                ConfigError::Validation("distributed mode requires redis-url".to_string())
            })?;

            let mut frontier = RedisFrontier::connect(
                redis_url,
                &config.distributed.key_prefix,
                config.crawl.strategy,
            )
            .await?;
            if let Some(worker_id) = &config.distributed.worker_id {
                frontier = frontier.with_worker_id(worker_id.clone());
            }
            Arc::new(frontier)
        } else {
            Arc::new(LocalFrontier::new(config.crawl.strategy))
        };

        let store = Arc::new(open_store(&config.output.output_dir)?);
        let capabilities = Capabilities::standard(&config, store);

        Ok(Self::new(config, frontier, capabilities))
    }

    /// Prepares the fetcher and restores progress from the checkpoint file
    ///
    /// Runs once; later calls do nothing. A missing or corrupt checkpoint is a
    /// cold start.
    pub async fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return;
        }

        let shared = &self.shared;
        shared.fetcher.initialize().await;

        if let Some(progress) = shared.checkpoint.load(shared.frontier.as_ref()).await {
            shared
                .stats
                .restore(progress.processed, progress.success, progress.errors);
            if let Some(visited) = progress.visited {
                shared.visited.lock().await.extend(visited);
            }
        }
    }

    /// Runs the crawl until every worker has exited
    ///
    /// Seeds are enqueued only when no frontier was restored from a
    /// checkpoint. A final checkpoint is written and the fetcher closed before
    /// returning.
    ///
    /// # Returns
    ///
    /// * `Ok(StatsSnapshot)` - Final counters
    /// * `Err(HarvestError)` - Seeds could not be enqueued
    pub async fn crawl(&self) -> crate::Result<StatsSnapshot> {
        self.initialize().await;

        let shared = Arc::clone(&self.shared);
        shared.started.get_or_init(Instant::now);

        if shared.checkpoint.frontier_restored() {
            tracing::info!(
                "Resuming with {} restored tasks; seeds not re-enqueued",
                shared.frontier.len().await
            );
        } else {
            self.enqueue_seeds().await?;
        }

        let workers = shared.config.fetch.concurrent_requests.max(1);
        tracing::info!(
            "Starting crawl with {} workers ({} strategy)",
            workers,
            shared.config.crawl.strategy
        );

        let (progress_tx, progress_rx) = mpsc::channel(1);
        let checkpointer = tokio::spawn(run_checkpointer(Arc::clone(&shared), progress_rx));

        let mut pool = JoinSet::new();
        for id in 0..workers {
            pool.spawn(run_worker(Arc::clone(&shared), id, progress_tx.clone()));
        }
        drop(progress_tx);

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        if let Err(e) = checkpointer.await {
            tracing::error!("Checkpoint task failed: {}", e);
        }

        shared.save_checkpoint().await;
        self.shutdown().await;

        if !shared.frontier.is_distributed() {
            tracing::debug!("Visited record holds {} URLs", self.visited_count().await);
        }

        let snapshot = shared.stats.snapshot();
        tracing::info!(
            "Crawl completed: {} processed, {} succeeded, {} errors",
            snapshot.processed,
            snapshot.success,
            snapshot.errors
        );
        Ok(snapshot)
    }

    async fn enqueue_seeds(&self) -> crate::Result<()> {
        let shared = &self.shared;
        let mut enqueued = 0;

        for seed in &shared.config.crawl.seeds {
            match normalize_url(seed) {
                Ok(url) => {
                    shared.frontier.add(CrawlTask::seed(url.to_string())).await?;
                    enqueued += 1;
                }
                Err(e) => tracing::warn!("Skipping invalid seed {}: {}", seed, e),
            }
        }

        tracing::info!("Enqueued {} seed URLs", enqueued);
        Ok(())
    }

    /// Writes a checkpoint now; failures are logged
    pub async fn checkpoint(&self) {
        self.shared.save_checkpoint().await;
    }

    /// Releases the fetcher and renderer; safe to call repeatedly
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        tracing::info!("Shutting down crawler");
        if let Some(renderer) = self.shared.capabilities.renderer() {
            renderer.close().await;
        }
        self.shared.fetcher.close().await;
    }

    /// Current counters
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    pub fn frontier(&self) -> &Arc<dyn Frontier> {
        &self.shared.frontier
    }

    /// Whether `initialize()` restored pending tasks from a checkpoint
    pub fn frontier_restored(&self) -> bool {
        self.shared.checkpoint.frontier_restored()
    }

    /// Number of URLs in the local visited record
    pub async fn visited_count(&self) -> usize {
        self.shared.visited.lock().await.len()
    }
}

/// Convenience entry point: build from configuration, crawl, return counters
pub async fn run_crawl(config: CrawlConfig) -> crate::Result<StatsSnapshot> {
    let orchestrator = Orchestrator::from_config(config).await?;
    orchestrator.crawl().await
}

async fn run_worker(shared: Arc<Shared>, id: usize, progress: mpsc::Sender<u64>) {
    tracing::debug!("Worker {} started", id);
    let interval = shared.config.checkpoint.interval.max(1);

    while let Some(task) = shared.frontier.get().await {
        if let Some(reason) = shared.limit_reached() {
            tracing::info!("{}, stopping crawl", reason);
            if let Err(e) = shared.frontier.requeue(task).await {
                tracing::warn!("Could not hand task back to frontier: {}", e);
            }
            shared.frontier.stop();
            break;
        }

        // mark_done must run even if a collaborator panics
        let result = AssertUnwindSafe(shared.process_task(&task))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(Outcome::Stored)) => shared.stats.record_success(),
            Ok(Ok(Outcome::FetchFailed)) => shared.stats.record_error(),
            Ok(Ok(outcome)) => tracing::debug!("Skipped {} ({:?})", task.url, outcome),
            Ok(Err(e)) => {
                tracing::error!("Error processing {} at depth {}: {}", task.url, task.depth, e);
                shared.stats.record_error();
            }
            Err(panic) => {
                tracing::error!(
                    "Panic while processing {} at depth {}: {}",
                    task.url,
                    task.depth,
                    panic_message(&*panic)
                );
                shared.stats.record_error();
            }
        }

        shared.frontier.mark_done(&task).await;

        let processed = shared.stats.record_processed();
        if processed % interval == 0 {
            // A full channel means a save is already pending
            let _ = progress.try_send(processed);
        }
    }

    tracing::debug!("Worker {} finished", id);
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

async fn run_checkpointer(shared: Arc<Shared>, mut progress: mpsc::Receiver<u64>) {
    while let Some(processed) = progress.recv().await {
        tracing::info!(
            "Progress: {} processed, {} queued",
            processed,
            shared.frontier.len().await
        );
        shared.save_checkpoint().await;
    }
}

impl Shared {
    /// Describes the crawl-wide limit that has been hit, if any
    fn limit_reached(&self) -> Option<String> {
        let crawl = &self.config.crawl;

        if let Some(max_urls) = crawl.max_urls {
            if self.stats.processed() >= max_urls {
                return Some(format!("URL limit of {} reached", max_urls));
            }
        }

        if let (Some(budget), Some(started)) = (crawl.time_budget_secs, self.started.get()) {
            if started.elapsed() >= Duration::from_secs(budget) {
                return Some(format!("Time budget of {}s exhausted", budget));
            }
        }

        None
    }

    async fn save_checkpoint(&self) {
        let visited = if self.frontier.is_distributed() {
            None
        } else {
            let mut urls: Vec<String> = self.visited.lock().await.iter().cloned().collect();
            urls.sort();
            Some(urls)
        };

        if let Err(e) = self
            .checkpoint
            .save(self.stats.snapshot(), visited, self.frontier.as_ref())
            .await
        {
            tracing::error!(
                "Failed to save checkpoint to {}: {}",
                self.checkpoint.path().display(),
                e
            );
        }
    }

    async fn is_visited(&self, url: &str) -> crate::Result<bool> {
        if self.frontier.is_distributed() {
            Ok(self.frontier.is_visited(url).await?)
        } else {
            Ok(self.visited.lock().await.contains(url))
        }
    }

    /// Claims `url`; false when another worker already did
    async fn mark_visited(&self, url: &str) -> crate::Result<bool> {
        if self.frontier.is_distributed() {
            Ok(self.frontier.mark_visited(url).await?)
        } else {
            Ok(self.visited.lock().await.insert(url.to_string()))
        }
    }

    /// The per-URL pipeline
    async fn process_task(&self, task: &CrawlTask) -> crate::Result<Outcome> {
        tracing::debug!("Processing {} at depth {}", task.url, task.depth);

        if self.is_visited(&task.url).await? {
            return Ok(Outcome::AlreadyVisited);
        }

        let Some(mut page) = self
            .fetcher
            .fetch(&task.url, self.config.fetch.retries)
            .await
        else {
            return Ok(Outcome::FetchFailed);
        };

        if !self.mark_visited(&task.url).await? {
            return Ok(Outcome::AlreadyVisited);
        }
        self.stats.add_bytes(page.body.len() as u64);

        if let Some(renderer) = self.capabilities.renderer() {
            if page.is_decoded() && needs_render(&self.config.render, page.text_or_empty()) {
                tracing::debug!("Rendering {}", task.url);
                let wait = Duration::from_millis(self.config.render.wait_for_js_ms);
                page = renderer.render(&task.url, page, wait).await?;
            }
        }

        let task_url = Url::parse(&task.url)?;
        let features = &self.config.features;

        if features.enable_trap_detection {
            if let Some(detector) = self.capabilities.trap_detector() {
                if detector.is_trap(&task_url, &page) {
                    tracing::warn!("Trap detected: {}", task.url);
                    return Ok(Outcome::Trap);
                }
            }
        }

        if features.enable_soft404_detection {
            if let Some(detector) = self.capabilities.soft404_detector() {
                if detector.is_soft_404(&page) {
                    tracing::info!("Soft 404 detected: {}", task.url);
                    return Ok(Outcome::Soft404);
                }
            }
        }

        let content_type = page.content_type();
        let class = ContentClass::classify(content_type.as_deref(), &page.final_url);
        let content = self.extract_content(task, class, &page);
        let structured = self.run_extractor(task, ContentClass::Structured, || {
            self.capabilities.structured().extract(&page)
        });

        let document = StoredDocument {
            url: task.url.clone(),
            final_url: page.final_url.clone(),
            depth: task.depth,
            status: page.status,
            content_type,
            class,
            content: Value::Object(content),
            structured: structured.unwrap_or(Value::Null),
            size_bytes: page.body.len(),
        };
        self.capabilities.store().store(&document)?;

        if self
            .config
            .crawl
            .max_depth
            .map_or(true, |max| task.depth < max)
        {
            self.enqueue_links(task, &task_url, class, &page).await?;
        }

        Ok(Outcome::Stored)
    }

    /// Runs the class extractor, the image OCR pass and boilerplate removal
    fn extract_content(
        &self,
        task: &CrawlTask,
        class: ContentClass,
        page: &FetchResult,
    ) -> Map<String, Value> {
        let features = &self.config.features;
        let mut content = Map::new();

        if class.is_enabled(features) {
            if let Some(extractor) = self.capabilities.extractor(class) {
                if let Some(value) = self.run_extractor(task, class, || extractor.extract(page)) {
                    content.insert(class.to_string(), value);
                }
            }
        }

        if class.wants_ocr(features) {
            if let Some(ocr) = self.capabilities.ocr() {
                if let Some(value) = self.run_extractor(task, class, || ocr.extract(page)) {
                    content.insert("ocr".to_string(), value);
                }
            }
        }

        if class == ContentClass::Html && features.enable_ml_extraction {
            if let (Some(remover), Some(html)) =
                (self.capabilities.boilerplate_remover(), page.text.as_deref())
            {
                content.insert(
                    "clean_text".to_string(),
                    Value::String(remover.main_content(html)),
                );
            }
        }

        content
    }

    /// Runs one extraction; a failure is logged and counted, never fatal
    fn run_extractor<F>(&self, task: &CrawlTask, class: ContentClass, extract: F) -> Option<Value>
    where
        F: FnOnce() -> crate::Result<Value>,
    {
        match extract() {
            Ok(value) => Some(value),
            Err(e) => {
                let error = match e {
                    HarvestError::Extract { .. } => e,
                    other => HarvestError::Extract {
                        class,
                        message: other.to_string(),
                    },
                };
                tracing::error!("Extraction failed for {}: {}", task.url, error);
                self.stats.record_error();
                None
            }
        }
    }

    /// Discovers, filters and enqueues outbound links at `depth + 1`
    async fn enqueue_links(
        &self,
        task: &CrawlTask,
        task_url: &Url,
        class: ContentClass,
        page: &FetchResult,
    ) -> crate::Result<()> {
        let Some(text) = page.text.as_deref() else {
            return Ok(());
        };

        let base = Url::parse(&page.final_url).unwrap_or_else(|_| task_url.clone());
        let source_host = extract_domain(task_url)
            .or_else(|| host_of(&page.final_url))
            .unwrap_or_default();

        let candidates = discover_links(text, class == ContentClass::Html, &base);
        let discovered = candidates.len();
        let mut seen = HashSet::new();
        let mut enqueued = 0;

        for candidate in candidates {
            let Ok(url) = normalize_url(&candidate) else {
                continue;
            };
            if !seen.insert(url.to_string()) {
                continue;
            }
            let Some(target_host) = extract_domain(&url) else {
                continue;
            };
            if !should_follow(&self.config.crawl, &source_host, &target_host) {
                continue;
            }

            let score = self
                .capabilities
                .importance_model()
                .map(|model| model.score(&url));
            let priority = compute_priority(&url, score);

            self.frontier
                .add(CrawlTask::new(url.to_string(), task.depth + 1, priority))
                .await?;
            enqueued += 1;
        }

        tracing::debug!(
            "{}: enqueued {} of {} discovered links",
            task.url,
            enqueued,
            discovered
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{ImportanceModel, Store};
    use crate::frontier::Strategy;
    use std::sync::Mutex as StdMutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MemoryStore(StdMutex<Vec<StoredDocument>>);

    impl Store for MemoryStore {
        fn store(&self, document: &StoredDocument) -> crate::Result<()> {
            self.0.lock().unwrap().push(document.clone());
            Ok(())
        }
    }

    struct FixedImportance(f64);

    /// Extractor that always returns the same string
    struct Tagged(&'static str);

    impl crate::capability::Extractor for Tagged {
        fn extract(&self, _page: &FetchResult) -> crate::Result<Value> {
            Ok(Value::String(self.0.to_string()))
        }
    }

    impl ImportanceModel for FixedImportance {
        fn score(&self, _url: &Url) -> f64 {
            self.0
        }
    }

    fn config(dir: &TempDir) -> CrawlConfig {
        let mut config = CrawlConfig::default();
        config.crawl.seeds = vec!["https://example.com/".to_string()];
        config.crawl.max_depth = Some(2);
        config.checkpoint.state_file = dir.path().join("crawl_state.json");
        config.output.output_dir = dir.path().to_path_buf();
        config
    }

    fn html_page(url: &str, body: &str) -> FetchResult {
        let mut headers = std::collections::HashMap::new();
        headers.insert("content-type".to_string(), "text/html".to_string());
        FetchResult::new(200, headers, url, body.as_bytes().to_vec())
    }

    fn orchestrator(config: CrawlConfig, caps: Capabilities) -> (Orchestrator, Arc<LocalFrontier>) {
        let frontier = Arc::new(LocalFrontier::new(config.crawl.strategy));
        let orchestrator = Orchestrator::new(config, frontier.clone(), caps);
        (orchestrator, frontier)
    }

    #[tokio::test]
    async fn test_enqueue_links_applies_follow_policy_and_priority() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.crawl.strategy = Strategy::Priority;
        let caps = Capabilities::new(Arc::new(MemoryStore::default()))
            .with_importance_model(Arc::new(FixedImportance(0.9)));
        let (orchestrator, frontier) = orchestrator(config, caps);

        let page = html_page(
            "https://example.com/",
            r#"<a href="/about">About</a>
               <a href="/about#team">About again</a>
               <a href="https://blog.example.com/post">Blog</a>
               <a href="https://unrelated.org/">Elsewhere</a>"#,
        );
        let task = CrawlTask::seed("https://example.com/");
        let task_url = Url::parse(&task.url).unwrap();

        orchestrator
            .shared
            .enqueue_links(&task, &task_url, ContentClass::Html, &page)
            .await
            .unwrap();

        let queued = frontier.snapshot().await.unwrap();
        let urls: Vec<&str> = queued.iter().map(|t| t.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://example.com/about", "https://blog.example.com/post"]
        );
        assert!(queued.iter().all(|t| t.depth == 1));
        assert!((queued[0].priority - 0.8).abs() < 1e-9);
        assert!((queued[1].priority - 0.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_limit_reached_on_max_urls() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.crawl.max_urls = Some(2);
        let (orchestrator, _) =
            orchestrator(config, Capabilities::new(Arc::new(MemoryStore::default())));

        assert!(orchestrator.shared.limit_reached().is_none());
        orchestrator.shared.stats.record_processed();
        orchestrator.shared.stats.record_processed();
        assert!(orchestrator.shared.limit_reached().is_some());
    }

    #[tokio::test]
    async fn test_local_visited_is_set_if_absent() {
        let dir = TempDir::new().unwrap();
        let (orchestrator, _) =
            orchestrator(config(&dir), Capabilities::new(Arc::new(MemoryStore::default())));
        let shared = &orchestrator.shared;

        assert!(!shared.is_visited("https://example.com/").await.unwrap());
        assert!(shared.mark_visited("https://example.com/").await.unwrap());
        assert!(!shared.mark_visited("https://example.com/").await.unwrap());
        assert!(shared.is_visited("https://example.com/").await.unwrap());
    }

    #[tokio::test]
    async fn test_extraction_failure_is_counted_not_fatal() {
        let dir = TempDir::new().unwrap();
        let caps = Capabilities::new(Arc::new(MemoryStore::default()))
            .with_extractor(ContentClass::Html, Arc::new(crate::capability::HtmlTextExtractor));
        let (orchestrator, _) = orchestrator(config(&dir), caps);

        let binary = FetchResult::new(
            200,
            [("content-type".to_string(), "text/html".to_string())].into(),
            "https://example.com/",
            vec![0xff, 0xfe],
        );
        let task = CrawlTask::seed("https://example.com/");
        let content = orchestrator
            .shared
            .extract_content(&task, ContentClass::Html, &binary);

        assert!(content.get("html").is_none());
        assert_eq!(orchestrator.stats().errors, 1);
    }

    #[tokio::test]
    async fn test_image_metadata_always_extracted_ocr_gated() {
        let image = FetchResult::new(
            200,
            [("content-type".to_string(), "image/png".to_string())].into(),
            "https://example.com/logo.png",
            vec![0x89, 0x50, 0x4e, 0x47],
        );
        let task = CrawlTask::seed("https://example.com/logo.png");

        for (extract_images, expect_ocr) in [(false, false), (true, true)] {
            let dir = TempDir::new().unwrap();
            let mut config = config(&dir);
            config.features.extract_images = extract_images;
            let caps = Capabilities::new(Arc::new(MemoryStore::default()))
                .with_extractor(ContentClass::Image, Arc::new(Tagged("metadata")))
                .with_ocr(Arc::new(Tagged("recognized text")));
            let (orchestrator, _) = orchestrator(config, caps);

            let content = orchestrator
                .shared
                .extract_content(&task, ContentClass::Image, &image);

            assert_eq!(content["image"], "metadata");
            assert_eq!(content.contains_key("ocr"), expect_ocr);
        }
    }

    #[test]
    fn test_panic_message_reads_common_payloads() {
        let literal: Box<dyn Any + Send> = Box::new("boom");
        let formatted: Box<dyn Any + Send> = Box::new(format!("bad {}", 1));
        let other: Box<dyn Any + Send> = Box::new(7_u8);

        assert_eq!(panic_message(&*literal), "boom");
        assert_eq!(panic_message(&*formatted), "bad 1");
        assert_eq!(panic_message(&*other), "non-string panic payload");
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let (orchestrator, _) =
            orchestrator(config(&dir), Capabilities::new(Arc::new(MemoryStore::default())));
        orchestrator.initialize().await;
        orchestrator.shutdown().await;
        orchestrator.shutdown().await;
    }
}
