//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use deep_harvest::capability::{Capabilities, Soft404Detector, Store, StoredDocument};
use deep_harvest::checkpoint::{CheckpointManager, CheckpointRecord};
use deep_harvest::config::CrawlConfig;
use deep_harvest::crawler::{run_crawl, FetchResult, Orchestrator};
use deep_harvest::frontier::{CrawlTask, Frontier, LocalFrontier};
use deep_harvest::storage::open_store;
use deep_harvest::{HarvestError, StatsSnapshot};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling `seed` with output under `dir`
fn create_test_config(seed: &str, dir: &Path) -> CrawlConfig {
    let mut config = CrawlConfig::default();
    config.crawl.seeds = vec![seed.to_string()];
    config.crawl.max_depth = Some(2);
    config.fetch.concurrent_requests = 2;
    config.fetch.per_host_concurrent = 2;
    config.fetch.timeout_secs = 5;
    config.fetch.retries = 1;
    config.fetch.backoff_base_ms = 1;
    config.checkpoint.state_file = dir.join("crawl_state.json");
    config.output.output_dir = dir.join("out");
    config
}

/// Mounts an HTML page at `route`
async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
        .mount(server)
        .await;
}

/// Home links to two pages; page1 links back home and on to page2
async fn mount_small_site(server: &MockServer) {
    mount_page(
        server,
        "/",
        r#"<html><head><title>Home</title></head><body>
        <a href="/page1">Page 1</a>
        <a href="/page2">Page 2</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        server,
        "/page1",
        r#"<html><head><title>Page One</title></head><body>
        <a href="/">Home</a>
        <a href="/page2">Page 2</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        server,
        "/page2",
        r#"<html><head><title>Page Two</title></head><body><p>Leaf page</p></body></html>"#,
    )
    .await;
}

async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}

#[tokio::test]
async fn test_depth_zero_fetches_only_the_seed() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;
    let dir = TempDir::new().unwrap();

    let mut config = create_test_config(&format!("{}/", server.uri()), dir.path());
    config.crawl.max_depth = Some(0);

    let stats = run_crawl(config).await.unwrap();

    assert_eq!(stats.processed, 1);
    assert_eq!(stats.success, 1);
    assert_eq!(requested_paths(&server).await, vec!["/".to_string()]);
}

#[tokio::test]
async fn test_full_crawl_follows_links_and_stores_pages() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;
    let dir = TempDir::new().unwrap();
    let base = server.uri();

    let config = create_test_config(&format!("{}/", base), dir.path());
    let stats = run_crawl(config).await.unwrap();

    // Home and page2 are each enqueued twice; the second copies are skipped
    assert_eq!(stats.processed, 5);
    assert_eq!(stats.success, 3);
    assert_eq!(stats.errors, 0);
    assert!(stats.bytes_downloaded > 0);

    let store = open_store(&dir.path().join("out")).unwrap();
    assert_eq!(store.count().unwrap(), 3);

    let home = store.get(&format!("{}/", base)).unwrap().unwrap();
    assert_eq!(home.depth, 0);
    assert_eq!(home.content_class, "html");
    assert_eq!(home.content["html"]["title"], "Home");

    let leaf = store.get(&format!("{}/page2", base)).unwrap().unwrap();
    assert_eq!(leaf.status_code, 200);
    assert_eq!(leaf.content["html"]["title"], "Page Two");
}

#[tokio::test]
async fn test_failed_fetch_is_counted_as_error() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body><a href="/missing">Gone</a></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let config = create_test_config(&format!("{}/", server.uri()), dir.path());
    let stats = run_crawl(config).await.unwrap();

    assert_eq!(stats.processed, 2);
    assert_eq!(stats.success, 1);
    assert_eq!(stats.errors, 1);
}

#[tokio::test]
async fn test_max_urls_keeps_remaining_work_in_checkpoint() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
        <a href="/a">A</a><a href="/b">B</a><a href="/c">C</a>
        </body></html>"#,
    )
    .await;
    for route in ["/a", "/b", "/c"] {
        mount_page(&server, route, "<html><body><p>Leaf page</p></body></html>").await;
    }
    let dir = TempDir::new().unwrap();

    let mut config = create_test_config(&format!("{}/", server.uri()), dir.path());
    config.fetch.concurrent_requests = 1;
    config.fetch.per_host_concurrent = 1;
    config.crawl.max_urls = Some(2);
    let state_file = config.checkpoint.state_file.clone();

    let stats = run_crawl(config).await.unwrap();
    assert_eq!(stats.processed, 2);

    let record = CheckpointManager::new(state_file, false)
        .read()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.processed, 2);
    assert_eq!(record.visited.unwrap().len(), 2);
    assert_eq!(record.frontier.unwrap().len(), 2);
}

#[tokio::test]
async fn test_resume_from_checkpoint_skips_seeds() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;
    let dir = TempDir::new().unwrap();
    let base = server.uri();

    let mut config = create_test_config(&format!("{}/", base), dir.path());
    config.crawl.max_depth = Some(1);

    let previous = StatsSnapshot {
        processed: 4,
        success: 3,
        errors: 1,
        bytes_downloaded: 0,
    };
    let record = CheckpointRecord::new(
        previous,
        Some(vec![format!("{}/", base)]),
        Some(vec![CrawlTask::new(format!("{}/page1", base), 1, 0.5)]),
    );
    CheckpointManager::new(config.checkpoint.state_file.clone(), false)
        .write(&record)
        .await
        .unwrap();

    let stats = run_crawl(config).await.unwrap();

    assert_eq!(stats.processed, 5);
    assert_eq!(stats.success, 4);
    assert_eq!(stats.errors, 1);
    assert_eq!(requested_paths(&server).await, vec!["/page1".to_string()]);
}

#[tokio::test]
async fn test_legacy_checkpoint_restores_counters_and_enqueues_seeds() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;
    let dir = TempDir::new().unwrap();

    let mut config = create_test_config(&format!("{}/", server.uri()), dir.path());
    config.crawl.max_depth = Some(0);

    let legacy = serde_json::json!({
        "processed": 10,
        "success": 8,
        "errors": 2,
        "timestamp": "2024-01-01T00:00:00"
    });
    std::fs::write(
        &config.checkpoint.state_file,
        serde_json::to_vec_pretty(&legacy).unwrap(),
    )
    .unwrap();

    let stats = run_crawl(config).await.unwrap();

    assert_eq!(stats.processed, 11);
    assert_eq!(stats.success, 9);
    assert_eq!(stats.errors, 2);
    assert_eq!(requested_paths(&server).await, vec!["/".to_string()]);
}

/// Home links to a good page and a page that trips a collaborator
async fn mount_fork_site(server: &MockServer) {
    mount_page(
        server,
        "/",
        r#"<html><head><title>Home</title></head><body>
        <a href="/ok">Fine</a>
        <a href="/bad">Broken</a>
        </body></html>"#,
    )
    .await;
    mount_page(server, "/ok", "<html><body><p>Fine page</p></body></html>").await;
    mount_page(server, "/bad", "<html><body><p>Broken page</p></body></html>").await;
}

struct PanickingDetector;

impl Soft404Detector for PanickingDetector {
    fn is_soft_404(&self, page: &FetchResult) -> bool {
        if page.final_url.ends_with("/bad") {
            panic!("detector crashed on {}", page.final_url);
        }
        false
    }
}

/// Records stored URLs and refuses to store `/bad`
#[derive(Default)]
struct FailingStore(Mutex<Vec<String>>);

impl Store for FailingStore {
    fn store(&self, document: &StoredDocument) -> deep_harvest::Result<()> {
        if document.url.ends_with("/bad") {
            return Err(HarvestError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }
        self.0.lock().unwrap().push(document.url.clone());
        Ok(())
    }
}

fn local_orchestrator(config: CrawlConfig, capabilities: Capabilities) -> Orchestrator {
    let frontier: Arc<dyn Frontier> = Arc::new(LocalFrontier::new(config.crawl.strategy));
    Orchestrator::new(config, frontier, capabilities)
}

#[tokio::test]
async fn test_panicking_collaborator_does_not_stall_crawl() {
    let server = MockServer::start().await;
    mount_fork_site(&server).await;
    let dir = TempDir::new().unwrap();

    let config = create_test_config(&format!("{}/", server.uri()), dir.path());
    let capabilities = Capabilities::new(Arc::new(FailingStore::default()))
        .with_soft404_detector(Arc::new(PanickingDetector));
    let orchestrator = local_orchestrator(config, capabilities);

    let stats = tokio::time::timeout(Duration::from_secs(10), orchestrator.crawl())
        .await
        .expect("crawl finished instead of waiting on the panicked task")
        .unwrap();

    assert_eq!(stats.processed, 3);
    assert_eq!(stats.success, 2);
    assert_eq!(stats.errors, 1);
    assert_eq!(orchestrator.visited_count().await, 3);
    assert_eq!(orchestrator.frontier().len().await, 0);
}

#[tokio::test]
async fn test_failing_store_is_counted_as_error() {
    let server = MockServer::start().await;
    mount_fork_site(&server).await;
    let dir = TempDir::new().unwrap();

    let config = create_test_config(&format!("{}/", server.uri()), dir.path());
    let store = Arc::new(FailingStore::default());
    let orchestrator = local_orchestrator(config, Capabilities::new(store.clone()));

    let stats = tokio::time::timeout(Duration::from_secs(10), orchestrator.crawl())
        .await
        .expect("crawl finished")
        .unwrap();

    assert_eq!(stats.processed, 3);
    assert_eq!(stats.success, 2);
    assert_eq!(stats.errors, 1);

    let mut stored = store.0.lock().unwrap().clone();
    stored.sort();
    let base = server.uri();
    assert_eq!(stored, vec![format!("{}/", base), format!("{}/ok", base)]);
}
