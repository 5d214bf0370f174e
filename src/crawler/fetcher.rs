//! HTTP fetcher
//!
//! Wraps a pooled `reqwest` client with:
//! - a global concurrency cap and a per-host cap, enforced here so callers
//!   never throttle on their own
//! - exponential backoff between attempts (`tokio-retry`)
//! - a single "could not fetch" signal: `fetch` returns `None` and never errors

use crate::config::FetchSettings;
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock, Semaphore};
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::Retry;
use tracing::{debug, error, warn};

/// Failure of one fetch attempt; never leaves this module
#[derive(Debug, Error)]
enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("failed to read body: {0}")]
    Body(#[source] reqwest::Error),
}

/// A successfully retrieved response
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    /// Header names are lowercase
    pub headers: HashMap<String, String>,
    /// URL after redirects
    pub final_url: String,
    pub body: Vec<u8>,
    /// Body decoded with the declared charset (UTF-8 when none is given),
    /// or `None` when it does not decode cleanly
    pub text: Option<String>,
}

impl FetchResult {
    /// Builds a result from parts, decoding the body when possible
    pub fn new(
        status: u16,
        headers: HashMap<String, String>,
        final_url: impl Into<String>,
        body: Vec<u8>,
    ) -> Self {
        let text = decode_body(&body, headers.get("content-type").map(String::as_str));
        Self {
            status,
            headers,
            final_url: final_url.into(),
            body,
            text,
        }
    }

    /// Lowercased `Content-Type` without parameters
    pub fn content_type(&self) -> Option<String> {
        self.headers.get("content-type").map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_lowercase()
        })
    }

    pub fn is_decoded(&self) -> bool {
        self.text.is_some()
    }

    /// Decoded text, or an empty string for binary bodies
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// Decodes `body` using the `charset` parameter of `content_type`
///
/// Unknown labels fall back to UTF-8, as reqwest does. Malformed input yields
/// `None` rather than replacement characters so binary bodies stay binary.
fn decode_body(body: &[u8], content_type: Option<&str>) -> Option<String> {
    let encoding = content_type
        .and_then(charset_param)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
}

fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

/// Lowercases header names; repeated headers are joined with ", "
fn collect_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut collected: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        collected
            .entry(name.as_str().to_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    collected
}

/// Pooled, retrying HTTP fetcher shared by all workers
pub struct Fetcher {
    settings: FetchSettings,
    client: RwLock<Option<Client>>,
    closed: AtomicBool,
    global_limit: Arc<Semaphore>,
    host_limits: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl Fetcher {
    /// Creates a fetcher; the HTTP client is built by [`Fetcher::initialize`]
    pub fn new(settings: FetchSettings) -> Self {
        let global_limit = Arc::new(Semaphore::new(settings.concurrent_requests.max(1)));
        Self {
            settings,
            client: RwLock::new(None),
            closed: AtomicBool::new(false),
            global_limit,
            host_limits: Mutex::new(HashMap::new()),
        }
    }

    /// Builds the pooled client
    ///
    /// A failure to build the pooled client is logged and an unpooled client
    /// is used instead. If that fails too, later fetches return `None`.
    /// Calling this after [`Fetcher::close`] reopens the fetcher.
    pub async fn initialize(&self) {
        let client = match self.pooled_builder().build() {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Failed to build pooled HTTP client ({}), falling back to unpooled", e);
                match self.unpooled_builder().build() {
                    Ok(client) => Some(client),
                    Err(e) => {
                        error!("Failed to build HTTP client: {}", e);
                        None
                    }
                }
            }
        };

        *self.client.write().await = client;
        self.closed.store(false, Ordering::SeqCst);
    }

    fn pooled_builder(&self) -> reqwest::ClientBuilder {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml,*/*"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        Client::builder()
            .user_agent(self.settings.user_agent.clone())
            .timeout(Duration::from_secs(self.settings.timeout_secs))
            .connect_timeout(Duration::from_secs(self.settings.timeout_secs.min(10)))
            .pool_max_idle_per_host(self.settings.per_host_concurrent)
            .default_headers(headers)
            .gzip(true)
            .brotli(true)
    }

    fn unpooled_builder(&self) -> reqwest::ClientBuilder {
        Client::builder()
            .user_agent(self.settings.user_agent.clone())
            .timeout(Duration::from_secs(self.settings.timeout_secs))
            .pool_max_idle_per_host(0)
    }

    /// Releases the client and its pooled connections; safe to call repeatedly
    ///
    /// Fetches after this return `None` until [`Fetcher::initialize`] is called.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if self.client.write().await.take().is_some() {
            debug!("HTTP client closed");
        }
    }

    /// Backoff schedule for one fetch: `retries - 1` waits growing from
    /// twice the base delay, capped at `max-backoff-secs`
    fn retry_strategy(&self, retries: usize) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(2)
            .factor(self.settings.backoff_base_ms.max(1))
            .max_delay(Duration::from_secs(self.settings.max_backoff_secs))
            .take(retries.saturating_sub(1))
    }

    /// Fetches a URL with up to `retries` attempts
    ///
    /// Transport failures and HTTP statuses >= 400 both consume an attempt.
    ///
    /// # Returns
    ///
    /// * `Some(FetchResult)` - A successful response
    /// * `None` - Every attempt failed, no client is available or the fetcher
    ///   is closed
    pub async fn fetch(&self, url: &str, retries: usize) -> Option<FetchResult> {
        if self.closed.load(Ordering::SeqCst) {
            warn!("Fetch of {} after close, skipping", url);
            return None;
        }
        if self.client.read().await.is_none() {
            self.initialize().await;
        }
        let client = self.client.read().await.clone()?;

        let host = crate::url::host_of(url).unwrap_or_default();
        let host_limit = self.host_limit(&host).await;

        let result = Retry::start(self.retry_strategy(retries.max(1)), || {
            self.attempt(&client, &host_limit, url)
        })
        .await;

        match result {
            Ok(fetched) => Some(fetched),
            Err(e) => {
                warn!("Failed to fetch {} after {} attempts: {}", url, retries.max(1), e);
                None
            }
        }
    }

    async fn host_limit(&self, host: &str) -> Arc<Semaphore> {
        let mut limits = self.host_limits.lock().await;
        Arc::clone(
            limits
                .entry(host.to_string())
                .or_insert_with(|| Arc::new(Semaphore::new(self.settings.per_host_concurrent.max(1)))),
        )
    }

    /// One independent attempt, holding a global and a per-host slot
    async fn attempt(
        &self,
        client: &Client,
        host_limit: &Semaphore,
        url: &str,
    ) -> Result<FetchResult, FetchError> {
        // Semaphores are never closed, so acquire only fails after close()
        let _global = self.global_limit.acquire().await.ok();
        let _host = host_limit.acquire().await.ok();

        let response = client.get(url).send().await.map_err(|e| {
            debug!("Attempt for {} failed: {}", url, e);
            FetchError::Transport(e)
        })?;

        let status = response.status().as_u16();
        if status >= 400 {
            debug!("Attempt for {} returned HTTP {}", url, status);
            return Err(FetchError::Status(status));
        }

        let final_url = response.url().to_string();
        let headers = collect_headers(response.headers());

        let body = response.bytes().await.map_err(FetchError::Body)?;

        Ok(FetchResult::new(status, headers, final_url, body.to_vec()))
    }
}
