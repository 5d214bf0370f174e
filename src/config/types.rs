use crate::frontier::Strategy;
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for a crawl run
///
/// Immutable for the lifetime of a run; the orchestrator holds it behind an `Arc`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrawlConfig {
    #[serde(default)]
    pub crawl: CrawlSettings,
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub render: RenderSettings,
    #[serde(default)]
    pub checkpoint: CheckpointSettings,
    #[serde(default)]
    pub distributed: DistributedSettings,
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default)]
    pub output: OutputSettings,
}

/// Crawl scope and traversal policy
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlSettings {
    /// URLs enqueued at depth 0 (unless a checkpoint restored a frontier)
    #[serde(default)]
    pub seeds: Vec<String>,

    /// Frontier ordering discipline
    #[serde(default)]
    pub strategy: Strategy,

    /// Maximum link depth; `None` means unbounded
    #[serde(default)]
    pub max_depth: Option<u32>,

    #[serde(default = "default_true")]
    pub follow_subdomains: bool,

    #[serde(default)]
    pub follow_external: bool,

    /// Stop after this many processed URLs (cumulative across resumes)
    #[serde(default)]
    pub max_urls: Option<u64>,

    /// Stop dequeuing once this many seconds have elapsed
    #[serde(default)]
    pub time_budget_secs: Option<u64>,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            strategy: Strategy::default(),
            max_depth: None,
            follow_subdomains: true,
            follow_external: false,
            max_urls: None,
            time_budget_secs: None,
        }
    }
}

/// HTTP fetching and pooling configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetchSettings {
    /// Global concurrency cap; also the number of workers
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Concurrent requests allowed against a single host
    #[serde(default = "default_per_host_concurrent")]
    pub per_host_concurrent: usize,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Total request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per URL, including the first one
    #[serde(default = "default_retries")]
    pub retries: usize,

    /// Base delay for exponential backoff (milliseconds)
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            concurrent_requests: default_concurrent_requests(),
            per_host_concurrent: default_per_host_concurrent(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            max_backoff_secs: default_max_backoff_secs(),
        }
    }
}

/// JavaScript rendering policy
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RenderSettings {
    #[serde(default)]
    pub enable_js: bool,

    /// How long the render engine waits for scripts to settle (milliseconds)
    #[serde(default = "default_wait_for_js_ms")]
    pub wait_for_js_ms: u64,

    /// Decoded text shorter than this is treated as an empty client-side shell
    #[serde(default = "default_min_text_length")]
    pub min_text_length: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            enable_js: false,
            wait_for_js_ms: default_wait_for_js_ms(),
            min_text_length: default_min_text_length(),
        }
    }
}

/// Checkpoint cadence and location
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CheckpointSettings {
    /// Save a checkpoint every N processed URLs
    #[serde(default = "default_checkpoint_interval")]
    pub interval: u64,

    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

impl Default for CheckpointSettings {
    fn default() -> Self {
        Self {
            interval: default_checkpoint_interval(),
            state_file: default_state_file(),
        }
    }
}

/// Multi-process / multi-node operation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DistributedSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub redis_url: Option<String>,

    /// Namespace for every key this crawl touches in the shared store
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    #[serde(default)]
    pub worker_id: Option<String>,
}

impl Default for DistributedSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            redis_url: None,
            key_prefix: default_key_prefix(),
            worker_id: None,
        }
    }
}

/// Per-feature extraction and classifier switches
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FeatureFlags {
    #[serde(default = "default_true")]
    pub extract_text: bool,
    #[serde(default = "default_true")]
    pub extract_pdfs: bool,
    #[serde(default = "default_true")]
    pub extract_office: bool,
    #[serde(default = "default_true")]
    pub extract_images: bool,
    #[serde(default = "default_true")]
    pub extract_videos: bool,
    #[serde(default = "default_true")]
    pub extract_audio: bool,
    #[serde(default = "default_true")]
    pub enable_ml_extraction: bool,
    #[serde(default = "default_true")]
    pub enable_trap_detection: bool,
    #[serde(default = "default_true")]
    pub enable_soft404_detection: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            extract_text: true,
            extract_pdfs: true,
            extract_office: true,
            extract_images: true,
            extract_videos: true,
            extract_audio: true,
            enable_ml_extraction: true,
            enable_trap_detection: true,
            enable_soft404_detection: true,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputSettings {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_concurrent_requests() -> usize {
    10
}

fn default_per_host_concurrent() -> usize {
    2
}

fn default_user_agent() -> String {
    format!("DeepHarvest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retries() -> usize {
    3
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_max_backoff_secs() -> u64 {
    15
}

fn default_wait_for_js_ms() -> u64 {
    2000
}

fn default_min_text_length() -> usize {
    500
}

fn default_checkpoint_interval() -> u64 {
    100
}

fn default_state_file() -> PathBuf {
    PathBuf::from("crawl_state.json")
}

fn default_key_prefix() -> String {
    "deepharvest".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./crawl_output")
}
