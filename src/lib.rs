//! Deep-Harvest: a resumable, horizontally-scalable crawl engine
//!
//! This crate implements the crawl orchestration core: an ordered frontier
//! (in-process or Redis-backed), a pooled retrying fetcher, a bounded worker
//! pool that drives the per-URL pipeline, and crash-safe checkpointing.
//! Content extraction, rendering, classification and storage are reached
//! through the collaborator traits in [`capability`].

pub mod capability;
pub mod checkpoint;
pub mod config;
pub mod crawler;
pub mod frontier;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Deep-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Frontier error: {0}")]
    Frontier(#[from] frontier::FrontierError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] checkpoint::CheckpointError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Parse error for {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Render error for {url}: {message}")]
    Render { url: String, message: String },

    #[error("Extraction error ({class}): {message}")]
    Extract {
        class: capability::ContentClass,
        message: String,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Deep-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use capability::{Capabilities, ContentClass};
pub use checkpoint::{CheckpointManager, CheckpointRecord};
pub use config::CrawlConfig;
pub use crawler::{CrawlStats, FetchResult, Fetcher, Orchestrator, StatsSnapshot};
pub use frontier::{CrawlTask, Frontier, LocalFrontier, RedisFrontier, Strategy};
pub use url::{extract_domain, normalize_url};
