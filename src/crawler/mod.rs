//! Crawler module: fetching and per-URL pipeline orchestration
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry, backoff and concurrency caps
//! - Link and API endpoint discovery
//! - Follow, priority and render policies
//! - The worker pool that drives every dequeued task through the pipeline

mod fetcher;
mod orchestrator;
mod parser;
mod policy;
mod stats;

pub use fetcher::{FetchResult, Fetcher};
pub use orchestrator::{run_crawl, Orchestrator};
pub use parser::{detect_api_endpoints, discover_links, parse_html, ParsedPage};
pub use policy::{compute_priority, heuristic_priority, needs_render, should_follow};
pub use stats::{CrawlStats, StatsSnapshot};

pub(crate) use parser::extract_title;
