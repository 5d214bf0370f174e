//! Configuration module for Deep-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use deep_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawler will use {} workers", config.fetch.concurrent_requests);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CheckpointSettings, CrawlConfig, CrawlSettings, DistributedSettings, FeatureFlags,
    FetchSettings, OutputSettings, RenderSettings,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, load_config_with_seeds, parse_config,
    parse_config_with_seeds,
};
pub use validation::validate;
