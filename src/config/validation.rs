use crate::config::types::{
    CheckpointSettings, CrawlConfig, CrawlSettings, DistributedSettings, FetchSettings,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_crawl_settings(&config.crawl)?;
    validate_fetch_settings(&config.fetch)?;
    validate_checkpoint_settings(&config.checkpoint)?;
    validate_distributed_settings(&config.distributed)?;
    Ok(())
}

/// Validates seeds and crawl limits
fn validate_crawl_settings(settings: &CrawlSettings) -> Result<(), ConfigError> {
    if settings.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in &settings.seeds {
        validate_seed(seed)?;
    }

    if settings.max_urls == Some(0) {
        return Err(ConfigError::Validation(
            "max_urls must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates a single seed URL
pub(crate) fn validate_seed(seed: &str) -> Result<(), ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Seed URL '{}' must use http or https",
            seed
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' has no host",
            seed
        )));
    }

    Ok(())
}

/// Validates pool sizing and retry settings
fn validate_fetch_settings(settings: &FetchSettings) -> Result<(), ConfigError> {
    if settings.concurrent_requests < 1 || settings.concurrent_requests > 1000 {
        return Err(ConfigError::Validation(format!(
            "concurrent_requests must be between 1 and 1000, got {}",
            settings.concurrent_requests
        )));
    }

    if settings.per_host_concurrent < 1
        || settings.per_host_concurrent > settings.concurrent_requests
    {
        return Err(ConfigError::Validation(format!(
            "per_host_concurrent must be between 1 and concurrent_requests ({}), got {}",
            settings.concurrent_requests, settings.per_host_concurrent
        )));
    }

    if settings.retries < 1 {
        return Err(ConfigError::Validation(
            "retries must be >= 1".to_string(),
        ));
    }

    if settings.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_checkpoint_settings(settings: &CheckpointSettings) -> Result<(), ConfigError> {
    if settings.interval < 1 {
        return Err(ConfigError::Validation(
            "checkpoint interval must be >= 1".to_string(),
        ));
    }

    if settings.state_file.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "state_file cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_distributed_settings(settings: &DistributedSettings) -> Result<(), ConfigError> {
    if !settings.enabled {
        return Ok(());
    }

    match settings.redis_url.as_deref() {
        None | Some("") => Err(ConfigError::Validation(
            "redis_url is required in distributed mode".to_string(),
        )),
        Some(url) => {
            let parsed = Url::parse(url).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid redis_url '{}': {}", url, e))
            })?;
            if parsed.scheme() != "redis" && parsed.scheme() != "rediss" {
                return Err(ConfigError::Validation(format!(
                    "redis_url must use redis:// or rediss://, got '{}'",
                    url
                )));
            }
            Ok(())
        }
    }
}
