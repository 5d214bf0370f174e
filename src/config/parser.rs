use crate::config::types::CrawlConfig;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(CrawlConfig)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<CrawlConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<CrawlConfig, ConfigError> {
    parse_config_with_seeds(content, &[])
}

/// Parses TOML text, appends `extra_seeds`, then validates the result
///
/// Validation runs after the seeds are merged, so a file without seeds is
/// accepted as long as extra seeds are supplied.
pub fn parse_config_with_seeds(
    content: &str,
    extra_seeds: &[String],
) -> Result<CrawlConfig, ConfigError> {
    let mut config: CrawlConfig = toml::from_str(content)?;
    config.crawl.seeds.extend(extra_seeds.iter().cloned());
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a checkpoint can be matched to the configuration
/// that produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(CrawlConfig, String), ConfigError> {
    load_config_with_seeds(path, &[])
}

/// Like [`load_config_with_hash`], with command-line seeds merged in before
/// validation
///
/// The hash covers the file only.
pub fn load_config_with_seeds(
    path: &Path,
    extra_seeds: &[String],
) -> Result<(CrawlConfig, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config_with_seeds(&content, extra_seeds)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontier::Strategy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[crawl]
seeds = ["https://example.com/"]
strategy = "priority"
max-depth = 3
follow-external = true

[fetch]
concurrent-requests = 8
per-host-concurrent = 2

[checkpoint]
interval = 25
state-file = "/tmp/state.json"

[features]
enable-trap-detection = false
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawl.seeds.len(), 1);
        assert_eq!(config.crawl.strategy, Strategy::Priority);
        assert_eq!(config.crawl.max_depth, Some(3));
        assert!(config.crawl.follow_subdomains);
        assert!(config.crawl.follow_external);
        assert_eq!(config.fetch.concurrent_requests, 8);
        assert_eq!(config.fetch.retries, 3);
        assert_eq!(config.checkpoint.interval, 25);
        assert!(!config.features.enable_trap_detection);
        assert!(config.features.enable_soft404_detection);
        assert!(!config.distributed.enabled);
    }

    #[test]
    fn test_missing_max_depth_is_unbounded() {
        let config = parse_config(
            r#"
[crawl]
seeds = ["https://example.com/"]
"#,
        )
        .unwrap();

        assert_eq!(config.crawl.max_depth, None);
        assert_eq!(config.crawl.strategy, Strategy::BreadthFirst);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvest.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let result = parse_config(
            r#"
[crawl]
seeds = ["https://example.com/"]
strategy = "random"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[crawl]
seeds = ["https://example.com/"]

[fetch]
concurrent-requests = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_extra_seeds_satisfy_validation() {
        let file = create_temp_config(
            r#"
[crawl]
max-depth = 1
"#,
        );

        let missing = load_config_with_hash(file.path());
        assert!(matches!(missing, Err(ConfigError::Validation(_))));

        let seeds = vec!["https://example.com/".to_string()];
        let (config, hash) = load_config_with_seeds(file.path(), &seeds).unwrap();
        assert_eq!(config.crawl.seeds, seeds);
        assert_eq!(config.crawl.max_depth, Some(1));
        assert_eq!(hash, compute_config_hash(file.path()).unwrap());
    }

    #[test]
    fn test_extra_seeds_are_validated() {
        let result = parse_config_with_seeds(
            r#"
[crawl]
seeds = ["https://example.com/"]
"#,
            &["ftp://example.com/".to_string()],
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
