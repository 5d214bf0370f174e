//! Deep-Harvest main entry point
//!
//! This is the command-line interface for the Deep-Harvest crawl engine.

use anyhow::{bail, Context};
use clap::Parser;
use deep_harvest::config::{load_config_with_seeds, CrawlConfig};
use deep_harvest::{CheckpointManager, Orchestrator, RedisFrontier};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Deep-Harvest: a resumable, horizontally-scalable crawl engine
///
/// Crawls outward from the configured seeds, checkpointing progress so an
/// interrupted run picks up where it left off. With distributed mode enabled,
/// any number of processes share one Redis-backed frontier.
#[derive(Parser, Debug)]
#[command(name = "deep-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resumable web crawl engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Additional seed URL (repeatable)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Discard any checkpoint (and shared Redis state) and start from the seeds
    #[arg(long, conflicts_with = "status")]
    fresh: bool,

    /// Print the shared frontier counters (distributed mode) and exit
    #[arg(long)]
    status: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_seeds(&cli.config, &cli.seeds)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.status {
        handle_status(&config).await
    } else {
        handle_crawl(config, cli.fresh).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("deep_harvest=info,warn"),
            1 => EnvFilter::new("deep_harvest=debug,info"),
            2 => EnvFilter::new("deep_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --status: reads the shared counters of a distributed crawl
async fn handle_status(config: &CrawlConfig) -> anyhow::Result<()> {
    let Some(frontier) = connect_shared_frontier(config).await? else {
        bail!("--status requires distributed mode with a redis-url");
    };
    let stats = frontier.stats().await?;

    println!("Frontier: {}", config.distributed.key_prefix);
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

/// Connects to the Redis frontier when distributed mode is configured
async fn connect_shared_frontier(config: &CrawlConfig) -> anyhow::Result<Option<RedisFrontier>> {
    let distributed = &config.distributed;
    let Some(redis_url) = distributed.redis_url.as_deref().filter(|_| distributed.enabled) else {
        return Ok(None);
    };

    let frontier =
        RedisFrontier::connect(redis_url, &distributed.key_prefix, config.crawl.strategy).await?;
    Ok(Some(frontier))
}

/// Handles the main crawl operation
async fn handle_crawl(config: CrawlConfig, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (discarding checkpoint)");
        CheckpointManager::new(config.checkpoint.state_file.clone(), false)
            .clear()
            .await?;
        if let Some(frontier) = connect_shared_frontier(&config).await? {
            frontier
                .clear()
                .await
                .context("failed to clear shared frontier")?;
            tracing::info!("Cleared shared frontier {}", config.distributed.key_prefix);
        }
    } else {
        tracing::info!("Starting crawl (will resume if a checkpoint exists)");
    }

    tracing::info!(
        "Seeds: {}, workers: {}, strategy: {}",
        config.crawl.seeds.len(),
        config.fetch.concurrent_requests,
        config.crawl.strategy
    );

    let orchestrator = Orchestrator::from_config(config).await?;
    match orchestrator.crawl().await {
        Ok(stats) => {
            println!("{}", stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
