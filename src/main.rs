//! Weir main entry point
//!
//! This is the command-line interface for the Weir crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use weir::config::{load_config_with_hash, Config};
use weir::crawler::{print_summary, run_crawl};
use weir::parse_crawl_url;

/// Weir: a concurrent bounded-depth web crawler
///
/// Weir starts from the seed URLs in its configuration, follows links up to
/// the configured depth with a pool of workers, and stores every titled page
/// it finds.
#[derive(Parser, Debug)]
#[command(name = "weir")]
#[command(version)]
#[command(about = "A concurrent bounded-depth web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, cli.json).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("weir=info,warn"),
            1 => EnvFilter::new("weir=debug,info"),
            2 => EnvFilter::new("weir=trace,debug"),
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

/// Handles the --dry-run mode: shows the validated plan
fn handle_dry_run(config: &Config) {
    println!("=== Weir Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Workers: {}", config.crawler.worker_count);
    println!("  Queue capacity: {}", config.crawler.queue_capacity);

    println!("\nUser Agent:");
    println!("  Header: {}", config.user_agent.header_value());
    println!(
        "  Timeouts: {}s request, {}s connect",
        config.user_agent.request_timeout_secs, config.user_agent.connect_timeout_secs
    );

    println!("\nStore:");
    println!("  Backend: {:?}", config.store.backend);
    println!("  Location: {}", config.store.location);

    println!("\nSeeds ({}):", config.seeds.len());
    let mut valid = 0;
    for seed in &config.seeds {
        match parse_crawl_url(&seed.url) {
            Ok(url) => {
                valid += 1;
                println!("  - {}", url);
            }
            Err(e) => println!("  - {} (skipped: {})", seed.url, e),
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling with {} seed URLs", valid);
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, json: bool) -> anyhow::Result<()> {
    tracing::info!(
        "Starting crawl: {} seeds, {} workers, max depth {}",
        config.seeds.len(),
        config.crawler.worker_count,
        config.crawler.max_depth
    );

    let summary = run_crawl(config).await.context("crawl failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}
