//! Catalog-Sweep main entry point
//!
//! This is the command-line interface for the Catalog-Sweep harvester.

use anyhow::Context;
use catalog_sweep::config::{load_config_with_hash, Config};
use catalog_sweep::prompt::{ask_run_mode, format_indices};
use catalog_sweep::store::{JsonFileStore, Stores};
use catalog_sweep::sweep::{run_sweep, RunMode};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog-Sweep: a resumable list/detail catalog harvester
///
/// Catalog-Sweep opens every card of a client-rendered catalog, extracts its
/// fields and images, and checkpoints progress after each one so that an
/// interrupted run picks up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "catalog-sweep")]
#[command(version)]
#[command(about = "A resumable list/detail catalog harvester", long_about = None)]
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

    /// Re-attempt only the recorded failures without asking
    #[arg(long, conflicts_with = "skip_retry")]
    retry_failed: bool,

    /// Run a normal scan even if failures are recorded, without asking
    #[arg(long, conflicts_with = "retry_failed")]
    skip_retry: bool,

    /// Clear checkpoint, failures and records before starting
    #[arg(long, conflicts_with_all = ["retry_failed", "status", "dry_run"])]
    fresh: bool,

    /// Validate config and show what would be swept without launching a browser
    #[arg(long, conflicts_with = "status")]
    dry_run: bool,

    /// Show the persisted progress and exit
    #[arg(long, conflicts_with = "dry_run")]
    status: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let stores = Stores::from_config(&config.output);

    if cli.dry_run {
        handle_dry_run(&config, &stores);
    } else if cli.status {
        handle_status(&stores);
    } else {
        handle_sweep(&cli, &config, &stores).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_sweep=info,warn"),
            1 => EnvFilter::new("catalog_sweep=debug,info"),
            2 => EnvFilter::new("catalog_sweep=trace,debug"),
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

/// Handles --dry-run: shows the effective configuration and resume point
fn handle_dry_run(config: &Config, stores: &Stores) {
    println!("=== Catalog-Sweep Dry Run ===\n");

    println!("Catalog:");
    println!("  Root URL: {}", config.catalog.root_url);
    println!("  Card selector: {}", config.selectors.card);
    println!("  Detail marker: {}", config.selectors.detail_marker);

    println!("\nBrowser:");
    println!("  Headless: {}", config.browser.headless);
    println!(
        "  Viewport: {}x{}",
        config.browser.viewport_width, config.browser.viewport_height
    );
    println!(
        "  Scroll: {}px every {}ms (max {} steps)",
        config.browser.scroll_step, config.browser.scroll_interval_ms, config.browser.max_scroll_steps
    );

    println!("\nTimeouts:");
    println!("  Detail marker: {}ms", config.timeouts.detail_marker);
    println!("  List reappear: {}ms", config.timeouts.list_reappear);
    println!("  Asset fetch: {}ms", config.timeouts.asset_fetch);

    println!("\nOutput:");
    println!("  Checkpoint: {}", stores.checkpoint.path().display());
    println!("  Failures: {}", stores.failures.path().display());
    println!("  Records: {}", stores.records.path().display());
    println!("  Images: {}", config.output.images_dir.display());
    println!("  Prune failures on success: {}", config.retry.prune_on_success);

    println!("\n✓ Configuration is valid");
    println!("✓ Would resume from index {}", stores.checkpoint.read());
}

/// Handles --status: prints what the durable stores currently hold
fn handle_status(stores: &Stores) {
    let failed = stores.failures.read();

    println!("Checkpoint (next index): {}", stores.checkpoint.read());
    println!("Records saved: {}", stores.records.read().len());
    println!("Failed indices ({}): [{}]", failed.len(), format_indices(&failed));
}

/// Handles the main sweep
async fn handle_sweep(cli: &Cli, config: &Config, stores: &Stores) -> anyhow::Result<()> {
    if cli.fresh {
        tracing::info!("Starting fresh sweep (clearing previous state)");
        stores
            .reset_all()
            .context("failed to clear previous sweep state")?;
    }

    let failed = stores.failures.read();
    let mode = if cli.retry_failed {
        RunMode::RetryOnly
    } else if cli.skip_retry || failed.is_empty() {
        RunMode::Normal
    } else {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut output = std::io::stdout();
        ask_run_mode(&failed, &mut input, &mut output).context("failed to read answer")?
    };

    tracing::info!("Starting {} sweep of {}", mode, config.catalog.root_url);

    let summary = run_sweep(config, mode).await.context("sweep failed")?;

    tracing::info!(
        "Sweep finished: {} attempted, {} succeeded this run",
        summary.attempted,
        summary.succeeded
    );

    Ok(())
}
