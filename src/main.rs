//! Bookdraw main entry point
//!
//! This is the command-line interface for the Bookdraw giveaway bot.

use anyhow::{Context, Result};
use bookdraw::config::{load_config_or_default, Config};
use bookdraw::output::read_last_run;
use bookdraw::{run_giveaways, Credentials};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Bookdraw: enters every open book giveaway for you
///
/// Bookdraw signs in to your account, pages through the open giveaways and
/// enters each one using the first saved shipping address. Every entry is
/// appended to the entry log.
#[derive(Parser, Debug)]
#[command(name = "bookdraw")]
#[command(version = "1.0.0")]
#[command(about = "Enters open book giveaways automatically", long_about = None)]
struct Cli {
    /// Account email
    #[arg(short, long, required_unless_present_any = ["dry_run", "show_log"])]
    username: Option<String>,

    /// Account password
    #[arg(short, long, required_unless_present_any = ["dry_run", "show_log"])]
    password: Option<String>,

    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what a run would do without signing in
    #[arg(long, conflicts_with = "show_log")]
    dry_run: bool,

    /// Print the entries recorded by the last run and exit
    #[arg(long, conflicts_with = "dry_run")]
    show_log: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_config_or_default(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Invalid built-in configuration".to_string(),
    })?;
    tracing::info!("Configuration loaded");

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }
    if cli.show_log {
        return handle_show_log(Path::new(&config.output.entry_log_path));
    }

    let (Some(username), Some(password)) = (cli.username, cli.password) else {
        anyhow::bail!("--username and --password are required");
    };
    handle_run(config, Credentials::new(username, password)).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bookdraw=info,warn"),
            1 => EnvFilter::new("bookdraw=debug,info"),
            2 => EnvFilter::new("bookdraw=trace,debug"),
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

/// Handles the --dry-run mode: shows what a run would do
fn handle_dry_run(config: &Config) {
    println!("=== Bookdraw Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Sign-in page: {}", config.site.sign_in_path);
    println!("  Giveaway listing: {}", config.site.giveaway_path);
    println!("  Listing API: {}", config.site.discovery_endpoint);

    println!("\nDiscovery:");
    println!("  Sort: {}", config.discovery.sort);
    println!(
        "  Format: {}",
        config.discovery.format.as_deref().unwrap_or("any")
    );
    println!(
        "  Genre: {}",
        config.discovery.genre.as_deref().unwrap_or("any")
    );
    println!("  Max pages: {}", config.discovery.max_pages);

    println!("\nCrawler:");
    println!("  User agent: {}", config.crawler.user_agent);
    println!(
        "  Max concurrent entries: {}",
        config.crawler.max_concurrent_entries
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);

    println!("\nOutput:");
    println!("  Entry log: {}", config.output.entry_log_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --show-log mode: prints the last run's entries
fn handle_show_log(path: &Path) -> Result<()> {
    let records = read_last_run(path)
        .with_context(|| format!("Failed to read entry log {}", path.display()))?;

    println!("Entry log: {}\n", path.display());
    if records.is_empty() {
        println!("No entries recorded in the last run");
    }
    for record in &records {
        println!("{}", record.to_line());
    }

    Ok(())
}

/// Handles the main giveaway run
async fn handle_run(config: Config, credentials: Credentials) -> Result<()> {
    tracing::info!(
        "Entry log: {}, max concurrent entries: {}",
        config.output.entry_log_path,
        config.crawler.max_concurrent_entries
    );

    match run_giveaways(config, credentials).await {
        Ok(summary) => {
            tracing::info!("Run finished with {} giveaways entered", summary.entered);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            Err(e.into())
        }
    }
}
