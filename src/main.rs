//! Sieve crawler main entry point
//!
//! This is the command-line interface for the Sieve crawler.

use clap::Parser;
use sieve_crawler::config::{load_config_with_hash, Config};
use sieve_crawler::crawler::Crawler;
use sieve_crawler::output::{load_status, print_report, print_status};
use sieve_crawler::storage::open_store;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Sieve: a polite, resumable web crawler
///
/// Sieve crawls a configured set of domains with a pool of worker threads,
/// waits between requests to the same host, skips near-duplicate pages, and
/// writes a summary of the words and subdomains it found.
#[derive(Parser, Debug)]
#[command(name = "sieve-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A polite, resumable web crawler", long_about = None)]
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

    /// Delete the save file and start again from the seed URLs
    #[arg(long, conflicts_with_all = ["dry_run", "status"])]
    restart: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "status")]
    dry_run: bool,

    /// Show progress stored in the save file and exit
    #[arg(long, conflicts_with = "dry_run")]
    status: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.status {
        handle_status(&config)?;
    } else {
        handle_crawl(config, cli.restart)?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sieve_crawler=info,warn"),
            1 => EnvFilter::new("sieve_crawler=debug,info"),
            2 => EnvFilter::new("sieve_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Sieve Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Worker threads: {}", config.crawler.threads_count);
    println!("  Politeness delay: {}ms", config.crawler.time_delay);
    println!("  Minimum word count: {}", config.crawler.min_word_count);
    println!(
        "  Similarity threshold: {} bits",
        config.crawler.similarity_threshold
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nFetch:");
    match &config.fetch.cache_server {
        Some(server) => println!("  Cache server: {}", server),
        None => println!("  Cache server: none (direct requests)"),
    }
    println!("  Timeout: {}s", config.fetch.timeout);

    println!("\nOutput:");
    println!("  Save file: {}", config.output.save_file);
    println!("  Summary: {}", config.output.summary_path);

    println!("\nScope (root domain {}):", config.scope.root_domain);
    for pattern in &config.scope.allowed_domains {
        println!("  - {}", pattern);
    }
    for rule in &config.scope.path_rules {
        println!("  - {}{}", rule.domain, rule.path_prefix);
    }

    println!("\nSeed URLs ({}):", config.crawler.seed_urls.len());
    for seed in &config.crawler.seed_urls {
        println!("  * {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --status mode: shows progress from the save file
fn handle_status(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(&config.output.save_file);
    println!("Save file: {}\n", path.display());

    if !path.exists() {
        println!("No save file found; the next crawl starts from the seed URLs.");
        return Ok(());
    }

    let store = open_store(path)?;
    let status = load_status(&store)?;
    print_status(&status);

    Ok(())
}

/// Handles the main crawl operation
fn handle_crawl(config: Config, restart: bool) -> Result<(), Box<dyn std::error::Error>> {
    if restart {
        tracing::info!("Starting fresh crawl (ignoring previous state)");
    } else {
        tracing::info!("Starting crawl (will resume from the save file if present)");
    }
    tracing::info!("Total seed URLs: {}", config.crawler.seed_urls.len());

    let mut crawler = Crawler::new(config, restart)?;

    let frontier = crawler.halt_handle();
    ctrlc::set_handler(move || {
        tracing::warn!("Interrupt received, finishing in-flight pages");
        frontier.halt();
    })?;

    crawler.start()?;
    match crawler.join() {
        Ok(report) => {
            tracing::info!("Crawl completed successfully");
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
