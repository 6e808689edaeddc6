//! Crawler coordinator - crawl orchestration
//!
//! This module wires the crawl together:
//! - Opening the frontier (resuming or restarting from the save file)
//! - Spawning the worker threads
//! - Joining them and aggregating their counters
//! - Writing the final report

use crate::config::Config;
use crate::crawler::fetcher::{Fetch, HttpFetcher};
use crate::crawler::worker::{run_worker, WorkerContext, WorkerSummary};
use crate::frontier::{Frontier, RecoveryReport};
use crate::output::{write_report, CrawlReport};
use crate::stats::Stats;
use crate::url::UrlFilter;
use crate::{Result, SieveError};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Main crawler structure
pub struct Crawler {
    config: Config,
    frontier: Arc<Frontier>,
    stats: Arc<Stats>,
    fetcher: Arc<dyn Fetch>,
    filter: Arc<UrlFilter>,
    recovery: RecoveryReport,
    workers: Vec<(usize, JoinHandle<Result<WorkerSummary>>)>,
    started_at: Option<Instant>,
}

impl Crawler {
    /// Creates a crawler backed by the save file and a real HTTP client
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `restart` - Discard the save file and start from the seeds
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Frontier opened and client built
    /// * `Err(SieveError)` - The save file or HTTP client could not be set up
    pub fn new(config: Config, restart: bool) -> Result<Self> {
        let filter = UrlFilter::from_scope(&config.scope);
        let (frontier, recovery) = Frontier::open(&config, restart, &filter)?;
        let fetcher = HttpFetcher::new(&config.user_agent, &config.fetch)?;

        let mut crawler = Self::with_parts(config, frontier, Arc::new(fetcher));
        crawler.recovery = recovery;
        Ok(crawler)
    }

    /// Creates a crawler from an already-open frontier and any fetcher
    pub fn with_parts(config: Config, frontier: Frontier, fetcher: Arc<dyn Fetch>) -> Self {
        let filter = UrlFilter::from_scope(&config.scope);
        let stats = Stats::from_config(&config);

        Self {
            config,
            frontier: Arc::new(frontier),
            stats: Arc::new(stats),
            fetcher,
            filter: Arc::new(filter),
            recovery: RecoveryReport::default(),
            workers: Vec::new(),
            started_at: None,
        }
    }

    /// Handle used to halt the crawl from another thread (e.g. a Ctrl-C handler)
    pub fn halt_handle(&self) -> Arc<Frontier> {
        Arc::clone(&self.frontier)
    }

    pub fn stats(&self) -> Arc<Stats> {
        Arc::clone(&self.stats)
    }

    pub fn recovery(&self) -> &RecoveryReport {
        &self.recovery
    }

    /// Spawns `threads-count` worker threads
    pub fn start(&mut self) -> Result<()> {
        if self.frontier.is_halted() {
            return Err(SieveError::Halted);
        }

        let count = self.config.crawler.threads_count as usize;
        tracing::info!(
            "Starting {} workers, politeness delay {:?}, {} urls pending",
            count,
            self.frontier.politeness_delay(),
            self.frontier.pending_count()
        );
        self.started_at = Some(Instant::now());

        for id in 0..count {
            let ctx = WorkerContext {
                id,
                frontier: Arc::clone(&self.frontier),
                stats: Arc::clone(&self.stats),
                fetcher: Arc::clone(&self.fetcher),
                filter: Arc::clone(&self.filter),
                min_word_count: self.config.crawler.min_word_count,
            };

            let spawned = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || run_worker(ctx));

            match spawned {
                Ok(handle) => self.workers.push((id, handle)),
                Err(e) => {
                    tracing::error!("Failed to spawn worker {}: {}", id, e);
                    self.frontier.halt();
                    return Err(e.into());
                }
            }
        }

        Ok(())
    }

    /// Waits for every worker, then writes the report
    ///
    /// The report is written even when a worker failed; the first failure is
    /// returned after all workers have stopped.
    pub fn join(&mut self) -> Result<CrawlReport> {
        let mut totals = WorkerSummary::default();
        let mut first_error = None;

        for (id, handle) in self.workers.drain(..) {
            match handle.join() {
                Ok(Ok(summary)) => totals += summary,
                Ok(Err(e)) => {
                    tracing::error!("Worker {} failed: {}", id, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                Err(_) => {
                    tracing::error!("Worker {} panicked", id);
                    self.frontier.halt();
                    if first_error.is_none() {
                        first_error = Some(SieveError::WorkerPanicked { id });
                    }
                }
            }
        }

        if let Err(e) = self.frontier.checkpoint() {
            tracing::warn!("Failed to checkpoint save file: {}", e);
        }

        let duration = self
            .started_at
            .map(|started| started.elapsed())
            .unwrap_or_default();
        let mut report = CrawlReport::new(self.stats.snapshot(), totals, duration);
        report.pages_resumed = self.recovery.pending_replayed;
        report.halted = self.frontier.is_halted();

        tracing::info!(
            "Crawl finished: {} pages fetched, {} unique pages in {:?}",
            report.pages_fetched,
            report.unique_pages,
            report.duration
        );

        let summary_path = Path::new(&self.config.output.summary_path);
        if let Err(e) = write_report(&report, summary_path) {
            tracing::error!("Failed to write summary to {}: {}", summary_path.display(), e);
            if first_error.is_none() {
                first_error = Some(e.into());
            }
        } else {
            tracing::info!("Summary written to {}", summary_path.display());
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }
}

/// Runs a complete crawl operation
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `restart` - Discard previous progress
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed (or was halted) and the summary was written
/// * `Err(SieveError)` - Crawl failed with an error
///
/// # Example
///
/// ```no_run
/// use sieve_crawler::config::load_config;
/// use sieve_crawler::crawler::run_crawl;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let report = run_crawl(config, false)?;
/// println!("{} unique pages", report.unique_pages);
/// # Ok(())
/// # }
/// ```
pub fn run_crawl(config: Config, restart: bool) -> Result<CrawlReport> {
    let mut crawler = Crawler::new(config, restart)?;
    crawler.start()?;
    crawler.join()
}
