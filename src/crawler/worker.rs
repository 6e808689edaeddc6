//! Crawl worker
//!
//! Each worker runs on its own OS thread and repeats one pipeline until the
//! frontier runs dry: dequeue, fetch, record completion, dedup, update stats,
//! enqueue the page's links, release the domain.

use crate::crawler::fetcher::{Fetch, FetchResult};
use crate::crawler::parser::{extract_links, extract_words};
use crate::frontier::Frontier;
use crate::stats::{compute_fingerprint, Stats};
use crate::url::{domain_of, UrlFilter};
use crate::{Result, UrlError};
use std::ops::AddAssign;
use std::sync::Arc;

/// Everything a worker thread needs, shared with the other workers
#[derive(Clone)]
pub struct WorkerContext {
    pub id: usize,
    pub frontier: Arc<Frontier>,
    pub stats: Arc<Stats>,
    pub fetcher: Arc<dyn Fetch>,
    pub filter: Arc<UrlFilter>,
    /// Pages with fewer words are not analyzed
    pub min_word_count: usize,
}

/// Per-worker page counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    /// URLs downloaded (any outcome)
    pub fetched: u64,
    /// Pages added to the statistics
    pub accepted: u64,
    /// Pages under the minimum word count
    pub low_content: u64,
    /// Pages skipped as near-duplicates
    pub duplicate: u64,
    /// Non-HTML, non-200, empty, or unreachable pages
    pub failed: u64,
    /// New URLs added to the frontier
    pub links_enqueued: u64,
}

impl AddAssign for WorkerSummary {
    fn add_assign(&mut self, other: Self) {
        self.fetched += other.fetched;
        self.accepted += other.accepted;
        self.low_content += other.low_content;
        self.duplicate += other.duplicate;
        self.failed += other.failed;
        self.links_enqueued += other.links_enqueued;
    }
}

/// Holds a domain leased from the frontier and releases it on drop
///
/// Dropping runs on every exit path, including early returns and unwinding,
/// so a domain can never stay busy after its worker moved on. Dropping while
/// the thread panics also halts the frontier, stopping the other workers.
pub struct DomainLease<'a> {
    frontier: &'a Frontier,
    domain: String,
}

impl<'a> DomainLease<'a> {
    pub fn new(frontier: &'a Frontier, domain: String) -> Self {
        Self { frontier, domain }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl Drop for DomainLease<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            tracing::error!("Worker panicked while holding {}, halting crawl", self.domain);
            self.frontier.halt();
        }
        self.frontier.mark_domain_done(&self.domain);
    }
}

/// Runs the worker loop until the frontier is exhausted or halted
///
/// A persistence failure halts the frontier, so the other workers stop too,
/// and is returned to the caller.
pub fn run_worker(ctx: WorkerContext) -> Result<WorkerSummary> {
    let mut summary = WorkerSummary::default();
    tracing::debug!(worker = ctx.id, "Worker started");

    while let Some(url) = ctx.frontier.get_tbd_url() {
        let Some(domain) = domain_of(&url) else {
            tracing::error!(worker = ctx.id, "Dequeued url {} has no domain", url);
            ctx.frontier.halt();
            return Err(UrlError::MissingDomain.into());
        };
        let _lease = DomainLease::new(&ctx.frontier, domain);

        if let Err(e) = process_url(&ctx, &url, &mut summary) {
            tracing::error!(worker = ctx.id, "Fatal error while processing {}: {}", url, e);
            ctx.frontier.halt();
            return Err(e);
        }
    }

    tracing::info!(worker = ctx.id, "Frontier is empty, stopping");
    Ok(summary)
}

fn process_url(ctx: &WorkerContext, url: &str, summary: &mut WorkerSummary) -> Result<()> {
    let result = ctx.fetcher.fetch(url);
    summary.fetched += 1;

    match result.status_code() {
        Some(status) => tracing::info!(worker = ctx.id, "Downloaded {}, status <{}>", url, status),
        None => tracing::info!(worker = ctx.id, "Downloaded {}, no response", url),
    }

    ctx.frontier.mark_url_complete(url)?;

    match result {
        FetchResult::Success {
            final_url,
            status_code: 200,
            body,
            ..
        } if !body.is_empty() => {
            let html = String::from_utf8_lossy(&body);
            analyze_page(ctx, url, &final_url, &html, summary)
        }
        FetchResult::Success { status_code, .. } => {
            tracing::debug!(worker = ctx.id, "Skipping {}: status {} with no usable body", url, status_code);
            summary.failed += 1;
            Ok(())
        }
        FetchResult::HttpError { status_code } => {
            tracing::debug!(worker = ctx.id, "Skipping {} due to status {}", url, status_code);
            summary.failed += 1;
            Ok(())
        }
        FetchResult::ContentMismatch { content_type } => {
            tracing::debug!(worker = ctx.id, "Skipping {}: content type {}", url, content_type);
            summary.failed += 1;
            Ok(())
        }
        FetchResult::NetworkError { error } => {
            tracing::warn!(worker = ctx.id, "Failed to download {}: {}", url, error);
            summary.failed += 1;
            Ok(())
        }
    }
}

fn analyze_page(
    ctx: &WorkerContext,
    url: &str,
    final_url: &str,
    html: &str,
    summary: &mut WorkerSummary,
) -> Result<()> {
    let words = extract_words(html);
    if words.len() < ctx.min_word_count {
        tracing::info!(
            worker = ctx.id,
            "Page {} ignored due to low word count ({})",
            url,
            words.len()
        );
        summary.low_content += 1;
        return Ok(());
    }

    let fingerprint = compute_fingerprint(&words);
    if !ctx.stats.insert_if_novel(fingerprint) {
        tracing::info!(
            worker = ctx.id,
            "Page {} is similar to an already seen page, skipping",
            url
        );
        summary.duplicate += 1;
        return Ok(());
    }

    summary.accepted += 1;
    ctx.stats.add_url(url);
    ctx.stats.add_words(&words);
    ctx.stats.update_longest_page(url, words.len());

    for link in extract_links(final_url, html) {
        if let Err(reason) = ctx.filter.check(&link) {
            tracing::trace!("Rejected {}: {}", link, reason);
            continue;
        }
        if ctx.frontier.add_url(&link)? {
            summary.links_enqueued += 1;
        }
    }

    Ok(())
}
