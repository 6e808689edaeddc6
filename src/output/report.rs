//! Final crawl report

use crate::crawler::WorkerSummary;
use crate::stats::{LongestPage, StatsSnapshot};
use std::time::Duration;

/// Everything the crawl learned, assembled once all workers have stopped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Distinct accepted page URLs (fragments ignored)
    pub unique_pages: usize,
    pub longest_page: Option<LongestPage>,
    /// Most frequent words, most frequent first
    pub top_words: Vec<(String, u64)>,
    /// Accepted pages per subdomain of the root domain, sorted by name
    pub subdomains: Vec<(String, u64)>,
    pub pages_fetched: u64,
    pub pages_accepted: u64,
    pub pages_low_content: u64,
    pub pages_duplicate: u64,
    pub pages_failed: u64,
    pub links_enqueued: u64,
    /// URLs replayed from the save file at startup
    pub pages_resumed: usize,
    /// True if the crawl was halted before the frontier ran dry
    pub halted: bool,
    pub duration: Duration,
}

impl CrawlReport {
    /// Combines the statistics with the workers' counters
    pub fn new(snapshot: StatsSnapshot, totals: WorkerSummary, duration: Duration) -> Self {
        Self {
            unique_pages: snapshot.unique_pages,
            longest_page: snapshot.longest_page,
            top_words: snapshot.top_words,
            subdomains: snapshot.subdomains,
            pages_fetched: totals.fetched,
            pages_accepted: totals.accepted,
            pages_low_content: totals.low_content,
            pages_duplicate: totals.duplicate,
            pages_failed: totals.failed,
            links_enqueued: totals.links_enqueued,
            pages_resumed: 0,
            halted: false,
            duration,
        }
    }
}

/// Prints a short form of the report to stdout
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Overview:");
    println!("  Unique pages: {}", report.unique_pages);
    match &report.longest_page {
        Some(longest) => println!(
            "  Longest page: {} ({} words)",
            longest.url, longest.word_count
        ),
        None => println!("  Longest page: none"),
    }
    println!("  Subdomains: {}", report.subdomains.len());
    println!(
        "  Duration: {:.1}s{}",
        report.duration.as_secs_f64(),
        if report.halted { " (halted)" } else { "" }
    );
    println!();

    println!("Pages:");
    println!("  Fetched: {}", report.pages_fetched);
    println!("  Accepted: {}", report.pages_accepted);
    println!("  Low content: {}", report.pages_low_content);
    println!("  Near-duplicate: {}", report.pages_duplicate);
    println!("  Failed: {}", report.pages_failed);
    println!("  New links queued: {}", report.links_enqueued);
    println!();

    if !report.top_words.is_empty() {
        println!("Top words:");
        for (word, count) in report.top_words.iter().take(10) {
            println!("  {}: {}", word, count);
        }
        println!();
    }
}
