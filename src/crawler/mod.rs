//! Crawler module for web page fetching and processing
//!
//! This module contains the crawl pipeline, including:
//! - HTTP fetching behind the `Fetch` trait
//! - HTML parsing for links and words
//! - The worker loop run on each thread
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod worker;

pub use coordinator::{run_crawl, Crawler};
pub use fetcher::{build_http_client, fetch_url, Fetch, FetchResult, HttpFetcher};
pub use parser::{extract_links, extract_words, STOP_WORDS};
pub use worker::{run_worker, DomainLease, WorkerContext, WorkerSummary};
