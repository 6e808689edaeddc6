//! Sieve: a polite, resumable, near-duplicate-aware web crawler
//!
//! This crate crawls a restricted set of domains with a pool of worker threads.
//! A shared frontier enforces a minimum delay between fetches to the same host
//! and persists every discovered URL so an interrupted crawl can resume, while
//! a simhash fingerprint index keeps near-duplicate pages out of the corpus
//! statistics.

pub mod config;
pub mod crawler;
pub mod frontier;
pub mod output;
pub mod stats;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum SieveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker {id} panicked")]
    WorkerPanicked { id: usize },

    #[error("Crawl halted before completion")]
    Halted,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, SieveError>;

// Re-export commonly used types
pub use config::Config;
pub use frontier::Frontier;
pub use stats::{Fingerprint, Stats};
pub use url::{extract_domain, normalize_url, url_key, UrlFilter};
