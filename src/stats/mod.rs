//! Near-duplicate detection and corpus statistics
//!
//! This module provides:
//! - 64-bit simhash fingerprints over a page's words
//! - A sorted fingerprint index with a bounded neighbour search
//! - Thread-safe aggregate statistics for the final report

mod aggregate;
mod index;
mod simhash;

pub use aggregate::{LongestPage, Stats, StatsSnapshot, TOP_WORDS};
pub use index::{FingerprintIndex, NEIGHBOR_WINDOW};
pub use simhash::{compute_fingerprint, word_hash, Fingerprint, FINGERPRINT_BITS};
