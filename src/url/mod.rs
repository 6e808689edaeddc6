//! URL handling module
//!
//! This module provides URL normalization, durable record keys, politeness
//! domain extraction, wildcard matching, and the crawl eligibility filter.

mod domain;
mod filter;
mod normalize;

pub use domain::{domain_of, extract_domain, hostname_of};
pub use filter::{matches_wildcard, Rejection, UrlFilter};
pub use normalize::{normalize_url, url_key};
