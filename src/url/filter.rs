//! Crawl eligibility filter
//!
//! Decides whether a discovered URL is worth enqueueing: it must be HTTP(S),
//! inside the configured scope, and must not look like a crawler trap or a
//! non-HTML resource.

use crate::config::{PathRule, ScopeConfig};
use std::collections::HashMap;
use std::fmt;
use url::Url;

/// File extensions that never lead to crawlable HTML
const DISALLOWED_EXTENSIONS: &[&str] = &[
    "css", "js", "bmp", "gif", "jpg", "jpeg", "ico", "png", "tif", "tiff", "mid", "mp2", "mp3",
    "mp4", "wav", "avi", "mov", "mpeg", "ram", "m4v", "mkv", "ogg", "ogv", "pdf", "ps", "eps",
    "tex", "ppt", "pptx", "doc", "docx", "xls", "xlsx", "names", "data", "dat", "exe", "bz2",
    "tar", "msi", "bin", "7z", "psd", "dmg", "iso", "epub", "dll", "cnf", "tgz", "sha1", "txt",
    "thmx", "mso", "arff", "rtf", "jar", "csv", "ppsx", "rm", "smil", "wmv", "swf", "wma", "zip",
    "rar", "gz", "apk", "war", "img", "sql",
];

/// Why a URL was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Not a parseable absolute URL
    Unparseable,
    /// Scheme other than http/https
    Scheme,
    /// Host (or host + path) outside the configured scope
    OutOfScope,
    /// Query matches a known trap pattern
    TrapQuery,
    /// Path ends with a non-HTML file extension
    Extension,
    /// URL longer than the configured maximum
    TooLong,
    /// A path segment repeats too often
    RepeatedSegment,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Unparseable => "unparseable",
            Self::Scheme => "scheme",
            Self::OutOfScope => "out of scope",
            Self::TrapQuery => "trap query",
            Self::Extension => "file extension",
            Self::TooLong => "too long",
            Self::RepeatedSegment => "repeated path segment",
        };
        f.write_str(reason)
    }
}

/// Eligibility filter built from the `[scope]` configuration
#[derive(Debug, Clone)]
pub struct UrlFilter {
    allowed_domains: Vec<String>,
    path_rules: Vec<PathRule>,
    blocked_query: Vec<String>,
    max_url_length: usize,
    max_repeated_segments: usize,
}

impl UrlFilter {
    /// Builds a filter from the scope configuration
    pub fn from_scope(scope: &ScopeConfig) -> Self {
        Self {
            allowed_domains: scope
                .allowed_domains
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
            path_rules: scope.path_rules.clone(),
            blocked_query: scope.blocked_query.clone(),
            max_url_length: scope.max_url_length,
            max_repeated_segments: scope.max_repeated_segments,
        }
    }

    /// Returns true if the URL may be enqueued
    pub fn is_eligible(&self, url: &str) -> bool {
        self.check(url).is_ok()
    }

    /// Checks a URL, reporting the first rule it breaks
    pub fn check(&self, url_str: &str) -> Result<(), Rejection> {
        let url = Url::parse(url_str).map_err(|_| Rejection::Unparseable)?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Rejection::Scheme);
        }

        let host = url.host_str().ok_or(Rejection::Unparseable)?.to_lowercase();
        if !self.in_scope(&host, url.path()) {
            return Err(Rejection::OutOfScope);
        }

        if let Some(query) = url.query() {
            if self.blocked_query.iter().any(|b| query.contains(b.as_str())) {
                return Err(Rejection::TrapQuery);
            }
        }

        if has_disallowed_extension(url.path()) {
            return Err(Rejection::Extension);
        }

        if url_str.len() > self.max_url_length {
            return Err(Rejection::TooLong);
        }

        if has_repeated_segment(url.path(), self.max_repeated_segments) {
            return Err(Rejection::RepeatedSegment);
        }

        Ok(())
    }

    fn in_scope(&self, host: &str, path: &str) -> bool {
        if self
            .allowed_domains
            .iter()
            .any(|pattern| matches_wildcard(pattern, host))
        {
            return true;
        }

        self.path_rules.iter().any(|rule| {
            matches_wildcard(&rule.domain.to_lowercase(), host)
                && path.starts_with(rule.path_prefix.as_str())
        })
    }
}

/// Checks if a domain matches a wildcard pattern
///
/// `"example.com"` matches only itself; `"*.example.com"` matches the bare
/// domain and any subdomain at any depth. Both sides are expected lowercase.
///
/// ```
/// use sieve_crawler::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.ics.uci.edu", "ics.uci.edu"));
/// assert!(matches_wildcard("*.ics.uci.edu", "vision.ics.uci.edu"));
/// assert!(!matches_wildcard("*.ics.uci.edu", "physics.uci.edu"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || (candidate.len() > base.len()
                    && candidate.ends_with(base)
                    && candidate.as_bytes()[candidate.len() - base.len() - 1] == b'.')
        }
        None => candidate == pattern,
    }
}

fn has_disallowed_extension(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or("");
    match last.rsplit_once('.') {
        Some((_, ext)) => DISALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => false,
    }
}

fn has_repeated_segment(path: &str, limit: usize) -> bool {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let count = counts.entry(segment).or_insert(0);
        *count += 1;
        if *count >= limit {
            return true;
        }
    }
    false
}
