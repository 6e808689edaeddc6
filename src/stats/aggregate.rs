//! Aggregate corpus statistics shared by all workers

use super::index::FingerprintIndex;
use super::simhash::Fingerprint;
use crate::config::Config;
use crate::url::hostname_of;
use parking_lot::Mutex;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use url::Url;

/// Words reported by [`Stats::top_50`]
pub const TOP_WORDS: usize = 50;

/// The page with the most words seen so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongestPage {
    pub url: String,
    pub word_count: usize,
}

/// Point-in-time copy of the statistics, used for reporting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub unique_pages: usize,
    pub longest_page: Option<LongestPage>,
    pub top_words: Vec<(String, u64)>,
    pub subdomains: Vec<(String, u64)>,
    pub fingerprints: usize,
}

/// Thread-safe crawl statistics
///
/// Each field sits behind its own lock. The only compound operation is
/// [`Stats::insert_if_novel`], which checks and inserts a fingerprint under a
/// single lock so two identical pages cannot both be accepted.
pub struct Stats {
    root_domain: String,
    similarity_threshold: u32,
    urls: Mutex<HashSet<String>>,
    words: Mutex<HashMap<String, u64>>,
    subdomains: Mutex<HashMap<String, u64>>,
    longest: Mutex<Option<LongestPage>>,
    fingerprints: Mutex<FingerprintIndex>,
}

impl Stats {
    /// Creates empty statistics
    ///
    /// # Arguments
    ///
    /// * `root_domain` - Hosts under this domain are counted per subdomain
    /// * `similarity_threshold` - Maximum Hamming distance of a near-duplicate
    pub fn new(root_domain: &str, similarity_threshold: u32) -> Self {
        Self {
            root_domain: root_domain.to_lowercase(),
            similarity_threshold,
            urls: Mutex::new(HashSet::new()),
            words: Mutex::new(HashMap::new()),
            subdomains: Mutex::new(HashMap::new()),
            longest: Mutex::new(None),
            fingerprints: Mutex::new(FingerprintIndex::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.scope.root_domain,
            config.crawler.similarity_threshold,
        )
    }

    /// Records an accepted page URL
    ///
    /// The fragment is ignored. Returns false if the URL was already counted.
    pub fn add_url(&self, url: &str) -> bool {
        let defragmented = url.split('#').next().unwrap_or(url).to_string();
        let host = Url::parse(&defragmented)
            .ok()
            .as_ref()
            .and_then(hostname_of);

        if !self.urls.lock().insert(defragmented) {
            return false;
        }

        if let Some(host) = host {
            if self.is_under_root(&host) {
                *self.subdomains.lock().entry(host).or_insert(0) += 1;
            }
        }
        true
    }

    /// Only proper subdomains count; the bare root host does not
    fn is_under_root(&self, host: &str) -> bool {
        host.strip_suffix(self.root_domain.as_str())
            .map_or(false, |prefix| prefix.len() > 1 && prefix.ends_with('.'))
    }

    /// Adds one occurrence of each word to the frequency table
    pub fn add_words<S: AsRef<str>>(&self, words: &[S]) {
        let mut table = self.words.lock();
        for word in words {
            match table.get_mut(word.as_ref()) {
                Some(count) => *count += 1,
                None => {
                    table.insert(word.as_ref().to_string(), 1);
                }
            }
        }
    }

    /// Replaces the longest page if `word_count` is strictly larger
    pub fn update_longest_page(&self, url: &str, word_count: usize) {
        let mut longest = self.longest.lock();
        let improves = longest
            .as_ref()
            .map_or(true, |current| word_count > current.word_count);
        if improves {
            *longest = Some(LongestPage {
                url: url.to_string(),
                word_count,
            });
        }
    }

    /// Adds a fingerprint unconditionally
    pub fn add_simhash(&self, fp: Fingerprint) {
        self.fingerprints.lock().insert(fp);
    }

    /// Returns true if a stored fingerprint is within the similarity threshold
    pub fn similar(&self, fp: Fingerprint) -> bool {
        self.fingerprints
            .lock()
            .similar(fp, self.similarity_threshold)
    }

    /// Inserts the fingerprint unless a near-duplicate is already stored
    ///
    /// Returns true if the page is novel.
    pub fn insert_if_novel(&self, fp: Fingerprint) -> bool {
        let mut index = self.fingerprints.lock();
        if index.similar(fp, self.similarity_threshold) {
            return false;
        }
        index.insert(fp);
        true
    }

    pub fn unique_pages(&self) -> usize {
        self.urls.lock().len()
    }

    pub fn longest_page(&self) -> Option<LongestPage> {
        self.longest.lock().clone()
    }

    /// The `n` most frequent words, most frequent first, ties alphabetical
    pub fn top_words(&self, n: usize) -> Vec<(String, u64)> {
        let mut words: Vec<(String, u64)> = self
            .words
            .lock()
            .iter()
            .map(|(word, count)| (word.clone(), *count))
            .collect();
        words.sort_by(|a, b| Reverse(a.1).cmp(&Reverse(b.1)).then_with(|| a.0.cmp(&b.0)));
        words.truncate(n);
        words
    }

    pub fn top_50(&self) -> Vec<(String, u64)> {
        self.top_words(TOP_WORDS)
    }

    /// Page counts per subdomain of the root domain, sorted by name
    pub fn subdomains(&self) -> Vec<(String, u64)> {
        let mut subdomains: Vec<(String, u64)> = self
            .subdomains
            .lock()
            .iter()
            .map(|(host, count)| (host.clone(), *count))
            .collect();
        subdomains.sort();
        subdomains
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            unique_pages: self.unique_pages(),
            longest_page: self.longest_page(),
            top_words: self.top_50(),
            subdomains: self.subdomains(),
            fingerprints: self.fingerprints.lock().len(),
        }
    }
}
