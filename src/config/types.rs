use serde::Deserialize;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    pub scope: ScopeConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// URLs the crawl starts from on a fresh run
    #[serde(rename = "seed-urls")]
    pub seed_urls: Vec<String>,

    /// Number of worker threads
    #[serde(rename = "threads-count")]
    pub threads_count: u32,

    /// Minimum time between two fetches to the same domain (milliseconds)
    #[serde(rename = "time-delay")]
    pub time_delay: u64,

    /// Pages with fewer words than this are not fingerprinted or counted
    #[serde(rename = "min-word-count", default = "default_min_word_count")]
    pub min_word_count: usize,

    /// Maximum Hamming distance at which two pages count as near-duplicates
    #[serde(
        rename = "similarity-threshold",
        default = "default_similarity_threshold"
    )]
    pub similarity_threshold: u32,
}

impl CrawlerConfig {
    /// The politeness delay as a `Duration`
    pub fn politeness_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.time_delay)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite save file backing the frontier
    #[serde(rename = "save-file")]
    pub save_file: String,

    /// Path to the markdown summary written when the crawl finishes
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

/// Fetch layer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Optional caching server every request is routed through
    #[serde(rename = "cache-server", default)]
    pub cache_server: Option<String>,

    /// Request timeout (seconds)
    #[serde(default = "default_fetch_timeout")]
    pub timeout: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            cache_server: None,
            timeout: default_fetch_timeout(),
        }
    }
}

/// Which URLs the crawl is allowed to follow
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeConfig {
    /// Hosts under this domain are broken out in the subdomain report
    #[serde(rename = "root-domain")]
    pub root_domain: String,

    /// Domain patterns (e.g., "*.ics.uci.edu") whose URLs may be crawled
    #[serde(rename = "allowed-domains")]
    pub allowed_domains: Vec<String>,

    /// Domains that are only crawlable below a path prefix
    #[serde(rename = "path-rules", default)]
    pub path_rules: Vec<PathRule>,

    /// Query substrings that mark a URL as a crawler trap
    #[serde(rename = "blocked-query", default = "default_blocked_query")]
    pub blocked_query: Vec<String>,

    /// URLs longer than this are rejected
    #[serde(rename = "max-url-length", default = "default_max_url_length")]
    pub max_url_length: usize,

    /// A path segment appearing this many times marks a URL as a trap
    #[serde(
        rename = "max-repeated-segments",
        default = "default_max_repeated_segments"
    )]
    pub max_repeated_segments: usize,
}

/// Domain crawlable only below a path prefix
#[derive(Debug, Clone, Deserialize)]
pub struct PathRule {
    /// Domain pattern (e.g., "today.uci.edu" or "*.today.uci.edu")
    pub domain: String,

    /// Required path prefix (e.g., "/department/information_computer_sciences")
    #[serde(rename = "path-prefix")]
    pub path_prefix: String,
}

fn default_min_word_count() -> usize {
    50
}

fn default_similarity_threshold() -> u32 {
    3
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_blocked_query() -> Vec<String> {
    ["do=media", "image=", "ical=1", "outlook-ical=1", "tribe-bar-date"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_url_length() -> usize {
    1000
}

fn default_max_repeated_segments() -> usize {
    3
}
