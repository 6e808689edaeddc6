//! Integration tests for the crawler
//!
//! The crawl scenarios run the full worker pool against an in-process fake
//! web so timings and page contents are deterministic. The fetcher itself is
//! tested against a wiremock server.

use parking_lot::Mutex;
use sieve_crawler::config::{parse_config, Config, FetchConfig, UserAgentConfig};
use sieve_crawler::crawler::{Crawler, Fetch, FetchResult, HttpFetcher};
use sieve_crawler::frontier::Frontier;
use sieve_crawler::storage::{open_store, RecordStore};
use sieve_crawler::url::{domain_of, normalize_url, url_key, UrlFilter};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves canned HTML and records every request with its start time
struct FakeWeb {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<(String, Instant)>>,
}

impl FakeWeb {
    fn new(pages: Vec<(&str, String)>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|(url, html)| (url.to_string(), html))
                .collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requested(&self) -> Vec<String> {
        self.requests.lock().iter().map(|(u, _)| u.clone()).collect()
    }

    fn request_times(&self, host: &str) -> Vec<Instant> {
        self.requests
            .lock()
            .iter()
            .filter(|(u, _)| domain_of(u).as_deref() == Some(host))
            .map(|(_, t)| *t)
            .collect()
    }
}

impl Fetch for FakeWeb {
    fn fetch(&self, url: &str) -> FetchResult {
        self.requests.lock().push((url.to_string(), Instant::now()));
        match self.pages.get(url) {
            Some(html) => FetchResult::Success {
                final_url: url.to_string(),
                status_code: 200,
                content_type: "text/html".to_string(),
                body: html.clone().into_bytes(),
            },
            None => FetchResult::HttpError { status_code: 404 },
        }
    }
}

/// Creates a test configuration rooted in `dir`
fn create_test_config(
    dir: &Path,
    seeds: &[&str],
    threads: u32,
    delay_ms: u64,
    min_word_count: usize,
) -> Config {
    let seeds = seeds
        .iter()
        .map(|s| format!("\"{}\"", s))
        .collect::<Vec<_>>()
        .join(", ");
    let toml = format!(
        r#"
[crawler]
seed-urls = [{}]
threads-count = {}
time-delay = {}
min-word-count = {}

[user-agent]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
save-file = "{}"
summary-path = "{}"

[scope]
root-domain = "uci.edu"
allowed-domains = ["*.ics.uci.edu"]
"#,
        seeds,
        threads,
        delay_ms,
        min_word_count,
        dir.join("frontier.db").display(),
        dir.join("stats.md").display()
    );
    parse_config(&toml).expect("test config should parse")
}

fn page(body: &str) -> String {
    format!("<html><body>{}</body></html>", body)
}

fn links(urls: &[&str]) -> String {
    urls.iter()
        .map(|u| format!("<a href=\"{}\">more</a>", u))
        .collect::<Vec<_>>()
        .join(" ")
}

/// 121 distinct alphabetic words, each repeated twice
fn repeated_vocabulary() -> String {
    let mut words = Vec::new();
    for i in 0..121u8 {
        let word = format!("word{}{}", (b'a' + i / 26) as char, (b'a' + i % 26) as char);
        words.push(word.clone());
        words.push(word);
    }
    words.join(" ")
}

fn crawl(config: Config, web: Arc<FakeWeb>) -> (Crawler, sieve_crawler::output::CrawlReport) {
    let filter = UrlFilter::from_scope(&config.scope);
    let (frontier, _) = Frontier::open(&config, false, &filter).unwrap();
    let mut crawler = Crawler::with_parts(config, frontier, web);
    crawler.start().unwrap();
    let report = crawler.join().unwrap();
    (crawler, report)
}

#[test]
fn test_same_host_fetches_respect_politeness_delay() {
    let dir = TempDir::new().unwrap();
    let delay = Duration::from_millis(100);
    let config = create_test_config(
        dir.path(),
        &["https://a.ics.uci.edu"],
        4,
        delay.as_millis() as u64,
        1,
    );

    let web = Arc::new(FakeWeb::new(vec![
        (
            "https://a.ics.uci.edu/",
            page(&format!(
                "seed page {}",
                links(&[
                    "https://a.ics.uci.edu/one",
                    "https://a.ics.uci.edu/two",
                    "https://a.ics.uci.edu/three",
                    "https://b.ics.uci.edu/four",
                ])
            )),
        ),
        ("https://a.ics.uci.edu/one", page("first child")),
        ("https://a.ics.uci.edu/two", page("second child")),
        ("https://a.ics.uci.edu/three", page("third child")),
        ("https://b.ics.uci.edu/four", page("another host")),
    ]));

    let (_, report) = crawl(config, Arc::clone(&web));

    assert_eq!(report.pages_fetched, 5);
    assert!(!report.halted);

    let times = web.request_times("a.ics.uci.edu");
    assert_eq!(times.len(), 4);
    for pair in times.windows(2) {
        let gap = pair[1].duration_since(pair[0]);
        assert!(gap >= delay, "same-host fetches only {:?} apart", gap);
    }
}

#[test]
fn test_near_duplicate_page_is_excluded_and_not_followed() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &["https://www.ics.uci.edu"], 2, 0, 5);

    let vocabulary = repeated_vocabulary();
    let web = Arc::new(FakeWeb::new(vec![
        (
            "https://www.ics.uci.edu/",
            page(&format!(
                "department informatics research faculty students {}",
                links(&[
                    "https://www.ics.uci.edu/original",
                    "https://www.ics.uci.edu/copy",
                ])
            )),
        ),
        (
            "https://www.ics.uci.edu/original",
            page(&format!(
                "{} {}",
                vocabulary,
                links(&["https://www.ics.uci.edu/from-original"])
            )),
        ),
        (
            "https://www.ics.uci.edu/copy",
            page(&format!(
                "{} extra {}",
                vocabulary,
                links(&["https://www.ics.uci.edu/from-copy"])
            )),
        ),
    ]));

    let (crawler, report) = crawl(config, Arc::clone(&web));

    let requested = web.requested();
    assert!(requested.contains(&"https://www.ics.uci.edu/original".to_string()));
    assert!(requested.contains(&"https://www.ics.uci.edu/copy".to_string()));
    assert!(requested.contains(&"https://www.ics.uci.edu/from-original".to_string()));
    assert!(!requested.contains(&"https://www.ics.uci.edu/from-copy".to_string()));

    assert_eq!(report.pages_duplicate, 1);
    assert_eq!(report.unique_pages, 2);
    assert_eq!(crawler.stats().unique_pages(), 2);

    let longest = report.longest_page.expect("longest page recorded");
    assert_eq!(longest.url, "https://www.ics.uci.edu/original");
    assert_eq!(longest.word_count, 242);
}

#[test]
fn test_resume_fetches_only_pending_urls() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &["https://www.ics.uci.edu"], 3, 0, 1);
    let save_file = Path::new(&config.output.save_file).to_path_buf();

    let done = [
        "https://www.ics.uci.edu/",
        "https://www.ics.uci.edu/a",
        "https://vision.ics.uci.edu/b",
    ];
    let pending = ["https://www.ics.uci.edu/c", "https://vision.ics.uci.edu/d"];

    {
        let mut store = open_store(&save_file).unwrap();
        for (url, completed) in done
            .iter()
            .map(|u| (u, true))
            .chain(pending.iter().map(|u| (u, false)))
        {
            let normalized = normalize_url(url).unwrap();
            let domain = domain_of(url).unwrap();
            store
                .upsert(&url_key(&normalized), normalized.as_str(), &domain, completed)
                .unwrap();
        }
        store.flush().unwrap();
    }

    let web = Arc::new(FakeWeb::new(vec![
        ("https://www.ics.uci.edu/c", page("pending page one")),
        ("https://vision.ics.uci.edu/d", page("pending page two")),
    ]));

    let filter = UrlFilter::from_scope(&config.scope);
    let (frontier, recovery) = Frontier::open(&config, false, &filter).unwrap();
    assert_eq!(recovery.total_records, 5);
    assert_eq!(recovery.pending_replayed, 2);
    assert_eq!(recovery.seeded, 0);

    let mut crawler = Crawler::with_parts(config, frontier, Arc::clone(&web) as Arc<dyn Fetch>);
    crawler.start().unwrap();
    let report = crawler.join().unwrap();
    drop(crawler);

    let mut requested = web.requested();
    requested.sort();
    assert_eq!(requested, vec![pending[1].to_string(), pending[0].to_string()]);
    assert_eq!(report.pages_fetched, 2);

    let store = open_store(&save_file).unwrap();
    assert_eq!(store.count().unwrap(), 5);
    assert_eq!(store.count_completed(true).unwrap(), 5);
}

#[test]
fn test_restart_ignores_previous_progress() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &["https://www.ics.uci.edu"], 1, 0, 1);

    let web = Arc::new(FakeWeb::new(vec![(
        "https://www.ics.uci.edu/",
        page("informatics home"),
    )]));
    crawl(config.clone(), Arc::clone(&web));
    assert_eq!(web.requested().len(), 1);

    // Resuming a finished crawl has nothing to do
    let filter = UrlFilter::from_scope(&config.scope);
    let (frontier, recovery) = Frontier::open(&config, false, &filter).unwrap();
    assert_eq!(recovery.pending_replayed, 0);
    assert_eq!(recovery.seeded, 0);
    assert!(frontier.is_exhausted());
    drop(frontier);

    let (frontier, recovery) = Frontier::open(&config, true, &filter).unwrap();
    assert_eq!(recovery.total_records, 0);
    assert_eq!(recovery.seeded, 1);
    assert_eq!(frontier.pending_count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_http_fetcher_classifies_responses() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body><p>hello crawler</p></body></html>", "text/html"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("{}", "application/json"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let results = tokio::task::spawn_blocking(move || {
        let user_agent = UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        };
        let fetcher = HttpFetcher::new(&user_agent, &FetchConfig::default()).unwrap();
        ["/page", "/data.json", "/missing"]
            .iter()
            .map(|p| fetcher.fetch(&format!("{}{}", base_url, p)))
            .collect::<Vec<_>>()
    })
    .await
    .unwrap();

    match &results[0] {
        FetchResult::Success {
            status_code,
            content_type,
            body,
            ..
        } => {
            assert_eq!(*status_code, 200);
            assert!(content_type.starts_with("text/html"));
            assert!(String::from_utf8_lossy(body).contains("hello crawler"));
        }
        other => panic!("expected success, got {:?}", other),
    }
    assert!(matches!(
        &results[1],
        FetchResult::ContentMismatch { content_type } if content_type.starts_with("application/json")
    ));
    assert!(matches!(
        results[2],
        FetchResult::HttpError { status_code: 404 }
    ));
}
