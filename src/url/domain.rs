use url::Url;

/// Extracts the politeness domain from a URL
///
/// The domain is the network location: the lowercase host, plus the port when
/// the URL carries a non-default one. Two URLs share a politeness queue exactly
/// when their domains are equal.
///
/// # Returns
///
/// * `Some(String)` - The `host[:port]` string
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sieve_crawler::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_domain(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Parses a URL string and extracts its politeness domain
pub fn domain_of(url: &str) -> Option<String> {
    Url::parse(url).ok().as_ref().and_then(extract_domain)
}

/// Extracts the lowercase hostname without any port
pub fn hostname_of(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
