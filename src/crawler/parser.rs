//! HTML parser for extracting links and words
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (from `<a>` tags)
//! - The page's visible words, used for simhash and word statistics

use scraper::{Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// English stop words removed before counting
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "ain", "all", "am", "an", "and", "any",
    "are", "aren", "as", "at", "be", "because", "been", "before", "being", "below", "between",
    "both", "but", "by", "can", "couldn", "d", "did", "didn", "do", "does", "doesn", "doing", "don",
    "down", "during", "each", "few", "for", "from", "further", "had", "hadn", "has", "hasn", "have",
    "haven", "having", "he", "her", "here", "hers", "herself", "him", "himself", "his", "how", "i",
    "if", "in", "into", "is", "isn", "it", "its", "itself", "just", "ll", "m", "ma", "me", "mightn",
    "more", "most", "mustn", "my", "myself", "needn", "no", "nor", "not", "now", "o", "of", "off",
    "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "re",
    "s", "same", "shan", "she", "should", "shouldn", "so", "some", "such", "t", "than", "that",
    "the", "their", "theirs", "them", "themselves", "then", "there", "these", "they", "this",
    "those", "through", "to", "too", "under", "until", "up", "ve", "very", "was", "wasn", "we",
    "were", "weren", "what", "when", "where", "which", "while", "who", "whom", "why", "will",
    "with", "won", "wouldn", "y", "you", "your", "yours", "yourself", "yourselves",
];

/// Elements whose text is never part of the page's words
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Extracts the absolute URLs of all followable links on a page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
///
/// Fragments are stripped and duplicates removed; first occurrence order is kept.
///
/// # Arguments
///
/// * `base_url` - The URL the page was served from, for resolving relative links
/// * `html` - The HTML content
///
/// # Example
///
/// ```
/// use sieve_crawler::crawler::extract_links;
///
/// let html = r#"<a href="/people#faculty">People</a><a href="/people">Again</a>"#;
/// let links = extract_links("https://www.ics.uci.edu/about", html);
/// assert_eq!(links, vec!["https://www.ics.uci.edu/people".to_string()]);
/// ```
pub fn extract_links(base_url: &str, html: &str) -> Vec<String> {
    let Ok(base_url) = Url::parse(base_url) else {
        return Vec::new();
    };
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        if let Some(href) = element.value().attr("href") {
            if let Some(absolute_url) = resolve_link(href, &base_url) {
                if seen.insert(absolute_url.clone()) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute, fragment-free URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);
    Some(absolute_url.to_string())
}

/// Extracts the words of a page
///
/// Text outside `<script>`/`<style>` is split into runs of word characters;
/// runs of two or more ASCII letters are kept, lowercased, with English stop
/// words removed. Digits or underscores inside a run disqualify it.
///
/// ```
/// use sieve_crawler::crawler::extract_words;
///
/// let words = extract_words("<p>The ICS faculty wrote 3 papers in 2023, v2 and R2D2.</p>");
/// assert_eq!(words, vec!["ics", "faculty", "wrote", "papers"]);
/// ```
pub fn extract_words(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut words = Vec::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let skipped = node
            .ancestors()
            .filter_map(|ancestor| ancestor.value().as_element())
            .any(|element| SKIPPED_ELEMENTS.contains(&element.name()));
        if skipped {
            continue;
        }

        tokenize_into(text, &mut words);
    }

    words
}

fn tokenize_into(text: &str, words: &mut Vec<String>) {
    for token in text.split(|c: char| !(c.is_alphanumeric() || c == '_')) {
        if token.len() < 2 || !token.chars().all(|c| c.is_ascii_alphabetic()) {
            continue;
        }
        let word = token.to_ascii_lowercase();
        if !STOP_WORDS.contains(&word.as_str()) {
            words.push(word);
        }
    }
}
