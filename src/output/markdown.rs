//! Markdown summary generation
//!
//! This module generates the human-readable summary written at the end of a
//! crawl: unique pages, the longest page, the most common words, and the
//! per-subdomain page counts.

use crate::output::report::CrawlReport;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary of a crawl
///
/// # Arguments
///
/// * `report` - The crawl report
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(std::io::Error)` - Failed to write summary
pub fn write_report(report: &CrawlReport, output_path: &Path) -> std::io::Result<()> {
    let markdown = format_markdown_report(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl report as markdown
pub fn format_markdown_report(report: &CrawlReport) -> String {
    let mut md = String::new();

    md.push_str("# Sieve Crawl Summary\n\n");

    md.push_str("## Overview\n\n");
    md.push_str(&format!("- **Unique Pages**: {}\n", report.unique_pages));
    match &report.longest_page {
        Some(longest) => md.push_str(&format!(
            "- **Longest Page**: {} ({} words)\n",
            longest.url, longest.word_count
        )),
        None => md.push_str("- **Longest Page**: none\n"),
    }
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds ({:.2} minutes)\n",
        report.duration.as_secs_f64(),
        report.duration.as_secs_f64() / 60.0
    ));
    let status = if report.halted { "halted" } else { "completed" };
    md.push_str(&format!("- **Status**: {}\n\n", status));

    md.push_str("## Pages\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Fetched | {} |\n", report.pages_fetched));
    md.push_str(&format!("| Accepted | {} |\n", report.pages_accepted));
    md.push_str(&format!("| Low Content | {} |\n", report.pages_low_content));
    md.push_str(&format!("| Near-Duplicate | {} |\n", report.pages_duplicate));
    md.push_str(&format!("| Failed | {} |\n", report.pages_failed));
    md.push_str(&format!("| Resumed From Save File | {} |\n", report.pages_resumed));
    md.push_str(&format!("| New Links Queued | {} |\n\n", report.links_enqueued));

    if !report.top_words.is_empty() {
        md.push_str(&format!(
            "## Top {} Words\n\n",
            report.top_words.len()
        ));
        md.push_str("| Rank | Word | Count |\n");
        md.push_str("|------|------|-------|\n");
        for (rank, (word, count)) in report.top_words.iter().enumerate() {
            md.push_str(&format!("| {} | {} | {} |\n", rank + 1, word, count));
        }
        md.push('\n');
    }

    if !report.subdomains.is_empty() {
        md.push_str("## Subdomains\n\n");
        md.push_str(&format!("Total subdomains: {}\n\n", report.subdomains.len()));
        for (subdomain, count) in &report.subdomains {
            md.push_str(&format!("- {}, {}\n", subdomain, count));
        }
        md.push('\n');
    }

    md
}
