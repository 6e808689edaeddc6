//! Output module for crawl reports
//!
//! This module handles:
//! - Assembling the final crawl report
//! - Writing the markdown summary
//! - Printing reports and save file status to stdout

mod markdown;
mod report;
mod status;

pub use markdown::{format_markdown_report, write_report};
pub use report::{print_report, CrawlReport};
pub use status::{load_status, print_status, StoreStatus};
