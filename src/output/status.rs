//! Save file status
//!
//! Summarizes what a save file holds without starting a crawl.

use crate::storage::{DomainProgress, RecordStore, StorageResult};

/// Record totals of a save file
#[derive(Debug, Clone, Default)]
pub struct StoreStatus {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    pub domains: Vec<DomainProgress>,
}

/// Loads record totals from a store
pub fn load_status(store: &dyn RecordStore) -> StorageResult<StoreStatus> {
    let total = store.count()?;
    let completed = store.count_completed(true)?;

    Ok(StoreStatus {
        total,
        completed,
        pending: total.saturating_sub(completed),
        domains: store.domain_progress()?,
    })
}

/// Prints store status to stdout
pub fn print_status(status: &StoreStatus) {
    println!("=== Save File Status ===\n");

    println!("Overview:");
    println!("  Total urls discovered: {}", status.total);
    println!("  Downloaded: {}", status.completed);
    println!("  Pending: {}", status.pending);
    println!("  Domains: {}", status.domains.len());
    println!();

    if !status.domains.is_empty() {
        println!("By domain:");
        for progress in &status.domains {
            println!(
                "  {}: {} of {} downloaded, {} pending",
                progress.domain,
                progress.completed,
                progress.total,
                progress.pending()
            );
        }
        println!();
    }
}
