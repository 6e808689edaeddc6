//! Storage module for the durable record store
//!
//! This module persists one record per discovered URL:
//! - SQLite database initialization and schema management
//! - Discovery and completion bookkeeping
//! - Bulk loading for crash recovery
//! - Per-domain progress for the `--status` view

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{remove_database, SqliteRecordStore};
pub use traits::{RecordStore, StorageError, StorageResult};

use std::path::Path;

/// Initializes or opens a record store
///
/// # Arguments
///
/// * `path` - Path to the SQLite save file
///
/// # Returns
///
/// * `Ok(SqliteRecordStore)` - Successfully opened store
/// * `Err(StorageError)` - Failed to open or initialize the database
pub fn open_store(path: &Path) -> StorageResult<SqliteRecordStore> {
    SqliteRecordStore::open(path)
}

/// A persisted URL record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    /// SHA-256 hex of the normalized URL
    pub key: String,
    pub url: String,
    pub domain: String,
    pub completed: bool,
    pub discovered_at: String,
    pub completed_at: Option<String>,
}

/// Per-domain record totals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainProgress {
    pub domain: String,
    pub total: u64,
    pub completed: u64,
}

impl DomainProgress {
    /// Records discovered but not yet fetched
    pub fn pending(&self) -> u64 {
        self.total.saturating_sub(self.completed)
    }
}
