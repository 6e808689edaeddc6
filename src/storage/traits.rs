//! Storage traits and error types
//!
//! This module defines the trait interface for the durable record store and
//! associated error types.

use crate::storage::{DomainProgress, UrlRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable mapping from a URL's record key to `(url, completed)`
///
/// Implementations must make every successful `upsert`/`set_completed`
/// durable once `flush` returns. The frontier serializes all access behind
/// its own lock, so implementations only need to be `Send`.
pub trait RecordStore: Send {
    /// Looks up a record by key
    fn get(&self, key: &str) -> StorageResult<Option<UrlRecord>>;

    /// Returns true if a record exists for the key
    fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Inserts or replaces the record for `key`
    ///
    /// # Arguments
    ///
    /// * `key` - The record key (hash of the normalized URL)
    /// * `url` - The normalized URL
    /// * `domain` - The politeness domain of the URL
    /// * `completed` - Whether the URL has been fetched
    fn upsert(&mut self, key: &str, url: &str, domain: &str, completed: bool)
        -> StorageResult<()>;

    /// Flips an existing record to completed
    ///
    /// Returns false if no record exists for the key.
    fn set_completed(&mut self, key: &str) -> StorageResult<bool>;

    /// Forces pending writes to stable storage
    fn flush(&mut self) -> StorageResult<()>;

    /// Compacts write-ahead state into the main file
    ///
    /// Not needed for durability; called once when a crawl stops.
    fn checkpoint(&mut self) -> StorageResult<()> {
        Ok(())
    }

    /// Loads every record (used for crash recovery)
    fn all_records(&self) -> StorageResult<Vec<UrlRecord>>;

    /// Counts all records
    fn count(&self) -> StorageResult<u64>;

    /// Counts records by completion flag
    fn count_completed(&self, completed: bool) -> StorageResult<u64>;

    /// Per-domain totals, sorted by domain
    fn domain_progress(&self) -> StorageResult<Vec<DomainProgress>>;

    /// Returns true if the store holds no records
    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.count()? == 0)
    }
}
