//! SQLite record store
//!
//! This module provides a SQLite-based implementation of the RecordStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordStore, StorageResult};
use crate::storage::{DomainProgress, UrlRecord};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite record store backend
pub struct SqliteRecordStore {
    conn: Connection,
}

impl SqliteRecordStore {
    /// Opens or creates the save file at `path`
    ///
    /// The database runs in WAL mode with `synchronous = FULL`, so every
    /// committed statement survives a process crash.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.pragma_update(None, "synchronous", "FULL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory store (for tests and dry runs)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Deletes a save file together with its WAL and shared-memory siblings
///
/// Missing files are not an error.
pub fn remove_database(path: &Path) -> std::io::Result<()> {
    let mut candidates = vec![path.to_path_buf()];
    for suffix in ["-wal", "-shm"] {
        let mut sibling = path.as_os_str().to_os_string();
        sibling.push(suffix);
        candidates.push(sibling.into());
    }

    for candidate in candidates {
        match std::fs::remove_file(&candidate) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<UrlRecord> {
    Ok(UrlRecord {
        key: row.get(0)?,
        url: row.get(1)?,
        domain: row.get(2)?,
        completed: row.get::<_, i64>(3)? != 0,
        discovered_at: row.get(4)?,
        completed_at: row.get(5)?,
    })
}

impl RecordStore for SqliteRecordStore {
    fn get(&self, key: &str) -> StorageResult<Option<UrlRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT key, url, domain, completed, discovered_at, completed_at
                 FROM urls WHERE key = ?1",
                params![key],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn contains(&self, key: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM urls WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    fn upsert(
        &mut self,
        key: &str,
        url: &str,
        domain: &str,
        completed: bool,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let completed_at = completed.then(|| now.clone());
        self.conn.execute(
            "INSERT INTO urls (key, url, domain, completed, discovered_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(key) DO UPDATE SET
                url = excluded.url,
                domain = excluded.domain,
                completed = excluded.completed,
                completed_at = excluded.completed_at",
            params![key, url, domain, completed as i64, now, completed_at],
        )?;
        Ok(())
    }

    fn set_completed(&mut self, key: &str) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE urls SET completed = 1, completed_at = COALESCE(completed_at, ?1)
             WHERE key = ?2",
            params![now, key],
        )?;
        Ok(updated > 0)
    }

    fn flush(&mut self) -> StorageResult<()> {
        // Every statement autocommits under synchronous=FULL
        Ok(())
    }

    fn checkpoint(&mut self) -> StorageResult<()> {
        self.conn
            .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        Ok(())
    }

    fn all_records(&self) -> StorageResult<Vec<UrlRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, url, domain, completed, discovered_at, completed_at
             FROM urls ORDER BY rowid",
        )?;
        let records = stmt
            .query_map([], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM urls", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_completed(&self, completed: bool) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM urls WHERE completed = ?1",
            params![completed as i64],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn domain_progress(&self) -> StorageResult<Vec<DomainProgress>> {
        let mut stmt = self.conn.prepare(
            "SELECT domain, COUNT(*), SUM(completed) FROM urls GROUP BY domain ORDER BY domain",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(DomainProgress {
                    domain: row.get(0)?,
                    total: row.get::<_, i64>(1)? as u64,
                    completed: row.get::<_, i64>(2)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
