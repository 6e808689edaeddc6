//! Database schema definitions
//!
//! This module contains the SQL schema for the crawl save file.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per discovered URL, keyed by the SHA-256 of its normalized form
CREATE TABLE IF NOT EXISTS urls (
    key TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    domain TEXT NOT NULL,
    completed INTEGER NOT NULL DEFAULT 0,
    discovered_at TEXT NOT NULL,
    completed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_urls_completed ON urls(completed);
CREATE INDEX IF NOT EXISTS idx_urls_domain ON urls(domain);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}
