//! Database module - SQLite key/value storage for serialized state

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::StoreError;

/// String-keyed blob storage, synchronous and fallible
pub trait BlobStore {
    /// Store `value` under `key`, replacing any previous value
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
}

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database (`:memory:` for a throwaway one)
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

impl BlobStore for Database {
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }
}

/// In-memory store with an optional size limit, for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: std::collections::HashMap<String, String>,
    limit: Option<usize>,
    pub writes: usize,
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_limit(limit: usize) -> Self {
        Self { limit: Some(limit), ..Self::default() }
    }
}

#[cfg(test)]
impl BlobStore for MemoryStore {
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(limit) = self.limit
            && value.len() > limit
        {
            return Err(StoreError::QuotaExceeded {
                key: key.to_string(),
                size: value.len(),
                limit,
            });
        }
        self.writes += 1;
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.get(key).cloned())
    }
}
