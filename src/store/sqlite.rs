use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::KvStore;
use crate::error::{JournalError, Result};

/// SQLite-backed document store: one row per key.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| JournalError::StoreRead {
            key: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| JournalError::StoreRead {
            key: ":memory:".to_string(),
            reason: e.to_string(),
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .map_err(|e| JournalError::StoreWrite {
            key: "documents".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock_conn();
        conn.query_row(
            "SELECT value FROM documents WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| JournalError::StoreRead {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock_conn();
        conn.execute(
            "INSERT INTO documents (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )
        .map_err(|e| JournalError::StoreWrite {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        tracing::trace!("Persisted document '{}' ({} bytes)", key, value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.lock_conn();
        conn.execute("DELETE FROM documents WHERE key = ?1", params![key])
            .map_err(|e| JournalError::StoreWrite {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daybook.sqlite3");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.set("journalEntries", "[]").unwrap();
            store.set("journalEntries", "[1]").unwrap();
            store.set("aiConfig", "{}").unwrap();
            store.remove("aiConfig").unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get("journalEntries").unwrap().as_deref(), Some("[1]"));
        assert_eq!(store.get("aiConfig").unwrap(), None);
    }

    #[test]
    fn removing_missing_key_is_ok() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.remove("journalDraft").unwrap();
        assert_eq!(store.get("journalDraft").unwrap(), None);
    }
}
