//! Key/value document storage.
//!
//! Each journal document (entries, trash, AI settings, draft) is one JSON
//! value stored under its own key and always read and written whole.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{JournalError, Result};

pub const ENTRIES_KEY: &str = "journalEntries";
pub const TRASH_KEY: &str = "journalTrash";
pub const AI_CONFIG_KEY: &str = "aiConfig";
pub const DRAFT_KEY: &str = "journalDraft";

/// Blob store the repositories persist into.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Decodes the document under `key`, or `None` when nothing was stored yet.
pub fn load_document<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| JournalError::StoreRead {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

pub fn save_document<T: Serialize + ?Sized>(store: &dyn KvStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value).map_err(|e| JournalError::StoreWrite {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    store.set(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_document_is_none() {
        let store = MemoryStore::new();
        let loaded: Option<Vec<String>> = load_document(&store, ENTRIES_KEY).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn undecodable_document_is_a_read_error() {
        let store = MemoryStore::new();
        store.set(TRASH_KEY, "{not json").unwrap();

        let err = load_document::<Vec<String>>(&store, TRASH_KEY).unwrap_err();
        assert!(matches!(err, JournalError::StoreRead { ref key, .. } if key == TRASH_KEY));
    }

    #[test]
    fn saved_document_loads_back() {
        let store = MemoryStore::new();
        save_document(&store, DRAFT_KEY, &vec!["a", "b"]).unwrap();

        let loaded: Option<Vec<String>> = load_document(&store, DRAFT_KEY).unwrap();
        assert_eq!(loaded, Some(vec!["a".to_string(), "b".to_string()]));
    }
}
