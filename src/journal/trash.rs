use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::entry::{Entry, TrashEntry};
use crate::error::{JournalError, Result};
use crate::store::{self, KvStore, TRASH_KEY};

/// Soft-deleted entries, most recently deleted first.
pub struct TrashRepository {
    entries: Vec<TrashEntry>,
    store: Arc<dyn KvStore>,
}

impl TrashRepository {
    pub fn load(store: Arc<dyn KvStore>) -> Result<Self> {
        let entries: Vec<TrashEntry> = store::load_document(store.as_ref(), TRASH_KEY)?.unwrap_or_default();
        tracing::debug!("Loaded {} trashed entries", entries.len());
        Ok(Self { entries, store })
    }

    pub fn insert(&mut self, trashed: TrashEntry) -> Result<()> {
        tracing::debug!(
            "Moved entry {} to trash (expires {})",
            trashed.id(),
            trashed.delete_after
        );
        self.entries.insert(0, trashed);
        self.persist()
    }

    /// Takes the entry out of the trash and strips its deletion metadata.
    pub fn restore(&mut self, id: &str) -> Result<Entry> {
        let index = self.position(id)?;
        let restored = self.entries.remove(index).into_entry();
        tracing::debug!("Restored entry {} from trash", id);
        self.persist()?;
        Ok(restored)
    }

    pub fn purge(&mut self, id: &str) -> Result<()> {
        let index = self.position(id)?;
        self.entries.remove(index);
        tracing::info!("Permanently deleted entry {}", id);
        self.persist()
    }

    /// Empties the trash, returning how many entries were dropped.
    pub fn purge_all(&mut self) -> Result<usize> {
        let count = self.entries.len();
        self.entries.clear();
        tracing::info!("Emptied trash ({} entries)", count);
        self.persist()?;
        Ok(count)
    }

    /// Drops every entry whose `delete_after` is strictly before `now`.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let before = self.entries.len();
        self.entries.retain(|t| !t.is_expired(now));
        let removed = before - self.entries.len();

        if removed > 0 {
            tracing::info!("Cleaned up {} expired trash entries", removed);
            self.persist()?;
        }
        Ok(removed)
    }

    pub fn find(&self, id: &str) -> Option<&TrashEntry> {
        self.entries.iter().find(|t| t.id() == id)
    }

    pub fn list(&self) -> &[TrashEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn persist(&self) -> Result<()> {
        store::save_document(self.store.as_ref(), TRASH_KEY, &self.entries)
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.entries
            .iter()
            .position(|t| t.id() == id)
            .ok_or_else(|| JournalError::not_found(id))
    }
}
