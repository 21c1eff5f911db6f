use std::collections::HashSet;

use super::entries::EntryRepository;
use super::entry::Entry;
use super::lifecycle::LifecycleManager;
use crate::error::Result;

/// Transient multi-select state for batch operations. Never persisted.
///
/// Ids are not checked against the repository when toggled; anything stale
/// is dropped when the selection is materialized.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    ids: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id` if absent, removes it if present. Returns whether it is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected entries that still exist, in repository order.
    pub fn materialize<'a>(&self, entries: &'a EntryRepository) -> Vec<&'a Entry> {
        entries
            .list()
            .iter()
            .filter(|e| self.ids.contains(&e.id))
            .collect()
    }

    /// Soft-deletes every still-valid selected entry and clears the selection.
    /// Entries that vanish mid-batch are skipped. Returns how many were deleted.
    ///
    /// A store failure stops the batch and is returned; entries moved before it
    /// stay moved in memory.
    pub fn batch_soft_delete(&mut self, manager: &mut LifecycleManager) -> Result<usize> {
        let valid: Vec<String> = self
            .materialize(manager.entries())
            .into_iter()
            .map(|e| e.id.clone())
            .collect();
        self.clear();

        let mut deleted = 0;
        for id in &valid {
            match manager.soft_delete(id) {
                Ok(_) => deleted += 1,
                Err(e) if e.is_not_found() => {
                    tracing::debug!("Skipping {} in batch delete: already gone", id);
                }
                Err(e) => {
                    tracing::warn!("Batch delete stopped at {} after {} entries: {}", id, deleted, e);
                    return Err(e);
                }
            }
        }

        tracing::info!("Moved {} selected entries to trash", deleted);
        Ok(deleted)
    }
}
