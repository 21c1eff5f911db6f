//! Moves entries between the active list and the trash, and owns the
//! retention sweep.
//!
//! The two repositories are separate documents in the store, so a move is two
//! writes: destination first, then source. A crash between them can leave the
//! entry in both lists (or, if the second write is lost, duplicated on
//! reload). Both halves are always applied in memory; the first store error is
//! reported.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use flume::Sender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::entries::EntryRepository;
use super::entry::{Entry, TrashEntry};
use super::trash::TrashRepository;
use crate::clock::Clock;
use crate::error::{JournalError, Result};
use crate::store::KvStore;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

pub struct LifecycleManager {
    entries: EntryRepository,
    trash: TrashRepository,
    clock: Arc<dyn Clock>,
}

impl LifecycleManager {
    pub fn new(entries: EntryRepository, trash: TrashRepository, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries,
            trash,
            clock,
        }
    }

    /// Loads both repositories from `store`.
    pub fn open(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Result<Self> {
        let entries = EntryRepository::load(store.clone(), clock.clone())?;
        let trash = TrashRepository::load(store)?;
        Ok(Self::new(entries, trash, clock))
    }

    pub fn entries(&self) -> &EntryRepository {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut EntryRepository {
        &mut self.entries
    }

    pub fn trash(&self) -> &TrashRepository {
        &self.trash
    }

    pub fn trash_mut(&mut self) -> &mut TrashRepository {
        &mut self.trash
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Moves an active entry into the trash with a 30-day expiry.
    pub fn soft_delete(&mut self, id: &str) -> Result<TrashEntry> {
        let entry = self
            .entries
            .find(id)
            .cloned()
            .ok_or_else(|| JournalError::not_found(id))?;
        let trashed = TrashEntry::new(entry, self.clock.now());

        let inserted = self.trash.insert(trashed.clone());
        let removed = self.entries.remove(id).map(|_| ());
        inserted.and(removed)?;

        tracing::info!("Entry {} moved to trash", id);
        Ok(trashed)
    }

    /// Moves a trashed entry back to the front of the active list.
    pub fn restore_from_trash(&mut self, id: &str) -> Result<Entry> {
        let entry = self
            .trash
            .find(id)
            .map(|t| t.entry.clone())
            .ok_or_else(|| JournalError::not_found(id))?;

        let reinserted = self.entries.reinsert(entry);
        let removed = self.trash.restore(id).map(|_| ());
        let restored = reinserted.and_then(|active| removed.map(|_| active))?;

        tracing::info!("Entry {} restored from trash", id);
        Ok(restored)
    }

    pub fn sweep_expired(&mut self) -> Result<usize> {
        let now = self.clock.now();
        self.trash.sweep_expired(now)
    }

    /// Opens the journal and drops expired trash. A failed sweep is logged and
    /// the journal is returned as loaded.
    pub fn open_and_sweep(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Result<Self> {
        let mut manager = Self::open(store, clock)?;
        match manager.sweep_expired() {
            Ok(0) => {}
            Ok(removed) => tracing::info!("Removed {} expired entries from trash", removed),
            Err(e) => tracing::warn!("Could not clean up expired trash: {}", e),
        }
        Ok(manager)
    }
}

/// Result of one scheduled sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepReport {
    pub ran_at: DateTime<Utc>,
    /// Entries removed, or why the sweep failed.
    pub outcome: std::result::Result<usize, String>,
}

/// Sweeps once immediately, then every `every`, until the runtime shuts down.
///
/// A failed sweep is logged (and reported on `reports`) and the schedule
/// carries on. Must be called from within a tokio runtime.
pub fn start_periodic_sweep(
    manager: Arc<Mutex<LifecycleManager>>,
    every: Duration,
    reports: Option<Sender<SweepReport>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let report = {
                let mut guard = manager.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                let ran_at = guard.clock.now();
                let outcome = guard.sweep_expired().map_err(|e| e.to_string());
                SweepReport { ran_at, outcome }
            };

            match &report.outcome {
                Ok(0) => tracing::debug!("Trash sweep found nothing to remove"),
                Ok(removed) => tracing::info!("Trash sweep removed {} entries", removed),
                Err(reason) => tracing::warn!("Trash sweep failed: {}", reason),
            }

            if let Some(tx) = &reports {
                if tx.send(report).is_err() {
                    tracing::debug!("Sweep report receiver dropped");
                }
            }
        }
    })
}
