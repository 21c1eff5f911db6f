use std::sync::Arc;

use uuid::Uuid;

use super::entry::{word_count, Entry, EntryFields};
use crate::clock::Clock;
use crate::error::{JournalError, Result};
use crate::store::{self, KvStore, ENTRIES_KEY};

/// Active entries, most recent first, mirrored to the store on every mutation.
pub struct EntryRepository {
    entries: Vec<Entry>,
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
}

impl EntryRepository {
    pub fn load(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Result<Self> {
        let entries: Vec<Entry> = store::load_document(store.as_ref(), ENTRIES_KEY)?.unwrap_or_default();
        tracing::debug!("Loaded {} journal entries", entries.len());
        Ok(Self {
            entries,
            store,
            clock,
        })
    }

    pub fn create(&mut self, fields: EntryFields) -> Result<Entry> {
        let fields = fields.normalized()?;
        let now = self.clock.now();

        let entry = Entry {
            id: self.fresh_id(),
            word_count: word_count(&fields.content),
            title: fields.title,
            content: fields.content,
            date: fields.date.unwrap_or_else(|| self.clock.today()),
            tags: fields.tags,
            location: fields.location,
            photos: fields.photos,
            created_at: now,
            updated_at: now,
        };

        self.entries.insert(0, entry.clone());
        tracing::debug!("Created entry {} ({} words)", entry.id, entry.word_count);
        self.persist()?;
        Ok(entry)
    }

    pub fn update(&mut self, id: &str, fields: EntryFields) -> Result<Entry> {
        let index = self.position(id)?;
        let fields = fields.normalized()?;
        let now = self.clock.now();

        let entry = &mut self.entries[index];
        entry.word_count = word_count(&fields.content);
        entry.title = fields.title;
        entry.content = fields.content;
        if let Some(date) = fields.date {
            entry.date = date;
        }
        entry.tags = fields.tags;
        entry.location = fields.location;
        entry.photos = fields.photos;
        entry.updated_at = now;

        let updated = entry.clone();
        tracing::debug!("Updated entry {}", id);
        self.persist()?;
        Ok(updated)
    }

    /// Takes the entry out of the sequence. The caller hands it on to the trash.
    pub fn remove(&mut self, id: &str) -> Result<Entry> {
        let index = self.position(id)?;
        let removed = self.entries.remove(index);
        tracing::debug!("Removed entry {} from active entries", id);
        self.persist()?;
        Ok(removed)
    }

    /// Puts a previously removed entry back at the front and returns the active copy.
    ///
    /// If the id is still active (a move whose second write was lost), the
    /// active entry is kept and nothing is written.
    pub(crate) fn reinsert(&mut self, entry: Entry) -> Result<Entry> {
        if let Some(active) = self.find(&entry.id) {
            tracing::warn!("Entry {} is already active; keeping the active copy", entry.id);
            return Ok(active.clone());
        }
        tracing::debug!("Reinserted entry {}", entry.id);
        self.entries.insert(0, entry.clone());
        self.persist()?;
        Ok(entry)
    }

    pub fn find(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn list(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the full sequence again, e.g. after an earlier failed write.
    pub fn persist(&self) -> Result<()> {
        store::save_document(self.store.as_ref(), ENTRIES_KEY, &self.entries)
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| JournalError::not_found(id))
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.find(&id).is_none() {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn setup() -> (EntryRepository, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap(),
        ));
        let repo = EntryRepository::load(store.clone(), clock.clone()).unwrap();
        (repo, store, clock)
    }

    #[test]
    fn create_then_find_returns_equal_entry() {
        let (mut repo, _store, clock) = setup();
        let created = repo
            .create(EntryFields::new("Walk", "long walk by the   river").with_tags(["outdoors"]))
            .unwrap();

        assert_eq!(repo.find(&created.id), Some(&created));
        assert_eq!(created.word_count, 5);
        assert_eq!(created.created_at, clock.now());
        assert_eq!(created.updated_at, clock.now());
        assert_eq!(created.date, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
    }

    #[test]
    fn create_prepends_and_persists() {
        let (mut repo, store, clock) = setup();
        let a = repo.create(EntryFields::new("A", "first")).unwrap();
        let b = repo.create(EntryFields::new("B", "second")).unwrap();

        let ids: Vec<&str> = repo.list().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec![b.id.as_str(), a.id.as_str()]);

        let reloaded = EntryRepository::load(store, clock).unwrap();
        assert_eq!(reloaded.list(), repo.list());
    }

    #[test]
    fn blank_title_or_content_is_rejected_without_change() {
        let (mut repo, store, _clock) = setup();

        assert!(matches!(
            repo.create(EntryFields::new("", "body")),
            Err(JournalError::Validation(_))
        ));
        assert!(matches!(
            repo.create(EntryFields::new("title", "")),
            Err(JournalError::Validation(_))
        ));
        assert!(repo.is_empty());
        assert!(store.get(ENTRIES_KEY).unwrap().is_none());
    }

    #[test]
    fn update_replaces_fields_and_keeps_identity_and_position() {
        let (mut repo, _store, clock) = setup();
        let a = repo
            .create(EntryFields::new("A", "alpha").with_location("Home"))
            .unwrap();
        let b = repo.create(EntryFields::new("B", "beta")).unwrap();

        clock.advance(Duration::minutes(5));
        let updated = repo
            .update(&a.id, EntryFields::new("A2", "alpha beta gamma").with_tags(["t"]))
            .unwrap();

        assert_eq!(updated.id, a.id);
        assert_eq!(updated.created_at, a.created_at);
        assert_eq!(updated.updated_at, clock.now());
        assert_eq!(updated.date, a.date);
        assert_eq!(updated.word_count, 3);
        assert_eq!(updated.location, None);
        assert_eq!(updated.tags, vec!["t"]);
        assert_eq!(repo.list()[0].id, b.id);
        assert_eq!(repo.list()[1], updated);
    }

    #[test]
    fn update_validates_after_lookup() {
        let (mut repo, _store, _clock) = setup();
        let a = repo.create(EntryFields::new("A", "alpha")).unwrap();

        assert!(repo
            .update("missing", EntryFields::new("x", "y"))
            .unwrap_err()
            .is_not_found());
        assert!(matches!(
            repo.update(&a.id, EntryFields::new("A", " ")),
            Err(JournalError::Validation(_))
        ));
        assert_eq!(repo.find(&a.id), Some(&a));
    }

    #[test]
    fn remove_missing_id_leaves_repository_unchanged() {
        let (mut repo, _store, _clock) = setup();
        let a = repo.create(EntryFields::new("A", "alpha")).unwrap();

        assert!(repo.remove("nope").unwrap_err().is_not_found());
        assert_eq!(repo.list(), &[a.clone()]);

        let removed = repo.remove(&a.id).unwrap();
        assert_eq!(removed, a);
        assert!(repo.is_empty());
    }

    #[test]
    fn failed_persist_keeps_in_memory_change() {
        let (mut repo, store, clock) = setup();
        store.set_fail_writes(true);

        let err = repo.create(EntryFields::new("A", "alpha")).unwrap_err();
        assert!(matches!(err, JournalError::StoreWrite { .. }));
        assert_eq!(repo.len(), 1);

        store.set_fail_writes(false);
        repo.persist().unwrap();
        let reloaded = EntryRepository::load(store, clock).unwrap();
        assert_eq!(reloaded.len(), 1);
    }
}
