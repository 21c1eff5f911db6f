use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::{self, KvStore, DRAFT_KEY};

/// Unsaved new-entry text. Tags stay as the raw comma-separated input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub date: String,
}

impl Draft {
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.content.trim().is_empty() && self.tags.trim().is_empty()
    }
}

pub struct DraftStore {
    store: Arc<dyn KvStore>,
}

impl DraftStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Overwrites whatever draft was there.
    pub fn save(&self, draft: &Draft) -> Result<()> {
        store::save_document(self.store.as_ref(), DRAFT_KEY, draft)
    }

    pub fn load(&self) -> Result<Option<Draft>> {
        store::load_document(self.store.as_ref(), DRAFT_KEY)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(DRAFT_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn save_overwrites_and_clear_removes() {
        let drafts = DraftStore::new(Arc::new(MemoryStore::new()));
        assert_eq!(drafts.load().unwrap(), None);

        let first = Draft {
            title: "Half a thought".into(),
            ..Draft::default()
        };
        drafts.save(&first).unwrap();
        let second = Draft {
            title: "Half a thought".into(),
            content: "and the rest".into(),
            tags: "ideas, later".into(),
            date: "2024-08-01".into(),
        };
        drafts.save(&second).unwrap();
        assert_eq!(drafts.load().unwrap(), Some(second));

        drafts.clear().unwrap();
        assert_eq!(drafts.load().unwrap(), None);
    }

    #[test]
    fn partial_stored_draft_fills_defaults() {
        let store = Arc::new(MemoryStore::new());
        store.set(DRAFT_KEY, r#"{"title":"t"}"#).unwrap();

        let draft = DraftStore::new(store).load().unwrap().unwrap();
        assert_eq!(draft.title, "t");
        assert!(draft.content.is_empty());
        assert!(!draft.is_blank());
    }
}
