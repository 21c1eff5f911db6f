use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{JournalError, Result};

/// Days a soft-deleted entry stays restorable.
pub const TRASH_RETENTION_DAYS: i64 = 30;

/// A user-authored journal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub content: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<String>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub word_count: usize,
}

/// An attachment carried inline with its entry. `data` is already text-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub data: String,
    pub name: String,
    pub size: u64,
}

/// The mutable part of an entry, as supplied on create and update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFields {
    pub title: String,
    pub content: String,
    /// `None` means today on create and "keep the current date" on update.
    pub date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub location: Option<String>,
    pub photos: Vec<Photo>,
}

impl EntryFields {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Trims every text field, drops blank tags and a blank location.
    /// Fails when the title or content is blank.
    pub(crate) fn normalized(self) -> Result<Self> {
        let title = self.title.trim().to_string();
        let content = self.content.trim().to_string();
        if title.is_empty() {
            return Err(JournalError::Validation("title must not be empty".into()));
        }
        if content.is_empty() {
            return Err(JournalError::Validation("content must not be empty".into()));
        }

        Ok(Self {
            title,
            content,
            date: self.date,
            tags: split_tags_iter(self.tags.iter().map(String::as_str)),
            location: self
                .location
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
            photos: self.photos,
        })
    }
}

/// Parses the comma-separated tag text users type.
pub fn parse_tags(raw: &str) -> Vec<String> {
    split_tags_iter(raw.split(','))
}

fn split_tags_iter<'a>(tags: impl Iterator<Item = &'a str>) -> Vec<String> {
    tags.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whitespace-delimited token count.
pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}

/// An entry sitting in the trash, with its fixed expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashEntry {
    #[serde(flatten)]
    pub entry: Entry,
    pub deleted_at: DateTime<Utc>,
    pub delete_after: DateTime<Utc>,
}

impl TrashEntry {
    pub fn new(entry: Entry, deleted_at: DateTime<Utc>) -> Self {
        Self {
            entry,
            deleted_at,
            delete_after: deleted_at + Duration::days(TRASH_RETENTION_DAYS),
        }
    }

    pub fn id(&self) -> &str {
        &self.entry.id
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.delete_after < now
    }

    /// Strips the trash bookkeeping.
    pub fn into_entry(self) -> Entry {
        self.entry
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_entry() -> Entry {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        Entry {
            id: "e1".into(),
            title: "Morning".into(),
            content: "Coffee and rain".into(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            tags: vec!["x".into()],
            location: None,
            photos: Vec::new(),
            created_at: at,
            updated_at: at,
            word_count: 3,
        }
    }

    #[test]
    fn word_count_ignores_surrounding_and_repeated_whitespace() {
        assert_eq!(word_count("one two  three"), 3);
        assert_eq!(word_count("  leading and trailing  "), 3);
        assert_eq!(word_count("tabs\tand\nnewlines"), 3);
        assert_eq!(word_count("single"), 1);
        assert_eq!(word_count("   "), 0);
    }

    #[test]
    fn normalization_trims_and_rejects_blank_fields() {
        let fields = EntryFields::new("  Title ", " body ")
            .with_tags(["a", " ", " b ", "a"])
            .with_location("   ");
        let normalized = fields.normalized().unwrap();
        assert_eq!(normalized.title, "Title");
        assert_eq!(normalized.content, "body");
        assert_eq!(normalized.tags, vec!["a", "b", "a"]);
        assert_eq!(normalized.location, None);

        assert!(matches!(
            EntryFields::new("   ", "body").normalized(),
            Err(JournalError::Validation(_))
        ));
        assert!(matches!(
            EntryFields::new("title", "\n\t").normalized(),
            Err(JournalError::Validation(_))
        ));
    }

    #[test]
    fn parse_tags_splits_on_commas() {
        assert_eq!(parse_tags("work, travel,,  , work"), vec!["work", "travel", "work"]);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn trash_entry_expires_thirty_days_after_deletion() {
        let deleted_at = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();
        let trashed = TrashEntry::new(sample_entry(), deleted_at);

        assert_eq!(trashed.delete_after, deleted_at + Duration::days(30));
        assert!(!trashed.is_expired(trashed.delete_after));
        assert!(trashed.is_expired(trashed.delete_after + Duration::milliseconds(1)));
    }

    #[test]
    fn trash_entry_json_is_flat_camel_case() {
        let deleted_at = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();
        let json = serde_json::to_value(TrashEntry::new(sample_entry(), deleted_at)).unwrap();

        assert_eq!(json["id"], "e1");
        assert_eq!(json["wordCount"], 3);
        assert_eq!(json["date"], "2024-05-01");
        assert!(json.get("deletedAt").is_some());
        assert!(json.get("deleteAfter").is_some());
        assert!(json.get("entry").is_none());
        assert!(json.get("location").is_none());
    }

    #[test]
    fn blank_stored_location_reads_as_none() {
        let mut json = serde_json::to_value(sample_entry()).unwrap();
        json["location"] = serde_json::json!("");
        let entry: Entry = serde_json::from_value(json).unwrap();
        assert_eq!(entry.location, None);
    }
}
