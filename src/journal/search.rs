use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::entry::Entry;

/// Criteria for narrowing the entry list. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    /// Case-insensitive substring of the title, content or any tag.
    pub query: Option<String>,
    /// Exact tag membership.
    pub tag: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl EntryFilter {
    pub fn matches(&self, entry: &Entry) -> bool {
        let matches_query = match self.query.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(q) => {
                let q = q.to_lowercase();
                entry.title.to_lowercase().contains(&q)
                    || entry.content.to_lowercase().contains(&q)
                    || entry.tags.iter().any(|t| t.to_lowercase().contains(&q))
            }
        };
        let matches_tag = match self.tag.as_deref() {
            None | Some("") => true,
            Some(tag) => entry.tags.iter().any(|t| t == tag),
        };
        let after_from = self.from.map_or(true, |from| entry.date >= from);
        let before_to = self.to.map_or(true, |to| entry.date <= to);

        matches_query && matches_tag && after_from && before_to
    }
}

pub fn search<'a>(entries: &'a [Entry], filter: &EntryFilter) -> Vec<&'a Entry> {
    entries.iter().filter(|e| filter.matches(e)).collect()
}

/// Every distinct tag, sorted.
pub fn all_tags(entries: &[Entry]) -> Vec<String> {
    entries
        .iter()
        .flat_map(|e| e.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
