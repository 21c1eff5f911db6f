use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::entry::Entry;

pub const DEFAULT_TAG_CLOUD_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JournalStats {
    pub total_entries: usize,
    pub total_words: usize,
    pub total_tags: usize,
    pub streak_days: usize,
}

impl JournalStats {
    pub fn compute(entries: &[Entry], today: NaiveDate) -> Self {
        let distinct_tags: HashSet<&str> = entries
            .iter()
            .flat_map(|e| e.tags.iter().map(String::as_str))
            .collect();

        Self {
            total_entries: entries.len(),
            total_words: entries.iter().map(|e| e.word_count).sum(),
            total_tags: distinct_tags.len(),
            streak_days: streak_days(entries, today),
        }
    }
}

/// Consecutive calendar days with at least one entry, ending today. A streak
/// that last had an entry yesterday is still running.
pub fn streak_days(entries: &[Entry], today: NaiveDate) -> usize {
    let days: BTreeSet<NaiveDate> = entries.iter().map(|e| e.date).collect();

    let mut cursor = if days.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        match cursor.pred_opt() {
            Some(previous) => cursor = previous,
            None => break,
        }
    }
    streak
}

/// Entry count per day of the given month; index 0 is the 1st.
pub fn monthly_activity(entries: &[Entry], year: i32, month: u32) -> Vec<usize> {
    let Some(days) = days_in_month(year, month) else {
        return Vec::new();
    };

    let mut counts = vec![0; days as usize];
    for entry in entries {
        if entry.date.year() == year && entry.date.month() == month {
            counts[entry.date.day0() as usize] += 1;
        }
    }
    counts
}

/// Most used tags with their counts, highest first, ties by name.
pub fn tag_cloud(entries: &[Entry], limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for tag in entries.iter().flat_map(|e| e.tags.iter()) {
        *counts.entry(tag.as_str()).or_default() += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(tag, count)| (tag.to_string(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next_first - first).num_days() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry_on(date: NaiveDate, tags: &[&str], words: usize) -> Entry {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Entry {
            id: format!("{date}-{words}"),
            title: "t".into(),
            content: "c".into(),
            date,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            location: None,
            photos: Vec::new(),
            created_at: at,
            updated_at: at,
            word_count: words,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    #[test]
    fn totals_count_words_and_distinct_tags() {
        let entries = vec![
            entry_on(day(1), &["a", "b"], 10),
            entry_on(day(2), &["b"], 5),
        ];
        let stats = JournalStats::compute(&entries, day(20));
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.total_words, 15);
        assert_eq!(stats.total_tags, 2);
        assert_eq!(stats.streak_days, 0);
    }

    #[test]
    fn streak_counts_distinct_consecutive_days() {
        let entries = vec![
            entry_on(day(10), &[], 1),
            entry_on(day(10), &[], 2),
            entry_on(day(9), &[], 1),
            entry_on(day(8), &[], 1),
            entry_on(day(6), &[], 1),
        ];
        assert_eq!(streak_days(&entries, day(10)), 3);
        assert_eq!(streak_days(&entries, day(11)), 3);
        assert_eq!(streak_days(&entries, day(12)), 0);
        assert_eq!(streak_days(&[], day(12)), 0);
    }

    #[test]
    fn monthly_activity_buckets_by_day() {
        let entries = vec![
            entry_on(day(1), &[], 1),
            entry_on(day(29), &[], 1),
            entry_on(day(29), &[], 2),
            entry_on(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), &[], 1),
        ];
        let counts = monthly_activity(&entries, 2024, 2);
        assert_eq!(counts.len(), 29);
        assert_eq!(counts[0], 1);
        assert_eq!(counts[28], 2);
        assert_eq!(counts.iter().sum::<usize>(), 3);

        assert_eq!(monthly_activity(&entries, 2023, 12).len(), 31);
        assert!(monthly_activity(&entries, 2024, 13).is_empty());
    }

    #[test]
    fn tag_cloud_ranks_by_frequency() {
        let entries = vec![
            entry_on(day(1), &["x", "y"], 1),
            entry_on(day(2), &["x", "z"], 2),
            entry_on(day(3), &["x", "y"], 3),
        ];
        assert_eq!(
            tag_cloud(&entries, 2),
            vec![("x".to_string(), 3), ("y".to_string(), 2)]
        );
        assert_eq!(tag_cloud(&entries, DEFAULT_TAG_CLOUD_SIZE).len(), 3);
    }
}
