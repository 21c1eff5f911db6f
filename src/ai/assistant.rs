use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use super::TextCompleter;
use crate::error::{JournalError, Result};
use crate::journal::{parse_tags, Entry};

const SUMMARY_MAX_TOKENS: u32 = 800;
const TAGS_MAX_TOKENS: u32 = 100;
const INSIGHTS_MAX_TOKENS: u32 = 1000;
const CONNECTION_TEST_MAX_TOKENS: u32 = 50;
const INSIGHTS_ENTRY_LIMIT: usize = 10;
const INSIGHTS_CONTENT_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub label: String,
    pub entry_count: usize,
    pub text: String,
}

/// Journal-specific prompts on top of a [`TextCompleter`].
///
/// Nothing here touches the repositories; a failed call leaves local state as it was.
pub struct JournalAssistant {
    completer: Arc<dyn TextCompleter>,
}

impl JournalAssistant {
    pub fn new(completer: Arc<dyn TextCompleter>) -> Self {
        Self { completer }
    }

    pub async fn summarize(&self, entries: &[&Entry], label: &str) -> Result<Summary> {
        if entries.is_empty() {
            return Err(JournalError::Validation("no entries to summarize".into()));
        }

        let entry_texts = entries
            .iter()
            .map(|e| {
                format!(
                    "Title: {}\nDate: {}\nContent: {}\nTags: {}",
                    e.title,
                    e.date,
                    e.content,
                    e.tags.join(", ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        let prompt = format!(
            "Please provide a concise summary of the following journal entries. \
             Focus on the main themes, emotions, and key events mentioned:\n\n\
             {entry_texts}\n\n\
             Please provide:\n\
             1. A brief overview (2-3 sentences)\n\
             2. Main themes and topics\n\
             3. Emotional patterns or moods\n\
             4. Any notable insights or reflections\n\n\
             Keep the summary clear and well-structured."
        );

        let text = self.completer.complete_text(&prompt, SUMMARY_MAX_TOKENS).await?;
        Ok(Summary {
            label: label.to_string(),
            entry_count: entries.len(),
            text,
        })
    }

    pub async fn suggest_tags(&self, entry: &Entry) -> Result<Vec<String>> {
        let prompt = format!(
            "Based on the following journal entry, suggest 3-5 relevant tags that would help \
             categorize and organize this content. Tags should be:\n\
             - Single words or short phrases\n\
             - Relevant to the main topics and themes\n\
             - Useful for future searching and organization\n\n\
             Journal Entry:\n\
             Title: {}\n\
             Content: {}\n\n\
             Current tags: {}\n\n\
             Please provide only the suggested tags, separated by commas, without any additional text.",
            entry.title,
            entry.content,
            entry.tags.join(", ")
        );

        let reply = self.completer.complete_text(&prompt, TAGS_MAX_TOKENS).await?;
        Ok(parse_tags(&reply))
    }

    /// Writing-pattern analysis over the most recent entries.
    pub async fn insights(&self, entries: &[Entry]) -> Result<String> {
        if entries.is_empty() {
            return Err(JournalError::Validation("no entries available for analysis".into()));
        }

        let recent: Vec<InsightEntry<'_>> = entries
            .iter()
            .take(INSIGHTS_ENTRY_LIMIT)
            .map(InsightEntry::from)
            .collect();
        let entry_data = serde_json::to_string_pretty(&recent)
            .map_err(|e| JournalError::ExternalService(format!("failed to encode entries: {e}")))?;

        let prompt = format!(
            "Analyze the following journal entries and provide insights about the user's writing \
             patterns, themes, and personal growth. Focus on:\n\n\
             1. Writing patterns and frequency\n\
             2. Common themes and topics\n\
             3. Emotional patterns and mood trends\n\
             4. Personal growth indicators\n\
             5. Suggestions for future journaling\n\n\
             Recent entries data:\n{entry_data}\n\n\
             Please provide thoughtful insights that would help the user understand their \
             journaling journey better."
        );

        self.completer.complete_text(&prompt, INSIGHTS_MAX_TOKENS).await
    }

    pub async fn test_connection(&self) -> Result<String> {
        self.completer
            .complete_text(
                "Hello, this is a test message. Please respond with \"API connection successful!\"",
                CONNECTION_TEST_MAX_TOKENS,
            )
            .await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InsightEntry<'a> {
    date: NaiveDate,
    title: &'a str,
    content: String,
    tags: &'a [String],
    word_count: usize,
}

impl<'a> From<&'a Entry> for InsightEntry<'a> {
    fn from(entry: &'a Entry) -> Self {
        let excerpt: String = entry.content.chars().take(INSIGHTS_CONTENT_CHARS).collect();
        Self {
            date: entry.date,
            title: &entry.title,
            content: format!("{excerpt}..."),
            tags: &entry.tags,
            word_count: entry.word_count,
        }
    }
}

/// Appends `tag` unless it is already present. Returns whether it was added.
pub fn apply_suggested_tag(tags: &mut Vec<String>, tag: &str) -> bool {
    let tag = tag.trim();
    if tag.is_empty() || tags.iter().any(|t| t == tag) {
        return false;
    }
    tags.push(tag.to_string());
    true
}
