//! Text analysis delegated to a language model.

mod assistant;
mod openai;

pub use assistant::{apply_suggested_tag, JournalAssistant, Summary};
pub use openai::{ChatMessage, OpenAiCompleter};

use async_trait::async_trait;

use crate::error::Result;

/// A text-completion backend. Failures come back as
/// `JournalError::ExternalService` with a human-readable reason.
#[async_trait]
pub trait TextCompleter: Send + Sync {
    async fn complete_text(&self, prompt: &str, max_tokens: u32) -> Result<String>;
}
