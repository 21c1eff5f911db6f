use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::TextCompleter;
use crate::config::AiConfig;
use crate::error::{JournalError, Result};

const SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant that helps with journal analysis and insights.";
const TEMPERATURE: f32 = 0.7;

/// A message in a chat-completions request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

/// `complete_text` over an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiCompleter {
    config: AiConfig,
    api_url: String,
    client: reqwest::Client,
}

impl OpenAiCompleter {
    pub fn new(config: AiConfig, api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| JournalError::ExternalService(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            config,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn request_body(&self, prompt: &str, max_tokens: u32) -> serde_json::Value {
        let messages = [
            ChatMessage::new("system", SYSTEM_PROMPT),
            ChatMessage::new("user", prompt),
        ];
        serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "max_tokens": max_tokens,
            "temperature": TEMPERATURE,
        })
    }
}

#[async_trait]
impl TextCompleter for OpenAiCompleter {
    async fn complete_text(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        if !self.config.has_api_key() {
            return Err(JournalError::ExternalService(
                "no API key configured; set one with `daybook config set-key`".to_string(),
            ));
        }

        let url = format!("{}/chat/completions", self.api_url);
        tracing::debug!("Calling {} with model {}", url, self.config.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.trim())
            .json(&self.request_body(prompt, max_tokens))
            .send()
            .await
            .map_err(|e| JournalError::ExternalService(format!("AI request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("AI API returned {}: {}", status, body);
            return Err(JournalError::ExternalService(format!(
                "AI request failed: {status} {body}"
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| JournalError::ExternalService(format!("failed to parse AI response: {e}")))?;

        extract_reply(&response_json)
    }
}

/// Pulls `choices[0].message.content` out of a completion response.
fn extract_reply(response_json: &serde_json::Value) -> Result<String> {
    response_json["choices"]
        .as_array()
        .and_then(|choices| choices.first())
        .and_then(|choice| choice["message"]["content"].as_str())
        .map(|text| text.trim().to_string())
        .ok_or_else(|| JournalError::ExternalService("AI response contained no reply".to_string()))
}
