//! LLM (Ollama) API client module
//!
//! Encapsulates the completion-service call that turns a transcript into a
//! summary.

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};
use url::Url;

use super::prompt_builder::build_prompt;
use super::{SummaryGateway, SummaryOutcome};
use crate::errors::SummarizerError;
use crate::transcript::Transcript;

#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4 + 1
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub message: Option<ResponseMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Converts chat messages to the `{role, content}` objects the chat
/// endpoint expects. Non-text content is dropped.
#[must_use]
pub fn build_chat_messages(prompt: &[ChatCompletionMessage]) -> Vec<Value> {
    prompt
        .iter()
        .filter_map(|msg| {
            let role_str = match msg.role {
                MessageRole::system => "system",
                MessageRole::user => "user",
                MessageRole::assistant => "assistant",
                MessageRole::function => "function",
                MessageRole::tool => "tool",
            };
            match &msg.content {
                Content::Text(text) => Some(json!({"role": role_str, "content": text})),
                Content::ImageUrl(_) => None,
            }
        })
        .collect()
}

/// Completion-service client for generating summaries
pub struct LlmClient {
    http: Client,
    chat_url: String,
    model_name: String,
}

impl LlmClient {
    /// # Errors
    ///
    /// Returns a `ConfigError` if `host` is not a valid base URL.
    pub fn new(host: &str, model_name: String, http: Client) -> Result<Self, SummarizerError> {
        let base = Url::parse(host).map_err(|e| {
            SummarizerError::ConfigError(format!("invalid completion host {host:?}: {e}"))
        })?;
        Ok(Self {
            http,
            chat_url: format!("{}/api/chat", base.as_str().trim_end_matches('/')),
            model_name,
        })
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Sends one non-streaming chat request.
    ///
    /// Returns `Ok(None)` when the service answers with an empty (`null`)
    /// body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the status is not a success, or
    /// the body cannot be decoded.
    pub async fn chat(
        &self,
        prompt: &[ChatCompletionMessage],
    ) -> Result<Option<ChatResponse>, SummarizerError> {
        let request_body = json!({
            "model": self.model_name,
            "messages": build_chat_messages(prompt),
            "stream": false
        });

        let response = self
            .http
            .post(&self.chat_url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| SummarizerError::HttpError(format!("Chat request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|e| {
                format!("Failed to read error response body (status {status}): {e}")
            });
            return Err(SummarizerError::CompletionError(format!(
                "Chat API error (status {status}): {error_text}"
            )));
        }

        response.json::<Option<ChatResponse>>().await.map_err(|e| {
            SummarizerError::CompletionError(format!("Failed to parse chat response: {e}"))
        })
    }

    /// Summarizes a transcript. Errors from the call come back as
    /// `SummaryOutcome::Failed`.
    pub async fn generate_summary(&self, transcript: &Transcript) -> SummaryOutcome {
        let prompt = build_prompt(transcript);

        #[cfg(feature = "debug-logs")]
        info!("Sending transcript to {}:\n{}", self.model_name, transcript.to_prompt());

        #[cfg(not(feature = "debug-logs"))]
        info!(
            "Sending transcript with {} lines (~{} tokens) to {}",
            transcript.line_count(),
            estimate_tokens(&transcript.to_prompt()),
            self.model_name
        );

        let outcome = match self.chat(&prompt).await {
            Ok(Some(response)) => match response.message.and_then(|m| m.content) {
                Some(content) if !content.is_empty() => SummaryOutcome::Generated(content),
                _ => SummaryOutcome::Empty,
            },
            Ok(None) => SummaryOutcome::Unavailable,
            Err(e) => {
                error!("Completion service call failed: {}", e);
                SummaryOutcome::Failed(e.to_string())
            }
        };

        match &outcome {
            SummaryOutcome::Generated(text) => {
                info!("Received summary from model ({} chars)", text.chars().count());
            }
            other => warn!("Model produced no summary: {:?}", other),
        }
        outcome
    }
}

#[async_trait]
impl SummaryGateway for LlmClient {
    async fn summarize(&self, transcript: &Transcript) -> SummaryOutcome {
        self.generate_summary(transcript).await
    }
}
