//! All AI/LLM functionality

pub mod client;
pub mod prompt_builder;

use async_trait::async_trait;

use crate::transcript::Transcript;

// Re-export main types for convenience
pub use client::{LlmClient, estimate_tokens};

pub const NO_RESPONSE_SENTINEL: &str = "No response from the model.";
pub const NO_CONTENT_SENTINEL: &str = "No content in the response message.";

/// Result of one summarization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Generated(String),
    /// The service answered without any message content.
    Empty,
    /// The service answered with an empty body.
    Unavailable,
    /// The call itself failed; there is nothing to persist.
    Failed(String),
}

impl SummaryOutcome {
    /// Text to persist. `Empty` and `Unavailable` become fixed placeholder
    /// strings, which readers of the stored summary cannot tell apart from
    /// model output. `Failed` yields nothing.
    #[must_use]
    pub fn into_summary(self) -> Option<String> {
        match self {
            SummaryOutcome::Generated(text) => Some(text),
            SummaryOutcome::Empty => Some(NO_CONTENT_SENTINEL.to_string()),
            SummaryOutcome::Unavailable => Some(NO_RESPONSE_SENTINEL.to_string()),
            SummaryOutcome::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn is_generated(&self) -> bool {
        matches!(self, SummaryOutcome::Generated(_))
    }
}

/// Text-completion service seen from the pipeline.
#[async_trait]
pub trait SummaryGateway: Send + Sync {
    async fn summarize(&self, transcript: &Transcript) -> SummaryOutcome;
}
