//! Renders a collection snapshot into the text sent to the summarizer.

use crate::core::models::{Message, Snapshot};

pub const TRANSCRIPT_PREAMBLE: &str = "This is the chat transcript:";
pub const TRANSCRIPT_INSTRUCTION: &str = "Please summarize the key points discussed.";

/// Ordered, line-oriented rendering of the qualifying messages in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    body: String,
    line_count: usize,
}

impl Transcript {
    /// Keeps messages that have both text and a timestamp, orders them by
    /// timestamp (document id on ties) and renders `author: text` lines.
    #[must_use]
    pub fn build(snapshot: &Snapshot) -> Self {
        let mut included: Vec<&Message> = snapshot
            .messages
            .iter()
            .filter(|m| m.text.is_some() && m.timestamp.is_some())
            .collect();

        included.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));

        let body = included
            .iter()
            .map(|m| format!("{}: {}", m.author(), m.text.as_deref().unwrap_or_default()))
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            body,
            line_count: included.len(),
        }
    }

    /// The joined message lines without preamble or instruction.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// True when no message qualified; such a transcript is never sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// The full user input for the model.
    #[must_use]
    pub fn to_prompt(&self) -> String {
        format!(
            "{TRANSCRIPT_PREAMBLE}\n{}\n\n{TRANSCRIPT_INSTRUCTION}",
            self.body
        )
    }
}
