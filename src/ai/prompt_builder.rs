use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};

use crate::transcript::Transcript;

/// Persona for the summarizer; the output is embedded into an existing `<div>`.
pub const SYSTEM_PROMPT: &str = "You are an assistant that turns chat conversations into news articles. \
    Given a chat transcript, report the key points that were discussed. \
    Write in a journalistic tone and style: synthesize the messages into one coherent narrative instead of listing them, \
    and add reasonable background context where it makes the story more complete. \
    Format the article as HTML using appropriate tags. The result is inserted into a <div> element, \
    so do not add a preamble and do not emit <html>, <head> or <body> tags.";

fn text_message(role: MessageRole, text: String) -> ChatCompletionMessage {
    ChatCompletionMessage {
        role,
        content: Content::Text(text),
        name: None,
        tool_calls: None,
        tool_call_id: None,
    }
}

/// Builds the two-entry conversation for one summary: the wrapped
/// transcript as user input followed by the fixed system instruction.
#[must_use]
pub fn build_prompt(transcript: &Transcript) -> Vec<ChatCompletionMessage> {
    vec![
        text_message(MessageRole::user, transcript.to_prompt()),
        text_message(MessageRole::system, SYSTEM_PROMPT.to_string()),
    ]
}
