use std::env;
use std::path::PathBuf;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SummarizerError;
use crate::store::{CollectionPath, DocumentPath};

pub const DEFAULT_CREDENTIALS_PATH: &str = "serviceAccountKey.json";
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "gpt-oss:20b";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Reserved ids (`__name__`) are rejected by the store.
static RESERVED_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^__.*__$").expect("valid reserved-id pattern"));

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials_path: PathBuf,
    pub ollama_host: String,
    pub ollama_model: String,
    pub poll_interval: Duration,
    pub firestore_emulator_host: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, so callers other than
    /// the process environment can supply values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let poll_interval_ms = match lookup("SUMMARIZER_POLL_INTERVAL_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| {
                    format!("SUMMARIZER_POLL_INTERVAL_MS: expected a positive integer, got {raw:?}")
                })?,
            None => DEFAULT_POLL_INTERVAL_MS,
        };

        Ok(Self {
            credentials_path: lookup("SUMMARIZER_CREDENTIALS")
                .unwrap_or_else(|| DEFAULT_CREDENTIALS_PATH.to_string())
                .into(),
            ollama_host: lookup("OLLAMA_HOST").unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string()),
            ollama_model: lookup("OLLAMA_MODEL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            poll_interval: Duration::from_millis(poll_interval_ms),
            firestore_emulator_host: lookup("FIRESTORE_EMULATOR_HOST")
                .filter(|host| !host.trim().is_empty()),
        })
    }
}

/// Store locations derived from the CLI identifiers of one chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPaths {
    pub messages: CollectionPath,
    pub summary: DocumentPath,
}

impl SessionPaths {
    /// # Errors
    ///
    /// Returns a `ConfigError` if either identifier is not a valid single
    /// path segment.
    pub fn new(app_id: &str, session: &str) -> Result<Self, SummarizerError> {
        validate_segment("app_id", app_id)?;
        validate_segment("session", session)?;

        let base = format!("artifacts/{app_id}/public/data/chat_sessions/{session}");
        Ok(Self {
            messages: CollectionPath::new(format!("{base}/messages")),
            summary: DocumentPath::new(format!("{base}/summary/content")),
        })
    }
}

fn validate_segment(label: &str, value: &str) -> Result<(), SummarizerError> {
    let invalid = value.is_empty()
        || value.contains('/')
        || value == "."
        || value == ".."
        || RESERVED_SEGMENT.is_match(value);

    if invalid {
        return Err(SummarizerError::ConfigError(format!(
            "{label} {value:?} is not a valid document id"
        )));
    }
    Ok(())
}
