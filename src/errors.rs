use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummarizerError {
    #[error("Failed to load credentials: {0}")]
    CredentialError(String),

    #[error("Failed to access document store: {0}")]
    StoreError(String),

    #[error("Failed to access completion service: {0}")]
    CompletionError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Subscription terminated: {0}")]
    SubscriptionError(String),
}

impl From<reqwest::Error> for SummarizerError {
    fn from(error: reqwest::Error) -> Self {
        SummarizerError::HttpError(error.to_string())
    }
}

impl From<serde_json::Error> for SummarizerError {
    fn from(error: serde_json::Error) -> Self {
        SummarizerError::StoreError(format!("Malformed payload: {}", error))
    }
}

impl From<openssl::error::ErrorStack> for SummarizerError {
    fn from(error: openssl::error::ErrorStack) -> Self {
        SummarizerError::CredentialError(format!("Key operation failed: {}", error))
    }
}

impl From<tokio::task::JoinError> for SummarizerError {
    fn from(error: tokio::task::JoinError) -> Self {
        SummarizerError::SubscriptionError(error.to_string())
    }
}
