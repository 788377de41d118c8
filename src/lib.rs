/// Chat Summarizer - keeps a running news-style summary of a live chat session.
///
/// The crate watches one messages collection in Cloud Firestore and, every
/// time the collection changes, rebuilds the transcript, asks a local Ollama
/// model for a summary, and merges the result into a summary document.
///
/// # Architecture
///
/// The system uses:
/// - a polling `ChangeWatcher` that publishes full collection snapshots
/// - a single worker (`SummaryPipeline`) that consumes the newest snapshot
/// - the Firestore REST API for reads and merge writes
/// - the Ollama chat API for summaries
/// - Tokio for the async runtime
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use chat_summarizer::ai::LlmClient;
/// use chat_summarizer::core::config::{AppConfig, SessionPaths};
/// use chat_summarizer::pipeline::SummaryPipeline;
/// use chat_summarizer::store::{FirestoreClient, ServiceAccountKey, TokenProvider};
/// use chat_summarizer::watcher::ChangeWatcher;
/// use chat_summarizer::writer::ResultWriter;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     chat_summarizer::setup_logging();
///
///     let config = AppConfig::from_env()?;
///     let paths = SessionPaths::new("my-app", "room-1")?;
///     let http = reqwest::Client::new();
///
///     let key = ServiceAccountKey::from_file(&config.credentials_path)?;
///     let store = Arc::new(FirestoreClient::new(TokenProvider::new(key, http.clone())?, http.clone())?);
///     let llm = Arc::new(LlmClient::new(&config.ollama_host, config.ollama_model.clone(), http)?);
///
///     let (subscription, snapshots) =
///         ChangeWatcher::new(store.clone(), paths.messages, config.poll_interval).subscribe();
///     let pipeline = SummaryPipeline::new(llm, ResultWriter::new(store, paths.summary));
///     pipeline.run(snapshots, subscription.stop_signal()).await;
///     Ok(())
/// }
/// ```
// Module declarations
pub mod ai;
pub mod core;
pub mod errors;
pub mod pipeline;
pub mod store;
pub mod transcript;
pub mod watcher;
pub mod writer;

pub use ai::{SummaryGateway, SummaryOutcome, estimate_tokens};
pub use errors::SummarizerError;
pub use pipeline::{PipelineOutcome, SummaryPipeline};
pub use transcript::Transcript;

/// Configure structured logging.
///
/// Honors `RUST_LOG` (default `info`) and switches to JSON lines when
/// `LOG_FORMAT=json`. Calling it more than once is harmless.
///
/// # Example
///
/// ```
/// chat_summarizer::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(false).boxed()
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
