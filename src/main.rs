use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Client as HttpClient;
use tracing::{error, info};

use chat_summarizer::ai::LlmClient;
use chat_summarizer::core::config::{AppConfig, SessionPaths};
use chat_summarizer::pipeline::SummaryPipeline;
use chat_summarizer::store::{DocumentStore, FirestoreClient, ServiceAccountKey, TokenProvider};
use chat_summarizer::watcher::ChangeWatcher;
use chat_summarizer::writer::ResultWriter;

#[derive(Parser)]
#[command(name = "chat-summarizer", version, about = "Real-time chat session summarizer")]
struct Cli {
    /// Application id used in the store paths
    app_id: String,
    /// Chat session code to monitor
    session: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    chat_summarizer::setup_logging();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        anyhow::anyhow!(e)
    })?;
    let paths = SessionPaths::new(&cli.app_id, &cli.session)?;
    let http = HttpClient::new();

    let key = ServiceAccountKey::from_file(&config.credentials_path).map_err(|e| {
        error!("Error initializing store credentials: {}", e);
        error!(
            "Make sure {} exists and is a valid service account key",
            config.credentials_path.display()
        );
        e
    })?;

    let store: Arc<dyn DocumentStore> = match &config.firestore_emulator_host {
        Some(host) => {
            info!("Using Firestore emulator at {}", host);
            Arc::new(FirestoreClient::emulator(&key.project_id, host, http.clone())?)
        }
        None => {
            let tokens = TokenProvider::new(key, http.clone())?;
            Arc::new(FirestoreClient::new(tokens, http.clone())?)
        }
    };
    let llm = Arc::new(LlmClient::new(
        &config.ollama_host,
        config.ollama_model.clone(),
        http,
    )?);

    info!("Starting chat summarizer for session {}", cli.session);
    info!("Listening for new messages in {}", paths.messages);
    info!("Will write summaries to {}", paths.summary);
    info!("Using model {} at {}", llm.model_name(), config.ollama_host);
    info!("Press Ctrl+C to stop.");

    let watcher = ChangeWatcher::new(store.clone(), paths.messages.clone(), config.poll_interval);
    let (mut subscription, snapshots) = watcher.subscribe();

    let pipeline = SummaryPipeline::new(llm, ResultWriter::new(store, paths.summary.clone()));
    let stop = subscription.stop_signal();
    let worker = tokio::spawn(async move { pipeline.run(snapshots, stop).await });

    let terminated = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl+C")?;
            None
        }
        result = subscription.terminated() => Some(result),
    };

    match terminated {
        None => {
            info!("Stopping listener...");
            subscription.unsubscribe().await?;
            worker.await?;
            info!("Listener stopped. Goodbye!");
            Ok(())
        }
        Some(result) => {
            worker.await?;
            result?;
            anyhow::bail!("subscription ended unexpectedly")
        }
    }
}
