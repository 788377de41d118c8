//! Snapshot → transcript → summary → document, one snapshot at a time.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::ai::{SummaryGateway, SummaryOutcome};
use crate::core::models::Snapshot;
use crate::transcript::Transcript;
use crate::watcher::SnapshotReceiver;
use crate::writer::ResultWriter;

/// What a single pipeline run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// No message qualified; nothing was sent or written.
    Skipped,
    /// The summary was written. `generated` is false for placeholder text.
    Written { generated: bool },
    /// The completion call failed; the stored summary was left alone.
    GatewayFailed,
    /// The write failed and was dropped.
    WriteFailed,
}

pub struct SummaryPipeline {
    gateway: Arc<dyn SummaryGateway>,
    writer: ResultWriter,
}

impl SummaryPipeline {
    pub fn new(gateway: Arc<dyn SummaryGateway>, writer: ResultWriter) -> Self {
        Self { gateway, writer }
    }

    /// Runs the full chain for one snapshot. Never fails: gateway and write
    /// errors are logged and reported through the outcome.
    pub async fn process(&self, snapshot: &Snapshot) -> PipelineOutcome {
        info!(
            "Re-generating summary from {} documents",
            snapshot.len()
        );

        let transcript = Transcript::build(snapshot);
        if transcript.is_empty() {
            info!("No messages to summarize yet");
            return PipelineOutcome::Skipped;
        }

        let outcome = self.gateway.summarize(&transcript).await;
        let generated = outcome.is_generated();
        match &outcome {
            SummaryOutcome::Failed(reason) => {
                error!("Keeping previous summary, completion failed: {}", reason);
            }
            SummaryOutcome::Empty | SummaryOutcome::Unavailable => {
                warn!("Writing placeholder summary for outcome {:?}", outcome);
            }
            SummaryOutcome::Generated(_) => {}
        }
        let Some(summary) = outcome.into_summary() else {
            return PipelineOutcome::GatewayFailed;
        };

        match self.writer.write(&summary).await {
            Ok(()) => PipelineOutcome::Written { generated },
            Err(e) => {
                error!("Error writing summary to {}: {}", self.writer.target(), e);
                PipelineOutcome::WriteFailed
            }
        }
    }

    /// Consumes snapshots until the channel closes or `stop` turns true.
    /// Returns how many snapshots were processed.
    ///
    /// A run in progress is always finished; no new run starts after stop.
    pub async fn run(
        &self,
        mut snapshots: SnapshotReceiver,
        mut stop: watch::Receiver<bool>,
    ) -> usize {
        let mut processed = 0;

        loop {
            if *stop.borrow() {
                break;
            }

            tokio::select! {
                biased;
                _ = stop.changed() => break,
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            if *stop.borrow() {
                break;
            }

            let latest = snapshots.borrow_and_update().clone();
            if let Some(snapshot) = latest {
                self.process(&snapshot).await;
                processed += 1;
            }
        }

        info!("Summary worker stopped after {} runs", processed);
        processed
    }
}
