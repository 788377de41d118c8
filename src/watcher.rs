//! Collection subscription.
//!
//! The REST surface of the store has no push listener, so a subscription
//! polls the collection and publishes a full snapshot whenever the listing's
//! digest changes. Snapshots go into a single-slot `watch` channel: a slow
//! consumer only ever sees the newest state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::core::models::Snapshot;
use crate::errors::SummarizerError;
use crate::store::{CollectionPath, DocumentStore};

pub type SnapshotReceiver = watch::Receiver<Option<Snapshot>>;

pub struct ChangeWatcher {
    store: Arc<dyn DocumentStore>,
    collection: CollectionPath,
    poll_interval: Duration,
}

impl ChangeWatcher {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collection: CollectionPath,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            collection,
            poll_interval,
        }
    }

    /// Starts polling on the current runtime. The first poll always
    /// publishes; later polls publish only on change.
    pub fn subscribe(self) -> (Subscription, SnapshotReceiver) {
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let (stop_tx, stop_rx) = watch::channel(false);
        info!("Listening for changes in {}", self.collection);

        let poller = tokio::spawn(self.poll(snapshot_tx, stop_rx));
        (
            Subscription {
                stop_tx,
                poller: Some(poller),
            },
            snapshot_rx,
        )
    }

    async fn poll(
        self,
        snapshots: watch::Sender<Option<Snapshot>>,
        mut stop: watch::Receiver<bool>,
    ) -> Result<(), SummarizerError> {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_digest: Option<String> = None;

        loop {
            tokio::select! {
                biased;
                _ = stop.changed() => break,
                _ = ticker.tick() => {}
            }

            let documents = self
                .store
                .list_documents(&self.collection)
                .await
                .map_err(|e| {
                    SummarizerError::SubscriptionError(format!("{}: {}", self.collection, e))
                })?;

            if *stop.borrow() {
                break;
            }

            let snapshot = Snapshot::from_documents(&documents);
            if last_digest.as_deref() == Some(snapshot.digest.as_str()) {
                continue;
            }

            info!(
                "Change detected in {}: {} documents (digest {})",
                self.collection,
                snapshot.len(),
                &snapshot.digest[..12]
            );
            last_digest = Some(snapshot.digest.clone());

            if snapshots.send(Some(snapshot)).is_err() {
                debug!("Snapshot receiver dropped, ending subscription");
                break;
            }
        }

        info!("Stopped listening to {}", self.collection);
        Ok(())
    }
}

/// Handle to a running subscription.
pub struct Subscription {
    stop_tx: watch::Sender<bool>,
    poller: Option<JoinHandle<Result<(), SummarizerError>>>,
}

impl Subscription {
    /// Receiver that flips to `true` once `unsubscribe` is called.
    #[must_use]
    pub fn stop_signal(&self) -> watch::Receiver<bool> {
        self.stop_tx.subscribe()
    }

    /// Resolves when the poller ends on its own, which only happens on a
    /// store error or when every snapshot receiver is gone.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the subscription.
    pub async fn terminated(&mut self) -> Result<(), SummarizerError> {
        match self.poller.as_mut() {
            Some(poller) => {
                let result = poller.await;
                self.poller = None;
                result?
            }
            None => std::future::pending().await,
        }
    }

    /// Stops polling and waits for the poller to finish. No snapshot is
    /// published afterwards.
    ///
    /// # Errors
    ///
    /// Returns the poller's error if it had already failed.
    pub async fn unsubscribe(mut self) -> Result<(), SummarizerError> {
        self.stop_tx.send_replace(true);
        match self.poller.take() {
            Some(poller) => poller.await?,
            None => Ok(()),
        }
    }
}
