use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::errors::SummarizerError;
use crate::store::{DocumentPath, DocumentStore, FieldUpdate, Value};

pub const CONTENT_FIELD: &str = "content";
pub const LAST_UPDATED_FIELD: &str = "lastUpdated";

/// Persists summaries into the single target document.
pub struct ResultWriter {
    store: Arc<dyn DocumentStore>,
    target: DocumentPath,
}

impl ResultWriter {
    pub fn new(store: Arc<dyn DocumentStore>, target: DocumentPath) -> Self {
        Self { store, target }
    }

    #[must_use]
    pub fn target(&self) -> &DocumentPath {
        &self.target
    }

    /// Merges `content` and a server-stamped `lastUpdated` into the target;
    /// every other field on the document is left as it is.
    ///
    /// # Errors
    ///
    /// Returns the store error unchanged. Nothing is retried.
    pub async fn write(&self, summary: &str) -> Result<(), SummarizerError> {
        let mut fields = BTreeMap::new();
        fields.insert(
            CONTENT_FIELD.to_string(),
            FieldUpdate::Set(Value::string(summary)),
        );
        fields.insert(LAST_UPDATED_FIELD.to_string(), FieldUpdate::ServerTimestamp);

        self.store.merge_document(&self.target, fields).await?;
        info!("Successfully wrote summary to {}", self.target);
        Ok(())
    }
}
