//! Document store access: the consumed store interface and its Firestore
//! REST implementation.

pub mod auth;
pub mod firestore;
pub mod value;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::SummarizerError;

pub use auth::{ServiceAccountKey, TokenProvider};
pub use firestore::FirestoreClient;
pub use value::{SortKey, Value};

/// Slash-separated path of a collection, relative to the database root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

/// Slash-separated path of a single document, relative to the database root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath(String);

impl CollectionPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl DocumentPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored document as returned by a collection listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name, ending in the document id.
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default)]
    pub update_time: Option<String>,
}

impl Document {
    #[must_use]
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// One field of a merge write.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Set(Value),
    /// Resolved by the store to its own commit time.
    ServerTimestamp,
}

/// The subset of a document database the summarizer needs.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns every document currently in the collection.
    async fn list_documents(
        &self,
        collection: &CollectionPath,
    ) -> Result<Vec<Document>, SummarizerError>;

    /// Writes the given fields, leaving all other fields of the document
    /// untouched. Creates the document when it does not exist yet.
    async fn merge_document(
        &self,
        document: &DocumentPath,
        fields: BTreeMap<String, FieldUpdate>,
    ) -> Result<(), SummarizerError>;
}
