use sha2::{Digest, Sha256};

use crate::store::{Document, SortKey};

/// One chat entry as read from the messages collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Document id, used to break timestamp ties.
    pub id: String,
    pub username: Option<String>,
    pub text: Option<String>,
    pub timestamp: Option<SortKey>,
}

impl Message {
    /// Decodes a stored document. Falsy `text`/`timestamp` values and
    /// non-orderable timestamps decode as absent.
    #[must_use]
    pub fn from_document(doc: &Document) -> Self {
        let username = doc
            .fields
            .get("username")
            .and_then(|v| v.as_str())
            .filter(|name| !name.is_empty())
            .map(ToString::to_string);
        let text = doc
            .fields
            .get("text")
            .filter(|v| v.is_truthy())
            .and_then(|v| v.display_text());
        let timestamp = doc
            .fields
            .get("timestamp")
            .filter(|v| v.is_truthy())
            .and_then(|v| v.sort_key());

        Self {
            id: doc.id().to_string(),
            username,
            text,
            timestamp,
        }
    }

    #[must_use]
    pub fn author(&self) -> &str {
        self.username.as_deref().unwrap_or("Unknown")
    }
}

/// Full state of the messages collection at one change event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub messages: Vec<Message>,
    /// Hex SHA-256 over every document's name, fields and update time.
    pub digest: String,
}

impl Snapshot {
    #[must_use]
    pub fn from_documents(documents: &[Document]) -> Self {
        Self {
            messages: documents.iter().map(Message::from_document).collect(),
            digest: digest_documents(documents),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Order-independent digest of a collection listing over each document's
/// name, fields and `updateTime`.
#[must_use]
pub fn digest_documents(documents: &[Document]) -> String {
    let mut sorted: Vec<&Document> = documents.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut hasher = Sha256::new();
    for doc in sorted {
        hasher.update(doc.name.as_bytes());
        hasher.update([0u8]);
        // BTreeMap serializes in key order, so equal fields hash equally.
        hasher.update(serde_json::to_vec(&doc.fields).unwrap_or_default());
        hasher.update([0u8]);
        hasher.update(doc.update_time.as_deref().unwrap_or("").as_bytes());
        hasher.update([0xffu8]);
    }
    hex::encode(hasher.finalize())
}
