//! In-memory stand-ins for the document store and the completion service.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chat_summarizer::core::models::Snapshot;
use chat_summarizer::store::{
    CollectionPath, Document, DocumentPath, DocumentStore, FieldUpdate, Value,
};
use chat_summarizer::{SummarizerError, SummaryGateway, SummaryOutcome, Transcript};

pub fn message_doc(
    id: &str,
    username: Option<&str>,
    text: Option<&str>,
    timestamp: Option<i64>,
) -> Document {
    let mut fields = BTreeMap::new();
    if let Some(name) = username {
        fields.insert("username".to_string(), Value::string(name));
    }
    if let Some(text) = text {
        fields.insert("text".to_string(), Value::string(text));
    }
    if let Some(ts) = timestamp {
        fields.insert("timestamp".to_string(), Value::integer(ts));
    }
    Document {
        name: format!("projects/demo/databases/(default)/documents/messages/{id}"),
        fields,
        update_time: None,
    }
}

pub fn snapshot(documents: &[Document]) -> Snapshot {
    Snapshot::from_documents(documents)
}

/// Store keeping collections and documents in memory, with merge writes.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    documents: Mutex<HashMap<String, BTreeMap<String, Value>>>,
    commit_clock: AtomicUsize,
    pub fail_lists: AtomicBool,
    pub fail_writes: AtomicBool,
    pub list_calls: AtomicUsize,
    pub write_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn set_collection(&self, path: &CollectionPath, documents: Vec<Document>) {
        self.collections
            .lock()
            .unwrap()
            .insert(path.as_str().to_string(), documents);
    }

    pub fn put_document(&self, path: &DocumentPath, fields: BTreeMap<String, Value>) {
        self.documents
            .lock()
            .unwrap()
            .insert(path.as_str().to_string(), fields);
    }

    pub fn document(&self, path: &DocumentPath) -> Option<BTreeMap<String, Value>> {
        self.documents.lock().unwrap().get(path.as_str()).cloned()
    }

    pub fn writes(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_documents(
        &self,
        collection: &CollectionPath,
    ) -> Result<Vec<Document>, SummarizerError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(SummarizerError::StoreError("listing unavailable".to_string()));
        }
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(collection.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn merge_document(
        &self,
        document: &DocumentPath,
        fields: BTreeMap<String, FieldUpdate>,
    ) -> Result<(), SummarizerError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SummarizerError::StoreError("write rejected".to_string()));
        }
        let tick = self.commit_clock.fetch_add(1, Ordering::SeqCst);
        let mut documents = self.documents.lock().unwrap();
        let stored = documents.entry(document.as_str().to_string()).or_default();
        for (name, update) in fields {
            let value = match update {
                FieldUpdate::Set(value) => value,
                FieldUpdate::ServerTimestamp => {
                    Value::TimestampValue(format!("2024-01-01T00:00:{:02}Z", tick % 60))
                }
            };
            stored.insert(name, value);
        }
        Ok(())
    }
}

/// Gateway that answers every request with a fixed outcome and records the
/// prompts it was given.
pub struct ScriptedGateway {
    outcome: SummaryOutcome,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new(outcome: SummaryOutcome) -> Self {
        Self {
            outcome,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl SummaryGateway for ScriptedGateway {
    async fn summarize(&self, transcript: &Transcript) -> SummaryOutcome {
        self.prompts.lock().unwrap().push(transcript.to_prompt());
        self.outcome.clone()
    }
}
