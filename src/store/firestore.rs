//! Cloud Firestore over its REST API.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue, json};
use tracing::{debug, info};
use url::Url;

use super::auth::TokenProvider;
use super::{CollectionPath, Document, DocumentPath, DocumentStore, FieldUpdate};
use crate::errors::SummarizerError;

pub const FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com";
const LIST_PAGE_SIZE: &str = "300";
/// The emulator accepts this fixed bearer as an admin credential.
const EMULATOR_BEARER: &str = "owner";

pub enum Auth {
    ServiceAccount(TokenProvider),
    Emulator,
}

pub struct FirestoreClient {
    http: Client,
    endpoint: String,
    database_root: String,
    auth: Auth,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl FirestoreClient {
    /// Client for the production endpoint, authenticated as the service account.
    pub fn new(tokens: TokenProvider, http: Client) -> Result<Self, SummarizerError> {
        let project_id = tokens.project_id().to_string();
        Self::with_endpoint(&project_id, FIRESTORE_ENDPOINT, Auth::ServiceAccount(tokens), http)
    }

    /// Client for a local emulator given as `host:port` or a full URL.
    pub fn emulator(project_id: &str, host: &str, http: Client) -> Result<Self, SummarizerError> {
        let endpoint = if host.contains("://") {
            host.to_string()
        } else {
            format!("http://{host}")
        };
        Self::with_endpoint(project_id, &endpoint, Auth::Emulator, http)
    }

    pub fn with_endpoint(
        project_id: &str,
        endpoint: &str,
        auth: Auth,
        http: Client,
    ) -> Result<Self, SummarizerError> {
        let parsed = Url::parse(endpoint).map_err(|e| {
            SummarizerError::ConfigError(format!("invalid store endpoint {endpoint:?}: {e}"))
        })?;
        Ok(Self {
            http,
            endpoint: parsed.as_str().trim_end_matches('/').to_string(),
            database_root: format!("projects/{project_id}/databases/(default)/documents"),
            auth,
        })
    }

    fn resource_name(&self, document: &DocumentPath) -> String {
        format!("{}/{}", self.database_root, document)
    }

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, SummarizerError> {
        let token = match &self.auth {
            Auth::ServiceAccount(tokens) => tokens.access_token().await?,
            Auth::Emulator => EMULATOR_BEARER.to_string(),
        };
        Ok(request.bearer_auth(token))
    }

    async fn check(response: Response, action: &str) -> Result<Response, SummarizerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
        Err(SummarizerError::StoreError(format!(
            "{action} failed (status {status}): {body}"
        )))
    }
}

/// Field paths with anything beyond `[A-Za-z0-9_]` must be backtick-quoted.
fn quote_field_path(field: &str) -> String {
    let simple = !field.is_empty()
        && !field.starts_with(|c: char| c.is_ascii_digit())
        && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        field.to_string()
    } else {
        format!("`{}`", field.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

/// Builds the single `commit` write that merges `fields` into `name`.
pub(crate) fn merge_write(name: &str, fields: &BTreeMap<String, FieldUpdate>) -> JsonValue {
    let mut values = Map::new();
    let mut mask = Vec::new();
    let mut transforms = Vec::new();

    for (field, update) in fields {
        match update {
            FieldUpdate::Set(value) => {
                values.insert(field.clone(), json!(value));
                mask.push(quote_field_path(field));
            }
            FieldUpdate::ServerTimestamp => transforms.push(json!({
                "fieldPath": quote_field_path(field),
                "setToServerValue": "REQUEST_TIME"
            })),
        }
    }

    let mut write = json!({
        "update": {"name": name, "fields": values},
        "updateMask": {"fieldPaths": mask},
    });
    if !transforms.is_empty() {
        write["updateTransforms"] = JsonValue::Array(transforms);
    }
    write
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn list_documents(
        &self,
        collection: &CollectionPath,
    ) -> Result<Vec<Document>, SummarizerError> {
        let url = format!("{}/v1/{}/{}", self.endpoint, self.database_root, collection);
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http.get(&url).query(&[("pageSize", LIST_PAGE_SIZE)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = self.authorize(request).await?.send().await?;
            let page: ListDocumentsResponse = Self::check(response, "list documents")
                .await?
                .json()
                .await
                .map_err(|e| {
                    SummarizerError::StoreError(format!("invalid list response: {e}"))
                })?;

            documents.extend(page.documents);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!("Listed {} documents in {}", documents.len(), collection);
        Ok(documents)
    }

    async fn merge_document(
        &self,
        document: &DocumentPath,
        fields: BTreeMap<String, FieldUpdate>,
    ) -> Result<(), SummarizerError> {
        let url = format!("{}/v1/{}:commit", self.endpoint, self.database_root);
        let body = json!({
            "writes": [merge_write(&self.resource_name(document), &fields)]
        });

        let request = self.http.post(&url).json(&body);
        let response = self.authorize(request).await?.send().await?;
        Self::check(response, "commit").await?;

        info!("Merged {} fields into {}", fields.len(), document);
        Ok(())
    }
}
