//! Service-account credentials and OAuth2 access tokens for the store.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::sign::Signer;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::errors::SummarizerError;

pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Service-account key file as downloaded from the cloud console.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Reads and parses a key file.
    ///
    /// # Errors
    ///
    /// Returns a `CredentialError` if the file is missing, is not valid JSON,
    /// lacks required fields, or holds an unusable private key.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SummarizerError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SummarizerError::CredentialError(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(&raw).map_err(|e| match e {
            SummarizerError::CredentialError(msg) => {
                SummarizerError::CredentialError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// # Errors
    ///
    /// Returns a `CredentialError` for malformed JSON or a bad private key.
    pub fn from_json(raw: &str) -> Result<Self, SummarizerError> {
        let key: Self = serde_json::from_str(raw)
            .map_err(|e| SummarizerError::CredentialError(format!("invalid key file: {e}")))?;
        if key.project_id.trim().is_empty() {
            return Err(SummarizerError::CredentialError(
                "key file has an empty project_id".to_string(),
            ));
        }
        key.signing_key()?;
        Ok(key)
    }

    fn signing_key(&self) -> Result<PKey<Private>, SummarizerError> {
        Ok(PKey::private_key_from_pem(self.private_key.as_bytes())?)
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Exchanges signed service-account assertions for bearer tokens and caches
/// them until shortly before expiry.
pub struct TokenProvider {
    key: ServiceAccountKey,
    signing_key: PKey<Private>,
    http: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    /// # Errors
    ///
    /// Returns a `CredentialError` if the private key cannot be parsed.
    pub fn new(key: ServiceAccountKey, http: Client) -> Result<Self, SummarizerError> {
        let signing_key = key.signing_key()?;
        Ok(Self {
            key,
            signing_key,
            http,
            cached: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.key.project_id
    }

    /// Builds the RS256 JWT assertion for the token exchange.
    ///
    /// # Errors
    ///
    /// Returns a `CredentialError` if signing fails.
    pub fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String, SummarizerError> {
        let header = match &self.key.private_key_id {
            Some(kid) => json!({"alg": "RS256", "typ": "JWT", "kid": kid}),
            None => json!({"alg": "RS256", "typ": "JWT"}),
        };
        let claims = Claims {
            iss: &self.key.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );

        let mut signer = Signer::new(MessageDigest::sha256(), &self.signing_key)?;
        signer.update(signing_input.as_bytes())?;
        let signature = signer.sign_to_vec()?;

        Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
    }

    /// Returns a valid access token, exchanging a fresh assertion when the
    /// cached one is missing or about to expire.
    ///
    /// # Errors
    ///
    /// Returns an error if the token endpoint rejects the assertion or is
    /// unreachable.
    pub async fn access_token(&self) -> Result<String, SummarizerError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref()
            && token.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now
        {
            return Ok(token.value.clone());
        }

        debug!("Requesting new access token from {}", self.key.token_uri);
        let assertion = self.signed_assertion(now)?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            return Err(SummarizerError::CredentialError(format!(
                "token exchange failed (status {status}): {body}"
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            SummarizerError::CredentialError(format!("invalid token response: {e}"))
        })?;
        let expires_at =
            now + Duration::seconds(token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS));
        info!("Obtained access token valid until {}", expires_at);

        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at,
        });
        Ok(token.access_token)
    }
}
