use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chat_summarizer::SummarizerError;
use chat_summarizer::store::auth::DATASTORE_SCOPE;
use chat_summarizer::store::{ServiceAccountKey, TokenProvider};
use chrono::{TimeZone, Utc};
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::sign::Verifier;
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn generated_key() -> (String, Vec<u8>) {
    let rsa = Rsa::generate(2048).unwrap();
    let pkey = PKey::from_rsa(rsa).unwrap();
    let private_pem = String::from_utf8(pkey.private_key_to_pem_pkcs8().unwrap()).unwrap();
    let public_pem = pkey.public_key_to_pem().unwrap();
    (private_pem, public_pem)
}

fn key_json(private_pem: &str, token_uri: &str) -> String {
    json!({
        "type": "service_account",
        "project_id": "demo-project",
        "private_key_id": "kid-123",
        "private_key": private_pem,
        "client_email": "summarizer@demo-project.iam.gserviceaccount.com",
        "token_uri": token_uri
    })
    .to_string()
}

#[test]
fn test_loads_key_file() {
    let (private_pem, _) = generated_key();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", key_json(&private_pem, "https://oauth2.googleapis.com/token")).unwrap();

    let key = ServiceAccountKey::from_file(file.path()).unwrap();
    assert_eq!(key.project_id, "demo-project");
    assert_eq!(key.private_key_id.as_deref(), Some("kid-123"));
    assert!(!format!("{key:?}").contains("PRIVATE KEY"));
}

#[test]
fn test_missing_key_file_is_credential_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ServiceAccountKey::from_file(dir.path().join("serviceAccountKey.json")).unwrap_err();
    assert!(matches!(err, SummarizerError::CredentialError(_)));
    assert!(err.to_string().contains("serviceAccountKey.json"));
}

#[test]
fn test_malformed_key_files_are_rejected() {
    let cases = [
        "not json at all".to_string(),
        json!({"project_id": "p", "client_email": "e"}).to_string(),
        json!({"project_id": "p", "client_email": "e", "private_key": "garbage"}).to_string(),
    ];
    for raw in cases {
        let err = ServiceAccountKey::from_json(&raw).unwrap_err();
        assert!(matches!(err, SummarizerError::CredentialError(_)), "{raw}: {err}");
    }
}

#[test]
fn test_signed_assertion_claims_and_signature() {
    let (private_pem, public_pem) = generated_key();
    let key = ServiceAccountKey::from_json(&key_json(&private_pem, "https://token.example/t")).unwrap();
    let provider = TokenProvider::new(key, reqwest::Client::new()).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();

    let assertion = provider.signed_assertion(now).unwrap();
    let parts: Vec<&str> = assertion.split('.').collect();
    assert_eq!(parts.len(), 3);

    let header: Value = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[0]).unwrap()).unwrap();
    assert_eq!(header, json!({"alg": "RS256", "typ": "JWT", "kid": "kid-123"}));

    let claims: Value = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
    assert_eq!(claims["iss"], "summarizer@demo-project.iam.gserviceaccount.com");
    assert_eq!(claims["aud"], "https://token.example/t");
    assert_eq!(claims["scope"], DATASTORE_SCOPE);
    assert_eq!(claims["iat"], now.timestamp());
    assert_eq!(claims["exp"], now.timestamp() + 3600);

    let public = PKey::public_key_from_pem(&public_pem).unwrap();
    let mut verifier = Verifier::new(MessageDigest::sha256(), &public).unwrap();
    verifier
        .update(format!("{}.{}", parts[0], parts[1]).as_bytes())
        .unwrap();
    assert!(verifier.verify(&URL_SAFE_NO_PAD.decode(parts[2]).unwrap()).unwrap());
}

#[tokio::test]
async fn test_access_token_is_exchanged_once_and_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.test-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (private_pem, _) = generated_key();
    let key =
        ServiceAccountKey::from_json(&key_json(&private_pem, &format!("{}/token", server.uri())))
            .unwrap();
    let provider = TokenProvider::new(key, reqwest::Client::new()).unwrap();

    assert_eq!(provider.access_token().await.unwrap(), "ya29.test-token");
    assert_eq!(provider.access_token().await.unwrap(), "ya29.test-token");
}

#[tokio::test]
async fn test_rejected_exchange_is_credential_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
        .mount(&server)
        .await;

    let (private_pem, _) = generated_key();
    let key =
        ServiceAccountKey::from_json(&key_json(&private_pem, &format!("{}/token", server.uri())))
            .unwrap();
    let provider = TokenProvider::new(key, reqwest::Client::new()).unwrap();

    let err = provider.access_token().await.unwrap_err();
    assert!(matches!(err, SummarizerError::CredentialError(ref m) if m.contains("invalid_grant")));
}
