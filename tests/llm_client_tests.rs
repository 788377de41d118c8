mod common;

use chat_summarizer::ai::prompt_builder::{SYSTEM_PROMPT, build_prompt};
use chat_summarizer::ai::{LlmClient, NO_CONTENT_SENTINEL, NO_RESPONSE_SENTINEL};
use chat_summarizer::{SummaryOutcome, Transcript};
use common::{message_doc, snapshot};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transcript() -> Transcript {
    Transcript::build(&snapshot(&[
        message_doc("a", Some("Alex"), Some("hi"), Some(2)),
        message_doc("b", Some("Jane"), Some("hello"), Some(1)),
    ]))
}

fn client(server: &MockServer) -> LlmClient {
    LlmClient::new(&server.uri(), "gpt-oss:20b".to_string(), reqwest::Client::new()).unwrap()
}

#[test]
fn test_prompt_has_user_transcript_and_system_instruction() {
    let prompt = build_prompt(&transcript());
    let messages = chat_summarizer::ai::client::build_chat_messages(&prompt);

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], transcript().to_prompt());
    assert_eq!(messages[1]["role"], "system");
    assert_eq!(messages[1]["content"], SYSTEM_PROMPT);
}

#[test]
fn test_system_prompt_asks_for_embeddable_html_narrative() {
    assert!(SYSTEM_PROMPT.contains("journalistic"));
    assert!(SYSTEM_PROMPT.contains("HTML"));
    assert!(SYSTEM_PROMPT.contains("<div>"));
    assert!(SYSTEM_PROMPT.contains("<body>"));
}

#[tokio::test]
async fn test_generated_summary_and_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-oss:20b",
            "message": {"role": "assistant", "content": "<h2>Greetings</h2><p>Jane said hello.</p>"},
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server).generate_summary(&transcript()).await;
    assert_eq!(
        outcome,
        SummaryOutcome::Generated("<h2>Greetings</h2><p>Jane said hello.</p>".to_string())
    );

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["model"], "gpt-oss:20b");
    assert_eq!(body["stream"], false);
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_missing_content_is_empty_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": {"role": "assistant", "content": ""}})),
        )
        .mount(&server)
        .await;

    let outcome = client(&server).generate_summary(&transcript()).await;
    assert_eq!(outcome, SummaryOutcome::Empty);
    assert_eq!(outcome.into_summary().as_deref(), Some(NO_CONTENT_SENTINEL));
}

#[tokio::test]
async fn test_null_body_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("null", "application/json"),
        )
        .mount(&server)
        .await;

    let outcome = client(&server).generate_summary(&transcript()).await;
    assert_eq!(outcome, SummaryOutcome::Unavailable);
    assert_eq!(outcome.into_summary().as_deref(), Some(NO_RESPONSE_SENTINEL));
}

#[tokio::test]
async fn test_server_error_is_a_failed_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .expect(2)
        .mount(&server)
        .await;

    let llm = client(&server);
    let err = llm.chat(&build_prompt(&transcript())).await.unwrap_err();
    assert!(err.to_string().contains("model not loaded"));

    let outcome = llm.generate_summary(&transcript()).await;
    assert!(
        matches!(outcome, SummaryOutcome::Failed(ref reason) if reason.contains("500")),
        "{outcome:?}"
    );
    assert_eq!(outcome.into_summary(), None);
}

#[tokio::test]
async fn test_unreachable_service_is_a_failed_call() {
    let server = MockServer::start().await;
    let llm = client(&server);
    drop(server);

    let outcome = llm.generate_summary(&transcript()).await;
    assert!(matches!(outcome, SummaryOutcome::Failed(_)), "{outcome:?}");
}

#[test]
fn test_rejects_invalid_host() {
    assert!(LlmClient::new("not a url", "m".to_string(), reqwest::Client::new()).is_err());
}
