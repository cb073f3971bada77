use std::sync::Arc;

use axum::{
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use pygpt::{
    builder::{LLMBackend, LLMBuilder},
    chain::CodeGenChain,
    chat::ChatMessage,
    error::LLMError,
};
use serde_json::{json, Value};

const KEY: &str = "gsk-test";

/// Minimal stand-in for the chat completions endpoint: answers with the
/// reversed user prompt and echoes the sampling settings it received.
async fn completions(
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if auth != format!("Bearer {KEY}") {
        return Err((StatusCode::UNAUTHORIZED, "Invalid API Key".into()));
    }

    let prompt = body["messages"][0]["content"].as_str().unwrap_or_default();
    let answer: String = prompt.chars().rev().collect();
    Ok(Json(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": body["model"],
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": answer},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 7, "completion_tokens": 5, "total_tokens": 12},
        "x_temperature": body["temperature"],
        "x_stream": body["stream"]
    })))
}

async fn spawn_mock() -> String {
    let app = Router::new()
        .route("/openai/v1/chat/completions", post(completions))
        .route(
            "/broken/chat/completions",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream down") }),
        )
        .route("/garbage/chat/completions", post(|| async { "not json" }))
        .route(
            "/empty/chat/completions",
            post(|| async {
                Json(json!({"choices": [{"message": {"role": "assistant", "content": null}}]}))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn groq(base_url: String, key: &str) -> Box<dyn pygpt::chat::ChatProvider> {
    LLMBuilder::new()
        .backend(LLMBackend::Groq)
        .api_key(key)
        .base_url(base_url)
        .temperature(0.8)
        .build()
        .unwrap()
}

#[tokio::test]
async fn chat_speaks_the_completions_protocol() {
    let base = spawn_mock().await;
    let llm = groq(format!("{base}/openai/v1"), KEY);

    let response = llm
        .chat(&[ChatMessage::user().content("abc").build()])
        .await
        .unwrap();

    assert_eq!(response.text().as_deref(), Some("cba"));
    assert_eq!(response.to_string(), "cba");
    let usage = response.usage().unwrap();
    assert_eq!(usage.total_tokens, 12);
}

#[tokio::test]
async fn wrong_key_is_an_auth_error() {
    let base = spawn_mock().await;
    let llm = groq(format!("{base}/openai/v1/"), "gsk-wrong");

    let err = llm
        .chat(&[ChatMessage::user().content("abc").build()])
        .await
        .err()
        .unwrap();
    assert!(matches!(err, LLMError::AuthError(msg) if msg.contains("Invalid API Key")));
}

#[tokio::test]
async fn error_status_keeps_the_raw_body() {
    let base = spawn_mock().await;
    let llm = groq(format!("{base}/broken"), KEY);

    match llm.chat(&[ChatMessage::user().content("abc").build()]).await {
        Err(LLMError::ResponseFormatError { message, raw_response }) => {
            assert!(message.contains("500"));
            assert_eq!(raw_response, "upstream down");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected an error"),
    }
}

#[tokio::test]
async fn undecodable_body_is_a_format_error() {
    let base = spawn_mock().await;
    let llm = groq(format!("{base}/garbage"), KEY);

    let err = llm
        .chat(&[ChatMessage::user().content("abc").build()])
        .await
        .err()
        .unwrap();
    assert!(matches!(err, LLMError::ResponseFormatError { raw_response, .. } if raw_response == "not json"));
}

#[tokio::test]
async fn null_content_is_no_text() {
    let base = spawn_mock().await;
    let llm = groq(format!("{base}/empty"), KEY);

    let response = llm
        .chat(&[ChatMessage::user().content("abc").build()])
        .await
        .unwrap();
    assert_eq!(response.text(), None);
}

#[tokio::test]
async fn unreachable_endpoint_is_an_http_error() {
    // Nothing listens on the discard port.
    let llm = groq("http://127.0.0.1:9/v1".to_string(), KEY);
    let err = llm
        .chat(&[ChatMessage::user().content("abc").build()])
        .await
        .err()
        .unwrap();
    assert!(matches!(err, LLMError::HttpError(_)));
}

#[tokio::test]
async fn pipeline_runs_against_the_endpoint() {
    let base = spawn_mock().await;
    let llm = groq(format!("{base}/openai/v1"), KEY);
    let mut chain = CodeGenChain::new(Arc::from(llm)).unwrap();

    let result = chain.generate("ab").await.unwrap();

    let code: String = "Write Python code on this topic: ab".chars().rev().collect();
    let description: String = format!("Describe this given code: {code}").chars().rev().collect();
    let example: String = format!("Give an example of this given description: {description}")
        .chars()
        .rev()
        .collect();
    assert_eq!(result.code, code);
    assert_eq!(result.description, description);
    assert_eq!(result.example, example);
}
