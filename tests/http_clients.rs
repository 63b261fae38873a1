mod common;

use std::sync::{Arc, Mutex};

use axum::{Json, Router, extract::State, http::HeaderMap, http::StatusCode, routing::post};
use common::spawn_server;
use serde_json::{Value, json};
use tool_agents::Error;
use tool_agents::email::{OutgoingEmail, SendGridClient, SendStatus, send_html_email};
use tool_agents::llm::{
    ChatCompletionsDriver, HostedTool, LlmDriver, LlmProtocol, LlmRequest, LlmSettings, Message,
    Provider, ResponsesDriver, ToolSpec,
};

#[derive(Clone, Default)]
struct Captured {
    bodies: Arc<Mutex<Vec<Value>>>,
    auth: Arc<Mutex<Vec<String>>>,
}

fn record(state: &Captured, headers: &HeaderMap, body: Value) {
    state.bodies.lock().unwrap().push(body);
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.auth.lock().unwrap().push(auth);
}

fn settings(base_url: String, protocol: LlmProtocol) -> LlmSettings {
    LlmSettings {
        base_url,
        api_key: Some("sk-test".to_string()),
        model: "gpt-4o-mini".to_string(),
        protocol,
        provider: Provider::Generic,
        temperature: None,
        parallel_tool_calls: None,
    }
}

fn email() -> OutgoingEmail {
    OutgoingEmail {
        from: "kawsar@idare.ai".to_string(),
        to: "cto@example.com".to_string(),
        subject: "Hello".to_string(),
        html_body: "<p>Hello</p>".to_string(),
    }
}

fn search_request() -> LlmRequest {
    LlmRequest {
        messages: vec![Message::user("What is GPT-4o?")],
        tools: vec![
            ToolSpec::Function {
                name: "internal_search".to_string(),
                description: "Search".to_string(),
                parameters: json!({"type": "object", "properties": {"query": {"type": "string"}}}),
            },
            ToolSpec::Hosted(HostedTool::WebSearch),
        ],
        model: None,
        temperature: Some(0.3),
    }
}

#[tokio::test]
async fn test_chat_completions_round_trip() {
    async fn handler(
        State(state): State<Captured>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        record(&state, &headers, body);
        Json(json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "finish_reason": "tool_calls",
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "internal_search", "arguments": "{\"query\":\"GPT-4o\"}"}
                    }]
                }
            }]
        }))
    }

    let captured = Captured::default();
    let router = Router::new()
        .route("/v1/chat/completions", post(handler))
        .with_state(captured.clone());
    let base_url = spawn_server(router).await;

    let driver = ChatCompletionsDriver::new(settings(base_url, LlmProtocol::Chat));
    let completion = driver.complete(search_request()).await.unwrap();

    assert!(completion.has_tool_calls());
    assert_eq!(
        completion.message.requested_tool_calls()[0].function.name,
        "internal_search"
    );

    let body = captured.bodies.lock().unwrap()[0].clone();
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["tool_choice"], "auto");
    assert_eq!(body["tools"].as_array().unwrap().len(), 1);
    assert_eq!(captured.auth.lock().unwrap()[0], "Bearer sk-test");
}

#[tokio::test]
async fn test_responses_round_trip_with_hosted_tool() {
    async fn handler(
        State(state): State<Captured>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        record(&state, &headers, body);
        Json(json!({
            "id": "resp_1",
            "status": "completed",
            "output": [
                {"type": "web_search_call", "id": "ws_1", "status": "completed"},
                {"type": "message", "role": "assistant", "content": [
                    {"type": "output_text", "text": "GPT-4o is multimodal."}
                ]}
            ]
        }))
    }

    let captured = Captured::default();
    let router = Router::new()
        .route("/v1/responses", post(handler))
        .with_state(captured.clone());
    let base_url = spawn_server(router).await;

    let driver = ResponsesDriver::new(settings(base_url, LlmProtocol::Responses));
    let completion = driver.complete(search_request()).await.unwrap();

    assert!(!completion.has_tool_calls());
    assert_eq!(completion.message.text(), "GPT-4o is multimodal.");
    assert_eq!(completion.hosted_calls[0].kind, "web_search");

    let body = captured.bodies.lock().unwrap()[0].clone();
    let tools = body["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 2);
    assert_eq!(tools[0]["name"], "internal_search");
    assert_eq!(tools[1], json!({"type": "web_search"}));
    assert_eq!(body["input"][0]["content"], "What is GPT-4o?");
}

#[tokio::test]
async fn test_api_error_status_is_surfaced() {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::UNAUTHORIZED, "invalid api key") }),
    );
    let base_url = spawn_server(router).await;

    let driver = ChatCompletionsDriver::new(settings(base_url, LlmProtocol::Chat));
    let err = driver.complete(search_request()).await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "invalid api key");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_sendgrid_accepts_mail() {
    async fn handler(
        State(state): State<Captured>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> StatusCode {
        record(&state, &headers, body);
        StatusCode::ACCEPTED
    }

    let captured = Captured::default();
    let router = Router::new()
        .route("/v3/mail/send", post(handler))
        .with_state(captured.clone());
    let base_url = spawn_server(router).await;

    let client = SendGridClient::with_base_url(base_url, Some("SG.test".to_string()));
    let status = send_html_email(&client, &email()).await;
    assert_eq!(status, SendStatus::Success);

    let body = captured.bodies.lock().unwrap()[0].clone();
    assert_eq!(body["personalizations"][0]["to"][0]["email"], "cto@example.com");
    assert_eq!(body["content"][0]["value"], "<p>Hello</p>");
    assert_eq!(captured.auth.lock().unwrap()[0], "Bearer SG.test");
}

#[tokio::test]
async fn test_sendgrid_rejection_becomes_error_status() {
    let router = Router::new().route(
        "/v3/mail/send",
        post(|| async {
            (
                StatusCode::FORBIDDEN,
                r#"{"errors":[{"message":"The from address does not match a verified Sender Identity."}]}"#,
            )
        }),
    );
    let base_url = spawn_server(router).await;

    let client = SendGridClient::with_base_url(base_url, None);
    match send_html_email(&client, &email()).await {
        SendStatus::Error { message } => {
            assert!(message.contains("403"));
            assert!(message.contains("verified Sender Identity"));
        }
        SendStatus::Success => panic!("expected error status"),
    }
}

#[tokio::test]
async fn test_unreachable_sendgrid_becomes_error_status() {
    // Nothing listens on port 9 locally
    let client = SendGridClient::with_base_url("http://127.0.0.1:9", None);
    let status = send_html_email(&client, &email()).await;
    assert!(!status.is_success());
}
