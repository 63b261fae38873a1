//! OpenAI Responses API driver.
//!
//! This module implements the [`LlmDriver`] trait for the OpenAI Responses
//! API (`/v1/responses`). Unlike Chat Completions it accepts hosted tools
//! such as `web_search` next to function tools.

use serde_json::{Value, json};

use crate::error::{Error, Result};

use super::{
    Completion, HostedCall, LlmDriver, LlmRequest, LlmSettings, Message, MessageRole, ToolCall,
    ToolSpec, check_status,
};

/// Driver for the OpenAI Responses API.
#[derive(Clone)]
pub struct ResponsesDriver {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ResponsesDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponsesDriver")
            .field("base_url", &self.settings.base_url)
            .field("model", &self.settings.model)
            .finish()
    }
}

impl ResponsesDriver {
    /// Create a new Responses driver with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    fn request_body(&self, req: &LlmRequest) -> Value {
        let mut body = json!({
            "model": req.model.as_deref().unwrap_or(&self.settings.model),
            "input": input_items(&req.messages),
        });

        if !req.tools.is_empty() {
            body["tools"] = Value::Array(tools_json(&req.tools));
            body["tool_choice"] = json!("auto");
            if let Some(parallel) = self.settings.parallel_tool_calls {
                body["parallel_tool_calls"] = json!(parallel);
            }
        }
        if let Some(t) = req.temperature.or(self.settings.temperature) {
            body["temperature"] = json!(t);
        }
        body
    }
}

#[async_trait::async_trait]
impl LlmDriver for ResponsesDriver {
    async fn complete(&self, req: LlmRequest) -> Result<Completion> {
        let url = self
            .settings
            .provider
            .build_responses_url(&self.settings.base_url);
        let body = self.request_body(&req);

        tracing::debug!(
            url = %url,
            message_count = req.messages.len(),
            tool_count = req.tools.len(),
            "Sending responses request"
        );

        let rb = self.http.post(&url).json(&body);
        let rb = self
            .settings
            .provider
            .authorize(rb, self.settings.api_key.as_deref());

        let resp = check_status(rb.send().await?).await?;
        let v: Value = resp.json().await?;
        parse_response(&v)
    }
}

/// Tools in Responses API format (flat function objects, bare hosted types).
fn tools_json(tools: &[ToolSpec]) -> Vec<Value> {
    tools
        .iter()
        .map(|t| match t {
            ToolSpec::Function {
                name,
                description,
                parameters,
            } => json!({
                "type": "function",
                "name": name,
                "description": description,
                "parameters": parameters
            }),
            ToolSpec::Hosted(hosted) => json!({ "type": hosted.type_name() }),
        })
        .collect()
}

/// Convert conversation history into Responses `input` items.
///
/// Assistant tool calls become `function_call` items and tool results become
/// `function_call_output` items keyed by the same call id.
pub fn input_items(messages: &[Message]) -> Vec<Value> {
    let mut items = Vec::with_capacity(messages.len());

    for msg in messages {
        match msg.role {
            MessageRole::Tool => {
                items.push(json!({
                    "type": "function_call_output",
                    "call_id": msg.tool_call_id.as_deref().unwrap_or_default(),
                    "output": msg.text(),
                }));
            }
            MessageRole::Assistant if msg.tool_calls.is_some() => {
                if !msg.text().is_empty() {
                    items.push(json!({"role": "assistant", "content": msg.text()}));
                }
                for call in msg.requested_tool_calls() {
                    items.push(json!({
                        "type": "function_call",
                        "call_id": call.id,
                        "name": call.function.name,
                        "arguments": call.function.arguments,
                    }));
                }
            }
            role => {
                items.push(json!({"role": role, "content": msg.text()}));
            }
        }
    }

    items
}

/// Read the `output` items of a Responses API body.
pub fn parse_response(v: &Value) -> Result<Completion> {
    let output = v
        .get("output")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::MalformedResponse("response has no output".to_string()))?;

    let mut text = String::new();
    let mut calls = Vec::new();
    let mut hosted_calls = Vec::new();

    for item in output {
        match item.get("type").and_then(Value::as_str).unwrap_or_default() {
            "message" => {
                let parts = item.get("content").and_then(Value::as_array);
                for part in parts.into_iter().flatten() {
                    if part.get("type").and_then(Value::as_str) == Some("output_text") {
                        text.push_str(part.get("text").and_then(Value::as_str).unwrap_or_default());
                    }
                }
            }
            "function_call" => {
                let field = |k: &str| item.get(k).and_then(Value::as_str).unwrap_or_default();
                calls.push(ToolCall::function(
                    field("call_id"),
                    field("name"),
                    field("arguments"),
                ));
            }
            kind if kind.ends_with("_call") => {
                hosted_calls.push(HostedCall {
                    id: item
                        .get("id")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    kind: kind.trim_end_matches("_call").to_string(),
                    status: item
                        .get("status")
                        .and_then(Value::as_str)
                        .map(ToString::to_string),
                });
            }
            other => {
                tracing::debug!(item_type = %other, "Ignoring response output item");
            }
        }
    }

    let content = (!text.is_empty()).then_some(text);
    let message = if calls.is_empty() {
        Message {
            content,
            ..Message::assistant("")
        }
    } else {
        Message::assistant_tool_calls(content, calls)
    };

    Ok(Completion {
        message,
        hosted_calls,
        finish_reason: v
            .get("status")
            .and_then(Value::as_str)
            .map(ToString::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{HostedTool, LlmProtocol, Provider};

    #[test]
    fn test_input_items_round_trip_tool_turn() {
        let messages = vec![
            Message::user("What is GPT-4o?"),
            Message::assistant_tool_calls(
                None,
                vec![ToolCall::function("call_1", "internal_search", r#"{"query":"GPT-4o"}"#)],
            ),
            Message::tool("call_1", "internal_search", "[]"),
        ];

        let items = input_items(&messages);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["role"], "user");
        assert_eq!(items[1]["type"], "function_call");
        assert_eq!(items[1]["call_id"], "call_1");
        assert_eq!(items[2]["type"], "function_call_output");
        assert_eq!(items[2]["call_id"], "call_1");
        assert_eq!(items[2]["output"], "[]");
    }

    #[test]
    fn test_parse_web_search_then_text() {
        let body = json!({
            "status": "completed",
            "output": [
                {"type": "web_search_call", "id": "ws_1", "status": "completed"},
                {"type": "message", "role": "assistant", "content": [
                    {"type": "output_text", "text": "GPT-4o is ", "annotations": []},
                    {"type": "output_text", "text": "multimodal."}
                ]}
            ]
        });

        let completion = parse_response(&body).unwrap();
        assert!(!completion.has_tool_calls());
        assert_eq!(completion.message.text(), "GPT-4o is multimodal.");
        assert_eq!(completion.hosted_calls.len(), 1);
        assert_eq!(completion.hosted_calls[0].kind, "web_search");
        assert_eq!(completion.finish_reason.as_deref(), Some("completed"));
    }

    #[test]
    fn test_parse_function_call() {
        let body = json!({
            "output": [{
                "type": "function_call",
                "id": "fc_1",
                "call_id": "call_9",
                "name": "internal_search",
                "arguments": "{\"query\":\"AutoML\",\"top_k\":2}"
            }]
        });
        let completion = parse_response(&body).unwrap();
        let calls = completion.message.requested_tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_9");
        assert_eq!(calls[0].parsed_arguments().unwrap()["top_k"], 2);
    }

    #[test]
    fn test_request_body_keeps_hosted_tools() {
        let driver = ResponsesDriver::new(LlmSettings {
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            protocol: LlmProtocol::Responses,
            provider: Provider::OpenAI,
            temperature: None,
            parallel_tool_calls: None,
        });
        let body = driver.request_body(&LlmRequest {
            messages: vec![Message::system("be brief"), Message::user("hi")],
            tools: vec![ToolSpec::Hosted(HostedTool::WebSearch)],
            ..LlmRequest::default()
        });
        assert_eq!(body["tools"][0]["type"], "web_search");
        assert_eq!(body["input"][0]["role"], "system");
    }
}
