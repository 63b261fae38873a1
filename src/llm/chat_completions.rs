//! OpenAI Chat Completions API driver.
//!
//! This module implements the [`LlmDriver`] trait for the OpenAI Chat Completions
//! API (`/v1/chat/completions`), supporting tool calls.

use serde_json::{Value, json};

use crate::error::{Error, Result};

use super::{Completion, LlmDriver, LlmRequest, LlmSettings, Message, ToolSpec, check_status};

/// Driver for the OpenAI Chat Completions API.
///
/// Connects to `/v1/chat/completions` and returns the first choice as a
/// [`Completion`].
#[derive(Clone)]
pub struct ChatCompletionsDriver {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsDriver")
            .field("base_url", &self.settings.base_url)
            .field("model", &self.settings.model)
            .finish()
    }
}

impl ChatCompletionsDriver {
    /// Create a new Chat Completions driver with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    fn request_body(&self, req: &LlmRequest) -> Result<Value> {
        let tools = tools_json(&req.tools);
        let mut body = json!({
            "model": req.model.as_deref().unwrap_or(&self.settings.model),
            "messages": serde_json::to_value(&req.messages)?,
        });

        if !tools.is_empty() {
            body["tools"] = Value::Array(tools);
            body["tool_choice"] = json!("auto");
            if let Some(parallel) = self.settings.parallel_tool_calls {
                body["parallel_tool_calls"] = json!(parallel);
            }
        }
        if let Some(t) = req.temperature.or(self.settings.temperature) {
            body["temperature"] = json!(t);
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl LlmDriver for ChatCompletionsDriver {
    async fn complete(&self, req: LlmRequest) -> Result<Completion> {
        let url = self.settings.provider.build_chat_url(&self.settings.base_url);
        let body = self.request_body(&req)?;

        tracing::debug!(
            url = %url,
            message_count = req.messages.len(),
            tool_count = req.tools.len(),
            "Sending chat completions request"
        );

        let rb = self.http.post(&url).json(&body);
        let rb = self
            .settings
            .provider
            .authorize(rb, self.settings.api_key.as_deref());

        let resp = check_status(rb.send().await?).await?;
        let v: Value = resp.json().await?;
        parse_completion(&v)
    }
}

/// Function tools in Chat Completions format.
///
/// Hosted tools have no representation on this endpoint and are dropped.
fn tools_json(tools: &[ToolSpec]) -> Vec<Value> {
    tools
        .iter()
        .filter_map(|t| match t {
            ToolSpec::Function {
                name,
                description,
                parameters,
            } => Some(json!({
                "type": "function",
                "function": {
                    "name": name,
                    "description": description,
                    "parameters": parameters
                }
            })),
            ToolSpec::Hosted(hosted) => {
                tracing::warn!(
                    tool = hosted.type_name(),
                    "Hosted tool not supported by chat completions; omitting"
                );
                None
            }
        })
        .collect()
}

/// Read `choices[0]` of a Chat Completions response body.
pub fn parse_completion(v: &Value) -> Result<Completion> {
    let choice = v
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| Error::MalformedResponse("response has no choices".to_string()))?;

    let message: Message = serde_json::from_value(choice["message"].clone())?;
    let finish_reason = choice
        .get("finish_reason")
        .and_then(Value::as_str)
        .map(ToString::to_string);

    Ok(Completion {
        message,
        hosted_calls: Vec::new(),
        finish_reason,
    })
}
