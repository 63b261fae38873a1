//! LLM driver traits and implementations.
//!
//! This module provides protocol-agnostic abstractions for single
//! request/response calls to hosted Large Language Models, supporting both
//! `OpenAI` Chat Completions and Responses APIs.
//!
//! # Overview
//!
//! The [`LlmDriver`] trait defines the one call every implementation must
//! support: send the conversation so far plus the offered tools, get back a
//! [`Completion`]. The tool loops in [`crate::agents`] and [`crate::hybrid`]
//! are built on top of it.
//!
//! # Drivers
//!
//! - [`ChatCompletionsDriver`]: `OpenAI` Chat Completions API (`/v1/chat/completions`)
//! - [`ResponsesDriver`]: `OpenAI` Responses API (`/v1/responses`)
//!
//! # Example
//!
//! ```rust,ignore
//! use tool_agents::llm::{driver_for, LlmProtocol, LlmSettings, Provider};
//!
//! let settings = LlmSettings {
//!     base_url: "https://api.openai.com".to_string(),
//!     api_key: Some("sk-...".to_string()),
//!     model: "gpt-4o-mini".to_string(),
//!     protocol: LlmProtocol::Auto,
//!     provider: Provider::OpenAI,
//!     temperature: None,
//!     parallel_tool_calls: None,
//! };
//! let driver = driver_for(settings);
//! ```

pub mod chat_completions;
pub mod provider;
pub mod responses;

pub use chat_completions::ChatCompletionsDriver;
pub use provider::Provider;
pub use responses::ResponsesDriver;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// LLM connection and model settings.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Base URL for the LLM API (e.g., `https://api.openai.com`).
    pub base_url: String,
    /// Optional API key for authentication.
    pub api_key: Option<String>,
    /// Default model identifier (e.g., `gpt-4o-mini`).
    pub model: String,
    /// Protocol to use for communication.
    pub protocol: LlmProtocol,
    /// Provider type (auto-detected from `base_url` if not specified).
    pub provider: Provider,
    /// Default sampling temperature; requests may override it.
    pub temperature: Option<f32>,
    /// Whether to enable parallel tool calls (provider-dependent).
    pub parallel_tool_calls: Option<bool>,
}

/// LLM protocol variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LlmProtocol {
    /// Pick Responses when the provider hosts web search, Chat otherwise.
    #[default]
    Auto,
    /// `OpenAI` Responses API (`/v1/responses`).
    Responses,
    /// `OpenAI` Chat Completions API (`/v1/chat/completions`).
    Chat,
}

impl LlmProtocol {
    /// Parse a protocol name; anything unrecognised means [`LlmProtocol::Auto`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "responses" => Self::Responses,
            "chat" => Self::Chat,
            _ => Self::Auto,
        }
    }
}

/// Build the driver matching the configured protocol.
pub fn driver_for(settings: LlmSettings) -> Arc<dyn LlmDriver> {
    match settings.protocol {
        LlmProtocol::Responses => Arc::new(ResponsesDriver::new(settings)),
        LlmProtocol::Chat => Arc::new(ChatCompletionsDriver::new(settings)),
        LlmProtocol::Auto => {
            if settings.provider.supports_hosted_web_search() {
                Arc::new(ResponsesDriver::new(settings))
            } else {
                Arc::new(ChatCompletionsDriver::new(settings))
            }
        }
    }
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt.
    System,
    /// User message.
    User,
    /// Assistant response.
    Assistant,
    /// Tool response.
    Tool,
}

/// A message in a conversation, in Chat Completions wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    /// Text content. `None` for assistant turns that only request tools.
    pub content: Option<String>,
    /// Tool call this message answers (tool role only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Name of the tool that produced this message (tool role only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tool calls requested by the assistant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl Message {
    fn with_role(role: MessageRole, content: Option<String>) -> Self {
        Self {
            role,
            content,
            tool_call_id: None,
            name: None,
            tool_calls: None,
        }
    }

    /// System prompt message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::System, Some(content.into()))
    }

    /// User message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::User, Some(content.into()))
    }

    /// Plain assistant answer.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::Assistant, Some(content.into()))
    }

    /// Assistant turn carrying tool calls, with optional accompanying text.
    #[must_use]
    pub fn assistant_tool_calls(content: Option<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: Some(calls),
            ..Self::with_role(MessageRole::Assistant, content)
        }
    }

    /// Result of a tool call.
    #[must_use]
    pub fn tool(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
            ..Self::with_role(MessageRole::Tool, Some(content.into()))
        }
    }

    /// Text content, or empty when there is none.
    #[must_use]
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// Tool calls requested by this message (empty when none).
    #[must_use]
    pub fn requested_tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or_default()
    }
}

/// A tool call made by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call.
    pub id: String,
    /// Type of tool (always "function" for now).
    #[serde(rename = "type")]
    pub call_type: String,
    /// Function details.
    pub function: ToolCallFunction,
}

impl ToolCall {
    /// Build a function tool call.
    #[must_use]
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: "function".to_string(),
            function: ToolCallFunction {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    /// Parse the JSON-string arguments; an empty string means `{}`.
    pub fn parsed_arguments(&self) -> Result<serde_json::Value> {
        if self.function.arguments.trim().is_empty() {
            return Ok(serde_json::Value::Object(serde_json::Map::new()));
        }
        Ok(serde_json::from_str(&self.function.arguments)?)
    }
}

/// Function details in a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallFunction {
    /// Function name.
    pub name: String,
    /// Arguments as JSON string.
    pub arguments: String,
}

/// Capabilities executed by the hosting platform rather than locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostedTool {
    /// Built-in web search.
    WebSearch,
}

impl HostedTool {
    /// Wire type name of the hosted tool.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::WebSearch => "web_search",
        }
    }
}

/// A tool offered to the model for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolSpec {
    /// Locally executed function.
    Function {
        /// Function name.
        name: String,
        /// What the function does.
        description: String,
        /// JSON schema of the arguments.
        parameters: serde_json::Value,
    },
    /// Platform-resolved capability.
    Hosted(HostedTool),
}

/// A hosted tool invocation reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedCall {
    /// Platform identifier for the call.
    pub id: String,
    /// Hosted tool type (e.g. `web_search`).
    pub kind: String,
    /// Reported status, when present.
    pub status: Option<String>,
}

/// Request to an LLM driver.
#[derive(Debug, Clone, Default)]
pub struct LlmRequest {
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// Tools the model may call.
    pub tools: Vec<ToolSpec>,
    /// Model override; the driver's configured model is used otherwise.
    pub model: Option<String>,
    /// Sampling temperature override.
    pub temperature: Option<f32>,
}

/// One model response.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// The returned message (usually the assistant).
    pub message: Message,
    /// Hosted tool calls the platform resolved while answering.
    pub hosted_calls: Vec<HostedCall>,
    /// Reported finish reason or response status.
    pub finish_reason: Option<String>,
}

impl Completion {
    /// Completion carrying only assistant text.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            message: Message::assistant(content),
            hosted_calls: Vec::new(),
            finish_reason: Some("stop".to_string()),
        }
    }

    /// Completion requesting the given tool calls.
    #[must_use]
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            message: Message::assistant_tool_calls(None, calls),
            hosted_calls: Vec::new(),
            finish_reason: Some("tool_calls".to_string()),
        }
    }

    /// Whether the model asked for at least one function tool call.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.message.requested_tool_calls().is_empty()
    }
}

/// Trait for LLM request/response drivers.
#[async_trait::async_trait]
pub trait LlmDriver: Send + Sync + std::fmt::Debug {
    /// Send one request and wait for the full response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API answers with a non-2xx
    /// status, or the body cannot be interpreted.
    async fn complete(&self, req: LlmRequest) -> Result<Completion>;
}

/// Turn a non-2xx response into [`crate::Error::Api`].
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(crate::Error::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_message_wire_shape() {
        let msg = Message::tool("call_1", "internal_search", "[]");
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["role"], "tool");
        assert_eq!(v["tool_call_id"], "call_1");
        assert_eq!(v["name"], "internal_search");
        assert_eq!(v["content"], "[]");
        assert!(v.get("tool_calls").is_none());
    }

    #[test]
    fn test_assistant_tool_call_message_has_null_content() {
        let msg = Message::assistant_tool_calls(
            None,
            vec![ToolCall::function("call_1", "internal_search", "{}")],
        );
        let v = serde_json::to_value(&msg).unwrap();
        assert!(v["content"].is_null());
        assert_eq!(v["tool_calls"][0]["type"], "function");
        assert_eq!(v["tool_calls"][0]["function"]["name"], "internal_search");
    }

    #[test]
    fn test_empty_arguments_parse_as_object() {
        let call = ToolCall::function("c", "transfer_to_email_manager", "");
        assert_eq!(call.parsed_arguments().unwrap(), serde_json::json!({}));
    }

    #[test]
    fn test_protocol_parse() {
        assert_eq!(LlmProtocol::parse("Chat"), LlmProtocol::Chat);
        assert_eq!(LlmProtocol::parse(" responses "), LlmProtocol::Responses);
        assert_eq!(LlmProtocol::parse("whatever"), LlmProtocol::Auto);
    }
}
