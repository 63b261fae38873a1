//! Hybrid search chat loop.
//!
//! Each user turn is answered by letting the model choose between the local
//! `internal_search` tool, the hosted web search tool, or a direct answer:
//! 1. Append the user query to the history
//! 2. Request a completion offering both tools
//! 3. Run `internal_search` locally when requested and append its hits
//! 4. Repeat until the model answers without tool calls

use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::history::ConversationHistory;
use crate::llm::{LlmDriver, LlmRequest, Message, MessageRole, ToolCall};
use crate::tools::{HostedTool, InternalSearchTool, ToolRegistry};
use crate::vector::VectorStore;

/// Default sampling temperature for every request.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Documents seeded into an empty index on first start.
pub const SAMPLE_DOCUMENTS: [&str; 2] = [
    "OpenAI released GPT-4o in 2025, offering multimodal capabilities.",
    "IDARE AI's AutoML platform simplifies model training on AWS S3 data.",
];

/// Chat agent combining local vector search and hosted web search.
#[derive(Debug, Clone)]
pub struct HybridSearchAgent {
    driver: Arc<dyn LlmDriver>,
    tools: ToolRegistry,
    temperature: f32,
    max_iterations: Option<usize>,
}

impl HybridSearchAgent {
    /// Agent offering `internal_search` over `store` and hosted web search.
    pub fn new(driver: Arc<dyn LlmDriver>, store: Arc<dyn VectorStore>) -> Self {
        let tools = ToolRegistry::new()
            .with_tool(Arc::new(InternalSearchTool::new(store)))
            .with_hosted(HostedTool::WebSearch);
        Self::with_tools(driver, tools)
    }

    pub fn with_tools(driver: Arc<dyn LlmDriver>, tools: ToolRegistry) -> Self {
        Self {
            driver,
            tools,
            temperature: DEFAULT_TEMPERATURE,
            max_iterations: None,
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Cap the number of requests per turn. Unbounded unless set.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: Option<usize>) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Run a tool call locally. Tools the platform resolves yield `[]`.
    pub async fn dispatch_tool_call(&self, call: &ToolCall) -> Result<serde_json::Value> {
        let name = call.function.name.as_str();
        if !self.tools.is_local(name) {
            return Ok(serde_json::Value::Array(Vec::new()));
        }
        self.tools.call(name, call.parsed_arguments()?).await
    }

    /// Answer one user query, appending every exchanged message to `history`.
    pub async fn chat(&self, query: &str, history: &mut ConversationHistory) -> Result<String> {
        let request_id = Uuid::new_v4().to_string();
        history.push_user(query);

        tracing::info!(
            request_id = %request_id,
            message_count = history.len(),
            tool_count = self.tools.len(),
            "Starting hybrid search chat"
        );

        let mut iteration = 0;
        loop {
            if let Some(max) = self.max_iterations.filter(|&max| iteration >= max) {
                tracing::error!(
                    request_id = %request_id,
                    max_iterations = max,
                    "Maximum tool loop iterations exceeded"
                );
                return Err(Error::MaxTurnsExceeded(max));
            }
            iteration += 1;

            let req = LlmRequest {
                messages: history.messages().to_vec(),
                tools: self.tools.specs(),
                model: None,
                temperature: Some(self.temperature),
            };

            let completion = self.driver.complete(req).await?;

            for hosted in &completion.hosted_calls {
                tracing::info!(
                    request_id = %request_id,
                    iteration = iteration,
                    kind = %hosted.kind,
                    status = ?hosted.status,
                    "Hosted tool resolved by platform"
                );
            }

            // Assistant wants to call a tool
            if completion.has_tool_calls() {
                let calls = completion.message.requested_tool_calls().to_vec();
                history.push(completion.message);

                for call in &calls {
                    if !self.tools.is_local(&call.function.name) {
                        tracing::debug!(
                            request_id = %request_id,
                            tool_name = %call.function.name,
                            "Skipping platform-handled tool call"
                        );
                        continue;
                    }

                    tracing::info!(
                        request_id = %request_id,
                        iteration = iteration,
                        tool_id = %call.id,
                        tool_name = %call.function.name,
                        "Executing tool call"
                    );

                    let result = self.dispatch_tool_call(call).await?;
                    let content = serde_json::to_string(&result)?;
                    history.push(Message::tool(&call.id, &call.function.name, content));
                }
                continue;
            }

            // Tool output relayed by the platform
            if completion.message.role == MessageRole::Tool {
                history.push(completion.message);
                continue;
            }

            let answer = completion.message.text().to_string();
            history.push(Message::assistant(answer.clone()));

            tracing::info!(
                request_id = %request_id,
                iterations = iteration,
                answer_length = answer.len(),
                "Hybrid search chat complete"
            );
            return Ok(answer);
        }
    }
}

/// Interactive question loop over `input`, writing answers to `output`.
///
/// Ends with "Goodbye!" on end of input or as soon as `shutdown` resolves,
/// including while a question is still being answered. The history starts
/// fresh for every question unless `keep_history` is set.
pub async fn run_repl<R, W, S>(
    agent: &HybridSearchAgent,
    input: R,
    mut output: W,
    keep_history: bool,
    shutdown: S,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut lines = input.lines();
    let mut history = ConversationHistory::new();

    loop {
        output.write_all(b"> ").await?;
        output.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            () = &mut shutdown => None,
        };
        let Some(line) = line else {
            break;
        };

        let question = line.trim();
        if question.is_empty() {
            continue;
        }

        if !keep_history {
            history = ConversationHistory::new();
        }
        let answer = tokio::select! {
            answer = agent.chat(question, &mut history) => Some(answer?),
            () = &mut shutdown => None,
        };
        let Some(answer) = answer else {
            tracing::info!("Interrupted while answering");
            break;
        };

        output
            .write_all(format!("\nAssistant:\n {answer} \n\n").as_bytes())
            .await?;
    }

    output.write_all(b"\nGoodbye!\n").await?;
    output.flush().await?;
    Ok(())
}
