//! Agent run loop.
//!
//! The runner manages one agent interaction end to end:
//! 1. Send the agent's instructions and the conversation to the LLM
//! 2. Execute any tool calls the model makes (including agents-as-tools)
//! 3. Switch agents when the model requests a handoff
//! 4. Feed tool results back and repeat until the model answers in text

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use super::Agent;
use crate::error::{Error, Result};
use crate::history::ConversationHistory;
use crate::llm::{LlmDriver, LlmRequest, Message, ToolCall};

/// Default maximum number of model turns per run.
pub const DEFAULT_MAX_TURNS: usize = 10;

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Final text answer of the last active agent.
    pub final_output: String,
    /// Name of the agent that produced the final answer.
    pub last_agent: String,
    /// Number of model turns used.
    pub turns: usize,
    /// The conversation without system prompts.
    pub history: ConversationHistory,
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RunResult:")?;
        writeln!(f, "- Last agent: {}", self.last_agent)?;
        writeln!(f, "- Turns: {}", self.turns)?;
        writeln!(f, "- Messages: {}", self.history.len())?;
        write!(f, "- Final output:\n{}", self.final_output)
    }
}

/// Executes agents against an [`LlmDriver`].
#[derive(Debug, Clone)]
pub struct Runner {
    driver: Arc<dyn LlmDriver>,
    max_turns: usize,
}

impl Runner {
    pub fn new(driver: Arc<dyn LlmDriver>) -> Self {
        Self {
            driver,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    #[must_use]
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Run `agent` on a single user input.
    pub async fn run(&self, agent: &Arc<Agent>, input: &str) -> Result<RunResult> {
        let run_id = Uuid::new_v4().to_string();
        let mut current = Arc::clone(agent);
        let mut history = ConversationHistory::new();
        history.push_user(input);

        tracing::info!(
            run_id = %run_id,
            agent = %current.name,
            "Starting agent run"
        );

        for turn in 1..=self.max_turns {
            let mut messages = Vec::with_capacity(history.len() + 1);
            messages.push(Message::system(current.instructions.clone()));
            messages.extend(history.messages().iter().cloned());

            let req = LlmRequest {
                messages,
                tools: current.tool_specs(),
                model: current.model.clone(),
                temperature: None,
            };

            tracing::debug!(
                run_id = %run_id,
                turn = turn,
                agent = %current.name,
                tool_count = req.tools.len(),
                "Sending agent turn"
            );

            let completion = self.driver.complete(req).await?;

            if !completion.has_tool_calls() {
                let final_output = completion.message.text().to_string();
                history.push(Message::assistant(final_output.clone()));

                tracing::info!(
                    run_id = %run_id,
                    turn = turn,
                    agent = %current.name,
                    output_length = final_output.len(),
                    "Agent run complete"
                );

                return Ok(RunResult {
                    final_output,
                    last_agent: current.name.clone(),
                    turns: turn,
                    history,
                });
            }

            let calls = completion.message.requested_tool_calls().to_vec();
            history.push(completion.message);

            let mut next_agent: Option<Arc<Agent>> = None;
            for call in &calls {
                let content = self
                    .execute_call(&run_id, &current, call, &mut next_agent)
                    .await;
                history.push(Message::tool(&call.id, &call.function.name, content));
            }

            if let Some(target) = next_agent {
                tracing::info!(
                    run_id = %run_id,
                    from = %current.name,
                    to = %target.name,
                    "Agent handoff"
                );
                current = target;
            }
        }

        tracing::error!(
            run_id = %run_id,
            max_turns = self.max_turns,
            "Maximum agent turns exceeded"
        );
        Err(Error::MaxTurnsExceeded(self.max_turns))
    }

    /// Run one tool call and render its result as tool message content.
    async fn execute_call(
        &self,
        run_id: &str,
        agent: &Agent,
        call: &ToolCall,
        next_agent: &mut Option<Arc<Agent>>,
    ) -> String {
        let name = call.function.name.as_str();

        if let Some(target) = agent.find_handoff(name) {
            if next_agent.is_some() {
                return "Error: only one handoff may be requested per turn".to_string();
            }
            *next_agent = Some(Arc::clone(target));
            return serde_json::json!({ "assistant": target.name }).to_string();
        }

        let Some(tool) = agent.find_tool(name) else {
            tracing::warn!(run_id = %run_id, tool_name = %name, "Model requested unknown tool");
            return format!("Error: unknown tool {name}");
        };

        tracing::info!(
            run_id = %run_id,
            agent = %agent.name,
            tool_id = %call.id,
            tool_name = %name,
            "Executing tool call"
        );

        let result = match call.parsed_arguments() {
            Ok(args) => tool.call(args).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(serde_json::Value::String(s)) => s,
            Ok(v) => v.to_string(),
            Err(e) => {
                tracing::error!(
                    run_id = %run_id,
                    tool_id = %call.id,
                    tool_name = %name,
                    error = %e,
                    "Tool call failed"
                );
                format!("Error: {e}")
            }
        }
    }
}
