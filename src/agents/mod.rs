//! Named LLM agents with tools and handoffs.
//!
//! An [`Agent`] is a configuration: instructions, an optional model, the
//! tools it may call and the agents it may hand the conversation to. The
//! [`Runner`] executes it against an [`LlmDriver`](crate::llm::LlmDriver).
//!
//! Agents compose two ways:
//! - **as tools** ([`Agent::as_tool`]): the caller keeps control and gets the
//!   sub-agent's final text back as the tool result
//! - **as handoffs** ([`Agent::with_handoff`]): control moves to the target
//!   agent, which continues the same conversation under its own instructions

pub mod runner;
pub mod sales;

pub use runner::{RunResult, Runner};

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{Error, Result};
use crate::llm::ToolSpec;
use crate::tools::Tool;

/// An agent definition.
#[derive(Debug, Clone)]
pub struct Agent {
    pub name: String,
    pub instructions: String,
    pub model: Option<String>,
    pub tools: Vec<Arc<dyn Tool>>,
    pub handoffs: Vec<Arc<Agent>>,
    /// Shown to other agents deciding whether to hand off here.
    pub handoff_description: Option<String>,
}

impl Agent {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model: None,
            tools: Vec::new(),
            handoffs: Vec::new(),
            handoff_description: None,
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    #[must_use]
    pub fn with_handoff(mut self, agent: Arc<Agent>) -> Self {
        self.handoffs.push(agent);
        self
    }

    #[must_use]
    pub fn with_handoff_description(mut self, description: impl Into<String>) -> Self {
        self.handoff_description = Some(description.into());
        self
    }

    /// Tool name under which other agents can transfer to this one.
    pub fn handoff_tool_name(&self) -> String {
        let snake: String = self
            .name
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("transfer_to_{snake}")
    }

    /// Expose this agent as a tool taking `{"input": "..."}`.
    ///
    /// Each call is a separate run on `runner`, with its own turn budget.
    pub fn as_tool(
        self: &Arc<Self>,
        runner: &Runner,
        tool_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Arc<dyn Tool> {
        Arc::new(AgentTool {
            agent: Arc::clone(self),
            runner: runner.clone(),
            name: tool_name.into(),
            description: description.into(),
        })
    }

    pub fn find_tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn find_handoff(&self, tool_name: &str) -> Option<&Arc<Agent>> {
        self.handoffs
            .iter()
            .find(|a| a.handoff_tool_name() == tool_name)
    }

    /// Everything the model is offered while this agent is active.
    pub fn tool_specs(&self) -> Vec<ToolSpec> {
        let tools = self.tools.iter().map(|t| ToolSpec::Function {
            name: t.name().to_string(),
            description: t.description().to_string(),
            parameters: t.schema(),
        });
        let handoffs = self.handoffs.iter().map(|a| ToolSpec::Function {
            name: a.handoff_tool_name(),
            description: a.handoff_description.clone().unwrap_or_else(|| {
                format!("Handoff to the {} agent to handle the request.", a.name)
            }),
            parameters: json!({"type": "object", "properties": {}, "additionalProperties": false}),
        });
        tools.chain(handoffs).collect()
    }
}

/// An agent wrapped as a callable tool.
#[derive(Debug)]
pub struct AgentTool {
    agent: Arc<Agent>,
    runner: Runner,
    name: String,
    description: String,
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "input": { "type": "string" }
            },
            "required": ["input"],
            "additionalProperties": false
        })
    }

    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value> {
        let input = args["input"]
            .as_str()
            .ok_or_else(|| Error::Tool(format!("{}: missing input", self.name)))?;

        let result = self.runner.run(&self.agent, input).await?;
        Ok(serde_json::Value::String(result.final_output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handoff_tool_name() {
        let agent = Agent::new("Email Manager", "format and send");
        assert_eq!(agent.handoff_tool_name(), "transfer_to_email_manager");
    }

    #[test]
    fn test_tool_specs_include_handoffs() {
        let emailer = Arc::new(
            Agent::new("Email Manager", "send").with_handoff_description("Send it"),
        );
        let manager = Agent::new("Sales Manager", "pick one").with_handoff(Arc::clone(&emailer));

        let specs = manager.tool_specs();
        assert_eq!(specs.len(), 1);
        match &specs[0] {
            ToolSpec::Function {
                name, description, ..
            } => {
                assert_eq!(name, "transfer_to_email_manager");
                assert_eq!(description, "Send it");
            }
            ToolSpec::Hosted(_) => panic!("expected function spec"),
        }
        assert!(manager.find_handoff("transfer_to_email_manager").is_some());
    }
}
