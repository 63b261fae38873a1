//! Tools the model may call.
//!
//! Local tools implement [`Tool`] and run in-process when the model asks for
//! them. Hosted tools ([`HostedTool`]) are only declared; the platform runs
//! them and folds the result into its answer.

pub mod internal_search;
pub mod send_email;

pub use internal_search::InternalSearchTool;
pub use send_email::SendHtmlEmailTool;

use std::sync::Arc;

use async_trait::async_trait;

pub use crate::llm::HostedTool;
use crate::error::{Error, Result};
use crate::llm::ToolSpec;

#[async_trait]
pub trait Tool: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn schema(&self) -> serde_json::Value;
    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value>;
}

/// The tools offered on one request, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    hosted: Vec<HostedTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    #[must_use]
    pub fn with_hosted(mut self, hosted: HostedTool) -> Self {
        self.hosted.push(hosted);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Whether `name` is executed in-process.
    pub fn is_local(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.tools.len() + self.hosted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Local function specs first, then hosted capabilities.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|t| ToolSpec::Function {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.schema(),
            })
            .chain(self.hosted.iter().copied().map(ToolSpec::Hosted))
            .collect()
    }

    pub async fn call(&self, name: &str, args: serde_json::Value) -> Result<serde_json::Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| Error::Tool(format!("unknown tool: {name}")))?;
        tool.call(args).await
    }
}
