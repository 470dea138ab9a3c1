//! The tool seam and the ordered palette.

use crate::model::ToolSpec;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("execution failed: {0}")]
    Execution(String),
}

/// An external function the agent may invoke. Each call is potentially
/// slow and independently failing; a failure aborts the whole turn.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON schema of the arguments object.
    fn parameters(&self) -> Value;
    async fn execute(&self, args: Value) -> Result<Value, ToolError>;
}

/// A fixed, ordered tool palette. Order matters: it is the prescribed
/// invocation order the [`crate::ToolOrderGuard`] enforces.
#[derive(Clone, Default)]
pub struct ToolPalette {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolPalette {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    /// Tool names in palette order.
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|tool| tool.name().to_string()).collect()
    }

    /// Provider-facing advertisements, in palette order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|tool| ToolSpec {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect()
    }
}
