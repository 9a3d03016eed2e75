//! Tool execution — the capabilities a provider can invoke mid-generation.
//!
//! Each [`AgentSkill`](crate::types::AgentSkill) advertised on an agent card
//! maps to a registered [`Tool`] by skill id. The [`ToolRegistry`] hands the
//! provider a schema list and executes calls by name; a failed tool produces
//! an error output that flows back to the provider as a tool result instead
//! of failing the task.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

/// A single tool invocation requested by the provider.
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// Opaque identifier assigned by the provider (forwarded verbatim).
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Parsed JSON arguments.
    pub args: Value,
}

/// The result of executing a tool.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// The call this output answers.
    pub call_id: String,
    /// Result payload handed back to the provider.
    pub content: Value,
    /// `true` when the tool failed non-fatally; the message is in `content`.
    pub is_error: bool,
}

impl ToolOutput {
    /// Successful result.
    pub fn ok(call_id: impl Into<String>, content: Value) -> Self {
        Self {
            call_id: call_id.into(),
            content,
            is_error: false,
        }
    }

    /// Error result carrying a plain-text message.
    pub fn err(call_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: Value::String(msg.into()),
            is_error: true,
        }
    }
}

/// A tool schema handed to the provider.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    /// Tool name (matches the advertising skill's id).
    pub name: String,
    /// What the tool does.
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters: Value,
}

/// Trait implemented by every capability an agent exposes to its provider.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable tool name; skills reference it by id.
    fn name(&self) -> &str;
    /// Human-readable description shown to the model.
    fn description(&self) -> &str;
    /// JSON Schema for the arguments object.
    fn parameters_schema(&self) -> Value;
    /// Execute the tool. Failures should be returned via [`ToolOutput::err`].
    async fn execute(&self, call: &ToolCall) -> ToolOutput;
}

/// Central registry holding all tools available to an agent.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool under its own name.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Schemas for all registered tools, sorted by name.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self
            .tools
            .values()
            .map(|t| ToolSchema {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Execute a call by name; unknown tools produce an error output.
    pub async fn execute(&self, call: &ToolCall) -> ToolOutput {
        match self.tools.get(&call.name) {
            Some(tool) => tool.execute(call).await,
            None => ToolOutput::err(&call.id, format!("unknown tool: {}", call.name)),
        }
    }

    /// Names of all registered tools.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// `true` when no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
