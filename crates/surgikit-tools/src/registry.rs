//! Tool registry and trait definitions
//!
//! Each tool is a self-contained module implementing the Tool trait and
//! declaring its parameters. The registry keeps registration order, renders
//! the declarations as JSON Schema for the model, and validates arguments
//! before anything is dispatched.

use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use surgikit_core::{Error, Result, ToolName, ToolOutcome};
use surgikit_llm::LlmTool;

#[derive(Clone, Debug)]
pub enum ToolResult {
    Text(String),
    /// The lookup ran and found nothing.
    NoMatch(String),
    Error(String),
}

impl ToolResult {
    pub fn text(s: impl Into<String>) -> Self { Self::Text(s.into()) }
    pub fn no_match(s: impl Into<String>) -> Self { Self::NoMatch(s.into()) }
    pub fn error(s: impl Into<String>) -> Self { Self::Error(s.into()) }

    pub fn to_content_string(&self) -> String {
        match self {
            Self::Text(s) | Self::NoMatch(s) => s.clone(),
            Self::Error(e) => format!("Error: {}", e),
        }
    }

    pub fn is_error(&self) -> bool { matches!(self, Self::Error(_)) }

    /// Convert into the outcome stored on the conversation's tool call.
    pub fn into_outcome(self) -> ToolOutcome {
        match self {
            Self::Text(s) => ToolOutcome::success(s),
            Self::NoMatch(s) => ToolOutcome::no_match(s),
            Self::Error(e) => ToolOutcome::failed(surgikit_core::FailureKind::Execution, e),
        }
    }
}

/// One named parameter of a tool. Every workflow tool takes text, so all
/// parameters are JSON strings.
#[derive(Clone, Debug)]
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

impl ParamSpec {
    pub fn required_string(name: &'static str, description: &'static str) -> Self {
        Self { name, description, required: true }
    }
}

/// The Tool trait - one of the workflow's fixed operations.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> ToolName;

    /// Hint sent to the model. Not used for validation.
    fn description(&self) -> &str;

    /// Declared parameters, in order.
    fn parameters(&self) -> Vec<ParamSpec>;

    /// Execute with arguments already validated against `parameters()`.
    async fn execute(&self, args: Value) -> ToolResult;

    /// JSON Schema for input parameters.
    fn input_schema(&self) -> Value {
        let params = self.parameters();
        let mut properties = Map::new();
        for p in &params {
            properties.insert(
                p.name.to_string(),
                json!({ "type": "string", "description": p.description }),
            );
        }
        let required: Vec<&str> = params.iter().filter(|p| p.required).map(|p| p.name).collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Convert to the LLM tool definition format.
    fn to_llm_tool(&self) -> LlmTool {
        LlmTool {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// (name, parameters, description) of a registered tool.
#[derive(Clone, Debug)]
pub struct ToolSchema {
    pub name: ToolName,
    pub parameters: Vec<ParamSpec>,
    pub description: String,
}

#[derive(Default)]
pub struct ToolRegistry {
    order: Vec<ToolName>,
    tools: HashMap<ToolName, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self { Self::default() }

    /// Register a tool. A name can only be registered once.
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<()> {
        let name = tool.name();
        if self.tools.contains_key(&name) {
            return Err(Error::DuplicateTool(name.to_string()));
        }
        self.order.push(name);
        self.tools.insert(name, Arc::new(tool));
        Ok(())
    }

    pub fn resolve(&self, name: ToolName) -> Result<Arc<dyn Tool>> {
        self.tools
            .get(&name)
            .cloned()
            .ok_or_else(|| Error::UnknownTool(name.to_string()))
    }

    /// Check `args` against the tool's declared parameters: an object, every
    /// required parameter present as a string, nothing undeclared.
    pub fn validate(&self, name: ToolName, args: &Value) -> Result<()> {
        let tool = self.resolve(name)?;
        let params = tool.parameters();
        let obj = args
            .as_object()
            .ok_or_else(|| {
                Error::invalid_arguments(name.as_str(), "arguments must be a JSON object")
            })?;

        for p in &params {
            match obj.get(p.name) {
                Some(Value::Null) | None if p.required => {
                    return Err(Error::invalid_arguments(
                        name.as_str(),
                        format!("missing required parameter: {}", p.name),
                    ));
                }
                Some(v) if !v.is_null() && !v.is_string() => {
                    return Err(Error::invalid_arguments(
                        name.as_str(),
                        format!("parameter {} must be a string", p.name),
                    ));
                }
                _ => {}
            }
        }
        if let Some(unknown) = obj.keys().find(|k| !params.iter().any(|p| p.name == k.as_str())) {
            return Err(Error::invalid_arguments(
                name.as_str(),
                format!("unknown parameter: {}", unknown),
            ));
        }
        Ok(())
    }

    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.order
            .iter()
            .filter_map(|n| self.tools.get(n))
            .map(|t| ToolSchema {
                name: t.name(),
                parameters: t.parameters(),
                description: t.description().to_string(),
            })
            .collect()
    }

    /// LLM tool definitions, in registration order.
    pub fn get_definitions(&self) -> Vec<LlmTool> {
        self.order
            .iter()
            .filter_map(|n| self.tools.get(n))
            .map(|t| t.to_llm_tool())
            .collect()
    }

    pub fn list(&self) -> Vec<&'static str> {
        self.order.iter().map(|n| n.as_str()).collect()
    }

    pub fn len(&self) -> usize { self.order.len() }
    pub fn is_empty(&self) -> bool { self.order.is_empty() }
}
