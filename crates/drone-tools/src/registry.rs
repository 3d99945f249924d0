use crate::{Error, Result, ToolOutcome};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Arguments handed to a tool, exactly as the planner produced them.
pub type ToolArgs = Map<String, Value>;

/// JSON type a tool parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParamType {
    fn json_name(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
        }
    }
}

/// Declared parameter of a tool, used for schema generation and for
/// validating planner arguments before execution.
#[derive(Debug, Clone)]
pub struct ToolParameter {
    pub name: &'static str,
    pub param_type: ParamType,
    pub description: &'static str,
    pub required: bool,
}

impl ToolParameter {
    pub fn required(name: &'static str, param_type: ParamType, description: &'static str) -> Self {
        Self {
            name,
            param_type,
            description,
            required: true,
        }
    }

    pub fn optional(name: &'static str, param_type: ParamType, description: &'static str) -> Self {
        Self {
            name,
            param_type,
            description,
            required: false,
        }
    }
}

/// One capability the planner may invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn parameters(&self) -> Vec<ToolParameter> {
        Vec::new()
    }
    async fn execute(&self, args: &ToolArgs) -> ToolOutcome;
}

/// OpenAI function-calling schema for one tool.
fn openai_schema(tool: &dyn Tool) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for param in tool.parameters() {
        properties.insert(
            param.name.to_string(),
            json!({
                "type": param.param_type.json_name(),
                "description": param.description,
            }),
        );
        if param.required {
            required.push(Value::String(param.name.to_string()));
        }
    }
    json!({
        "type": "function",
        "function": {
            "name": tool.name(),
            "description": tool.description(),
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required,
            },
        },
    })
}

/// Name-ordered collection of the tools available to the planner.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(Error::DuplicateTool(name));
        }
        debug!(tool = %name, "registered tool");
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Function-calling schemas for every registered tool.
    pub fn schemas(&self) -> Vec<Value> {
        self.tools.values().map(|t| openai_schema(t.as_ref())).collect()
    }

    /// Validate arguments against the tool's declared parameters and run it.
    ///
    /// Argument problems come back as failed outcomes so the caller can keep
    /// processing the rest of the plan; only an unknown tool name is an error.
    pub async fn execute(&self, name: &str, args: &ToolArgs) -> Result<ToolOutcome> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| Error::UnknownTool(name.to_string()))?;

        for param in tool.parameters() {
            match args.get(param.name) {
                None if param.required => {
                    return Ok(ToolOutcome::fail(format!(
                        "missing required argument '{}'",
                        param.name
                    )));
                }
                Some(value) if !param.param_type.accepts(value) => {
                    return Ok(ToolOutcome::fail(format!(
                        "argument '{}' must be a {}",
                        param.name,
                        param.param_type.json_name()
                    )));
                }
                _ => {}
            }
        }

        Ok(tool.execute(args).await)
    }
}
