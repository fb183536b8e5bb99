use std::sync::Arc;

use async_trait::async_trait;
use conduit_config::McpConfig;
use conduit_core::RequestContext;
use conduit_llm::types::{Message, ToolCall, ToolDefinition};
use conduit_llm::{ToolError, ToolExecutor};
use rmcp::model::{CallToolResult, RawContent};
use serde_json::{Map, Value};

use crate::access::AccessController;
use crate::downstream::ToolBackend;
use crate::downstream::manager::DownstreamManager;
use crate::error::McpError;
use crate::parse_qualified_name;

/// Executes model tool calls on MCP servers
///
/// Tool names follow the `server__tool` convention; the server part picks
/// the session and the tool part is what that server sees.
pub struct McpExecutor {
    backend: Arc<dyn ToolBackend>,
    access: AccessController,
    tools: Vec<ToolDefinition>,
}

impl McpExecutor {
    /// Connect to every configured server and collect the tools it may call
    pub async fn connect(config: &McpConfig) -> Self {
        let access = AccessController::new(&config.servers);
        let manager = DownstreamManager::connect(config).await;

        let tools = manager
            .tools()
            .iter()
            .filter(|tool| access.is_allowed(&tool.server_name, &tool.original_name))
            .map(|tool| {
                ToolDefinition::function(&tool.qualified_name, &tool.description, tool.input_schema.clone())
            })
            .collect();

        Self {
            backend: Arc::new(manager),
            access,
            tools,
        }
    }

    /// Build over an arbitrary backend
    pub fn new(backend: Arc<dyn ToolBackend>, access: AccessController, tools: Vec<ToolDefinition>) -> Self {
        Self { backend, access, tools }
    }

    /// Definitions of every callable tool, ready to attach to a request
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    async fn call(&self, call: &ToolCall) -> Result<String, McpError> {
        let (server, tool) = parse_qualified_name(&call.function.name).ok_or_else(|| McpError::ToolNotFound {
            tool: call.function.name.clone(),
        })?;

        self.access.check(server, tool)?;

        let arguments = parse_arguments(&call.function.arguments)?;
        let result = self.backend.call_tool(server, tool, arguments).await?;

        let text = result_text(&result);
        if result.is_error.unwrap_or(false) {
            return Err(McpError::Execution(text));
        }

        Ok(text)
    }
}

#[async_trait]
impl ToolExecutor for McpExecutor {
    async fn execute(&self, context: &RequestContext, call: &ToolCall) -> Result<Message, ToolError> {
        tracing::debug!(correlation_id = %context.correlation_id, tool = %call.function.name, "calling MCP tool");

        let text = self.call(call).await.map_err(ToolError::execution)?;
        Ok(Message::tool(call.id.clone(), text))
    }
}

/// Arguments arrive as a JSON string; MCP wants an object
fn parse_arguments(arguments: &str) -> Result<Option<Map<String, Value>>, McpError> {
    if arguments.trim().is_empty() {
        return Ok(None);
    }

    match serde_json::from_str(arguments) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(Value::Null) => Ok(None),
        Ok(other) => Err(McpError::InvalidArguments(format!("expected a JSON object, got {other}"))),
        Err(e) => Err(McpError::InvalidArguments(e.to_string())),
    }
}

/// Text parts of a tool result, one per line
fn result_text(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|content| match &content.raw {
            RawContent::Text(text) => Some(text.text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
