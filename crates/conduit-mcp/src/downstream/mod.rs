//! Sessions with the configured MCP servers

pub mod client;
pub mod manager;

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use serde_json::{Map, Value};

use crate::error::McpError;

/// Somewhere a tool on a named server can be called
#[async_trait]
pub trait ToolBackend: Send + Sync {
    async fn call_tool(
        &self,
        server: &str,
        tool: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<CallToolResult, McpError>;
}
