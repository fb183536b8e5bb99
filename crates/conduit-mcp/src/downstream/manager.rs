use std::collections::HashMap;

use async_trait::async_trait;
use conduit_config::McpConfig;
use rmcp::model::CallToolResult;
use serde_json::{Map, Value};

use super::ToolBackend;
use super::client::McpClient;
use crate::error::McpError;
use crate::qualified_name;

/// A downstream tool under its gateway-wide name
#[derive(Debug, Clone)]
pub struct AggregatedTool {
    /// `server__tool`
    pub qualified_name: String,
    pub original_name: String,
    pub server_name: String,
    pub description: String,
    /// JSON schema of the tool input
    pub input_schema: Value,
}

/// Connections to every reachable MCP server and their tools
pub struct DownstreamManager {
    clients: HashMap<String, McpClient>,
    tools: Vec<AggregatedTool>,
}

impl DownstreamManager {
    /// Connect to all configured servers
    ///
    /// Servers that fail to connect are logged and skipped.
    pub async fn connect(config: &McpConfig) -> Self {
        let mut clients = HashMap::new();

        for (name, server_config) in &config.servers {
            match McpClient::connect(name, &server_config.server_type).await {
                Ok(client) => {
                    clients.insert(name.clone(), client);
                }
                Err(e) => {
                    tracing::warn!(server = %name, error = %e, "failed to connect to MCP server, skipping");
                }
            }
        }

        let mut manager = Self {
            clients,
            tools: Vec::new(),
        };
        manager.refresh_tools().await;
        manager
    }

    /// Re-read the tool list of every connected server
    pub async fn refresh_tools(&mut self) {
        let mut tools = Vec::new();

        for (server_name, client) in &self.clients {
            let server_tools = match client.list_tools().await {
                Ok(server_tools) => server_tools,
                Err(e) => {
                    tracing::warn!(server = %server_name, error = %e, "failed to list tools from MCP server");
                    continue;
                }
            };

            tools.extend(server_tools.into_iter().map(|tool| AggregatedTool {
                qualified_name: qualified_name(server_name, &tool.name),
                original_name: tool.name.to_string(),
                server_name: server_name.clone(),
                description: tool.description.as_deref().unwrap_or_default().to_owned(),
                input_schema: Value::Object((*tool.input_schema).clone()),
            }));
        }

        tracing::info!(servers = self.clients.len(), tools = tools.len(), "aggregated MCP tools");
        self.tools = tools;
    }

    pub fn tools(&self) -> &[AggregatedTool] {
        &self.tools
    }

    pub fn server_count(&self) -> usize {
        self.clients.len()
    }

    /// Close every session
    pub async fn shutdown(self) {
        for (name, client) in self.clients {
            if let Err(e) = client.shutdown().await {
                tracing::warn!(server = %name, error = %e, "failed to close MCP session");
            }
        }
    }
}

#[async_trait]
impl ToolBackend for DownstreamManager {
    async fn call_tool(
        &self,
        server: &str,
        tool: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<CallToolResult, McpError> {
        let client = self.clients.get(server).ok_or_else(|| McpError::ServerNotFound {
            server: server.to_owned(),
        })?;

        client.call_tool(tool, arguments).await
    }
}
