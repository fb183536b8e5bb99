use std::collections::HashMap;

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// MCP servers whose tools back model tool calls
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct McpConfig {
    /// MCP server configurations keyed by name
    #[serde(default)]
    pub servers: IndexMap<String, McpServerConfig>,
}

impl McpConfig {
    /// Whether any server is configured at all
    pub fn is_enabled(&self) -> bool {
        !self.servers.is_empty()
    }
}

/// Configuration for a single MCP server
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct McpServerConfig {
    /// Server transport type
    #[serde(rename = "type")]
    pub server_type: McpServerType,
    /// Access control for this server
    #[serde(default)]
    pub access: Option<McpAccessConfig>,
}

/// MCP server transport types
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum McpServerType {
    /// STDIO subprocess
    Stdio(StdioConfig),
    /// HTTP with SSE
    Sse(HttpConfig),
    /// HTTP with streamable protocol
    StreamableHttp(HttpConfig),
}

/// STDIO transport configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StdioConfig {
    /// Command to execute
    pub command: String,
    /// Command arguments
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Server URL
    pub url: Url,
    /// Static bearer token sent with every request
    #[serde(default)]
    pub token: Option<SecretString>,
}

/// Access control for the tools of one server
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct McpAccessConfig {
    /// Allowed tool names (if set, only these tools are accessible)
    #[serde(default)]
    pub allow: Vec<String>,
    /// Denied tool names (if set, these tools are blocked)
    #[serde(default)]
    pub deny: Vec<String>,
}
