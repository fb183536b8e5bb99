use std::borrow::Cow;
use std::sync::Arc;

use conduit_config::{HttpConfig, McpServerType, StdioConfig};
use rmcp::model::{CallToolRequestParam, CallToolResult, Tool};
use rmcp::service::{RoleClient, RunningService, ServiceExt as _};
use rmcp::transport::TokioChildProcess;
use secrecy::ExposeSecret;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::error::McpError;

type Service = RunningService<RoleClient, ()>;

/// Live session with one MCP server
pub struct McpClient {
    service: Mutex<Service>,
    server_name: String,
    server_type: McpServerType,
}

impl McpClient {
    /// Connect and complete the MCP handshake
    pub async fn connect(name: &str, server_type: &McpServerType) -> Result<Self, McpError> {
        let service = open(server_type).await?;

        tracing::info!(server = name, "connected to MCP server");

        Ok(Self {
            service: Mutex::new(service),
            server_name: name.to_owned(),
            server_type: server_type.clone(),
        })
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Every tool the server advertises
    pub async fn list_tools(&self) -> Result<Vec<Tool>, McpError> {
        self.service
            .lock()
            .await
            .list_all_tools()
            .await
            .map_err(|e| McpError::Transport(format!("list_tools failed on {}: {e}", self.server_name)))
    }

    /// Call a tool, reconnecting once if the session is broken
    pub async fn call_tool(&self, tool: &str, arguments: Option<Map<String, Value>>) -> Result<CallToolResult, McpError> {
        let request = |arguments| CallToolRequestParam {
            name: Cow::Owned(tool.to_owned()),
            arguments,
        };

        let mut service = self.service.lock().await;

        match service.call_tool(request(arguments.clone())).await {
            Ok(result) => return Ok(result),
            Err(e) => {
                tracing::warn!(server = %self.server_name, tool, error = %e, "MCP call failed, reconnecting");
            }
        }

        *service = open(&self.server_type).await?;

        service
            .call_tool(request(arguments))
            .await
            .map_err(|e| McpError::Transport(format!("tool '{tool}' failed on {} after reconnect: {e}", self.server_name)))
    }

    /// Close the session
    pub async fn shutdown(self) -> Result<(), McpError> {
        self.service
            .into_inner()
            .cancel()
            .await
            .map_err(|e| McpError::Transport(format!("shutdown failed: {e}")))?;
        Ok(())
    }
}

async fn open(server_type: &McpServerType) -> Result<Service, McpError> {
    match server_type {
        McpServerType::Stdio(config) => open_stdio(config).await,
        McpServerType::Sse(config) => open_sse(config).await,
        McpServerType::StreamableHttp(config) => open_streamable_http(config).await,
    }
}

async fn open_stdio(config: &StdioConfig) -> Result<Service, McpError> {
    let mut command = tokio::process::Command::new(&config.command);
    command.args(&config.args).envs(&config.env);

    let transport =
        TokioChildProcess::new(command).map_err(|e| McpError::Transport(format!("failed to spawn process: {e}")))?;

    ().serve(transport)
        .await
        .map_err(|e| McpError::Transport(format!("STDIO handshake failed: {e}")))
}

async fn open_sse(config: &HttpConfig) -> Result<Service, McpError> {
    use rmcp::transport::SseClientTransport;
    use rmcp::transport::sse_client::SseClientConfig;

    let sse_config = SseClientConfig {
        sse_endpoint: Arc::from(config.url.as_str()),
        ..Default::default()
    };

    let transport = SseClientTransport::start_with_client(http_client(config)?, sse_config)
        .await
        .map_err(|e| McpError::Transport(format!("SSE connection failed: {e}")))?;

    ().serve(transport)
        .await
        .map_err(|e| McpError::Transport(format!("SSE handshake failed: {e}")))
}

async fn open_streamable_http(config: &HttpConfig) -> Result<Service, McpError> {
    use rmcp::transport::StreamableHttpClientTransport;
    use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;

    let mut transport_config = StreamableHttpClientTransportConfig::with_uri(config.url.as_str());
    if let Some(token) = &config.token {
        transport_config = transport_config.auth_header(format!("Bearer {}", token.expose_secret()));
    }

    let transport = StreamableHttpClientTransport::with_client(reqwest::Client::new(), transport_config);

    ().serve(transport)
        .await
        .map_err(|e| McpError::Transport(format!("StreamableHTTP handshake failed: {e}")))
}

/// HTTP client carrying the configured bearer token on every request
fn http_client(config: &HttpConfig) -> Result<reqwest::Client, McpError> {
    use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

    let mut headers = HeaderMap::new();
    if let Some(token) = &config.token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| McpError::Transport(format!("invalid auth token: {e}")))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| McpError::Transport(format!("failed to build HTTP client: {e}")))
}
