use conduit_core::HttpError;
use http::StatusCode;
use thiserror::Error;

/// Errors raised while resolving a tool call against MCP servers
#[derive(Debug, Error)]
pub enum McpError {
    /// Qualified name points at a server that is not connected
    #[error("server not found: {server}")]
    ServerNotFound { server: String },

    /// Name is not of the form `server__tool`
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// Access rules forbid the tool
    #[error("access denied to tool: {tool}")]
    AccessDenied { tool: String },

    /// Tool arguments are not a JSON object
    #[error("invalid tool arguments: {0}")]
    InvalidArguments(String),

    /// Connection or protocol failure talking to the server
    #[error("transport error: {0}")]
    Transport(String),

    /// The server ran the tool and reported a failure
    #[error("tool execution failed: {0}")]
    Execution(String),
}

impl HttpError for McpError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ServerNotFound { .. } | Self::ToolNotFound { .. } => StatusCode::NOT_FOUND,
            Self::AccessDenied { .. } => StatusCode::FORBIDDEN,
            Self::InvalidArguments(_) => StatusCode::BAD_REQUEST,
            Self::Transport(_) => StatusCode::BAD_GATEWAY,
            Self::Execution(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::ServerNotFound { .. } | Self::ToolNotFound { .. } => "not_found",
            Self::AccessDenied { .. } => "access_denied",
            Self::InvalidArguments(_) => "invalid_request_error",
            Self::Transport(_) => "transport_error",
            Self::Execution(_) => "execution_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Transport(_) => "failed to communicate with MCP server".to_owned(),
            other => other.to_string(),
        }
    }
}
