use std::time::Duration;

use conduit_core::HttpError;
use http::StatusCode;
use thiserror::Error;

/// Errors that can occur during LLM operations
#[derive(Debug, Error)]
pub enum LlmError {
    /// Named provider does not exist in configuration
    #[error("provider not found: {provider}")]
    ProviderNotFound { provider: String },

    /// Upstream provider returned an error
    #[error("upstream error{}: {message}", .status_code.map(|code| format!(" ({code})")).unwrap_or_default())]
    Upstream {
        /// Status the provider answered with, if the failure was an HTTP response
        status_code: Option<u16>,
        message: String,
    },

    /// Error during streaming response
    #[error("streaming error: {0}")]
    Streaming(String),

    /// Client sent a malformed or invalid request
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Provider has no endpoint for this kind of request
    #[error("{provider} does not support {operation}")]
    Unsupported { provider: String, operation: &'static str },

    /// Caller cancelled the request
    #[error("request cancelled")]
    Cancelled,

    /// Operation exceeded its configured deadline
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl LlmError {
    /// Upstream failure without an HTTP status
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            status_code: None,
            message: message.into(),
        }
    }
}

impl HttpError for LlmError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ProviderNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Upstream { status_code, .. } => status_code
                .and_then(|code| StatusCode::from_u16(code).ok())
                .filter(|code| code.is_client_error() || code.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            Self::Streaming(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRequest(_) | Self::Unsupported { .. } => StatusCode::BAD_REQUEST,
            // Client closed request, as popularised by nginx
            Self::Cancelled => StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST),
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::ProviderNotFound { .. } => "not_found_error",
            Self::Upstream { .. } => "upstream_error",
            Self::Streaming(_) => "streaming_error",
            Self::InvalidRequest(_) | Self::Unsupported { .. } => "invalid_request_error",
            Self::Cancelled => "cancelled",
            Self::Timeout(_) => "timeout_error",
            Self::Internal(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "an internal error occurred".to_owned(),
            other => other.to_string(),
        }
    }
}

/// Failure of a single tool call
///
/// Never escapes orchestration: it becomes the body of a synthetic tool
/// message so the rest of the batch proceeds.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The executor ran the call and it failed
    #[error("{0}")]
    Execution(String),

    /// Caller cancelled the request while the tool was running
    #[error("tool call cancelled")]
    Cancelled,

    /// Tool exceeded the configured per-call deadline
    #[error("tool call timed out after {0:?}")]
    Timeout(Duration),
}

impl ToolError {
    /// Execution failure from any displayable error
    pub fn execution(error: impl std::fmt::Display) -> Self {
        Self::Execution(error.to_string())
    }
}
