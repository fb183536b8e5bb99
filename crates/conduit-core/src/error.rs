use http::StatusCode;
use serde::{Deserialize, Serialize};

/// Trait for domain errors that carry a status and a client-safe message
///
/// Implemented by each feature crate's error type. Keeps the canonical
/// error body independent of whichever crate produced the failure.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Machine-readable error type (e.g. `invalid_request_error`)
    fn error_type(&self) -> &str;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;
}

/// Provider-agnostic error payload
///
/// Terminal signal for a whole request, and the shape a stream error
/// element takes when rendered for a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Upstream or synthesized status code, when one applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Machine-readable error type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Human-readable description
    pub message: String,
}

impl ErrorBody {
    /// Build a body carrying only a message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            error_type: None,
            message: message.into(),
        }
    }

    /// Build a body from any domain error
    pub fn from_error<E: HttpError + ?Sized>(error: &E) -> Self {
        Self {
            status_code: Some(error.status_code().as_u16()),
            error_type: Some(error.error_type().to_owned()),
            message: error.client_message(),
        }
    }
}
