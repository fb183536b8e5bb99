use std::pin::Pin;

use futures_util::Stream;
use serde::{Deserialize, Serialize};

use super::message::Role;
use super::response::Response;
use crate::error::LlmError;

/// Live sequence of partial responses
///
/// Every `Ok` element carries [`Choices::Delta`](super::Choices::Delta)
/// choices. An `Err` element is terminal for the dispatcher that produced it.
pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<Response, LlmError>> + Send>>;

/// Incremental message fragment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    /// Role, usually only on the first fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Incremental text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Incremental tool call data
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<StreamToolCall>,
}

impl Delta {
    /// Text-only fragment
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }
}

/// Partial tool call data within a stream delta
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamToolCall {
    /// Index of this tool call within the assistant turn
    pub index: u32,
    /// Tool call id (present on the first fragment of a call)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Partial function call data
    #[serde(default)]
    pub function: StreamFunctionCall,
}

impl StreamToolCall {
    /// Fragment carrying a whole call at once
    pub fn complete(index: u32, id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            index,
            id: Some(id.into()),
            function: StreamFunctionCall {
                name: Some(name.into()),
                arguments: Some(arguments.into()),
            },
        }
    }
}

/// Partial function call data within a streaming tool call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFunctionCall {
    /// Function name (present on the first fragment of a call)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Incremental arguments JSON fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}
