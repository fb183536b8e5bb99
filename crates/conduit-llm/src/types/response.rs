use conduit_core::ErrorBody;
use serde::{Deserialize, Serialize};

use super::message::Message;
use super::stream::Delta;

/// Reason the model stopped generating
///
/// Reasons this crate does not know are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FinishReason {
    /// Natural end of generation
    Stop,
    /// Hit the `max_tokens` limit
    Length,
    /// Model decided to call a tool
    ToolCalls,
    /// Content was filtered by safety systems
    ContentFilter,
    /// Provider-specific reason
    Other(String),
}

impl From<String> for FinishReason {
    fn from(reason: String) -> Self {
        match reason.as_str() {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "tool_calls" | "function_call" => Self::ToolCalls,
            "content_filter" => Self::ContentFilter,
            _ => Self::Other(reason),
        }
    }
}

impl From<FinishReason> for String {
    fn from(reason: FinishReason) -> Self {
        match reason {
            FinishReason::Stop => "stop".to_owned(),
            FinishReason::Length => "length".to_owned(),
            FinishReason::ToolCalls => "tool_calls".to_owned(),
            FinishReason::ContentFilter => "content_filter".to_owned(),
            FinishReason::Other(reason) => reason,
        }
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt
    pub prompt_tokens: u32,
    /// Tokens generated in the completion
    #[serde(default)]
    pub completion_tokens: u32,
    /// Total tokens (prompt + completion)
    pub total_tokens: u32,
}

/// A finished candidate answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Index of this choice
    pub index: u32,
    /// Generated message
    pub message: Message,
    /// Why generation stopped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    /// Log probabilities as reported by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_probs: Option<serde_json::Value>,
    /// Stop sequence that ended generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_string: Option<String>,
}

/// An incremental fragment of a candidate answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamChoice {
    /// Index of the choice this fragment extends
    pub index: u32,
    /// The fragment itself
    pub delta: Delta,
    /// Why generation stopped (present on the final fragment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

/// The choices of one response
///
/// Complete and streaming choices never share a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choices {
    /// Choices of a finished response
    Complete(Vec<Choice>),
    /// Fragments carried by one stream element
    Delta(Vec<StreamChoice>),
}

impl Default for Choices {
    fn default() -> Self {
        Self::Complete(Vec::new())
    }
}

impl Choices {
    /// Number of choices
    pub fn len(&self) -> usize {
        match self {
            Self::Complete(choices) => choices.len(),
            Self::Delta(choices) => choices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Message of the first complete choice
    pub fn first_message(&self) -> Option<&Message> {
        match self {
            Self::Complete(choices) => choices.first().map(|choice| &choice.message),
            Self::Delta(_) => None,
        }
    }

    /// Delta of the first streaming choice
    pub fn first_delta(&self) -> Option<&Delta> {
        match self {
            Self::Delta(choices) => choices.first().map(|choice| &choice.delta),
            Self::Complete(_) => None,
        }
    }
}

/// One embedding vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    /// Position of the input this vector belongs to
    pub index: u32,
    /// The vector
    pub embedding: Vec<f32>,
}

/// Transcribed audio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    /// Transcribed text
    pub text: String,
    /// Detected language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Audio duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Provider-agnostic response, or one element of a response stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Upstream response identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Model that produced the response
    pub model: String,
    /// Provider that served the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Unix timestamp of creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<u64>,
    /// Backend configuration fingerprint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
    /// Generated choices
    #[serde(default)]
    pub choices: Choices,
    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Embedding vectors, for embedding requests
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeddings: Vec<Embedding>,
    /// Transcript, for transcription requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<Transcription>,
    /// In-band error reported by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    /// Tool calls on the first complete choice
    pub fn tool_calls(&self) -> &[super::message::ToolCall] {
        self.choices.first_message().map(Message::tool_calls).unwrap_or_default()
    }
}
