use serde::{Deserialize, Serialize};

use super::message::Message;
use super::tool::{ToolChoice, ToolDefinition};
use crate::error::LlmError;

/// Sampling controls shared by every provider
///
/// Anything a provider understands beyond these fields goes into `extra`.
/// Adapters copy only the fields their provider recognises into native
/// wire fields and keep the rest reachable through `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// Sampling temperature (0.0 to 2.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Top-k sampling cutoff
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Stop sequences
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    /// Frequency penalty (-2.0 to 2.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    /// Presence penalty (-2.0 to 2.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    /// Random seed for deterministic generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Token id to bias mapping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<serde_json::Map<String, serde_json::Value>>,
    /// End-user identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Provider-specific fields
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Provider-agnostic request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Configured provider name
    pub provider: String,
    /// Model identifier, passed to the provider as-is
    pub model: String,
    /// The payload, exactly one kind per request
    pub input: RequestInput,
    /// Sampling controls
    #[serde(default)]
    pub params: Params,
    /// Tool definitions available to the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    /// How the model should select tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

impl Request {
    /// Chat request over the given conversation
    pub fn chat(provider: impl Into<String>, model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self::new(provider, model, RequestInput::Chat(messages))
    }

    /// Request with default params and no tools
    pub fn new(provider: impl Into<String>, model: impl Into<String>, input: RequestInput) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            input,
            params: Params::default(),
            tools: None,
            tool_choice: None,
        }
    }

    /// Conversation of a chat request
    pub fn messages(&self) -> Option<&[Message]> {
        match &self.input {
            RequestInput::Chat(messages) => Some(messages),
            _ => None,
        }
    }

    /// Check that the input is populated and every message is consistent
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.model.is_empty() {
            return Err(LlmError::InvalidRequest("model must not be empty".to_owned()));
        }

        match &self.input {
            RequestInput::Chat(messages) => {
                if messages.is_empty() {
                    return Err(LlmError::InvalidRequest("chat input has no messages".to_owned()));
                }
                messages.iter().try_for_each(Message::validate)
            }
            RequestInput::Embedding(input) if input.is_empty() => {
                Err(LlmError::InvalidRequest("embedding input is empty".to_owned()))
            }
            RequestInput::Transcription(input) if input.file.is_empty() => {
                Err(LlmError::InvalidRequest("transcription audio is empty".to_owned()))
            }
            _ => Ok(()),
        }
    }
}

/// Request payload
///
/// An empty text prompt is still a text-completion input; the variant
/// alone says which kind of request this is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RequestInput {
    /// Ordered conversation
    Chat(Vec<Message>),
    /// Single prompt for legacy text completion
    TextCompletion(String),
    /// Text or token input to embed
    Embedding(EmbeddingInput),
    /// Audio to transcribe
    Transcription(TranscriptionInput),
}

impl RequestInput {
    /// Operation name used in logs and unsupported-operation errors
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Chat(_) => "chat",
            Self::TextCompletion(_) => "text_completion",
            Self::Embedding(_) => "embedding",
            Self::Transcription(_) => "transcription",
        }
    }
}

/// Embedding input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingInput {
    /// One string
    Text(String),
    /// Several strings, one vector each
    Texts(Vec<String>),
    /// One pre-tokenised input
    Tokens(Vec<i64>),
    /// Several pre-tokenised inputs
    TokenBatches(Vec<Vec<i64>>),
}

impl EmbeddingInput {
    /// Whether there is nothing to embed
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Texts(texts) => texts.is_empty(),
            Self::Tokens(tokens) => tokens.is_empty(),
            Self::TokenBatches(batches) => batches.is_empty(),
        }
    }
}

/// Audio transcription input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionInput {
    /// Raw audio bytes
    #[serde(with = "super::base64_bytes")]
    pub file: Vec<u8>,
    /// ISO-639-1 language of the audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Text to guide the model's style
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Output format (json, text, srt, verbose_json, vtt)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<String>,
}
