//! `OpenAI` API wire format types
//!
//! Covers chat completions (including stream chunks), legacy text
//! completions, embeddings and audio transcriptions.

use serde::{Deserialize, Serialize};

type ExtraFields = serde_json::Map<String, serde_json::Value>;

// -- Shared request fields --

/// Sampling fields `OpenAI` accepts on chat and text completions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OpenAiSampling {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<ExtraFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// `OpenAI` stream options
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenAiStreamOptions {
    /// Include usage statistics in the final chunk
    pub include_usage: bool,
}

// -- Chat completions --

/// `POST /chat/completions` body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAiChatRequest {
    pub model: String,
    pub messages: Vec<OpenAiMessage>,
    #[serde(flatten)]
    pub sampling: OpenAiSampling,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<OpenAiTool>>,
    /// `"none" | "auto" | "required" | {"type":"function",...}`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<OpenAiStreamOptions>,
    /// Fields conduit has no native slot for, sent as-is
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Message within a chat request or response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiMessage {
    pub role: String,
    /// Absent when an assistant turn only calls tools
    #[serde(default)]
    pub content: Option<OpenAiContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// String or array of content parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpenAiContent {
    Text(String),
    Parts(Vec<OpenAiContentPart>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpenAiContentPart {
    Text { text: String },
    ImageUrl { image_url: OpenAiImageUrl },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAiImageUrl {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Tool definition (`type` is always `function`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAiTool {
    #[serde(rename = "type")]
    pub tool_type: &'static str,
    pub function: OpenAiFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAiFunction {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

/// Complete tool call within a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAiToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub tool_type: String,
    pub function: OpenAiFunctionCall,
}

fn function_type() -> String {
    "function".to_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAiFunctionCall {
    pub name: String,
    /// JSON-encoded arguments
    #[serde(default)]
    pub arguments: String,
}

/// `POST /chat/completions` response body
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiChatResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created: Option<u64>,
    #[serde(default)]
    pub system_fingerprint: Option<String>,
    #[serde(default)]
    pub choices: Vec<OpenAiChatChoice>,
    #[serde(default)]
    pub usage: Option<OpenAiUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiChatChoice {
    pub index: u32,
    pub message: OpenAiMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub logprobs: Option<serde_json::Value>,
}

/// Token usage; embeddings report no completion tokens
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OpenAiUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

// -- Chat streaming --

/// One `data:` payload of a chat completion stream
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiStreamChunk {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created: Option<u64>,
    #[serde(default)]
    pub system_fingerprint: Option<String>,
    #[serde(default)]
    pub choices: Vec<OpenAiStreamChoice>,
    /// Present on the final chunk when `include_usage` is set
    #[serde(default)]
    pub usage: Option<OpenAiUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiStreamChoice {
    pub index: u32,
    #[serde(default)]
    pub delta: OpenAiStreamDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAiStreamDelta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<OpenAiStreamToolCall>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiStreamToolCall {
    pub index: u32,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<OpenAiStreamFunctionCall>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiStreamFunctionCall {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

// -- Legacy text completions --

/// `POST /completions` body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAiTextRequest {
    pub model: String,
    pub prompt: String,
    #[serde(flatten)]
    pub sampling: OpenAiSampling,
    /// Number of most likely tokens to return log probabilities for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub echo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_of: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// `POST /completions` response body
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiTextResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created: Option<u64>,
    #[serde(default)]
    pub system_fingerprint: Option<String>,
    #[serde(default)]
    pub choices: Vec<OpenAiTextChoice>,
    #[serde(default)]
    pub usage: Option<OpenAiUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiTextChoice {
    pub index: u32,
    pub text: String,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub logprobs: Option<serde_json::Value>,
}

// -- Embeddings --

/// `POST /embeddings` body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAiEmbeddingRequest {
    pub model: String,
    /// String, array of strings, token array, or array of token arrays
    pub input: serde_json::Value,
    /// `float` or `base64`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// `POST /embeddings` response body
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiEmbeddingResponse {
    #[serde(default)]
    pub data: Vec<OpenAiEmbedding>,
    #[serde(default)]
    pub usage: Option<OpenAiUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiEmbedding {
    pub index: u32,
    pub embedding: OpenAiEmbeddingVector,
}

/// Float array, or little-endian `f32`s in base64 when `encoding_format = "base64"`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OpenAiEmbeddingVector {
    Float(Vec<f32>),
    Base64(String),
}

// -- Transcriptions --

/// `POST /audio/transcriptions` multipart form
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiTranscriptionRequest {
    pub model: String,
    pub file: Vec<u8>,
    pub language: Option<String>,
    pub prompt: Option<String>,
    pub response_format: Option<String>,
    pub temperature: Option<f64>,
    pub include: Vec<String>,
    pub timestamp_granularities: Vec<String>,
    /// Sent as additional text form fields
    pub extra: ExtraFields,
}

impl OpenAiTranscriptionRequest {
    /// Whether the response body is JSON rather than plain text/subtitles
    pub fn expects_json(&self) -> bool {
        matches!(self.response_format.as_deref(), None | Some("json" | "verbose_json"))
    }
}

/// `POST /audio/transcriptions` response body (json and verbose_json)
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiTranscriptionResponse {
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

// -- Errors --

/// Error response body
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiErrorResponse {
    pub error: OpenAiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiErrorDetail {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

// -- Endpoint unions --

/// Any request body the `OpenAI` API accepts
#[derive(Debug, Clone, PartialEq)]
pub enum OpenAiWireRequest {
    Chat(OpenAiChatRequest),
    Text(OpenAiTextRequest),
    Embedding(OpenAiEmbeddingRequest),
    Transcription(OpenAiTranscriptionRequest),
}

impl OpenAiWireRequest {
    /// Endpoint path relative to the API base URL
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Chat(_) => "chat/completions",
            Self::Text(_) => "completions",
            Self::Embedding(_) => "embeddings",
            Self::Transcription(_) => "audio/transcriptions",
        }
    }
}

/// Any response body the `OpenAI` API produces
#[derive(Debug, Clone)]
pub enum OpenAiWireResponse {
    Chat(OpenAiChatResponse),
    Text(OpenAiTextResponse),
    Embedding(OpenAiEmbeddingResponse),
    Transcription(OpenAiTranscriptionResponse),
    Chunk(OpenAiStreamChunk),
}
