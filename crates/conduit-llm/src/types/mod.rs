//! Canonical, provider-agnostic request and response types
//!
//! Every wire format converts to and from these. Payload kinds, content,
//! and choices are sum types, so the populated variant is always explicit.

mod base64_bytes;
pub mod message;
pub mod request;
pub mod response;
pub mod stream;
pub mod tool;

pub use message::{AssistantExtra, Content, ContentBlock, FunctionCall, Message, Role, ToolCall, ToolExtra};
pub use request::{EmbeddingInput, Params, Request, RequestInput, TranscriptionInput};
pub use response::{Choice, Choices, Embedding, FinishReason, Response, StreamChoice, Transcription, Usage};
pub use stream::{Delta, ResponseStream, StreamFunctionCall, StreamToolCall};
pub use tool::{ToolChoice, ToolDefinition};
