//! Provider-agnostic LLM requests for conduit
//!
//! Requests and responses use one canonical schema. Provider adapters map
//! that schema to and from each provider's wire format, and the tool-call
//! orchestrator resolves tool calls on both the complete and the streaming
//! response paths before the caller sees the final answer.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod convert;
pub mod error;
pub mod gateway;
pub mod protocol;
pub mod provider;
pub mod toolcall;
pub mod types;

pub use error::{LlmError, ToolError};
pub use gateway::Gateway;
pub use provider::{Credentials, Provider, ProviderCapabilities};
pub use toolcall::{ToolCallOrchestrator, ToolExecutor};
pub use types::{Message, Request, RequestInput, Response, ResponseStream};
