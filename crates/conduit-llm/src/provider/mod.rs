//! Provider trait and implementations for LLM backends

pub mod openai;

use async_trait::async_trait;
use conduit_core::RequestContext;
use secrecy::SecretString;

use crate::error::LlmError;
use crate::types::{Request, RequestInput, Response, ResponseStream};

/// Capabilities advertised by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ProviderCapabilities {
    /// Whether chat requests can be streamed
    pub streaming: bool,
    /// Whether the model can request tool calls
    pub tool_calling: bool,
    /// Legacy text completion endpoint
    pub text_completion: bool,
    /// Embedding endpoint
    pub embeddings: bool,
    /// Audio transcription endpoint
    pub transcription: bool,
}

impl ProviderCapabilities {
    /// Whether the provider has an endpoint for this kind of input
    pub const fn supports(&self, input: &RequestInput) -> bool {
        match input {
            RequestInput::Chat(_) => true,
            RequestInput::TextCompletion(_) => self.text_completion,
            RequestInput::Embedding(_) => self.embeddings,
            RequestInput::Transcription(_) => self.transcription,
        }
    }
}

/// Caller-supplied credentials for one dispatch
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Key that overrides the provider's configured key when forwarding is enabled
    pub api_key: Option<SecretString>,
}

impl Credentials {
    /// Credentials carried by a request context
    pub fn from_context(context: &RequestContext) -> Self {
        Self {
            api_key: context.api_key.clone(),
        }
    }
}

/// Performs one upstream request for a canonical request
///
/// Implementations never retry. Cancellation and deadlines are imposed by
/// the caller around these futures.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Configured provider name
    fn name(&self) -> &str;

    /// Advertised capabilities
    fn capabilities(&self) -> ProviderCapabilities;

    /// Send a request and wait for the whole response
    async fn dispatch(&self, request: &Request, credentials: &Credentials) -> Result<Response, LlmError>;

    /// Send a request and return its live stream of partial responses
    async fn dispatch_stream(&self, request: &Request, credentials: &Credentials) -> Result<ResponseStream, LlmError>;
}
