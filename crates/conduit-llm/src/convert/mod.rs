//! Bidirectional conversion between canonical types and wire formats
//!
//! Each submodule implements [`ProviderAdapter`] for one provider's
//! protocol.

pub mod openai;

pub use openai::OpenAiAdapter;

use crate::error::LlmError;
use crate::types::{Request, Response};

/// Translator between the canonical schema and one provider's wire shape
///
/// Both directions are deterministic and free of side effects. Sampling
/// parameters follow an allow-list: only fields the provider recognises are
/// copied into native wire fields, and everything else stays reachable
/// through [`Params::extra`](crate::types::Params::extra). Optional fields
/// missing upstream are left unset in the canonical response.
pub trait ProviderAdapter {
    /// Request body sent to the provider
    type WireRequest;
    /// Response body received from the provider
    type WireResponse;

    /// Build the provider request for a canonical request
    ///
    /// Fails without producing anything if the provider has no endpoint
    /// for the request's input kind.
    fn to_provider_wire(&self, request: &Request) -> Result<Self::WireRequest, LlmError>;

    /// Build the canonical response for a provider response
    fn from_provider_wire(&self, response: Self::WireResponse, model: &str, provider: &str) -> Response;
}
