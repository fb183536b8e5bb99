//! OpenAI-compatible provider implementation

use async_trait::async_trait;
use conduit_config::LlmProviderConfig;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{Credentials, Provider, ProviderCapabilities};
use crate::convert::openai::decode_embeddings;
use crate::convert::{OpenAiAdapter, ProviderAdapter};
use crate::error::LlmError;
use crate::protocol::openai::{
    OpenAiChatResponse, OpenAiEmbeddingResponse, OpenAiErrorResponse, OpenAiStreamChunk, OpenAiStreamOptions,
    OpenAiTextResponse, OpenAiTranscriptionRequest, OpenAiTranscriptionResponse, OpenAiWireRequest,
    OpenAiWireResponse,
};
use crate::types::{Request, Response, ResponseStream};

/// Default `OpenAI` API base URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Upload name for transcription audio
const AUDIO_FILE_NAME: &str = "audio.mp3";

/// Whether the provider is the canonical `OpenAI` API (vs a compatible third-party)
fn is_canonical_openai(base_url: &Url) -> bool {
    base_url.host_str().is_some_and(|host| host == "api.openai.com")
}

/// OpenAI-compatible provider
pub struct OpenAiProvider {
    name: String,
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    forward_authorization: bool,
    adapter: OpenAiAdapter,
}

impl OpenAiProvider {
    /// Create from provider configuration
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Internal` if the default base URL cannot be parsed
    pub fn new(name: String, config: &LlmProviderConfig) -> Result<Self, LlmError> {
        let base_url = match &config.base_url {
            Some(url) => url.clone(),
            None => Url::parse(DEFAULT_BASE_URL).map_err(|e| LlmError::Internal(e.into()))?,
        };

        Ok(Self {
            name,
            client: Client::new(),
            base_url,
            api_key: config.api_key.clone(),
            forward_authorization: config.forward_authorization,
            adapter: OpenAiAdapter,
        })
    }

    /// Pick the caller's key when forwarding is enabled, else the configured one
    fn resolve_api_key<'a>(&'a self, credentials: &'a Credentials) -> Option<&'a SecretString> {
        if self.forward_authorization
            && let Some(key) = &credentials.api_key
        {
            return Some(key);
        }

        self.api_key.as_ref()
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/{path}")
    }

    fn request_builder(&self, wire: &OpenAiWireRequest, credentials: &Credentials) -> RequestBuilder {
        let builder = self.client.post(self.endpoint(wire.path()));

        let builder = match wire {
            OpenAiWireRequest::Chat(body) => builder.json(body),
            OpenAiWireRequest::Text(body) => builder.json(body),
            OpenAiWireRequest::Embedding(body) => builder.json(body),
            OpenAiWireRequest::Transcription(body) => builder.multipart(transcription_form(body)),
        };

        match self.resolve_api_key(credentials) {
            Some(key) => builder.bearer_auth(key.expose_secret()),
            None => builder,
        }
    }

    async fn send(&self, wire: &OpenAiWireRequest, credentials: &Credentials) -> Result<reqwest::Response, LlmError> {
        let response = self.request_builder(wire, credentials).send().await.map_err(|e| {
            tracing::error!(provider = %self.name, error = %e, "upstream request failed");
            LlmError::upstream(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(provider = %self.name, status = %status, "upstream returned error");

        let message = serde_json::from_str::<OpenAiErrorResponse>(&body)
            .map(|error| error.error.message)
            .unwrap_or(body);

        Err(LlmError::Upstream {
            status_code: Some(status.as_u16()),
            message,
        })
    }

    async fn read_response(
        &self,
        wire: &OpenAiWireRequest,
        response: reqwest::Response,
    ) -> Result<OpenAiWireResponse, LlmError> {
        let decode_failed = |e: reqwest::Error| {
            tracing::warn!(provider = %self.name, error = %e, "unreadable upstream response");
            LlmError::upstream(format!("failed to parse response: {e}"))
        };

        let wire_response = match wire {
            OpenAiWireRequest::Chat(_) => {
                OpenAiWireResponse::Chat(response.json::<OpenAiChatResponse>().await.map_err(decode_failed)?)
            }
            OpenAiWireRequest::Text(_) => {
                OpenAiWireResponse::Text(response.json::<OpenAiTextResponse>().await.map_err(decode_failed)?)
            }
            OpenAiWireRequest::Embedding(_) => {
                let mut embedding = response.json::<OpenAiEmbeddingResponse>().await.map_err(decode_failed)?;
                decode_embeddings(&mut embedding).inspect_err(|e| {
                    tracing::warn!(provider = %self.name, error = %e, "undecodable upstream embedding");
                })?;
                OpenAiWireResponse::Embedding(embedding)
            }
            OpenAiWireRequest::Transcription(body) if body.expects_json() => OpenAiWireResponse::Transcription(
                response
                    .json::<OpenAiTranscriptionResponse>()
                    .await
                    .map_err(decode_failed)?,
            ),
            // text, srt and vtt come back as the bare transcript
            OpenAiWireRequest::Transcription(_) => OpenAiWireResponse::Transcription(OpenAiTranscriptionResponse {
                text: response.text().await.map_err(decode_failed)?,
                language: None,
                duration: None,
            }),
        };

        Ok(wire_response)
    }
}

/// Build the multipart body for an audio transcription
fn transcription_form(request: &OpenAiTranscriptionRequest) -> Form {
    let mut form = Form::new()
        .part("file", Part::bytes(request.file.clone()).file_name(AUDIO_FILE_NAME))
        .text("model", request.model.clone());

    let optional = [
        ("language", request.language.clone()),
        ("prompt", request.prompt.clone()),
        ("response_format", request.response_format.clone()),
        ("temperature", request.temperature.map(|t| t.to_string())),
    ];
    for (field, value) in optional {
        if let Some(value) = value {
            form = form.text(field, value);
        }
    }

    for include in &request.include {
        form = form.text("include[]", include.clone());
    }
    for granularity in &request.timestamp_granularities {
        form = form.text("timestamp_granularities[]", granularity.clone());
    }

    for (key, value) in &request.extra {
        let value = match value {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        form = form.text(key.clone(), value);
    }

    form
}

/// Map one SSE data payload to a stream element
///
/// `[DONE]` and unparseable payloads yield nothing. An in-band
/// `{"error": ...}` payload becomes an upstream error element.
fn sse_element(adapter: OpenAiAdapter, data: &str, model: &str, provider: &str) -> Option<Result<Response, LlmError>> {
    let data = data.trim();
    if data == "[DONE]" {
        return None;
    }

    if let Ok(error) = serde_json::from_str::<OpenAiErrorResponse>(data) {
        tracing::warn!(provider = %provider, error = %error.error.message, "upstream sent an error mid-stream");
        return Some(Err(LlmError::upstream(error.error.message)));
    }

    match serde_json::from_str::<OpenAiStreamChunk>(data) {
        Ok(chunk) => Some(Ok(adapter.from_provider_wire(OpenAiWireResponse::Chunk(chunk), model, provider))),
        Err(e) => {
            tracing::debug!(error = %e, data = %data, "skipping unparseable SSE chunk");
            None
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            streaming: true,
            tool_calling: true,
            text_completion: true,
            embeddings: true,
            transcription: true,
        }
    }

    async fn dispatch(&self, request: &Request, credentials: &Credentials) -> Result<Response, LlmError> {
        let wire = self.adapter.to_provider_wire(request)?;

        tracing::debug!(provider = %self.name, model = %request.model, endpoint = wire.path(), "dispatching request");

        let response = self.send(&wire, credentials).await?;
        let wire_response = self.read_response(&wire, response).await?;

        Ok(self.adapter.from_provider_wire(wire_response, &request.model, &self.name))
    }

    async fn dispatch_stream(&self, request: &Request, credentials: &Credentials) -> Result<ResponseStream, LlmError> {
        let OpenAiWireRequest::Chat(mut body) = self.adapter.to_provider_wire(request)? else {
            return Err(LlmError::Unsupported {
                provider: self.name.clone(),
                operation: "streaming of non-chat requests",
            });
        };

        body.stream = Some(true);

        // Only send stream_options to canonical OpenAI: many compatible
        // APIs reject the unsupported parameter
        body.stream_options = is_canonical_openai(&self.base_url).then_some(OpenAiStreamOptions { include_usage: true });

        tracing::debug!(provider = %self.name, model = %request.model, "dispatching stream request");

        let response = self.send(&OpenAiWireRequest::Chat(body), credentials).await?;

        let adapter = self.adapter;
        let model = request.model.clone();
        let provider = self.name.clone();

        let stream = response.bytes_stream().eventsource().filter_map(move |event| {
            let result = match event {
                Ok(event) => sse_element(adapter, &event.data, &model, &provider),
                Err(e) => Some(Err(LlmError::Streaming(e.to_string()))),
            };

            std::future::ready(result)
        });

        Ok(Box::pin(stream))
    }
}
