//! Provider lookup and tool-call resolution behind one entry point

use std::collections::HashMap;
use std::sync::Arc;

use conduit_config::{LlmConfig, LlmProviderType, ToolCallConfig};
use conduit_core::RequestContext;

use crate::error::LlmError;
use crate::provider::openai::OpenAiProvider;
use crate::provider::{Credentials, Provider};
use crate::toolcall::{ToolCallOrchestrator, ToolExecutor};
use crate::types::{Request, Response, ResponseStream};

/// Shared handle over the configured providers
///
/// Cheap to clone; every clone dispatches through the same providers and
/// the same tool executor.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    providers: HashMap<String, Arc<dyn Provider>>,
    orchestrator: ToolCallOrchestrator,
}

impl Gateway {
    /// Build from configuration, constructing every provider
    ///
    /// # Errors
    ///
    /// Returns an error if any provider fails to initialize.
    pub fn from_config(config: &LlmConfig, executor: Option<Arc<dyn ToolExecutor>>) -> Result<Self, LlmError> {
        let mut providers: HashMap<String, Arc<dyn Provider>> = HashMap::new();

        for (name, provider_config) in &config.providers {
            let provider: Arc<dyn Provider> = match provider_config.provider_type {
                LlmProviderType::Openai => Arc::new(OpenAiProvider::new(name.clone(), provider_config)?),
            };

            tracing::debug!(provider = %name, "provider initialized");
            providers.insert(name.clone(), provider);
        }

        Ok(Self::with_providers(providers, executor, config.tool_calls.clone()))
    }

    /// Build from already constructed providers, keyed by their names
    pub fn with_providers(
        providers: HashMap<String, Arc<dyn Provider>>,
        executor: Option<Arc<dyn ToolExecutor>>,
        config: ToolCallConfig,
    ) -> Self {
        Self {
            inner: Arc::new(GatewayInner {
                providers,
                orchestrator: ToolCallOrchestrator::new(executor, config),
            }),
        }
    }

    /// Convenience constructor for a single provider
    pub fn with_provider(
        provider: Arc<dyn Provider>,
        executor: Option<Arc<dyn ToolExecutor>>,
        config: ToolCallConfig,
    ) -> Self {
        let providers = HashMap::from([(provider.name().to_owned(), provider)]);
        Self::with_providers(providers, executor, config)
    }

    /// Names of all configured providers, sorted
    pub fn provider_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.inner.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Dispatch a request and resolve any tool calls in the answer
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unknown, cannot serve the request,
    /// the upstream call fails, or the caller cancels.
    pub async fn complete(&self, request: Request, context: &RequestContext) -> Result<Response, LlmError> {
        let provider = self.provider_for(&request)?;
        let credentials = Credentials::from_context(context);

        tracing::debug!(
            correlation_id = %context.correlation_id,
            provider = %request.provider,
            model = %request.model,
            input = request.input.kind(),
            "completing request"
        );

        let response = tokio::select! {
            biased;
            () = context.cancellation.cancelled() => Err(LlmError::Cancelled),
            result = provider.dispatch(&request, &credentials) => result,
        }?;

        self.inner
            .orchestrator
            .resolve(provider.as_ref(), &request, &credentials, context, response)
            .await
    }

    /// Dispatch a streaming request and splice in any tool-call follow-up
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unknown or cannot stream, the
    /// upstream call fails before the stream opens, or the caller cancels.
    pub async fn complete_stream(&self, request: Request, context: &RequestContext) -> Result<ResponseStream, LlmError> {
        let provider = self.provider_for(&request)?;

        if !provider.capabilities().streaming {
            return Err(LlmError::Unsupported {
                provider: request.provider.clone(),
                operation: "streaming",
            });
        }

        let credentials = Credentials::from_context(context);

        tracing::debug!(
            correlation_id = %context.correlation_id,
            provider = %request.provider,
            model = %request.model,
            "opening stream"
        );

        let stream = tokio::select! {
            biased;
            () = context.cancellation.cancelled() => Err(LlmError::Cancelled),
            result = provider.dispatch_stream(&request, &credentials) => result,
        }?;

        Ok(self
            .inner
            .orchestrator
            .intercept(provider, request, credentials, context.clone(), stream))
    }

    fn provider_for(&self, request: &Request) -> Result<Arc<dyn Provider>, LlmError> {
        request.validate()?;

        let provider = self
            .inner
            .providers
            .get(&request.provider)
            .cloned()
            .ok_or_else(|| LlmError::ProviderNotFound {
                provider: request.provider.clone(),
            })?;

        if !provider.capabilities().supports(&request.input) {
            return Err(LlmError::Unsupported {
                provider: request.provider.clone(),
                operation: request.input.kind(),
            });
        }

        if request.tools.as_ref().is_some_and(|tools| !tools.is_empty()) && !provider.capabilities().tool_calling {
            return Err(LlmError::Unsupported {
                provider: request.provider.clone(),
                operation: "tool calling",
            });
        }

        Ok(provider)
    }
}
