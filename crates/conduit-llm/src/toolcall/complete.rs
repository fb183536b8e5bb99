use conduit_core::RequestContext;

use super::{ToolCallOrchestrator, followup_request};
use crate::error::LlmError;
use crate::provider::{Credentials, Provider};
use crate::types::{Request, Response};

impl ToolCallOrchestrator {
    /// Resolve the tool calls of a complete response
    ///
    /// Returns `response` untouched when there is no executor, no choice,
    /// or no tool call on the first choice. Otherwise executes every call,
    /// then returns the response to one follow-up dispatch through the same
    /// provider and credentials. A failed follow-up is returned as-is.
    pub async fn resolve(
        &self,
        provider: &dyn Provider,
        request: &Request,
        credentials: &Credentials,
        context: &RequestContext,
        response: Response,
    ) -> Result<Response, LlmError> {
        let Some(executor) = self.executor.as_deref() else {
            return Ok(response);
        };

        let assistant = match response.choices.first_message() {
            Some(message) if !message.tool_calls().is_empty() => message.clone(),
            _ => return Ok(response),
        };

        if request.messages().is_none() {
            tracing::warn!(
                correlation_id = %context.correlation_id,
                input = request.input.kind(),
                "ignoring tool calls on a request without a conversation"
            );
            return Ok(response);
        }

        tracing::debug!(
            correlation_id = %context.correlation_id,
            provider = provider.name(),
            tool_calls = assistant.tool_calls().len(),
            "resolving tool calls"
        );

        let tool_messages = self.execute_batch(executor, context, assistant.tool_calls()).await;

        let Some(followup) = followup_request(request, assistant, tool_messages) else {
            return Ok(response);
        };

        self.bounded_followup(context, provider.dispatch(&followup, credentials))
            .await
            .inspect_err(|e| {
                tracing::error!(correlation_id = %context.correlation_id, error = %e, "follow-up dispatch failed");
            })
    }
}
