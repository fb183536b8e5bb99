use std::sync::Arc;

use conduit_core::RequestContext;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::Instrument;

use super::accumulator::StreamAccumulator;
use super::{ToolCallOrchestrator, ToolExecutor, followup_request};
use crate::error::LlmError;
use crate::provider::{Credentials, Provider};
use crate::types::{Request, Response, ResponseStream};

type Element = Result<Response, LlmError>;

impl ToolCallOrchestrator {
    /// Resolve tool calls carried by a live stream
    ///
    /// Every input element is forwarded as soon as it arrives. Once the
    /// input ends, accumulated tool calls are executed and the follow-up
    /// stream is spliced onto the same output, strictly after the last
    /// original element. A failed follow-up dispatch ends the output with a
    /// single error element.
    ///
    /// One spawned task owns the only sender of the bounded output channel,
    /// so the output closes exactly once: when that task finishes.
    /// Without an executor the input is returned as-is.
    pub fn intercept(
        &self,
        provider: Arc<dyn Provider>,
        request: Request,
        credentials: Credentials,
        context: RequestContext,
        input: ResponseStream,
    ) -> ResponseStream {
        let Some(executor) = self.executor.clone() else {
            return input;
        };

        let (sender, receiver) = mpsc::channel(self.config.stream_buffer.max(1));

        let span = tracing::info_span!(
            "tool_call_interceptor",
            correlation_id = %context.correlation_id,
            provider = provider.name(),
        );

        let interceptor = Interceptor {
            orchestrator: self.clone(),
            executor,
            provider,
            request,
            credentials,
            context,
        };

        tokio::spawn(interceptor.run(input, sender).instrument(span));

        Box::pin(futures_util::stream::unfold(receiver, |mut receiver| async move {
            let element = receiver.recv().await?;
            Some((element, receiver))
        }))
    }
}

/// Background task state for one interception
struct Interceptor {
    orchestrator: ToolCallOrchestrator,
    executor: Arc<dyn ToolExecutor>,
    provider: Arc<dyn Provider>,
    request: Request,
    credentials: Credentials,
    context: RequestContext,
}

impl Interceptor {
    async fn run(self, mut input: ResponseStream, output: mpsc::Sender<Element>) {
        let mut accumulator = StreamAccumulator::default();
        let mut forwarded = 0_usize;

        while let Some(element) = input.next().await {
            if let Ok(response) = &element {
                accumulator.observe(response);
            }

            if output.send(element).await.is_err() {
                tracing::debug!(forwarded, "consumer went away while forwarding");
                return;
            }
            forwarded += 1;
        }
        drop(input);

        if !accumulator.has_tool_calls() {
            tracing::debug!(forwarded, "stream finished without tool calls");
            return;
        }

        if self.request.messages().is_none() {
            tracing::warn!(
                input = self.request.input.kind(),
                "ignoring tool calls on a request without a conversation"
            );
            return;
        }

        if output.is_closed() {
            tracing::debug!("consumer went away before tool execution");
            return;
        }

        let assistant = accumulator.into_assistant_message();
        tracing::debug!(tool_calls = assistant.tool_calls().len(), "resolving streamed tool calls");

        let tool_messages = self
            .orchestrator
            .execute_batch(self.executor.as_ref(), &self.context, assistant.tool_calls())
            .await;

        let Some(followup) = followup_request(&self.request, assistant, tool_messages) else {
            return;
        };

        let dispatch = self.provider.dispatch_stream(&followup, &self.credentials);
        let mut followup_stream = match self.orchestrator.bounded_followup(&self.context, dispatch).await {
            Ok(stream) => stream,
            Err(error) => {
                tracing::error!(error = %error, "follow-up stream dispatch failed");
                // Nothing is left to deliver if the consumer is gone
                let _ = output.send(Err(error)).await;
                return;
            }
        };

        loop {
            let element = tokio::select! {
                biased;
                () = self.context.cancellation.cancelled() => {
                    tracing::debug!("caller cancelled during follow-up stream");
                    let _ = output.send(Err(LlmError::Cancelled)).await;
                    return;
                }
                element = followup_stream.next() => element,
            };
            let Some(element) = element else {
                break;
            };

            if output.send(element).await.is_err() {
                tracing::debug!("consumer went away during follow-up stream");
                return;
            }
        }

        tracing::debug!(forwarded, "follow-up stream spliced");
    }
}
