//! Tool-call resolution for complete and streamed responses
//!
//! Both paths resolve at most one batch of tool calls: execute every call,
//! append the assistant turn and one tool message per call to the
//! conversation, and dispatch exactly one follow-up request.

mod accumulator;
mod complete;
mod stream;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use conduit_config::ToolCallConfig;
use conduit_core::RequestContext;
use futures_util::future::join_all;

use crate::error::{LlmError, ToolError};
use crate::types::{Message, Request, RequestInput, Role, ToolCall};

/// Runs a single tool call on behalf of the model
///
/// The returned message becomes the tool result for `call`. Executors
/// should return promptly once `context.cancellation` fires.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute one tool call
    async fn execute(&self, context: &RequestContext, call: &ToolCall) -> Result<Message, ToolError>;
}

/// Resolves tool calls found in responses, one round per request
///
/// Without an executor both paths are pure pass-through.
#[derive(Clone)]
pub struct ToolCallOrchestrator {
    executor: Option<Arc<dyn ToolExecutor>>,
    config: ToolCallConfig,
}

impl ToolCallOrchestrator {
    pub fn new(executor: Option<Arc<dyn ToolExecutor>>, config: ToolCallConfig) -> Self {
        Self { executor, config }
    }

    /// Whether tool calls will be executed at all
    pub fn is_enabled(&self) -> bool {
        self.executor.is_some()
    }

    /// Execute a batch, producing exactly one tool message per call in call order
    async fn execute_batch(&self, executor: &dyn ToolExecutor, context: &RequestContext, calls: &[ToolCall]) -> Vec<Message> {
        let timeout = self.config.tool_timeout;

        if self.config.parallel {
            return join_all(calls.iter().map(|call| execute_one(executor, context, call, timeout))).await;
        }

        let mut messages = Vec::with_capacity(calls.len());
        for call in calls {
            messages.push(execute_one(executor, context, call, timeout).await);
        }
        messages
    }

    /// Run the follow-up dispatch under the caller's cancellation and the configured deadline
    async fn bounded_followup<T>(
        &self,
        context: &RequestContext,
        dispatch: impl Future<Output = Result<T, LlmError>>,
    ) -> Result<T, LlmError> {
        let dispatch = async move {
            match self.config.followup_timeout {
                Some(limit) => tokio::time::timeout(limit, dispatch)
                    .await
                    .unwrap_or(Err(LlmError::Timeout(limit))),
                None => dispatch.await,
            }
        };

        tokio::select! {
            biased;
            () = context.cancellation.cancelled() => Err(LlmError::Cancelled),
            result = dispatch => result,
        }
    }
}

/// Body of the tool message substituted for a failed call
pub fn tool_error_content(error: &ToolError) -> String {
    format!("Error executing tool: {error}")
}

/// Tool message standing in for a failed call
pub fn tool_error_message(call: &ToolCall, error: &ToolError) -> Message {
    Message::tool(call.id.clone(), tool_error_content(error))
}

async fn execute_one(
    executor: &dyn ToolExecutor,
    context: &RequestContext,
    call: &ToolCall,
    timeout: Option<Duration>,
) -> Message {
    let execution = async move {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, executor.execute(context, call))
                .await
                .unwrap_or(Err(ToolError::Timeout(limit))),
            None => executor.execute(context, call).await,
        }
    };

    let result = tokio::select! {
        biased;
        () = context.cancellation.cancelled() => Err(ToolError::Cancelled),
        result = execution => result,
    };

    match result {
        Ok(message) if message.role == Role::Tool && message.tool_call_id() == Some(call.id.as_str()) => {
            tracing::debug!(correlation_id = %context.correlation_id, tool = %call.function.name, "tool call succeeded");
            message
        }
        Ok(message) => {
            tracing::debug!(correlation_id = %context.correlation_id, tool = %call.function.name, "tool call succeeded");
            Message::tool(call.id.clone(), message.content)
        }
        Err(error) => {
            tracing::warn!(
                correlation_id = %context.correlation_id,
                tool = %call.function.name,
                tool_call_id = %call.id,
                error = %error,
                "tool call failed"
            );
            tool_error_message(call, &error)
        }
    }
}

/// Follow-up request: the original conversation plus the assistant turn and its results
///
/// `None` when the request has no conversation to extend.
fn followup_request(request: &Request, assistant: Message, tool_messages: Vec<Message>) -> Option<Request> {
    let RequestInput::Chat(messages) = &request.input else {
        return None;
    };

    let mut conversation = Vec::with_capacity(messages.len() + 1 + tool_messages.len());
    conversation.extend_from_slice(messages);
    conversation.push(assistant);
    conversation.extend(tool_messages);

    Some(Request {
        input: RequestInput::Chat(conversation),
        ..request.clone()
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::types::Content;

    /// Answers by tool name: `ok` echoes, `fail` errors, `slow` waits forever
    struct NamedExecutor {
        seen: Mutex<Vec<String>>,
    }

    impl NamedExecutor {
        fn new() -> Self {
            Self { seen: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl ToolExecutor for NamedExecutor {
        async fn execute(&self, _context: &RequestContext, call: &ToolCall) -> Result<Message, ToolError> {
            self.seen.lock().unwrap().push(call.id.clone());
            match call.function.name.as_str() {
                "ok" => Ok(Message::tool(call.id.clone(), call.function.arguments.clone())),
                "wrong_id" => Ok(Message::user("result without join key")),
                "slow" => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
                _ => Err(ToolError::execution("tool exploded")),
            }
        }
    }

    fn orchestrator(config: ToolCallConfig) -> (Arc<NamedExecutor>, ToolCallOrchestrator) {
        let executor = Arc::new(NamedExecutor::new());
        let orchestrator = ToolCallOrchestrator::new(Some(executor.clone()), config);
        (executor, orchestrator)
    }

    #[tokio::test]
    async fn failures_become_tool_messages_in_order() {
        let (executor, orchestrator) = orchestrator(ToolCallConfig::default());
        let calls = [
            ToolCall::new("call_a", "ok", "{\"x\":1}"),
            ToolCall::new("call_b", "fail", "{}"),
            ToolCall::new("call_c", "ok", "{}"),
        ];

        let messages = orchestrator
            .execute_batch(executor.as_ref(), &RequestContext::new(), &calls)
            .await;

        let ids: Vec<_> = messages.iter().filter_map(Message::tool_call_id).collect();
        assert_eq!(ids, ["call_a", "call_b", "call_c"]);
        assert_eq!(messages[0].content, Content::Text("{\"x\":1}".to_owned()));
        assert_eq!(messages[1].content.as_text(), "Error executing tool: tool exploded");
    }

    #[tokio::test]
    async fn parallel_batch_keeps_call_order() {
        let config = ToolCallConfig {
            parallel: true,
            ..ToolCallConfig::default()
        };
        let (executor, orchestrator) = orchestrator(config);
        let calls = [ToolCall::new("call_1", "fail", "{}"), ToolCall::new("call_2", "ok", "2")];

        let messages = orchestrator
            .execute_batch(executor.as_ref(), &RequestContext::new(), &calls)
            .await;

        assert_eq!(messages[0].tool_call_id(), Some("call_1"));
        assert_eq!(messages[1].tool_call_id(), Some("call_2"));
        assert_eq!(messages[1].content.as_text(), "2");
    }

    #[tokio::test]
    async fn result_is_rebound_to_call_id() {
        let (executor, orchestrator) = orchestrator(ToolCallConfig::default());
        let calls = [ToolCall::new("call_9", "wrong_id", "{}")];

        let messages = orchestrator
            .execute_batch(executor.as_ref(), &RequestContext::new(), &calls)
            .await;

        assert_eq!(messages[0].role, Role::Tool);
        assert_eq!(messages[0].tool_call_id(), Some("call_9"));
        messages[0].validate().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn slow_tool_times_out_into_message() {
        let config = ToolCallConfig {
            tool_timeout: Some(Duration::from_secs(5)),
            ..ToolCallConfig::default()
        };
        let (executor, orchestrator) = orchestrator(config);
        let calls = [ToolCall::new("call_1", "slow", "{}")];

        let messages = orchestrator
            .execute_batch(executor.as_ref(), &RequestContext::new(), &calls)
            .await;

        assert_eq!(
            messages[0].content.as_text(),
            "Error executing tool: tool call timed out after 5s"
        );
    }

    #[tokio::test]
    async fn cancellation_fails_tool_fast() {
        let (executor, orchestrator) = orchestrator(ToolCallConfig::default());
        let parent = CancellationToken::new();
        let context = RequestContext::with_parent(&parent);
        parent.cancel();

        let calls = [ToolCall::new("call_1", "slow", "{}"), ToolCall::new("call_2", "ok", "{}")];
        let messages = orchestrator.execute_batch(executor.as_ref(), &context, &calls).await;

        assert_eq!(messages.len(), 2);
        for message in &messages {
            assert_eq!(message.content.as_text(), "Error executing tool: tool call cancelled");
        }
        assert!(executor.seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn followup_deadline_is_fatal() {
        let config = ToolCallConfig {
            followup_timeout: Some(Duration::from_secs(1)),
            ..ToolCallConfig::default()
        };
        let (_, orchestrator) = orchestrator(config);

        let result: Result<(), LlmError> = orchestrator
            .bounded_followup(&RequestContext::new(), std::future::pending())
            .await;

        assert!(matches!(result, Err(LlmError::Timeout(limit)) if limit == Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn followup_honours_cancellation() {
        let (_, orchestrator) = orchestrator(ToolCallConfig::default());
        let context = RequestContext::new();
        context.cancellation.cancel();

        let result: Result<(), LlmError> = orchestrator.bounded_followup(&context, std::future::pending()).await;

        assert!(matches!(result, Err(LlmError::Cancelled)));
    }

    #[test]
    fn followup_appends_assistant_then_results() {
        let request = Request::chat("openai", "gpt-4o", vec![Message::system("s"), Message::user("u")]);
        let call = ToolCall::new("call_1", "ok", "{}");
        let assistant = Message::assistant_with_tool_calls("", vec![call.clone()]);

        let followup = followup_request(&request, assistant.clone(), vec![Message::tool("call_1", "r")]).unwrap();
        let messages = followup.messages().unwrap();

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[2], assistant);
        assert_eq!(messages[3].tool_call_id(), Some("call_1"));
        assert_eq!(followup.model, request.model);
    }

    #[test]
    fn followup_needs_a_conversation() {
        let request = Request::new("openai", "davinci", RequestInput::TextCompletion("hi".to_owned()));
        assert!(followup_request(&request, Message::assistant("x"), Vec::new()).is_none());
    }
}
