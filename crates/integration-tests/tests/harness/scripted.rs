//! In-memory provider that replays a script and records every request

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use conduit_llm::provider::{Credentials, Provider, ProviderCapabilities};
use conduit_llm::types::{
    Choice, Choices, Delta, FinishReason, Message, Request, Response, ResponseStream, StreamChoice, StreamToolCall,
    ToolCall,
};
use conduit_llm::LlmError;
use futures_util::stream;

pub const PROVIDER: &str = "scripted";

type Element = Result<Response, LlmError>;

/// Which dispatch method a recorded request went through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Complete,
    Stream,
}

#[derive(Default)]
pub struct ScriptedProvider {
    complete: Mutex<VecDeque<Result<Response, LlmError>>>,
    streams: Mutex<VecDeque<Result<Vec<Element>, LlmError>>>,
    requests: Mutex<Vec<(Dispatch, Request)>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer for the next `dispatch`
    pub fn then_complete(self, response: Response) -> Self {
        self.complete.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn then_complete_error(self, error: LlmError) -> Self {
        self.complete.lock().unwrap().push_back(Err(error));
        self
    }

    /// Queue the elements of the next `dispatch_stream`
    pub fn then_stream(self, elements: Vec<Element>) -> Self {
        self.streams.lock().unwrap().push_back(Ok(elements));
        self
    }

    /// Make the next `dispatch_stream` fail before any element
    pub fn then_stream_error(self, error: LlmError) -> Self {
        self.streams.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<(Dispatch, Request)> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of dispatches after the first one
    pub fn followups(&self) -> usize {
        self.requests.lock().unwrap().len().saturating_sub(1)
    }

    /// Conversation of the last dispatched request
    pub fn last_conversation(&self) -> Vec<Message> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .and_then(|(_, request)| request.messages().map(<[Message]>::to_vec))
            .unwrap_or_default()
    }

    fn record(&self, dispatch: Dispatch, request: &Request) {
        self.requests.lock().unwrap().push((dispatch, request.clone()));
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            streaming: true,
            tool_calling: true,
            text_completion: true,
            embeddings: false,
            transcription: false,
        }
    }

    async fn dispatch(&self, request: &Request, _credentials: &Credentials) -> Result<Response, LlmError> {
        self.record(Dispatch::Complete, request);
        self.complete
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::upstream("script exhausted")))
    }

    async fn dispatch_stream(&self, request: &Request, _credentials: &Credentials) -> Result<ResponseStream, LlmError> {
        self.record(Dispatch::Stream, request);
        let elements = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::upstream("script exhausted")))?;
        Ok(Box::pin(stream::iter(elements)))
    }
}

/// Complete response whose first choice is `message`
pub fn complete(message: Message, finish_reason: FinishReason) -> Response {
    Response {
        id: Some("resp_1".to_owned()),
        model: "scripted-model".to_owned(),
        provider: Some(PROVIDER.to_owned()),
        choices: Choices::Complete(vec![Choice {
            index: 0,
            message,
            finish_reason: Some(finish_reason),
            log_probs: None,
            stop_string: None,
        }]),
        ..Response::default()
    }
}

pub fn complete_text(text: &str) -> Response {
    complete(Message::assistant(text), FinishReason::Stop)
}

pub fn complete_tool_calls(calls: Vec<ToolCall>) -> Response {
    complete(Message::assistant_with_tool_calls("", calls), FinishReason::ToolCalls)
}

/// Stream element carrying `delta` on choice 0
pub fn element(delta: Delta) -> Response {
    Response {
        model: "scripted-model".to_owned(),
        provider: Some(PROVIDER.to_owned()),
        choices: Choices::Delta(vec![StreamChoice {
            index: 0,
            delta,
            finish_reason: None,
        }]),
        ..Response::default()
    }
}

pub fn text_element(text: &str) -> Response {
    element(Delta::text(text))
}

/// Stream element carrying one complete tool call
pub fn tool_call_element(index: u32, id: &str, name: &str, arguments: &str) -> Response {
    element(Delta {
        tool_calls: vec![StreamToolCall::complete(index, id, name, arguments)],
        ..Delta::default()
    })
}

/// Content of choice 0 of a stream element, empty for errors and tool-only elements
pub fn delta_text(element: &Element) -> String {
    element
        .as_ref()
        .ok()
        .and_then(|response| response.choices.first_delta())
        .and_then(|delta| delta.content.clone())
        .unwrap_or_default()
}
