//! Tool executors with predictable outcomes

use std::sync::Mutex;

use async_trait::async_trait;
use conduit_core::RequestContext;
use conduit_llm::types::{Message, ToolCall};
use conduit_llm::{ToolError, ToolExecutor};

/// Succeeds unless the tool is called `fail`; `hang` never returns on its own
#[derive(Default)]
pub struct ScriptedExecutor {
    calls: Mutex<Vec<ToolCall>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls in the order they started
    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolExecutor for ScriptedExecutor {
    async fn execute(&self, _context: &RequestContext, call: &ToolCall) -> Result<Message, ToolError> {
        self.calls.lock().unwrap().push(call.clone());

        match call.function.name.as_str() {
            "fail" => Err(ToolError::execution("backend unavailable")),
            "hang" => std::future::pending().await,
            name => Ok(Message::tool(call.id.clone(), format!("{name} result for {}", call.function.arguments))),
        }
    }
}
