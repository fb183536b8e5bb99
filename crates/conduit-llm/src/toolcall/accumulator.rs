use crate::types::{Content, Message, Response, StreamToolCall, ToolCall};

/// Assistant turn rebuilt from the first choice of a streamed response
#[derive(Debug, Default)]
pub(super) struct StreamAccumulator {
    content: String,
    calls: Vec<PartialCall>,
}

#[derive(Debug)]
struct PartialCall {
    index: u32,
    id: Option<String>,
    name: String,
    arguments: String,
}

impl PartialCall {
    fn continues_with(&self, fragment: &StreamToolCall) -> bool {
        let same_id = match (&self.id, &fragment.id) {
            (Some(open_id), Some(id)) => open_id == id,
            _ => true,
        };
        let same_name = match &fragment.function.name {
            Some(name) => self.name.is_empty() || &self.name == name,
            None => true,
        };
        same_id && same_name
    }
}

impl StreamAccumulator {
    /// Record the content and tool-call fragments of one stream element
    pub(super) fn observe(&mut self, element: &Response) {
        let Some(delta) = element.choices.first_delta() else {
            return;
        };

        if let Some(content) = &delta.content {
            self.content.push_str(content);
        }

        for fragment in &delta.tool_calls {
            self.absorb(fragment);
        }
    }

    /// A fragment extends the latest call at its index unless it names a
    /// different id or a different function
    fn absorb(&mut self, fragment: &StreamToolCall) {
        let open = self
            .calls
            .iter()
            .rposition(|call| call.index == fragment.index)
            .filter(|&position| self.calls[position].continues_with(fragment));

        let position = match open {
            Some(position) => position,
            None => {
                self.calls.push(PartialCall {
                    index: fragment.index,
                    id: None,
                    name: String::new(),
                    arguments: String::new(),
                });
                self.calls.len() - 1
            }
        };
        let call = &mut self.calls[position];

        if call.id.is_none() {
            call.id.clone_from(&fragment.id);
        }
        if call.name.is_empty()
            && let Some(name) = &fragment.function.name
        {
            call.name.clone_from(name);
        }
        if let Some(arguments) = &fragment.function.arguments {
            call.arguments.push_str(arguments);
        }
    }

    pub(super) fn has_tool_calls(&self) -> bool {
        !self.calls.is_empty()
    }

    /// The assistant message carrying everything accumulated so far
    ///
    /// Calls that never received an id get a positional one so their
    /// results can still be joined.
    pub(super) fn into_assistant_message(self) -> Message {
        let tool_calls = self
            .calls
            .into_iter()
            .enumerate()
            .map(|(position, call)| {
                let id = call.id.unwrap_or_else(|| format!("call_{position}"));
                ToolCall::new(id, call.name, call.arguments)
            })
            .collect();

        let content = if self.content.is_empty() {
            Content::Blocks(Vec::new())
        } else {
            Content::Text(self.content)
        };

        Message::assistant_with_tool_calls(content, tool_calls)
    }
}
