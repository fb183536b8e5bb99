use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Role of a message participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instruction
    System,
    /// User message
    User,
    /// Assistant response
    Assistant,
    /// Tool/function result
    Tool,
}

impl Role {
    /// Wire name shared by every chat protocol we speak
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// Message in a conversation
///
/// `assistant` is only ever set on assistant messages and `tool` only on
/// tool messages. The constructors guarantee it; [`Message::validate`]
/// checks messages that arrived through deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message author
    pub role: Role,
    /// Message content
    pub content: Content,
    /// Optional participant name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tool calls requested by the assistant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant: Option<AssistantExtra>,
    /// The tool call this message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<ToolExtra>,
}

/// Assistant-only message data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantExtra {
    /// Tool calls in the order the model emitted them
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

/// Tool-only message data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolExtra {
    /// Id of the originating [`ToolCall`]
    pub tool_call_id: String,
}

impl Message {
    fn plain(role: Role, content: Content) -> Self {
        Self {
            role,
            content,
            name: None,
            assistant: None,
            tool: None,
        }
    }

    /// System instruction
    pub fn system(text: impl Into<String>) -> Self {
        Self::plain(Role::System, Content::Text(text.into()))
    }

    /// User turn
    pub fn user(text: impl Into<String>) -> Self {
        Self::plain(Role::User, Content::Text(text.into()))
    }

    /// Assistant turn without tool calls
    pub fn assistant(content: impl Into<Content>) -> Self {
        Self::plain(Role::Assistant, content.into())
    }

    /// Assistant turn that requests tool calls
    pub fn assistant_with_tool_calls(content: impl Into<Content>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            assistant: Some(AssistantExtra { tool_calls }),
            ..Self::plain(Role::Assistant, content.into())
        }
    }

    /// Result of a tool call, joined to the call by its id
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<Content>) -> Self {
        Self {
            tool: Some(ToolExtra {
                tool_call_id: tool_call_id.into(),
            }),
            ..Self::plain(Role::Tool, content.into())
        }
    }

    /// Tool calls carried by an assistant message (empty otherwise)
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.assistant
            .as_ref()
            .map(|extra| extra.tool_calls.as_slice())
            .unwrap_or_default()
    }

    /// Id of the tool call a tool message answers
    pub fn tool_call_id(&self) -> Option<&str> {
        self.tool.as_ref().map(|extra| extra.tool_call_id.as_str())
    }

    /// Check that role and extra data agree
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.assistant.is_some() && self.role != Role::Assistant {
            return Err(LlmError::InvalidRequest(format!(
                "{} message must not carry tool calls",
                self.role.as_str()
            )));
        }

        match (&self.tool, self.role) {
            (Some(_), role) if role != Role::Tool => Err(LlmError::InvalidRequest(format!(
                "{} message must not carry a tool call id",
                role.as_str()
            ))),
            (None, Role::Tool) => Err(LlmError::InvalidRequest(
                "tool message must reference a tool call id".to_owned(),
            )),
            _ => Ok(()),
        }
    }
}

/// Message content, either plain text or structured blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Plain text content
    Text(String),
    /// Ordered content blocks
    Blocks(Vec<ContentBlock>),
}

impl Content {
    /// Extract text content, joining text blocks if necessary
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    ContentBlock::Image { .. } => None,
                })
                .collect(),
        }
    }

    /// Whether there is no content at all
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Blocks(blocks) => blocks.is_empty(),
        }
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

/// Individual block within a structured message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text block
    Text {
        /// The text string
        text: String,
    },
    /// Image reference
    Image {
        /// URL or base64 data URI for the image
        url: String,
        /// Detail level hint (e.g. "auto", "low", "high")
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
}

/// A tool/function call requested by the assistant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier, unique within one assistant turn
    pub id: String,
    /// Function name and arguments
    pub function: FunctionCall,
}

impl ToolCall {
    /// Build a tool call from raw parts
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// Function name and arguments within a tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name
    pub name: String,
    /// JSON-encoded arguments
    pub arguments: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_produce_valid_messages() {
        let messages = [
            Message::system("be brief"),
            Message::user("hi"),
            Message::assistant("hello"),
            Message::assistant_with_tool_calls("", vec![ToolCall::new("call_1", "lookup", "{}")]),
            Message::tool("call_1", "42"),
        ];

        for message in &messages {
            message.validate().unwrap();
        }
    }

    #[test]
    fn tool_extra_on_user_message_is_rejected() {
        let mut message = Message::user("hi");
        message.tool = Some(ToolExtra {
            tool_call_id: "call_1".to_owned(),
        });
        assert!(message.validate().is_err());
    }

    #[test]
    fn tool_calls_on_tool_message_are_rejected() {
        let mut message = Message::tool("call_1", "ok");
        message.assistant = Some(AssistantExtra::default());
        assert!(message.validate().is_err());
    }

    #[test]
    fn tool_message_without_id_is_rejected() {
        let message = Message {
            tool: None,
            ..Message::tool("call_1", "ok")
        };
        assert!(message.validate().is_err());
    }

    #[test]
    fn accessors_read_extras() {
        let call = ToolCall::new("call_9", "search", r#"{"q":"rust"}"#);
        let assistant = Message::assistant_with_tool_calls("looking", vec![call.clone()]);
        assert_eq!(assistant.tool_calls(), &[call]);
        assert!(assistant.tool_call_id().is_none());

        let tool = Message::tool("call_9", "found");
        assert!(tool.tool_calls().is_empty());
        assert_eq!(tool.tool_call_id(), Some("call_9"));
    }

    #[test]
    fn block_text_skips_images() {
        let content = Content::Blocks(vec![
            ContentBlock::Text { text: "a".to_owned() },
            ContentBlock::Image {
                url: "http://img".to_owned(),
                detail: None,
            },
            ContentBlock::Text { text: "b".to_owned() },
        ]);
        assert_eq!(content.as_text(), "ab");
    }

    #[test]
    fn empty_text_is_still_text_content() {
        let content: Content = serde_json::from_str(r#""""#).unwrap();
        assert_eq!(content, Content::Text(String::new()));
        assert!(content.is_empty());
    }
}
