//! Message and conversation types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::error::MessageError;

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message (instructions to the LLM)
    System,
    /// User message
    User,
    /// Assistant (LLM) message
    Assistant,
    /// Tool result message
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "tool" => Ok(Role::Tool),
            other => Err(MessageError::InvalidRole(other.to_string())),
        }
    }
}

/// Message content: either a plain string or a list of content parts.
///
/// Parts are kept as raw JSON so that image and other non-text items survive
/// parsing; they are simply ignored when text is extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<Value>),
}

impl MessageContent {
    /// Extract the countable text.
    ///
    /// Plain strings are returned verbatim. For part lists, string parts and
    /// string-valued `text` fields are joined with single spaces.
    pub fn extract_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    Value::String(text) => Some(text.as_str()),
                    Value::Object(fields) => fields.get("text").and_then(Value::as_str),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Text segment contributed when flattening a conversation.
    ///
    /// Plain strings always contribute, even when empty; part lists with no
    /// extractable text contribute nothing.
    pub fn segment(&self) -> Option<String> {
        match self {
            MessageContent::Text(text) => Some(text.clone()),
            MessageContent::Parts(_) => Some(self.extract_text()).filter(|t| !t.is_empty()),
        }
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Text(text.to_string())
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

impl From<Vec<Value>> for MessageContent {
    fn from(parts: Vec<Value>) -> Self {
        MessageContent::Parts(parts)
    }
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Message content
    pub content: MessageContent,
}

impl Message {
    /// Create a message from an untrusted role name.
    pub fn new(role: &str, content: impl Into<MessageContent>) -> Result<Self, MessageError> {
        Ok(Self {
            role: role.parse()?,
            content: content.into(),
        })
    }

    /// Create a system message
    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a tool result message
    pub fn tool(content: impl Into<MessageContent>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_roles() {
        for role in ["system", "user", "assistant", "tool"] {
            let message = Message::new(role, "hi").unwrap();
            assert_eq!(message.role.to_string(), role);
        }
    }

    #[test]
    fn test_invalid_role_rejected() {
        let err = Message::new("moderator", "hi").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid message role: moderator. Valid roles: assistant, system, tool, user"
        );
    }

    #[test]
    fn test_extract_plain_text() {
        let message = Message::user("Hello there");
        assert_eq!(message.content.extract_text(), "Hello there");
    }

    #[test]
    fn test_extract_mixed_parts() {
        let message = Message::user(vec![
            json!({"type": "text", "text": "Describe"}),
            json!({"type": "image_url", "image_url": {"url": "https://example.com/a.png"}}),
            json!("this image"),
            json!({"type": "text", "text": 42}),
            json!(7),
        ]);
        assert_eq!(message.content.extract_text(), "Describe this image");
    }

    #[test]
    fn test_extract_image_only_is_empty() {
        let message = Message::user(vec![json!({"type": "image", "source": "data"})]);
        assert_eq!(message.content.extract_text(), "");
        assert_eq!(message.content.segment(), None);
    }

    #[test]
    fn test_empty_plain_string_still_a_segment() {
        let message = Message::user("");
        assert_eq!(message.content.segment(), Some(String::new()));
    }
}
