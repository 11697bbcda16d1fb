//! Input payload handed to the counting engine

use std::path::PathBuf;

use super::Message;

/// Where the input comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    /// Plain UTF-8 text file
    File(PathBuf),
    /// JSON array of chat messages
    Messages(PathBuf),
}

/// Text or conversation to count.
///
/// When `messages` is present it is authoritative; `raw_text` is then only a
/// flattened fallback for strategies that need plain text.
#[derive(Debug, Clone, PartialEq)]
pub struct InputPayload {
    pub raw_text: String,
    pub messages: Option<Vec<Message>>,
    /// Label used in diagnostics (`stdin` or a path)
    pub origin: String,
}

impl InputPayload {
    pub fn text(raw_text: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            messages: None,
            origin: origin.into(),
        }
    }

    pub fn from_messages(messages: Vec<Message>, origin: impl Into<String>) -> Self {
        Self {
            raw_text: flatten_messages(&messages),
            messages: Some(messages),
            origin: origin.into(),
        }
    }
}

/// Join the text segment of each message with blank lines
pub fn flatten_messages(messages: &[Message]) -> String {
    messages
        .iter()
        .filter_map(|message| message.content.segment())
        .collect::<Vec<_>>()
        .join("\n\n")
}
