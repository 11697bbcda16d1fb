//! Reading input text and message files

use std::io::{self, Read};
use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::domain::{InputPayload, InputSource, Message, MessageContent};
use crate::error::{InputError, InputResult, MessageError};

/// Handles reading input from various sources
#[derive(Debug, Clone, Copy, Default)]
pub struct InputReader;

impl InputReader {
    pub fn new() -> Self {
        Self
    }

    /// Read input based on the configured source
    pub fn read(&self, source: &InputSource) -> InputResult<InputPayload> {
        let payload = match source {
            InputSource::Stdin => self.read_stdin(),
            InputSource::File(path) => self.read_text_file(path),
            InputSource::Messages(path) => self.read_messages_file(path),
        }?;

        info!(
            origin = %payload.origin,
            bytes = payload.raw_text.len(),
            messages = payload.messages.as_ref().map_or(0, Vec::len),
            "Read input"
        );
        Ok(payload)
    }

    pub fn read_stdin(&self) -> InputResult<InputPayload> {
        self.read_from(io::stdin().lock(), "stdin")
    }

    /// Read UTF-8 text from any reader
    pub fn read_from<R: Read>(&self, mut reader: R, origin: &str) -> InputResult<InputPayload> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(|source| InputError::Io {
            origin: origin.to_string(),
            source,
        })?;
        let text = decode_utf8(bytes, origin)?;
        Ok(InputPayload::text(text, origin))
    }

    pub fn read_text_file(&self, path: &Path) -> InputResult<InputPayload> {
        let bytes = read_file(path, "File", "file")?;
        let origin = path.display().to_string();
        let text = decode_utf8(bytes, &format!("file {}", origin))?;
        Ok(InputPayload::text(text, origin))
    }

    /// Read and parse a JSON messages file
    pub fn read_messages_file(&self, path: &Path) -> InputResult<InputPayload> {
        let bytes = read_file(path, "Messages file", "messages file")?;
        let origin = path.display().to_string();
        let json = decode_utf8(bytes, &format!("messages file {}", origin))?;

        let data: Value = serde_json::from_str(&json).map_err(|e| InputError::InvalidJson {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        let messages = parse_messages(&data, &origin)?;
        Ok(InputPayload::from_messages(messages, origin))
    }
}

/// Parse and validate messages from JSON data
pub fn parse_messages(data: &Value, source: &str) -> InputResult<Vec<Message>> {
    let items = data.as_array().ok_or_else(|| {
        InputError::InvalidMessages(format!(
            "Messages must be an array of objects in {}, got {}",
            source,
            json_type(data)
        ))
    })?;

    if items.is_empty() {
        return Err(InputError::InvalidMessages(format!(
            "Messages array cannot be empty in {}",
            source
        )));
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_message(i, item, source))
        .collect()
}

fn parse_message(index: usize, item: &Value, source: &str) -> InputResult<Message> {
    let fields = item.as_object().ok_or_else(|| {
        InputError::InvalidMessages(format!(
            "Message {} must be an object in {}, got {}",
            index,
            source,
            json_type(item)
        ))
    })?;

    let missing = |field: &str| {
        InputError::InvalidMessages(format!(
            "Message {} missing required field '{}' in {}",
            index, field, source
        ))
    };
    let role = fields.get("role").ok_or_else(|| missing("role"))?;
    let content = fields.get("content").ok_or_else(|| missing("content"))?;

    let invalid = |reason: String| {
        InputError::InvalidMessages(format!("Message {} in {}: {}", index, source, reason))
    };
    let role = role.as_str().ok_or_else(|| {
        invalid(format!("role must be a string, got {}", json_type(role)))
    })?;
    let content: MessageContent = serde_json::from_value(content.clone()).map_err(|_| {
        invalid(format!(
            "content must be a string or an array, got {}",
            json_type(content)
        ))
    })?;

    Message::new(role, content).map_err(|e: MessageError| invalid(e.to_string()))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn read_file(path: &Path, title: &'static str, kind: &'static str) -> InputResult<Vec<u8>> {
    std::fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => InputError::NotFound {
            kind: title,
            path: path.to_path_buf(),
        },
        io::ErrorKind::PermissionDenied => InputError::PermissionDenied {
            kind,
            path: path.to_path_buf(),
        },
        _ => InputError::Io {
            origin: path.display().to_string(),
            source,
        },
    })
}

fn decode_utf8(bytes: Vec<u8>, origin: &str) -> InputResult<String> {
    String::from_utf8(bytes).map_err(|e| InputError::Decode {
        origin: origin.to_string(),
        reason: e.utf8_error().to_string(),
    })
}
