//! Error types for token counting and input handling

use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by a tokenizer provider.
///
/// Acquiring an encoding and using it fail in different ways, and callers
/// report them differently, so the two stay separate variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizerError {
    /// The encoding tables for a model could not be loaded
    #[error("failed to load encoding: {0}")]
    Load(String),

    /// The encoding was loaded but rejected the text
    #[error("encoding failed: {0}")]
    Encode(String),
}

/// Reasons a single model's count could not be produced.
///
/// The `Display` text is what ends up in the `error` field of the output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CountingError {
    #[error("Unknown tokenizer type: {0}")]
    UnknownTokenizer(String),

    #[error("Provider token counting not yet implemented")]
    ProviderNotImplemented,

    #[error("Local counting not supported for model: {0}")]
    UnsupportedLocalModel(String),

    #[error("Failed to load tiktoken encoding: {0}")]
    EncodingLoad(String),

    #[error("Token encoding failed: {0}")]
    Encoding(String),

    /// Anything the dispatcher did not anticipate
    #[error("Token counting failed: {0}")]
    Unexpected(String),
}

impl From<TokenizerError> for CountingError {
    fn from(err: TokenizerError) -> Self {
        match err {
            TokenizerError::Load(detail) => CountingError::EncodingLoad(detail),
            TokenizerError::Encode(detail) => CountingError::Encoding(detail),
        }
    }
}

/// Message construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("Invalid message role: {0}. Valid roles: assistant, system, tool, user")]
    InvalidRole(String),
}

/// Errors raised while reading input text or messages
#[derive(Debug, Error)]
pub enum InputError {
    #[error("{kind} not found: {}", path.display())]
    NotFound { kind: &'static str, path: PathBuf },

    #[error("Permission denied reading {kind}: {}", path.display())]
    PermissionDenied { kind: &'static str, path: PathBuf },

    #[error("Failed to decode {origin} as UTF-8: {reason}")]
    Decode { origin: String, reason: String },

    #[error("Failed to read {origin}: {source}")]
    Io {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in messages file {}: {detail}", path.display())]
    InvalidJson { path: PathBuf, detail: String },

    #[error("{0}")]
    InvalidMessages(String),
}

/// Result type alias for input operations
pub type InputResult<T> = Result<T, InputError>;
