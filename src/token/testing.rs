//! Fake tokenizer providers for unit tests

use crate::domain::{Encoding, TokenizerProvider};
use crate::error::TokenizerError;

/// One token per whitespace-separated word
pub struct WhitespaceProvider;

struct WhitespaceEncoding;

impl Encoding for WhitespaceEncoding {
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        Ok(text.split_whitespace().enumerate().map(|(i, _)| i as u32).collect())
    }
}

impl TokenizerProvider for WhitespaceProvider {
    fn load(&self, _name: &str) -> Result<Box<dyn Encoding>, TokenizerError> {
        Ok(Box::new(WhitespaceEncoding))
    }
}

/// Fails every load
pub struct BrokenProvider;

impl TokenizerProvider for BrokenProvider {
    fn load(&self, _name: &str) -> Result<Box<dyn Encoding>, TokenizerError> {
        Err(TokenizerError::Load("tables unavailable".to_string()))
    }
}

/// Loads fine, rejects every encode
pub struct RejectingProvider;

struct RejectingEncoding;

impl Encoding for RejectingEncoding {
    fn encode(&self, _text: &str) -> Result<Vec<u32>, TokenizerError> {
        Err(TokenizerError::Encode("rejected input".to_string()))
    }
}

impl TokenizerProvider for RejectingProvider {
    fn load(&self, _name: &str) -> Result<Box<dyn Encoding>, TokenizerError> {
        Ok(Box::new(RejectingEncoding))
    }
}
