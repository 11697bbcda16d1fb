//! Domain types for token counting
//!
//! Messages, model descriptors and input payloads, plus the port through which
//! the counting engine reaches a tokenizer.

mod input;
mod message;
mod model;

pub use input::*;
pub use message::*;
pub use model::*;

use crate::error::TokenizerError;

/// A loaded tokenizer encoding
pub trait Encoding: Send + Sync {
    /// Encode text into token ids
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError>;
}

/// Port trait for acquiring tokenizer encodings.
///
/// `load` is attempted once per counting call; implementations decide whether
/// to cache.
pub trait TokenizerProvider: Send + Sync {
    /// Load the encoding for a model or encoding name
    fn load(&self, name: &str) -> Result<Box<dyn Encoding>, TokenizerError>;
}
