//! tiktoken-rs backed tokenizer provider

use tiktoken_rs::tokenizer::{get_tokenizer, Tokenizer};
use tiktoken_rs::CoreBPE;
use tracing::debug;

use crate::domain::{Encoding, TokenizerProvider};
use crate::error::TokenizerError;

/// Special tokens of each encoding. Text containing one of them is rejected
/// rather than silently encoded as ordinary text.
const O200K_SPECIAL: &[&str] = &["<|endoftext|>", "<|endofprompt|>"];
const CL100K_SPECIAL: &[&str] = &[
    "<|endoftext|>",
    "<|fim_prefix|>",
    "<|fim_middle|>",
    "<|fim_suffix|>",
    "<|endofprompt|>",
];
const P50K_EDIT_SPECIAL: &[&str] = &[
    "<|endoftext|>",
    "<|fim_prefix|>",
    "<|fim_middle|>",
    "<|fim_suffix|>",
];
const R50K_SPECIAL: &[&str] = &["<|endoftext|>"];

/// Encoding names accepted directly in place of a model name
const ENCODINGS: &[&str] = &["o200k_base", "cl100k_base", "p50k_base", "p50k_edit", "r50k_base"];

/// Encoding used for a model or encoding name.
///
/// Model names are resolved by `tiktoken-rs` itself.
pub fn encoding_for(name: &str) -> Option<&'static str> {
    if let Some(encoding) = ENCODINGS.iter().copied().find(|e| *e == name) {
        return Some(encoding);
    }
    get_tokenizer(name).map(encoding_name)
}

fn encoding_name(tokenizer: Tokenizer) -> &'static str {
    match tokenizer {
        Tokenizer::O200kBase => "o200k_base",
        Tokenizer::Cl100kBase => "cl100k_base",
        Tokenizer::P50kBase => "p50k_base",
        Tokenizer::P50kEdit => "p50k_edit",
        Tokenizer::R50kBase | Tokenizer::Gpt2 => "r50k_base",
    }
}

/// Loads BPE tables bundled with `tiktoken-rs`.
///
/// Tables are built on every `load`; the binary evaluates each model once.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiktokenProvider;

impl TiktokenProvider {
    pub fn new() -> Self {
        Self
    }
}

impl TokenizerProvider for TiktokenProvider {
    fn load(&self, name: &str) -> Result<Box<dyn Encoding>, TokenizerError> {
        let encoding = encoding_for(name).ok_or_else(|| {
            TokenizerError::Load(format!(
                "Could not automatically map {} to a tokeniser",
                name
            ))
        })?;
        debug!("Loading {} tables for {}", encoding, name);

        let (bpe, special_tokens) = match encoding {
            "o200k_base" => (tiktoken_rs::o200k_base(), O200K_SPECIAL),
            "cl100k_base" => (tiktoken_rs::cl100k_base(), CL100K_SPECIAL),
            "p50k_base" => (tiktoken_rs::p50k_base(), R50K_SPECIAL),
            "p50k_edit" => (tiktoken_rs::p50k_edit(), P50K_EDIT_SPECIAL),
            _ => (tiktoken_rs::r50k_base(), R50K_SPECIAL),
        };
        let bpe = bpe.map_err(|e| TokenizerError::Load(e.to_string()))?;

        Ok(Box::new(TiktokenEncoding {
            bpe,
            special_tokens,
        }))
    }
}

/// A loaded tiktoken encoding
pub struct TiktokenEncoding {
    bpe: CoreBPE,
    special_tokens: &'static [&'static str],
}

impl Encoding for TiktokenEncoding {
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        if let Some(token) = self.special_tokens.iter().find(|t| text.contains(**t)) {
            return Err(TokenizerError::Encode(format!(
                "Encountered text corresponding to disallowed special token '{}'",
                token
            )));
        }

        Ok(self
            .bpe
            .encode_ordinary(text)
            .into_iter()
            .map(|rank| rank as u32)
            .collect())
    }
}
