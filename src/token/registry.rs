//! Registry of exact-local counting routines

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{Encoding, InputPayload, Message, ModelDescriptor, TokenizerProvider};
use crate::error::{CountingError, TokenizerError};

use super::counter::{Accuracy, TokenCount};

/// A counting routine for one exact-local model
pub trait LocalCounter: Send + Sync {
    fn count(&self, input: &InputPayload) -> Result<TokenCount, CountingError>;
}

/// Maps model names to their local counting routine.
///
/// Adding support for another local model is a `register` call.
#[derive(Default, Clone)]
pub struct LocalCounterRegistry {
    counters: HashMap<String, Arc<dyn LocalCounter>>,
}

impl LocalCounterRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in tiktoken-backed models wired to `provider`
    pub fn with_defaults(provider: Arc<dyn TokenizerProvider>) -> Self {
        let mut registry = Self::new();
        registry.register("gpt-4o", Arc::new(EncodingCounter::new(provider, "gpt-4o")));
        registry
    }

    /// Register every local model in `models` that names an explicit encoding
    pub fn register_models<'a>(
        &mut self,
        models: impl IntoIterator<Item = &'a ModelDescriptor>,
        provider: Arc<dyn TokenizerProvider>,
    ) {
        for model in models {
            if let Some(encoding) = &model.encoding {
                self.register(
                    model.name.clone(),
                    Arc::new(EncodingCounter::new(provider.clone(), encoding.clone())),
                );
            }
        }
    }

    pub fn register(&mut self, model: impl Into<String>, counter: Arc<dyn LocalCounter>) {
        let model = model.into();
        debug!("Registering local counter for {}", model);
        self.counters.insert(model, counter);
    }

    pub fn get(&self, model: &str) -> Option<Arc<dyn LocalCounter>> {
        self.counters.get(model).cloned()
    }

    pub fn contains(&self, model: &str) -> bool {
        self.counters.contains_key(model)
    }
}

impl std::fmt::Debug for LocalCounterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut models: Vec<&String> = self.counters.keys().collect();
        models.sort();
        f.debug_struct("LocalCounterRegistry").field("models", &models).finish()
    }
}

/// Counts with an encoding obtained from a [`TokenizerProvider`].
///
/// Plain text is encoded directly and is exact. Message lists go through
/// [`approximate_message_text`] and are always reported as approximate.
pub struct EncodingCounter {
    provider: Arc<dyn TokenizerProvider>,
    encoding: String,
}

impl EncodingCounter {
    pub fn new(provider: Arc<dyn TokenizerProvider>, encoding: impl Into<String>) -> Self {
        Self {
            provider,
            encoding: encoding.into(),
        }
    }
}

impl LocalCounter for EncodingCounter {
    fn count(&self, input: &InputPayload) -> Result<TokenCount, CountingError> {
        let encoding = self.provider.load(&self.encoding)?;

        match &input.messages {
            Some(messages) => Ok(TokenCount {
                tokens: count_messages_approximate(messages, encoding.as_ref())?,
                accuracy: Accuracy::Approximate,
            }),
            None => Ok(TokenCount {
                tokens: encoding.encode(&input.raw_text)?.len() as u64,
                accuracy: Accuracy::Exact,
            }),
        }
    }
}

/// Flatten a conversation for approximate counting.
///
/// Each message contributes a `<role>` marker segment followed by its text
/// segment (see [`crate::domain::MessageContent::segment`]); segments are
/// joined by blank lines. This does not reproduce any provider's chat formatting overhead.
pub fn approximate_message_text(messages: &[Message]) -> String {
    let mut segments = Vec::with_capacity(messages.len() * 2);

    for message in messages {
        segments.push(format!("<{}>", message.role));
        segments.extend(message.content.segment());
    }

    segments.join("\n\n")
}

/// Approximate token count of a conversation
pub fn count_messages_approximate(
    messages: &[Message],
    encoding: &dyn Encoding,
) -> Result<u64, TokenizerError> {
    let text = approximate_message_text(messages);
    Ok(encoding.encode(&text)?.len() as u64)
}
