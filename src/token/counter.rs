//! Token counting dispatch

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{InputPayload, ModelDescriptor, TokenizerProvider, TokenizerStrategy};
use crate::error::CountingError;

use super::registry::LocalCounterRegistry;

/// Whether a count is exact or an approximation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    #[default]
    Exact,
    Approximate,
}

impl Accuracy {
    pub fn is_approximate(&self) -> bool {
        matches!(self, Accuracy::Approximate)
    }
}

/// A successful count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCount {
    pub tokens: u64,
    pub accuracy: Accuracy,
}

/// Result of counting one input against one model.
///
/// When `error` is set, `token_count` is always 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountingOutcome {
    pub model_name: String,
    pub token_count: u64,
    pub error: Option<String>,
    pub accuracy: Accuracy,
}

impl CountingOutcome {
    pub fn counted(model_name: impl Into<String>, count: TokenCount) -> Self {
        Self {
            model_name: model_name.into(),
            token_count: count.tokens,
            error: None,
            accuracy: count.accuracy,
        }
    }

    pub fn failed(model_name: impl Into<String>, error: CountingError) -> Self {
        Self {
            model_name: model_name.into(),
            token_count: 0,
            error: Some(error.to_string()),
            accuracy: Accuracy::Exact,
        }
    }
}

/// Selects a counting strategy per model and runs it
#[derive(Debug, Clone)]
pub struct TokenCounter {
    local: LocalCounterRegistry,
}

impl TokenCounter {
    pub fn new(local: LocalCounterRegistry) -> Self {
        Self { local }
    }

    /// Counter with the built-in local models wired to `provider`
    pub fn with_provider(provider: Arc<dyn TokenizerProvider>) -> Self {
        Self::new(LocalCounterRegistry::with_defaults(provider))
    }

    /// Count tokens using the strategy configured for `model`.
    ///
    /// Never fails: every problem, including a panic inside a local counter,
    /// is reported through the outcome's `error` field.
    pub fn count(&self, input: &InputPayload, model: &ModelDescriptor) -> CountingOutcome {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(input, model)))
            .unwrap_or_else(|payload| Err(CountingError::Unexpected(panic_message(payload))));

        match result {
            Ok(count) => {
                debug!(
                    model = %model.name,
                    tokens = count.tokens,
                    approximate = count.accuracy.is_approximate(),
                    "Counted tokens"
                );
                CountingOutcome::counted(&model.name, count)
            }
            Err(e) => {
                warn!(model = %model.name, origin = %input.origin, "Token counting failed: {}", e);
                CountingOutcome::failed(&model.name, e)
            }
        }
    }

    fn dispatch(
        &self,
        input: &InputPayload,
        model: &ModelDescriptor,
    ) -> Result<TokenCount, CountingError> {
        debug!(model = %model.name, strategy = %model.tokenizer_strategy, "Dispatching token count");

        match &model.tokenizer_strategy {
            TokenizerStrategy::ExactLocal => match self.local.get(&model.name) {
                Some(counter) => counter.count(input),
                None => Err(CountingError::UnsupportedLocalModel(model.name.clone())),
            },
            TokenizerStrategy::RemoteProvider => Err(CountingError::ProviderNotImplemented),
            TokenizerStrategy::Unknown(name) => Err(CountingError::UnknownTokenizer(name.clone())),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Message;
    use crate::token::registry::LocalCounter;
    use crate::token::testing::{BrokenProvider, RejectingProvider, WhitespaceProvider};
    use serde_json::json;

    fn counter() -> TokenCounter {
        TokenCounter::with_provider(Arc::new(WhitespaceProvider))
    }

    fn gpt4o() -> ModelDescriptor {
        ModelDescriptor::new("gpt-4o", 128_000, TokenizerStrategy::ExactLocal)
    }

    #[test]
    fn test_plain_text_is_exact() {
        let outcome = counter().count(&InputPayload::text("Hello, world!", "test"), &gpt4o());

        assert_eq!(outcome.model_name, "gpt-4o");
        assert_eq!(outcome.token_count, 2);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.accuracy, Accuracy::Exact);
    }

    #[test]
    fn test_messages_are_approximate() {
        let input = InputPayload::from_messages(
            vec![
                Message::system("You are a helpful assistant."),
                Message::user("Hello!"),
                Message::assistant("Hi there! How can I help you?"),
            ],
            "test",
        );

        let outcome = counter().count(&input, &gpt4o());

        assert!(outcome.token_count > 0);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.accuracy, Accuracy::Approximate);
    }

    #[test]
    fn test_approximate_counting_is_deterministic() {
        let input = InputPayload::from_messages(
            vec![
                Message::system("Rules."),
                Message::user(vec![json!({"type": "text", "text": "look"}), json!("here")]),
                Message::tool("{\"ok\": true}"),
            ],
            "test",
        );
        let counter = counter();

        let counts: Vec<u64> = (0..3).map(|_| counter.count(&input, &gpt4o()).token_count).collect();
        assert_eq!(counts[0], counts[1]);
        assert_eq!(counts[1], counts[2]);
    }

    #[test]
    fn test_provider_strategy_not_implemented() {
        let model = ModelDescriptor::new("claude-3-5-sonnet", 200_000, "provider");
        let outcome = counter().count(&InputPayload::text("hello", "test"), &model);

        assert_eq!(outcome.model_name, "claude-3-5-sonnet");
        assert_eq!(outcome.token_count, 0);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Provider token counting not yet implemented")
        );
    }

    #[test]
    fn test_unknown_strategy() {
        let model = ModelDescriptor::new("mystery", 1000, "sentencepiece");
        let outcome = counter().count(&InputPayload::text("hello", "test"), &model);

        assert_eq!(outcome.token_count, 0);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Unknown tokenizer type: sentencepiece")
        );
    }

    #[test]
    fn test_unregistered_local_model() {
        let model = ModelDescriptor::new("llama-3", 8192, "local");
        let outcome = counter().count(&InputPayload::text("hello", "test"), &model);

        assert_eq!(outcome.token_count, 0);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Local counting not supported for model: llama-3")
        );
    }

    #[test]
    fn test_encoding_load_failure() {
        let counter = TokenCounter::with_provider(Arc::new(BrokenProvider));
        let outcome = counter.count(&InputPayload::text("hello", "test"), &gpt4o());

        assert_eq!(outcome.token_count, 0);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Failed to load tiktoken encoding: tables unavailable")
        );
        assert_eq!(outcome.accuracy, Accuracy::Exact);
    }

    #[test]
    fn test_encoding_failure() {
        let counter = TokenCounter::with_provider(Arc::new(RejectingProvider));
        let outcome = counter.count(&InputPayload::text("hello", "test"), &gpt4o());

        assert_eq!(outcome.token_count, 0);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Token encoding failed: rejected input")
        );
    }

    struct PanickingCounter;

    impl LocalCounter for PanickingCounter {
        fn count(&self, _input: &InputPayload) -> Result<TokenCount, CountingError> {
            panic!("vocabulary corrupted")
        }
    }

    #[test]
    fn test_panic_is_caught() {
        let mut registry = LocalCounterRegistry::new();
        registry.register("gpt-4o", Arc::new(PanickingCounter));
        let counter = TokenCounter::new(registry);

        let outcome = counter.count(&InputPayload::text("hello", "test"), &gpt4o());

        assert_eq!(outcome.model_name, "gpt-4o");
        assert_eq!(outcome.token_count, 0);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Token counting failed: vocabulary corrupted")
        );
    }

    #[test]
    fn test_registered_model_is_counted() {
        let mut registry = LocalCounterRegistry::with_defaults(Arc::new(WhitespaceProvider));
        registry.register(
            "gpt-4o-mini",
            Arc::new(crate::token::registry::EncodingCounter::new(
                Arc::new(WhitespaceProvider),
                "o200k_base",
            )),
        );
        let counter = TokenCounter::new(registry);
        let model = ModelDescriptor::new("gpt-4o-mini", 128_000, "local");

        let outcome = counter.count(&InputPayload::text("a b c d", "test"), &model);
        assert_eq!(outcome.token_count, 4);
        assert!(outcome.error.is_none());
    }
}
