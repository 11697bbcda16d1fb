//! Model descriptors and the model registry

use serde::{Deserialize, Serialize};

/// How tokens are counted for a model.
///
/// Serialized as the plain strings `"local"` and `"provider"`. Any other
/// string is kept verbatim so the counting engine can report it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TokenizerStrategy {
    /// Exact counting with a tokenizer bundled with the tool
    ExactLocal,
    /// Counting delegated to the model provider's API
    RemoteProvider,
    /// Unrecognized strategy name
    Unknown(String),
}

impl TokenizerStrategy {
    pub fn as_str(&self) -> &str {
        match self {
            TokenizerStrategy::ExactLocal => "local",
            TokenizerStrategy::RemoteProvider => "provider",
            TokenizerStrategy::Unknown(name) => name,
        }
    }
}

impl From<String> for TokenizerStrategy {
    fn from(value: String) -> Self {
        match value.as_str() {
            "local" => TokenizerStrategy::ExactLocal,
            "provider" => TokenizerStrategy::RemoteProvider,
            _ => TokenizerStrategy::Unknown(value),
        }
    }
}

impl From<&str> for TokenizerStrategy {
    fn from(value: &str) -> Self {
        TokenizerStrategy::from(value.to_string())
    }
}

impl From<TokenizerStrategy> for String {
    fn from(strategy: TokenizerStrategy) -> Self {
        strategy.as_str().to_string()
    }
}

impl std::fmt::Display for TokenizerStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Definition of a supported model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub name: String,
    /// Maximum number of tokens the model accepts
    pub context_limit: u64,
    #[serde(rename = "tokenizer")]
    pub tokenizer_strategy: TokenizerStrategy,
    /// Encoding used for exact local counting, when it differs from the
    /// model name (e.g. `o200k_base`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

impl ModelDescriptor {
    pub fn new(
        name: impl Into<String>,
        context_limit: u64,
        tokenizer_strategy: impl Into<TokenizerStrategy>,
    ) -> Self {
        Self {
            name: name.into(),
            context_limit,
            tokenizer_strategy: tokenizer_strategy.into(),
            encoding: None,
        }
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }
}

/// Models shipped with the tool
pub fn builtin_models() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor::new("gpt-4o", 128_000, TokenizerStrategy::ExactLocal),
        ModelDescriptor::new("claude-3-5-sonnet", 200_000, TokenizerStrategy::RemoteProvider),
    ]
}

/// Models evaluated when none are requested
pub const DEFAULT_MODELS: &[&str] = &["gpt-4o", "claude-3-5-sonnet"];

/// Registry of model definitions, in registration order
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
}

impl ModelRegistry {
    /// Registry containing only the built-in models
    pub fn new() -> Self {
        Self {
            models: builtin_models(),
        }
    }

    /// Built-in models followed by `extra`
    pub fn with_models(extra: impl IntoIterator<Item = ModelDescriptor>) -> Self {
        let mut registry = Self::new();
        registry.models.extend(extra);
        registry
    }

    /// Get model definition by name
    pub fn get(&self, name: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Get list of available model names, sorted
    pub fn available_models(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.iter().map(|m| m.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Resolve requested names to descriptors, preserving request order
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> anyhow::Result<Vec<ModelDescriptor>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name).cloned().ok_or_else(|| {
                    anyhow::anyhow!(
                        "Unknown model: {}. Valid models: {}",
                        name,
                        self.available_models().join(", ")
                    )
                })
            })
            .collect()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
