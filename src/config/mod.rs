use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

pub mod validator;

use crate::cli::Cli;
use crate::domain::{ModelDescriptor, ModelRegistry, DEFAULT_MODELS};
use crate::token::{BudgetConfig, DEFAULT_RESERVE_PCT};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub budget: BudgetSettings,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// Additional model definitions, appended to the built-in registry
    #[serde(default)]
    pub models: Vec<ModelDescriptor>,
    /// Models requested for this run; filled from the CLI or `defaults`
    #[serde(skip)]
    pub requested_models: Vec<String>,
}

/// The `[budget]` section. At most one reserve mode may be set; the default
/// percentage applies only when neither is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct BudgetSettings {
    #[serde(default)]
    pub max_tokens: Option<u64>,
    #[serde(default)]
    pub reserve: Option<u64>,
    #[serde(default)]
    pub reserve_pct: Option<f64>,
}

impl BudgetSettings {
    /// Budget used for analysis, with the default reserve percentage filled in
    pub fn resolve(&self) -> BudgetConfig {
        BudgetConfig {
            max_tokens: self.max_tokens,
            reserve: self.reserve,
            reserve_pct: self.reserve_pct.unwrap_or(DEFAULT_RESERVE_PCT),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DefaultsConfig {
    /// Models evaluated when `--model` is not given
    #[serde(default = "default_models")]
    pub models: Vec<String>,
}

fn default_models() -> Vec<String> {
    DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            models: default_models(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            budget: BudgetSettings::default(),
            defaults: DefaultsConfig::default(),
            models: Vec::new(),
            requested_models: default_models(),
        }
    }
}

impl Settings {
    /// Create settings from CLI arguments (config file plus CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::from_file(&cli.config)?;

        // The file's own budget is checked before CLI overrides can hide a conflict
        validator::ConfigValidator::validate_reserve_modes(&settings.budget).map_err(report)?;

        // CLI > env vars > config file
        settings.apply_cli_overrides(cli);
        settings.validate()?;

        info!(
            models = ?settings.requested_models,
            budget = ?settings.budget,
            "Loaded settings"
        );
        Ok(settings)
    }

    /// Load settings from an optional TOML file, without validating
    pub fn from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .add_source(File::from(path.to_path_buf()).format(FileFormat::Toml).required(false))
            .set_default("defaults.models", default_models())?
            .build()?;

        Self::from_config(s)
    }

    /// Parse settings from TOML text, without validating
    pub fn from_toml(content: &str) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .set_default("defaults.models", default_models())?
            .build()?;

        Self::from_config(s)
    }

    fn from_config(config: Config) -> Result<Self, anyhow::Error> {
        let mut settings: Settings = config.try_deserialize()?;
        settings.requested_models = settings.defaults.models.clone();
        Ok(settings)
    }

    /// Apply CLI argument overrides to settings.
    ///
    /// An explicit reserve mode on the command line replaces the other mode
    /// from the config file.
    pub fn apply_cli_overrides(&mut self, cli: &Cli) {
        if !cli.models.is_empty() {
            self.requested_models = cli.models.clone();
        }
        if let Some(max_tokens) = cli.max_tokens {
            self.budget.max_tokens = Some(max_tokens);
        }
        if let Some(reserve) = cli.reserve {
            self.budget.reserve = Some(reserve);
            self.budget.reserve_pct = None;
        }
        if let Some(reserve_pct) = cli.reserve_pct {
            self.budget.reserve = None;
            self.budget.reserve_pct = Some(reserve_pct);
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        validator::ConfigValidator::validate(self).map_err(report)
    }

    /// Budget for this run
    pub fn budget_config(&self) -> BudgetConfig {
        self.budget.resolve()
    }

    /// Built-in models plus those defined in the config file
    pub fn registry(&self) -> ModelRegistry {
        ModelRegistry::with_models(self.models.iter().cloned())
    }
}

fn report(errors: Vec<validator::ValidationError>) -> anyhow::Error {
    let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    anyhow::anyhow!(
        "Configuration validation failed:\n{}",
        error_messages.join("\n")
    )
}
