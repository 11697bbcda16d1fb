use std::collections::HashSet;
use thiserror::Error;

use crate::adapters::tiktoken::encoding_for;
use crate::config::{BudgetSettings, Settings};
use crate::domain::{builtin_models, ModelDescriptor, TokenizerStrategy};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Conflicting settings: {0}")]
    Conflict(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Unknown model: {name}. Valid models: {available}")]
    UnknownModel { name: String, available: String },
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_budget(&settings.budget) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_models(&settings.models) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_requested(settings) {
            errors.extend(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// The absolute and percentage reserve modes are alternatives
    pub fn validate_reserve_modes(budget: &BudgetSettings) -> Result<(), Vec<ValidationError>> {
        if budget.reserve.is_some() && budget.reserve_pct.is_some() {
            Err(vec![ValidationError::Conflict(
                "budget.reserve and budget.reserve_pct are mutually exclusive".to_string(),
            )])
        } else {
            Ok(())
        }
    }

    fn validate_budget(budget: &BudgetSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_reserve_modes(budget) {
            errors.extend(e);
        }

        if let Some(reserve_pct) = budget.reserve_pct {
            if !(0.0..=1.0).contains(&reserve_pct) {
                errors.push(ValidationError::InvalidValue {
                    field: "budget.reserve_pct".to_string(),
                    reason: format!("{} is outside the range [0.0, 1.0]", reserve_pct),
                });
            }
        }

        if budget.max_tokens == Some(0) {
            errors.push(ValidationError::InvalidValue {
                field: "budget.max_tokens".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_models(models: &[ModelDescriptor]) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let builtin: HashSet<String> = builtin_models().into_iter().map(|m| m.name).collect();
        let mut seen = HashSet::new();

        for (i, model) in models.iter().enumerate() {
            if model.name.trim().is_empty() {
                errors.push(ValidationError::MissingField(format!("models[{}].name", i)));
                continue;
            }

            if builtin.contains(&model.name) {
                errors.push(ValidationError::Duplicate(format!(
                    "Model '{}' is built in and cannot be redefined",
                    model.name
                )));
            } else if !seen.insert(model.name.as_str()) {
                errors.push(ValidationError::Duplicate(format!(
                    "Model name '{}' is defined more than once",
                    model.name
                )));
            }

            if let Some(encoding) = &model.encoding {
                if model.tokenizer_strategy != TokenizerStrategy::ExactLocal {
                    errors.push(ValidationError::Conflict(format!(
                        "Model '{}' sets an encoding but uses the '{}' tokenizer",
                        model.name, model.tokenizer_strategy
                    )));
                } else if encoding_for(encoding).is_none() {
                    errors.push(ValidationError::InvalidValue {
                        field: format!("models[{}].encoding", i),
                        reason: format!("Unknown tiktoken encoding '{}'", encoding),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_requested(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if settings.requested_models.is_empty() {
            errors.push(ValidationError::MissingField("defaults.models".to_string()));
        }

        let registry = settings.registry();
        for name in &settings.requested_models {
            if !registry.contains(name) {
                errors.push(ValidationError::UnknownModel {
                    name: name.clone(),
                    available: registry.available_models().join(", "),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
