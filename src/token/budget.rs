//! Token budget analysis

use serde::Serialize;

use crate::domain::ModelDescriptor;

use super::counter::{Accuracy, CountingOutcome};

/// Usage at or above this fraction is a warning
pub const WARNING_THRESHOLD: f64 = 0.80;
/// Usage at or above this fraction exceeds the budget
pub const ERROR_THRESHOLD: f64 = 0.95;
/// Reported usage when there is demand but no capacity
pub const OVERFLOW_PCT: f64 = 999.99;
/// Default share of the effective limit reserved for output
pub const DEFAULT_RESERVE_PCT: f64 = 0.2;

pub const NEAR_LIMIT: &str = "warning: near limit";
pub const EXCEEDS_BUDGET: &str = "error: exceeds budget";

/// Budget settings shared by every model in one run.
///
/// `reserve` and `reserve_pct` are alternatives; when `reserve` is set the
/// percentage is ignored. Range checks happen when settings are validated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetConfig {
    /// Override that can only shrink a model's context limit
    pub max_tokens: Option<u64>,
    /// Absolute number of tokens reserved for output
    pub reserve: Option<u64>,
    /// Fraction of the effective limit reserved for output, in [0, 1]
    pub reserve_pct: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_tokens: None,
            reserve: None,
            reserve_pct: DEFAULT_RESERVE_PCT,
        }
    }
}

/// Budget analysis for one model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetRecord {
    pub model_name: String,
    pub token_count: u64,
    pub context_limit: u64,
    pub effective_limit: u64,
    pub reserve_size: u64,
    /// Negative when the input plus reserve does not fit
    pub remaining_tokens: i64,
    /// Fraction of the effective limit used, rounded to 2 decimals
    pub percent_used: f64,
    pub warning: Option<String>,
    pub error: Option<String>,
    pub accuracy: Accuracy,
}

impl BudgetRecord {
    pub fn is_exceeded(&self) -> bool {
        self.error.as_deref() == Some(EXCEEDS_BUDGET)
    }
}

/// Threshold classification of a budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    Ok,
    NearLimit,
    Exceeded,
}

/// Derives budget records from counting outcomes
#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetAnalyzer;

impl BudgetAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Perform budget analysis with thresholds.
    ///
    /// A failed count short-circuits: the record carries the counting error
    /// and zeroed arithmetic.
    pub fn analyze(
        &self,
        outcome: &CountingOutcome,
        model: &ModelDescriptor,
        config: &BudgetConfig,
    ) -> BudgetRecord {
        if let Some(error) = &outcome.error {
            return BudgetRecord {
                model_name: model.name.clone(),
                token_count: 0,
                context_limit: model.context_limit,
                effective_limit: model.context_limit,
                reserve_size: 0,
                remaining_tokens: 0,
                percent_used: 0.0,
                warning: None,
                error: Some(error.clone()),
                accuracy: outcome.accuracy,
            };
        }

        let tokens = outcome.token_count;
        let effective_limit = effective_limit(model.context_limit, config);
        let reserve_size = reserve_size(effective_limit, config);
        let remaining_tokens = to_signed(effective_limit)
            .saturating_sub(to_signed(reserve_size))
            .saturating_sub(to_signed(tokens));
        let percent_used = percent_used(tokens, effective_limit);

        let (warning, error) = match classify(percent_used, remaining_tokens) {
            BudgetStatus::Exceeded => (None, Some(EXCEEDS_BUDGET.to_string())),
            BudgetStatus::NearLimit => (Some(NEAR_LIMIT.to_string()), None),
            BudgetStatus::Ok => (None, None),
        };

        BudgetRecord {
            model_name: model.name.clone(),
            token_count: tokens,
            context_limit: model.context_limit,
            effective_limit,
            reserve_size,
            remaining_tokens,
            percent_used,
            warning,
            error,
            accuracy: outcome.accuracy,
        }
    }
}

/// Convenience wrapper around [`BudgetAnalyzer::analyze`]
pub fn analyze(
    outcome: &CountingOutcome,
    model: &ModelDescriptor,
    config: &BudgetConfig,
) -> BudgetRecord {
    BudgetAnalyzer::new().analyze(outcome, model, config)
}

/// The override can only shrink capacity, never extend it.
pub fn effective_limit(context_limit: u64, config: &BudgetConfig) -> u64 {
    match config.max_tokens {
        Some(max_tokens) => context_limit.min(max_tokens),
        None => context_limit,
    }
}

/// Absolute reserve when given, otherwise the truncated percentage share
pub fn reserve_size(effective_limit: u64, config: &BudgetConfig) -> u64 {
    match config.reserve {
        Some(reserve) => reserve,
        None => (effective_limit as f64 * config.reserve_pct).floor() as u64,
    }
}

/// `tokens / limit` rounded to 2 decimals.
///
/// The f64 ratio is rounded on its exact binary value, so 335/1000 (stored
/// just above 0.335) gives 0.34 while the exact tie 100/800 gives 0.12.
/// Zero capacity yields 0.0 for no demand and [`OVERFLOW_PCT`] otherwise.
pub fn percent_used(tokens: u64, limit: u64) -> f64 {
    if limit == 0 {
        return if tokens == 0 { 0.0 } else { OVERFLOW_PCT };
    }

    let ratio = tokens as f64 / limit as f64;
    format!("{:.2}", ratio).parse().unwrap_or(ratio)
}

/// Classify after rounding. Exceeding the budget takes precedence and
/// suppresses the warning.
pub fn classify(percent_used: f64, remaining_tokens: i64) -> BudgetStatus {
    if percent_used >= ERROR_THRESHOLD || remaining_tokens < 0 {
        BudgetStatus::Exceeded
    } else if percent_used >= WARNING_THRESHOLD {
        BudgetStatus::NearLimit
    } else {
        BudgetStatus::Ok
    }
}

fn to_signed(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
