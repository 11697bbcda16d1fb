//! # tc - cross-model token counter
//!
//! Counts the tokens of a text or a chat message list for one or more models
//! and checks the count against each model's context budget.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use tc::adapters::tiktoken::TiktokenProvider;
//! use tc::domain::{InputPayload, ModelRegistry};
//! use tc::token::{BudgetConfig, TokenCounter};
//!
//! let counter = TokenCounter::with_provider(Arc::new(TiktokenProvider::new()));
//! let models = ModelRegistry::new().resolve(&["gpt-4o"])?;
//! let input = InputPayload::text("Hello world", "stdin");
//!
//! for record in tc::evaluate(&input, &models, &counter, &BudgetConfig::default()) {
//!     println!("{}: {} tokens", record.model_name, record.token_count);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - **Domain**: messages, model descriptors, input payloads and the tokenizer port
//! - **Token**: strategy dispatch, local counter registry and budget analysis
//! - **Adapters**: tiktoken tables, input reading and output rendering
//! - **Config**: CLI arguments, `tc.toml` loading and validation

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod token;

use tracing::debug;

use crate::domain::{InputPayload, ModelDescriptor};
use crate::token::{BudgetAnalyzer, BudgetConfig, BudgetRecord, TokenCounter};

/// Count and analyse `input` for every model, in request order
pub fn evaluate(
    input: &InputPayload,
    models: &[ModelDescriptor],
    counter: &TokenCounter,
    config: &BudgetConfig,
) -> Vec<BudgetRecord> {
    let analyzer = BudgetAnalyzer::new();
    models
        .iter()
        .map(|model| {
            let outcome = counter.count(input, model);
            let record = analyzer.analyze(&outcome, model, config);
            debug!(
                model = %record.model_name,
                pct_used = record.percent_used,
                remaining = record.remaining_tokens,
                "Analysed budget"
            );
            record
        })
        .collect()
}

/// Process exit status derived from a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Ok,
    /// Runtime failure, or counting failed for at least one model
    Failure,
    /// Some model's input exceeds its budget
    BudgetExceeded,
}

impl ExitStatus {
    /// Counting errors take precedence over exceeded budgets
    pub fn from_records(records: &[BudgetRecord]) -> Self {
        if records.iter().any(|r| r.error.is_some() && !r.is_exceeded()) {
            Self::Failure
        } else if records.iter().any(BudgetRecord::is_exceeded) {
            Self::BudgetExceeded
        } else {
            Self::Ok
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Failure => 1,
            Self::BudgetExceeded => 2,
        }
    }
}
