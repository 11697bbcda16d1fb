//! Rendering budget records as a table or JSON

use std::io::IsTerminal;

use colored::Colorize;
use serde::Serialize;

use crate::token::BudgetRecord;

const HEADERS: [&str; 6] = [
    "model",
    "input_tokens",
    "context_limit",
    "pct_used",
    "remaining_tokens",
    "warnings",
];

/// JSON schema of one record. Field names and explicit nulls are part of
/// the output contract.
#[derive(Debug, Serialize)]
pub struct JsonRecord<'a> {
    pub model: &'a str,
    pub input_tokens: u64,
    pub context_limit: u64,
    pub pct_used: f64,
    pub remaining_tokens: i64,
    pub warning: Option<&'a str>,
    pub error: Option<&'a str>,
}

impl<'a> From<&'a BudgetRecord> for JsonRecord<'a> {
    fn from(record: &'a BudgetRecord) -> Self {
        Self {
            model: &record.model_name,
            input_tokens: record.token_count,
            context_limit: record.context_limit,
            pct_used: record.percent_used,
            remaining_tokens: record.remaining_tokens,
            warning: record.warning.as_deref(),
            error: record.error.as_deref(),
        }
    }
}

/// Whether ANSI colours should be written to stdout
pub fn should_enable_colors(no_color_flag: bool) -> bool {
    if no_color_flag {
        return false;
    }
    if std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
        return false;
    }
    std::io::stdout().is_terminal()
}

/// Apply the colour decision process-wide
pub fn configure_colors(no_color_flag: bool) {
    colored::control::set_override(should_enable_colors(no_color_flag));
}

/// Space-aligned table, one row per record
pub fn format_human_readable(records: &[BudgetRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let rows: Vec<[String; 6]> = records
        .iter()
        .map(|record| {
            [
                record.model_name.clone(),
                record.token_count.to_string(),
                record.context_limit.to_string(),
                format!("{:.2}%", record.percent_used),
                record.remaining_tokens.to_string(),
                record
                    .error
                    .as_deref()
                    .or(record.warning.as_deref())
                    .unwrap_or_default()
                    .to_string(),
            ]
        })
        .collect();

    let widths: Vec<usize> = HEADERS
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .max()
                .unwrap_or(0)
                .max(header.len())
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        HEADERS
            .iter()
            .zip(&widths)
            .map(|(header, width)| format!("{:<width$}", header, width = width))
            .collect::<Vec<_>>()
            .join("  "),
    );

    for (record, row) in records.iter().zip(&rows) {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, width))| {
                let padded = format!("{:<width$}", cell, width = width);
                if i != HEADERS.len() - 1 || cell.is_empty() {
                    padded
                } else if record.error.is_some() {
                    padded.red().to_string()
                } else {
                    padded.yellow().to_string()
                }
            })
            .collect();
        lines.push(cells.join("  "));
    }

    lines.join("\n")
}

/// Pretty-printed JSON array
pub fn format_json(records: &[BudgetRecord]) -> serde_json::Result<String> {
    let rows: Vec<JsonRecord<'_>> = records.iter().map(JsonRecord::from).collect();
    serde_json::to_string_pretty(&rows)
}
