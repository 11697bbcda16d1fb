use clap::{ArgGroup, Parser};
use std::path::PathBuf;

use crate::domain::InputSource;

/// Cross-model token counting command-line tool
#[derive(Parser, Debug, Clone)]
#[command(
    name = "tc",
    version,
    about,
    long_about = None,
    after_help = "Examples:\n  echo \"Hello world\" | tc\n  tc --file prompt.txt\n  tc --messages conversation.json --json\n  tc --model gpt-4o --reserve 1000\n  tc --model claude-3-5-sonnet --reserve-pct 0.1"
)]
#[command(group(ArgGroup::new("input").args(["file", "messages"])))]
#[command(group(ArgGroup::new("reserve_mode").args(["reserve", "reserve_pct"])))]
pub struct Cli {
    /// Read input from file instead of stdin
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Read structured messages from JSON file
    #[arg(long, value_name = "PATH")]
    pub messages: Option<PathBuf>,

    /// Model to count tokens for (can be repeated)
    #[arg(long = "model", value_name = "MODEL")]
    pub models: Vec<String>,

    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,

    /// Override model context limit
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_tokens: Option<u64>,

    /// Absolute number of tokens to reserve for output
    #[arg(long, value_name = "N")]
    pub reserve: Option<u64>,

    /// Fraction of context to reserve for output [default: 0.2]
    #[arg(long, value_name = "FLOAT", value_parser = parse_fraction)]
    pub reserve_pct: Option<f64>,

    /// Path to the configuration file
    #[arg(short, long, env = "TC_CONFIG", default_value = "tc.toml")]
    pub config: PathBuf,

    /// Disable coloured output
    #[arg(long, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_color: bool,
}

impl Cli {
    /// Where to read input from
    pub fn input_source(&self) -> InputSource {
        match (&self.messages, &self.file) {
            (Some(path), _) => InputSource::Messages(path.clone()),
            (None, Some(path)) => InputSource::File(path.clone()),
            (None, None) => InputSource::Stdin,
        }
    }
}

fn parse_fraction(value: &str) -> Result<f64, String> {
    let fraction: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if (0.0..=1.0).contains(&fraction) {
        Ok(fraction)
    } else {
        Err("--reserve-pct must be in range [0.0, 1.0]".to_string())
    }
}
