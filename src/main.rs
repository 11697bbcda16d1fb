use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tc::adapters::input::InputReader;
use tc::adapters::output::{configure_colors, format_human_readable, format_json};
use tc::adapters::tiktoken::TiktokenProvider;
use tc::cli::Cli;
use tc::config::Settings;
use tc::domain::TokenizerProvider;
use tc::token::{LocalCounterRegistry, TokenCounter};
use tc::ExitStatus;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable with --json
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(status) => ExitCode::from(status.code() as u8),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(ExitStatus::Failure.code() as u8)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitStatus> {
    let settings = Settings::new_with_cli(cli)?;
    let models = settings.registry().resolve(&settings.requested_models)?;

    let input = InputReader::new().read(&cli.input_source())?;

    let provider: Arc<dyn TokenizerProvider> = Arc::new(TiktokenProvider::new());
    let mut local = LocalCounterRegistry::with_defaults(provider.clone());
    local.register_models(&settings.models, provider);
    let counter = TokenCounter::new(local);

    info!(models = models.len(), "Evaluating token budgets");
    let records = tc::evaluate(&input, &models, &counter, &settings.budget_config());

    configure_colors(cli.no_color);
    if cli.json {
        println!("{}", format_json(&records)?);
    } else {
        let table = format_human_readable(&records);
        if !table.is_empty() {
            println!("{}", table);
        }
    }

    Ok(ExitStatus::from_records(&records))
}
