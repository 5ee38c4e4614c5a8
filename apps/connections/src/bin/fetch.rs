//! Usage: `fetch [YYYY-MM-DD]`. Defaults to today's local date.

use std::process::ExitCode;

use chrono::Local;
use tracing::error;

use connections::config::Config;
use connections::errors::PipelineError;
use connections::fetcher::{fetch_into_store, FetchOutcome, HttpPuzzleSource};
use connections::models::puzzle::format_puzzle_date;
use connections::telemetry::init_tracing;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.rust_log);

    let raw_date = std::env::args()
        .nth(1)
        .unwrap_or_else(|| format_puzzle_date(Local::now().date_naive()));

    match run(&config, &raw_date).await {
        Ok(outcome) => {
            let verb = if outcome.replaced { "Updated" } else { "Added" };
            println!(
                "{verb} {} in {} ({} entries)",
                outcome.date,
                config.solutions_file.display(),
                outcome.store_len
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Fetch for {raw_date} failed: {e}");
            eprintln!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(config: &Config, raw_date: &str) -> Result<FetchOutcome, PipelineError> {
    let source = HttpPuzzleSource::new(config.base_url.clone(), config.fetch_timeout)?;
    fetch_into_store(&source, &config.solutions_file, raw_date).await
}
