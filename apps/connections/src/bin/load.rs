use std::process::ExitCode;

use tracing::error;

use connections::config::Config;
use connections::loader;
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

    match loader::run(&config).await {
        Ok(report) => {
            println!(
                "Loaded {} solutions into {} ({} skipped)",
                report.upserted, config.db_name, report.skipped
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Load failed: {e}");
            eprintln!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
