mod cli;
mod config;
mod core;
mod server;
mod utils;

use std::process::ExitCode;

use crate::cli::Cli;
use crate::core::error::ServiceResult;
use crate::utils::logging;

/// Time HTTP Server
///
/// Serves `GET /api/time?tz=<zone>[,<zone>...]` and shuts down gracefully on
/// SIGINT or SIGTERM.
///
/// Usage: cargo run --bin http-server-time -- --port 8080
#[tokio::main]
async fn main() -> ExitCode {
    match start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn start() -> ServiceResult<()> {
    let config = Cli::parse_config()?;

    logging::init_logging(config.json_logs)?;
    tracing::info!(addr = %config.bind_addr, "Starting Time HTTP server");

    if let Err(e) = server::run(config).await {
        tracing::error!(fatal = true, error = %e, "Time HTTP server terminated");
        return Err(e);
    }

    Ok(())
}
