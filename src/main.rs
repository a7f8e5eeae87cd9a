//! Entry point for refine, an interactive code-generation assistant.
//!
//! Loads environment variables and configuration, starts file logging,
//! parses CLI arguments via [`cli`], and dispatches to the chosen subcommand.

mod chat;
mod cli;
mod config;
mod constants;
mod engine;
mod error;
mod execution;
mod format;
mod history;
mod logging;
mod output;
mod policy;
mod provider;
mod response;
mod tokens;
mod transcript;
mod validator;

use anyhow::Result;

/// Runs the refine CLI.
///
/// `.env` files are silently ignored if absent. The logging guard is held
/// until exit so buffered log lines are flushed.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = cli::parse();
    let config = config::Config::load()?;
    let _guard = logging::init(&config)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "refine starting");
    cli::run(cli, config).await
}
