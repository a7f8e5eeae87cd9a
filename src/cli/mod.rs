//! Command-line interface definition and dispatch for refine.
//!
//! Uses [`clap`] for argument parsing with derive macros. Each subcommand is
//! routed to its handler.

use std::path::PathBuf;

use crate::{chat, config, provider};
use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

/// Top-level CLI structure for refine.
#[derive(Parser, Debug)]
#[command(
    name = "refine",
    about = "Interactive code generation with bounded retries and feedback refinement"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the refine CLI.
///
/// The `///` doc comments on variants double as `--help` text rendered by clap.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive session
    Chat {
        /// Provider to use (anthropic, openai, openrouter, ollama)
        #[arg(long)]
        provider: Option<String>,
        /// Model to use (overrides config)
        #[arg(short, long)]
        model: Option<String>,
        /// Do not offer feedback on answers
        #[arg(long)]
        no_refine: bool,
        /// Retries after an unusable response (overrides config)
        #[arg(long)]
        max_retries: Option<u32>,
        /// Write the session as JSON to this path on exit
        #[arg(long)]
        transcript: Option<PathBuf>,
    },
    /// Ask a one-shot question
    Ask {
        /// The question to ask
        query: Vec<String>,
        /// Model to use (overrides config)
        #[arg(short, long)]
        model: Option<String>,
        /// Provider to use (anthropic, openai, openrouter, ollama)
        #[arg(short, long)]
        provider: Option<String>,
        /// Write the turn as JSON to this path
        #[arg(long)]
        transcript: Option<PathBuf>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Subcommands for the `config` command.
///
/// Reads refine's TOML configuration file stored at the XDG config path
/// (`~/.config/refine/config.toml`).
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current config
    Show,
}

/// Parses command-line arguments into a [`Cli`] struct.
///
/// Delegates to [`clap::Parser::parse`], which exits the process on invalid input.
pub fn parse() -> Cli {
    Cli::parse()
}

/// Dispatches the parsed CLI command to its handler.
pub async fn run(cli: Cli, mut config: config::Config) -> Result<()> {
    match cli.command {
        Commands::Chat {
            provider: provider_name,
            model,
            no_refine,
            max_retries,
            transcript,
        } => {
            let selection =
                provider::resolve_model(provider_name.as_deref(), model.as_deref(), &config)?;
            config.model = selection.model.clone();
            let options = chat::ChatOptions {
                no_refine,
                max_retries,
                transcript,
            };
            chat::run_chat(config, &selection, options).await
        }
        Commands::Ask {
            query,
            model,
            provider: provider_name,
            transcript,
        } => {
            let query = query.join(" ");
            if query.trim().is_empty() {
                anyhow::bail!("No query provided. Usage: refine ask \"your question here\"");
            }
            let selection =
                provider::resolve_model(provider_name.as_deref(), model.as_deref(), &config)?;
            config.model = selection.model.clone();
            chat::run_ask(config, &selection, &query, transcript).await
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let path = config::Config::config_path()?;
                println!("{} {}", "Config path:".bold(), path.display());
                println!(
                    "{} {}",
                    "Log directory:".bold(),
                    config::Config::logs_dir()?.display()
                );
                println!();
                let toml_str = toml::to_string_pretty(&config)?;
                println!("{}", toml_str);
                Ok(())
            }
        },
    }
}
