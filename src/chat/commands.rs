//! Slash command handlers for the chat REPL.
//!
//! Dispatches `/history`, `/export`, and `/help`. Commands only ever read the
//! conversation history. Returns a [`CommandAction`] so the REPL can decide
//! how to proceed.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::format;
use crate::history::InteractionRecord;
use crate::transcript::Transcript;

/// Action returned by slash command handling.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CommandAction {
    /// Command was handled successfully; continue the REPL loop.
    Continue,
    /// Unknown command was entered.
    Unknown(String),
}

/// Dispatch and handle a slash command.
pub(crate) fn handle_slash_command(
    command: &str,
    history: &[InteractionRecord],
    session_id: &str,
    model: &str,
) -> Result<CommandAction> {
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match name {
        "/history" => {
            if history.is_empty() {
                println!("{}", "No interactions yet.".dimmed());
            }
            for (i, record) in history.iter().enumerate() {
                println!("{}", format::format_record(i, record));
                println!();
            }
            Ok(CommandAction::Continue)
        }
        "/export" => {
            if arg.is_empty() {
                println!("{} Usage: /export <path>", "?".yellow());
                return Ok(CommandAction::Continue);
            }
            match Transcript::new(session_id, model, history).write(Path::new(arg)) {
                Ok(()) => println!(
                    "{}",
                    format!("Exported {} interactions to {}", history.len(), arg).dimmed()
                ),
                Err(e) => {
                    eprintln!("{} export failed: {:#}", "error:".red().bold(), e);
                }
            }
            Ok(CommandAction::Continue)
        }
        "/help" => {
            println!("{}", "Commands:".bold());
            println!("  {} - show logged interactions", "/history".cyan());
            println!("  {} - write the session as JSON", "/export <path>".cyan());
            println!("  {} - show this help", "/help".cyan());
            println!("  {} - cancel the current input", "Ctrl+C".cyan());
            println!("  {} - exit", "Ctrl+D".cyan());
            Ok(CommandAction::Continue)
        }
        _ => Ok(CommandAction::Unknown(command.to_string())),
    }
}
