//! Interactive chat REPL for refine.
//!
//! [`TerminalIo`] is the terminal implementation of the engine's
//! [`HumanIo`] seam, built on [`rustyline`] for line editing and persistent
//! query history. [`run_chat`] wires it to a provider-backed
//! [`InteractionLoop`]; [`run_ask`] runs a single turn.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::engine::{
    FeedbackInput, FeedbackKind, HumanIo, InteractionLoop, Output, QueryInput, TurnOutcome,
};
use crate::error::TurnError;
use crate::execution::{ExecutionOutcome, Executor};
use crate::format;
use crate::history::{ConversationHistory, InteractionRecord};
use crate::policy::RefinementPolicy;
use crate::provider::{ModelSelection, Provider, RigCompletionClient};
use crate::response::ParsedResponse;
use crate::tokens;
use crate::transcript::{new_session_id, Transcript};
use crate::validator::{DetectionRules, ResponseValidator};

/// Per-invocation overrides from the command line.
#[derive(Debug, Default)]
pub struct ChatOptions {
    /// Never offer feedback on answers.
    pub no_refine: bool,
    /// Overrides `refinement.max_retries`.
    pub max_retries: Option<u32>,
    /// Write the session to this path on exit.
    pub transcript: Option<PathBuf>,
}

/// Terminal-backed [`HumanIo`].
///
/// # Readline behavior
///
/// - **Ctrl+C**: cancels the current input (or the open turn at a feedback prompt)
/// - **Ctrl+D**: ends the session; at a feedback prompt it accepts the response
/// - Query history is persisted to `~/.cache/refine/query_history.txt`
pub struct TerminalIo {
    editor: DefaultEditor,
    history_path: Option<PathBuf>,
    session_id: String,
    model: String,
    executor: Option<Executor>,
}

impl TerminalIo {
    pub fn new(config: &Config, session_id: &str) -> Result<Self> {
        let mut editor = DefaultEditor::new()?;
        let history_path = Config::cache_dir()
            .map(|dir| dir.join(crate::constants::HISTORY_FILENAME))
            .ok();
        if let Some(path) = history_path.as_ref().filter(|p| p.exists()) {
            let _ = editor.load_history(path);
        }

        let executor = config
            .execution_enabled()
            .then(|| Executor::from_config(config));

        Ok(Self {
            editor,
            history_path,
            session_id: session_id.to_string(),
            model: config.model.clone(),
            executor,
        })
    }

    /// Persist query history. Failures are logged, not fatal.
    pub fn save_history(&mut self) {
        let Some(path) = &self.history_path else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(error = %e, "could not create history directory");
                return;
            }
        }
        if let Err(e) = self.editor.save_history(path) {
            warn!(error = %e, "could not save query history");
        }
    }

    async fn show_answer(&mut self, response: &str, refined: bool) {
        println!();
        println!("{}", format::format_answer(response, refined));

        match tokens::count_tokens(response, &self.model) {
            Ok(count) => println!(
                "{}",
                format!("Tokens: {}", tokens::format_number(count)).dimmed()
            ),
            Err(e) => debug!(error = %e, "token counting unavailable"),
        }

        let Some(executor) = &self.executor else {
            return;
        };
        let parsed = ParsedResponse::parse(response);
        let Some(block) = parsed.first_in("python") else {
            return;
        };

        println!();
        println!("{}", format::section_header("EXECUTION"));
        match executor.run(&block.body).await {
            Ok(ExecutionOutcome::Completed { stdout }) => {
                if stdout.is_empty() {
                    println!("{}", "(no output)".dimmed());
                } else {
                    println!("{stdout}");
                }
            }
            Ok(ExecutionOutcome::Failed { stderr }) => {
                println!("{} {}", "failed:".red().bold(), stderr);
            }
            Ok(ExecutionOutcome::TimedOut) => println!(
                "{} execution exceeded {}s",
                "timeout:".red().bold(),
                executor.timeout().as_secs()
            ),
            Ok(ExecutionOutcome::Blocked { module }) => println!(
                "{} imports banned module `{}`, not executed",
                "blocked:".yellow().bold(),
                module
            ),
            Err(e) => eprintln!("{} {}", "error:".red().bold(), e),
        }
    }
}

#[async_trait(?Send)]
impl HumanIo for TerminalIo {
    fn prompt_for_query(&mut self) -> Result<QueryInput> {
        match self.editor.readline(&format!("{} ", ">".green().bold())) {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.starts_with('/') {
                    return Ok(QueryInput::Command(line));
                }
                if !line.is_empty() {
                    let _ = self.editor.add_history_entry(&line);
                }
                Ok(QueryInput::Query(line))
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".dimmed());
                Ok(QueryInput::Cancel)
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "goodbye.".dimmed());
                Ok(QueryInput::End)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn prompt_for_feedback(&mut self, kind: FeedbackKind) -> Result<FeedbackInput> {
        let prompt = match kind {
            FeedbackKind::Clarification => "Your clarification: ",
            FeedbackKind::Refinement => "Provide feedback (or press enter to continue): ",
        };
        println!();
        match self.editor.readline(&prompt.yellow().to_string()) {
            Ok(line) => Ok(FeedbackInput::from_line(&line)),
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".dimmed());
                Ok(FeedbackInput::Cancel)
            }
            Err(ReadlineError::Eof) => Ok(FeedbackInput::Skip),
            Err(e) => Err(e.into()),
        }
    }

    async fn display(&mut self, output: Output<'_>) {
        match output {
            Output::Answer { response, refined } => self.show_answer(response, refined).await,
            Output::Question { response } => {
                println!();
                println!("{}", format::format_question(response));
            }
            Output::Notice(text) => println!("{}", text.dimmed()),
        }
    }

    fn report(&mut self, error: &TurnError) {
        eprintln!("{} {}", "error:".red().bold(), error);
        if let TurnError::InvalidResponse { last_response, .. } = error {
            eprintln!("{}", "Last response:".dimmed());
            eprintln!("{}", format::render_markdown_lite(last_response).dimmed());
        }
        println!();
    }

    fn handle_command(&mut self, command: &str, history: &[InteractionRecord]) -> Result<()> {
        match commands::handle_slash_command(command, history, &self.session_id, &self.model)? {
            commands::CommandAction::Continue => {}
            commands::CommandAction::Unknown(cmd) => {
                println!("{} Unknown command: {} (try /help)", "?".yellow(), cmd);
            }
        }
        Ok(())
    }
}

fn build_loop(
    config: &Config,
    selection: &ModelSelection,
    policy: RefinementPolicy,
) -> Result<InteractionLoop<RigCompletionClient>> {
    let provider = Provider::from_config(config, selection)?;
    let client = RigCompletionClient::new(
        provider,
        config.system_prompt.clone(),
        config.request_timeout(),
        config.stream_output(),
    );
    let validator = ResponseValidator::new(DetectionRules::from_config(config)?);
    Ok(InteractionLoop::new(client, validator, policy))
}

fn write_transcript(
    path: &std::path::Path,
    session_id: &str,
    model: &str,
    history: &ConversationHistory,
) -> Result<()> {
    Transcript::new(session_id, model, history.as_sequence()).write(path)?;
    println!(
        "{}",
        format!("Transcript written to {}", path.display()).dimmed()
    );
    Ok(())
}

/// Runs the interactive chat REPL until Ctrl+D.
pub async fn run_chat(config: Config, selection: &ModelSelection, options: ChatOptions) -> Result<()> {
    let policy = RefinementPolicy::new(
        options.max_retries.unwrap_or_else(|| config.max_retries()),
        config.iterative_refinement() && !options.no_refine,
    );
    let mut engine = build_loop(&config, selection, policy)?;

    let session_id = new_session_id();
    let mut io = TerminalIo::new(&config, &session_id)?;
    info!(
        session = %session_id,
        model = %selection.model,
        max_retries = policy.max_retries(),
        iterative = policy.iterative_refinement(),
        "chat session started"
    );

    let refinement = if policy.iterative_refinement() {
        "on"
    } else {
        "off"
    };
    println!(
        "{} [session: {}] [model: {}] [refinement: {}] (/help for commands, Ctrl+D to exit)",
        "refine".bold().cyan(),
        session_id[..8].yellow(),
        selection.model.yellow(),
        refinement.yellow(),
    );
    println!();

    // The log outlives a failed session so the transcript can still be written.
    let result = engine.run(&mut io).await;
    io.save_history();
    if let Err(e) = &result {
        warn!(error = %format!("{e:#}"), "session ended with an error");
    }

    let history = engine.into_history();
    let feedback_count = history
        .as_sequence()
        .iter()
        .filter(|r| r.feedback().is_some())
        .count();
    println!(
        "{}",
        format!(
            "{} interactions logged, {} with feedback.",
            history.len(),
            feedback_count
        )
        .dimmed()
    );

    if let Some(path) = &options.transcript {
        write_transcript(path, &session_id, &selection.model, &history)?;
    }
    result
}

/// Runs a single turn for `query` and exits.
///
/// Answers are not offered for refinement; clarifying questions still are.
pub async fn run_ask(
    config: Config,
    selection: &ModelSelection,
    query: &str,
    transcript: Option<PathBuf>,
) -> Result<()> {
    let policy = RefinementPolicy::new(config.max_retries(), false);
    let mut engine = build_loop(&config, selection, policy)?;

    let session_id = new_session_id();
    let mut io = TerminalIo::new(&config, &session_id)?;

    println!(
        "{} [model: {}]",
        "refine".bold().cyan(),
        selection.model.yellow(),
    );
    println!();
    println!("{} {}", ">".green().bold(), query);

    let outcome = engine.run_turn(&mut io, query).await?;
    if let Some(path) = &transcript {
        write_transcript(path, &session_id, &selection.model, engine.history())?;
    }

    match outcome {
        TurnOutcome::Resolved | TurnOutcome::Cancelled => Ok(()),
        TurnOutcome::Failed(err) => Err(err.into()),
    }
}
