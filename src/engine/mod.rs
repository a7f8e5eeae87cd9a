//! The interaction loop.
//!
//! [`InteractionLoop`] sequences one turn at a time:
//!
//! ```text
//! AwaitingQuery → Generating → Validating ─┬─ Retry ──────→ Retrying → Generating
//!                                          ├─ AskFeedback → AwaitingFeedback → Refining → Generating
//!                                          └─ Display / Abort ───────────────→ Terminal
//! ```
//!
//! Retries re-send the identical prompt and are bounded by the policy's
//! `max_retries`. Feedback leads to at most one refinement per answer.
//! Transport failures end the turn immediately and are never retried.

mod client;
mod io;
mod state;

pub use client::CompletionClient;
pub use io::{FeedbackInput, FeedbackKind, HumanIo, Output, QueryInput};
pub use state::{LoopState, SessionState};

use anyhow::Result;
use tracing::{info, info_span, warn, Instrument};

use crate::constants::{CLARIFICATION_PREFIX, FEEDBACK_PREFIX};
use crate::error::TurnError;
use crate::history::ConversationHistory;
use crate::policy::{Decision, RefinementPolicy, Stage};
use crate::validator::{Classification, ResponseValidator};

/// How a turn ended.
#[derive(Debug)]
pub enum TurnOutcome {
    /// A response was displayed and logged.
    Resolved,
    /// The human interrupted the turn; nothing was logged for the open step.
    Cancelled,
    /// The turn failed; the error names the query.
    Failed(TurnError),
}

/// Builds the prompt for the refinement pass.
pub fn refinement_prompt(query: &str, kind: FeedbackKind, feedback: &str) -> String {
    let prefix = match kind {
        FeedbackKind::Clarification => CLARIFICATION_PREFIX,
        FeedbackKind::Refinement => FEEDBACK_PREFIX,
    };
    format!("{query}\n{prefix} {feedback}")
}

/// Drives a session against a [`CompletionClient`].
pub struct InteractionLoop<C> {
    client: C,
    validator: ResponseValidator,
    policy: RefinementPolicy,
    session: SessionState,
}

impl<C: CompletionClient> InteractionLoop<C> {
    pub fn new(client: C, validator: ResponseValidator, policy: RefinementPolicy) -> Self {
        Self {
            client,
            validator,
            policy,
            session: SessionState::new(),
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        self.session.history()
    }

    #[cfg(test)]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    #[cfg(test)]
    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_history(self) -> ConversationHistory {
        self.session.into_history()
    }

    /// Runs turns until the human ends the session.
    ///
    /// Failed turns are reported through `io` and the loop keeps going; only
    /// I/O failures of `io` itself end the session early.
    pub async fn run<I: HumanIo>(&mut self, io: &mut I) -> Result<()> {
        loop {
            self.session.enter(LoopState::AwaitingQuery);
            match io.prompt_for_query()? {
                QueryInput::Query(query) => {
                    let query = query.trim();
                    if query.is_empty() {
                        continue;
                    }
                    if let TurnOutcome::Failed(err) = self.run_turn(io, query).await? {
                        io.report(&err);
                    }
                }
                QueryInput::Command(command) => {
                    io.handle_command(&command, self.session.history().as_sequence())?;
                }
                QueryInput::Cancel => self.session.discard(),
                QueryInput::End => break,
            }
        }
        info!(records = self.session.history().len(), "session ended");
        Ok(())
    }

    /// Runs a single turn for `query`.
    pub async fn run_turn<I: HumanIo>(&mut self, io: &mut I, query: &str) -> Result<TurnOutcome> {
        let span = info_span!("turn", turn = self.session.history().len());
        self.turn(io, query).instrument(span).await
    }

    async fn turn<I: HumanIo>(&mut self, io: &mut I, query: &str) -> Result<TurnOutcome> {
        self.session.begin(query);
        let mut prompt = query.to_string();
        let mut stage = Stage::Answer;

        loop {
            self.session.enter(LoopState::Generating);
            let response = match self.client.complete(&prompt).await {
                Ok(response) => response,
                Err(source) => {
                    warn!(error = %source, "completion failed");
                    self.session.finish();
                    return Ok(TurnOutcome::Failed(TurnError::Transport {
                        query: query.to_string(),
                        source,
                    }));
                }
            };
            self.session.set_pending(&response);

            self.session.enter(LoopState::Validating);
            let classification = self.validator.classify(&response);
            let retries = self.session.retry_count();
            let decision = self.policy.next(classification, retries, stage);
            info!(?classification, ?decision, ?stage, retries, "response classified");

            let kind = match decision {
                Decision::Retry => {
                    self.session.bump_retry();
                    debug_assert!(self.session.retry_count() <= self.policy.max_retries());
                    self.session.enter(LoopState::Retrying);
                    let notice = format!(
                        "Response was not usable, retrying ({}/{})...",
                        self.session.retry_count(),
                        self.policy.max_retries()
                    );
                    io.display(Output::Notice(&notice)).await;
                    continue;
                }
                Decision::Abort => {
                    warn!(attempts = retries + 1, "retry budget exhausted");
                    self.session.log_pending(None);
                    self.session.finish();
                    return Ok(TurnOutcome::Failed(TurnError::InvalidResponse {
                        query: query.to_string(),
                        attempts: retries + 1,
                        last_response: response,
                    }));
                }
                Decision::AskFeedback => {
                    io.display(Output::Question {
                        response: &response,
                    })
                    .await;
                    FeedbackKind::Clarification
                }
                Decision::Display { offer_feedback } => {
                    let output = match classification {
                        Classification::NeedsClarification => Output::Question {
                            response: &response,
                        },
                        _ => Output::Answer {
                            response: &response,
                            refined: stage == Stage::Refinement,
                        },
                    };
                    io.display(output).await;
                    if !offer_feedback {
                        self.session.log_pending(None);
                        self.session.finish();
                        return Ok(TurnOutcome::Resolved);
                    }
                    FeedbackKind::Refinement
                }
            };

            self.session.enter(LoopState::AwaitingFeedback);
            match io.prompt_for_feedback(kind)? {
                FeedbackInput::Feedback(feedback) => {
                    prompt = refinement_prompt(query, kind, &feedback);
                    self.session.log_pending(Some(feedback));
                    self.session.reset_retries();
                    self.session.enter(LoopState::Refining);
                    stage = Stage::Refinement;
                    io.display(Output::Notice("Feedback received. Improving solution..."))
                        .await;
                }
                FeedbackInput::Skip => {
                    self.session.log_pending(None);
                    self.session.finish();
                    return Ok(TurnOutcome::Resolved);
                }
                FeedbackInput::Cancel => {
                    info!("turn cancelled while awaiting feedback");
                    self.session.discard();
                    return Ok(TurnOutcome::Cancelled);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
