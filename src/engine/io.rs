//! The human-facing seam: line-oriented prompts and display.

use anyhow::Result;

use crate::error::TurnError;
use crate::history::InteractionRecord;

/// What the human entered at the query prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryInput {
    /// A natural-language query.
    Query(String),
    /// A slash command such as `/history`.
    Command(String),
    /// Input was interrupted (Ctrl+C).
    Cancel,
    /// The human is done (Ctrl+D).
    End,
}

/// What the human entered at a feedback prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackInput {
    Feedback(String),
    /// Nothing entered: the response is accepted as is.
    Skip,
    /// Input was interrupted; the turn is dropped without a record.
    Cancel,
}

impl FeedbackInput {
    /// Maps a raw line to feedback, treating blank input as [`FeedbackInput::Skip`].
    pub fn from_line(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            Self::Skip
        } else {
            Self::Feedback(line.to_string())
        }
    }
}

/// Why feedback is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    /// The model asked a question.
    Clarification,
    /// The model answered; the human may ask for one refinement.
    Refinement,
}

/// Something the loop wants shown to the human.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output<'a> {
    /// A usable answer. `refined` is set for the answer to a refinement.
    Answer { response: &'a str, refined: bool },
    /// A question the model asked back.
    Question { response: &'a str },
    /// Progress information (retries, refinement in progress).
    Notice(&'a str),
}

/// Line-oriented human interaction used by [`super::InteractionLoop`].
///
/// Prompts block until the human answers. `display` is async so a terminal
/// implementation can do follow-up work (such as running generated code)
/// before the loop continues.
#[async_trait::async_trait(?Send)]
pub trait HumanIo {
    fn prompt_for_query(&mut self) -> Result<QueryInput>;

    fn prompt_for_feedback(&mut self, kind: FeedbackKind) -> Result<FeedbackInput>;

    async fn display(&mut self, output: Output<'_>);

    /// Reports a failed turn.
    fn report(&mut self, error: &TurnError);

    /// Handles a slash command with a read-only view of the history.
    fn handle_command(&mut self, command: &str, history: &[InteractionRecord]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_feedback_is_skip() {
        assert_eq!(FeedbackInput::from_line(""), FeedbackInput::Skip);
        assert_eq!(FeedbackInput::from_line("   "), FeedbackInput::Skip);
        assert_eq!(
            FeedbackInput::from_line(" use recursion "),
            FeedbackInput::Feedback("use recursion".to_string())
        );
    }
}
