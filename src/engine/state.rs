//! Session state owned by the interaction loop.

use tracing::debug;

use crate::history::{ConversationHistory, InteractionRecord};

/// Where the loop is in a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingQuery,
    Generating,
    Validating,
    Retrying,
    AwaitingFeedback,
    Refining,
    Terminal,
}

/// Mutable state of one session.
///
/// Only the loop's transition logic touches it. A record can only be logged
/// from a pending response, so a turn that never got a response leaves no
/// trace in the history.
#[derive(Debug)]
pub struct SessionState {
    history: ConversationHistory,
    current_query: Option<String>,
    pending_response: Option<String>,
    retry_count: u32,
    state: LoopState,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            history: ConversationHistory::new(),
            current_query: None,
            pending_response: None,
            retry_count: 0,
            state: LoopState::AwaitingQuery,
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn into_history(self) -> ConversationHistory {
        self.history
    }

    pub fn current_query(&self) -> Option<&str> {
        self.current_query.as_deref()
    }

    pub fn pending_response(&self) -> Option<&str> {
        self.pending_response.as_deref()
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub(super) fn enter(&mut self, next: LoopState) {
        debug!(from = ?self.state, to = ?next, retries = self.retry_count, "transition");
        self.state = next;
    }

    /// Starts a turn for `query`.
    pub(super) fn begin(&mut self, query: &str) {
        self.current_query = Some(query.to_string());
        self.pending_response = None;
        self.retry_count = 0;
    }

    pub(super) fn set_pending(&mut self, response: &str) {
        self.pending_response = Some(response.to_string());
    }

    pub(super) fn bump_retry(&mut self) {
        self.retry_count += 1;
    }

    /// Starts the refinement pass with a fresh retry budget.
    pub(super) fn reset_retries(&mut self) {
        self.retry_count = 0;
    }

    /// Logs the pending response against the current query.
    ///
    /// Returns `false` when there is nothing to log.
    pub(super) fn log_pending(&mut self, feedback: Option<String>) -> bool {
        let (Some(query), Some(response)) = (self.current_query.as_ref(), self.pending_response.take())
        else {
            return false;
        };
        debug!(record = self.history.len(), feedback = feedback.is_some(), "logging interaction");
        self.history
            .append(InteractionRecord::new(query.clone(), response, feedback));
        true
    }

    /// Ends the turn, keeping whatever was logged.
    pub(super) fn finish(&mut self) {
        self.current_query = None;
        self.pending_response = None;
        self.enter(LoopState::Terminal);
    }

    /// Drops the in-flight turn without logging and waits for a new query.
    pub(super) fn discard(&mut self) {
        self.current_query = None;
        self.pending_response = None;
        self.retry_count = 0;
        self.enter(LoopState::AwaitingQuery);
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
