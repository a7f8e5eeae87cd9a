use super::*;
use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::TransportError;
use crate::history::InteractionRecord;
use crate::validator::ResponseValidator;

const CODE_ANSWER: &str = "[CODE]\n```python\ndef reverse(s: str) -> str:\n    return s[::-1]\n```\n[EXPLANATION]\nSlicing with a negative step.";
const REFINED_ANSWER: &str = "[CODE]\n```python\ndef reverse(s: str) -> str:\n    assert s.isdigit()\n    return s[::-1]\n```\n[EXPLANATION]\nValidates digits first.";
const QUESTION: &str = "Could you clarify the expected input format?";

/// Replays canned responses and records every prompt it was sent.
struct ScriptedClient {
    responses: RefCell<VecDeque<Result<String, TransportError>>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedClient {
    fn new(responses: Vec<Result<&str, TransportError>>) -> Self {
        Self {
            responses: RefCell::new(
                responses
                    .into_iter()
                    .map(|r| r.map(str::to_string))
                    .collect(),
            ),
            prompts: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.prompts.borrow().len()
    }

    fn prompt(&self, i: usize) -> String {
        self.prompts.borrow()[i].clone()
    }
}

#[async_trait::async_trait(?Send)]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, prompt: &str) -> Result<String, TransportError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("script exhausted".to_string())))
    }
}

/// Scripted human: fixed queries and feedback, records what was shown.
#[derive(Default)]
struct ScriptedIo {
    queries: VecDeque<QueryInput>,
    feedback: VecDeque<FeedbackInput>,
    feedback_requests: Vec<FeedbackKind>,
    shown: Vec<String>,
    reported: Vec<String>,
    commands: Vec<(String, usize)>,
}

impl ScriptedIo {
    fn with_feedback(feedback: Vec<FeedbackInput>) -> Self {
        Self {
            feedback: feedback.into(),
            ..Self::default()
        }
    }

    fn answers_shown(&self) -> usize {
        self.shown.iter().filter(|s| s.starts_with("answer")).count()
    }
}

#[async_trait::async_trait(?Send)]
impl HumanIo for ScriptedIo {
    fn prompt_for_query(&mut self) -> Result<QueryInput> {
        Ok(self.queries.pop_front().unwrap_or(QueryInput::End))
    }

    fn prompt_for_feedback(&mut self, kind: FeedbackKind) -> Result<FeedbackInput> {
        self.feedback_requests.push(kind);
        Ok(self.feedback.pop_front().unwrap_or(FeedbackInput::Skip))
    }

    async fn display(&mut self, output: Output<'_>) {
        let line = match output {
            Output::Answer { response, refined } => format!("answer(refined={refined}): {response}"),
            Output::Question { response } => format!("question: {response}"),
            Output::Notice(text) => format!("notice: {text}"),
        };
        self.shown.push(line);
    }

    fn report(&mut self, error: &TurnError) {
        self.reported.push(error.to_string());
    }

    fn handle_command(&mut self, command: &str, history: &[InteractionRecord]) -> Result<()> {
        self.commands.push((command.to_string(), history.len()));
        Ok(())
    }
}

fn engine(
    responses: Vec<Result<&str, TransportError>>,
    max_retries: u32,
    iterative: bool,
) -> InteractionLoop<ScriptedClient> {
    InteractionLoop::new(
        ScriptedClient::new(responses),
        ResponseValidator::default(),
        RefinementPolicy::new(max_retries, iterative),
    )
}

#[tokio::test]
async fn test_usable_answer_is_displayed_and_logged() {
    let mut engine = engine(vec![Ok(CODE_ANSWER)], 2, false);
    let mut io = ScriptedIo::default();

    let outcome = engine
        .run_turn(&mut io, "write a function that reverses a string")
        .await
        .unwrap();

    assert!(matches!(outcome, TurnOutcome::Resolved));
    assert_eq!(engine.client().calls(), 1);
    assert_eq!(io.answers_shown(), 1);
    assert!(io.feedback_requests.is_empty());
    let records = engine.history().as_sequence();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].query(), "write a function that reverses a string");
    assert_eq!(records[0].response(), CODE_ANSWER);
    assert_eq!(records[0].feedback(), None);
    assert_eq!(engine.session().state(), LoopState::Terminal);
}

#[tokio::test]
async fn test_empty_responses_abort_after_retry_budget() {
    let mut engine = engine(vec![Ok(""), Ok(""), Ok("")], 2, true);
    let mut io = ScriptedIo::default();

    let outcome = engine.run_turn(&mut io, "reverse a string").await.unwrap();

    match outcome {
        TurnOutcome::Failed(TurnError::InvalidResponse {
            query, attempts, ..
        }) => {
            assert_eq!(query, "reverse a string");
            assert_eq!(attempts, 3);
        }
        other => panic!("expected invalid response, got {other:?}"),
    }
    // One initial attempt plus two retries, all with the identical prompt.
    assert_eq!(engine.client().calls(), 3);
    assert!((0..3).all(|i| engine.client().prompt(i) == "reverse a string"));
    let records = engine.history().as_sequence();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].response(), "");
    assert_eq!(io.shown.iter().filter(|s| s.contains("retrying")).count(), 2);
}

#[tokio::test]
async fn test_retry_recovers_before_budget() {
    let mut engine = engine(vec![Ok("no code here"), Ok(CODE_ANSWER)], 2, false);
    let mut io = ScriptedIo::default();

    let outcome = engine.run_turn(&mut io, "reverse a string").await.unwrap();

    assert!(matches!(outcome, TurnOutcome::Resolved));
    assert_eq!(engine.client().calls(), 2);
    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.history().as_sequence()[0].response(), CODE_ANSWER);
    assert!(engine.session().retry_count() <= 2);
}

#[tokio::test]
async fn test_clarification_feedback_is_logged_then_refined_once() {
    let mut engine = engine(vec![Ok(QUESTION), Ok(REFINED_ANSWER)], 2, true);
    let mut io = ScriptedIo::with_feedback(vec![FeedbackInput::Feedback(
        "accepts a string of digits".to_string(),
    )]);

    let outcome = engine.run_turn(&mut io, "reverse a number").await.unwrap();

    assert!(matches!(outcome, TurnOutcome::Resolved));
    assert_eq!(engine.client().calls(), 2);
    assert_eq!(
        engine.client().prompt(1),
        "reverse a number\nUser clarification: accepts a string of digits"
    );
    // Only the clarification asked for feedback; the refined answer did not.
    assert_eq!(io.feedback_requests, vec![FeedbackKind::Clarification]);

    let records = engine.history().as_sequence();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].response(), QUESTION);
    assert_eq!(records[0].feedback(), Some("accepts a string of digits"));
    assert_eq!(records[1].query(), "reverse a number");
    assert_eq!(records[1].response(), REFINED_ANSWER);
    assert_eq!(records[1].feedback(), None);
    assert!(io.shown.iter().any(|s| s.starts_with("answer(refined=true)")));
}

#[tokio::test]
async fn test_feedback_is_logged_even_if_refinement_fails() {
    let mut engine = engine(
        vec![Ok(QUESTION), Err(TransportError::Network("reset".to_string()))],
        2,
        true,
    );
    let mut io = ScriptedIo::with_feedback(vec![FeedbackInput::Feedback("digits".to_string())]);

    let outcome = engine.run_turn(&mut io, "reverse a number").await.unwrap();

    assert!(matches!(
        outcome,
        TurnOutcome::Failed(TurnError::Transport { .. })
    ));
    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.history().as_sequence()[0].feedback(), Some("digits"));
}

#[tokio::test]
async fn test_transport_failure_logs_nothing() {
    let mut engine = engine(vec![Err(TransportError::Quota("429".to_string()))], 2, true);
    let mut io = ScriptedIo::default();

    let outcome = engine.run_turn(&mut io, "reverse a string").await.unwrap();

    match outcome {
        TurnOutcome::Failed(TurnError::Transport { query, source }) => {
            assert_eq!(query, "reverse a string");
            assert_eq!(source, TransportError::Quota("429".to_string()));
        }
        other => panic!("expected transport failure, got {other:?}"),
    }
    // Transport failures are not retried.
    assert_eq!(engine.client().calls(), 1);
    assert!(engine.history().is_empty());
    assert_eq!(engine.session().state(), LoopState::Terminal);
}

#[tokio::test]
async fn test_iterative_refinement_offers_single_feedback_step() {
    let mut engine = engine(vec![Ok(CODE_ANSWER), Ok(REFINED_ANSWER)], 2, true);
    let mut io = ScriptedIo::with_feedback(vec![
        FeedbackInput::Feedback("validate the input".to_string()),
        FeedbackInput::Feedback("never asked".to_string()),
    ]);

    engine.run_turn(&mut io, "reverse a string").await.unwrap();

    assert_eq!(io.feedback_requests, vec![FeedbackKind::Refinement]);
    assert_eq!(
        engine.client().prompt(1),
        "reverse a string\nUser feedback: validate the input"
    );
    assert_eq!(engine.history().len(), 2);
    assert_eq!(io.answers_shown(), 2);
}

#[tokio::test]
async fn test_skipped_feedback_is_implicit_acceptance() {
    let mut engine = engine(vec![Ok(CODE_ANSWER)], 2, true);
    let mut io = ScriptedIo::with_feedback(vec![FeedbackInput::Skip]);

    let outcome = engine.run_turn(&mut io, "reverse a string").await.unwrap();

    assert!(matches!(outcome, TurnOutcome::Resolved));
    assert_eq!(engine.client().calls(), 1);
    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.history().as_sequence()[0].feedback(), None);
}

#[tokio::test]
async fn test_cancel_while_awaiting_feedback_discards_turn() {
    let mut engine = engine(vec![Ok(QUESTION)], 2, true);
    let mut io = ScriptedIo::with_feedback(vec![FeedbackInput::Cancel]);

    let outcome = engine.run_turn(&mut io, "reverse a number").await.unwrap();

    assert!(matches!(outcome, TurnOutcome::Cancelled));
    assert!(engine.history().is_empty());
    assert_eq!(engine.session().state(), LoopState::AwaitingQuery);
    assert_eq!(engine.session().current_query(), None);
    assert_eq!(engine.session().pending_response(), None);
}

#[tokio::test]
async fn test_clarification_after_refinement_ends_turn() {
    let mut engine = engine(vec![Ok(QUESTION), Ok("What encoding do you use?")], 2, true);
    let mut io = ScriptedIo::with_feedback(vec![FeedbackInput::Feedback("digits".to_string())]);

    let outcome = engine.run_turn(&mut io, "reverse a number").await.unwrap();

    assert!(matches!(outcome, TurnOutcome::Resolved));
    assert_eq!(io.feedback_requests.len(), 1);
    assert_eq!(engine.client().calls(), 2);
    assert_eq!(engine.history().len(), 2);
}

#[tokio::test]
async fn test_refinement_has_its_own_retry_budget() {
    let mut engine = engine(
        vec![Ok(""), Ok(CODE_ANSWER), Ok(""), Ok(REFINED_ANSWER)],
        1,
        true,
    );
    let mut io = ScriptedIo::with_feedback(vec![FeedbackInput::Feedback("shorter".to_string())]);

    let outcome = engine.run_turn(&mut io, "reverse a string").await.unwrap();

    assert!(matches!(outcome, TurnOutcome::Resolved));
    assert_eq!(engine.client().calls(), 4);
    assert_eq!(engine.history().len(), 2);
}

#[tokio::test]
async fn test_session_history_counts_only_resolved_turns() {
    let mut engine = engine(
        vec![
            Ok(CODE_ANSWER),
            Err(TransportError::Timeout(30)),
            Ok(""),
            Ok(""),
            Ok(CODE_ANSWER),
        ],
        1,
        false,
    );
    let mut io = ScriptedIo {
        queries: VecDeque::from(vec![
            QueryInput::Query("first".to_string()),
            QueryInput::Query("second".to_string()),
            QueryInput::Cancel,
            QueryInput::Query("   ".to_string()),
            QueryInput::Query("third".to_string()),
            QueryInput::Command("/history".to_string()),
            QueryInput::Query("fourth".to_string()),
            QueryInput::End,
        ]),
        ..ScriptedIo::default()
    };

    engine.run(&mut io).await.unwrap();

    // first: displayed; second: transport failure; third: aborted; fourth: displayed.
    let queries: Vec<&str> = engine
        .history()
        .as_sequence()
        .iter()
        .map(|r| r.query())
        .collect();
    assert_eq!(queries, ["first", "third", "fourth"]);
    assert_eq!(io.reported.len(), 2);
    assert!(io.reported[0].contains("second"));
    assert!(io.reported[1].contains("third"));
    assert_eq!(io.commands, vec![("/history".to_string(), 2)]);
    assert_eq!(engine.client().calls(), 5);
}

#[test]
fn test_refinement_prompt_prefixes() {
    assert_eq!(
        refinement_prompt("q", FeedbackKind::Clarification, "f"),
        "q\nUser clarification: f"
    );
    assert_eq!(
        refinement_prompt("q", FeedbackKind::Refinement, "f"),
        "q\nUser feedback: f"
    );
}
