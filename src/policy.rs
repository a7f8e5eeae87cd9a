//! Refinement policy: what the loop does with a classified response.
//!
//! Retries handle malformed output and are bounded by `max_retries`.
//! Feedback handles valid output the human wants changed and is capped at a
//! single refinement per answer. The two budgets never mix.

use crate::validator::Classification;

/// Whether the response being decided on answers the original prompt or the
/// one refinement pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Answer,
    Refinement,
}

/// The next step for the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Re-submit the identical prompt.
    Retry,
    /// Surface the response and wait for the human's feedback.
    AskFeedback,
    /// Present the response. When `offer_feedback` is set the human may
    /// still give feedback for one refinement.
    Display { offer_feedback: bool },
    /// Give up on this turn and report the invalid response.
    Abort,
}

/// Decides transitions from a [`Classification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefinementPolicy {
    max_retries: u32,
    iterative_refinement: bool,
}

impl RefinementPolicy {
    pub fn new(max_retries: u32, iterative_refinement: bool) -> Self {
        Self {
            max_retries,
            iterative_refinement,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn iterative_refinement(&self) -> bool {
        self.iterative_refinement
    }

    /// Decides what follows a response classified as `classification` after
    /// `retry_count` retries of the current prompt.
    ///
    /// Once the refinement pass has happened no further feedback is asked
    /// for: a clarification request is displayed and ends the turn.
    pub fn next(&self, classification: Classification, retry_count: u32, stage: Stage) -> Decision {
        match (classification, stage) {
            (Classification::Invalid, _) if retry_count < self.max_retries => Decision::Retry,
            (Classification::Invalid, _) => Decision::Abort,
            (Classification::NeedsClarification, Stage::Answer) => Decision::AskFeedback,
            (Classification::NeedsClarification, Stage::Refinement) => Decision::Display {
                offer_feedback: false,
            },
            (Classification::Usable, Stage::Answer) => Decision::Display {
                offer_feedback: self.iterative_refinement,
            },
            (Classification::Usable, Stage::Refinement) => Decision::Display {
                offer_feedback: false,
            },
        }
    }
}

impl Default for RefinementPolicy {
    fn default() -> Self {
        Self::new(
            crate::constants::DEFAULT_MAX_RETRIES,
            crate::constants::DEFAULT_ITERATIVE_REFINEMENT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_retries_until_budget_then_aborts() {
        let policy = RefinementPolicy::new(2, true);
        assert_eq!(policy.next(Classification::Invalid, 0, Stage::Answer), Decision::Retry);
        assert_eq!(policy.next(Classification::Invalid, 1, Stage::Answer), Decision::Retry);
        assert_eq!(policy.next(Classification::Invalid, 2, Stage::Answer), Decision::Abort);
    }

    #[test]
    fn test_zero_budget_aborts_immediately() {
        let policy = RefinementPolicy::new(0, false);
        assert_eq!(policy.next(Classification::Invalid, 0, Stage::Answer), Decision::Abort);
    }

    #[test]
    fn test_clarification_does_not_depend_on_retry_count() {
        let policy = RefinementPolicy::new(1, false);
        for retries in 0..=1 {
            assert_eq!(
                policy.next(Classification::NeedsClarification, retries, Stage::Answer),
                Decision::AskFeedback
            );
        }
    }

    #[test]
    fn test_accessors_reflect_configuration() {
        let policy = RefinementPolicy::new(4, false);
        assert_eq!(policy.max_retries(), 4);
        assert!(!policy.iterative_refinement());
        assert!(RefinementPolicy::default().iterative_refinement());
    }

    #[test]
    fn test_usable_offers_feedback_only_when_iterative() {
        let iterative = RefinementPolicy::new(3, true);
        let single = RefinementPolicy::new(3, false);
        assert_eq!(
            iterative.next(Classification::Usable, 0, Stage::Answer),
            Decision::Display { offer_feedback: true }
        );
        assert_eq!(
            single.next(Classification::Usable, 0, Stage::Answer),
            Decision::Display { offer_feedback: false }
        );
    }

    #[test]
    fn test_refinement_stage_never_asks_again() {
        let policy = RefinementPolicy::new(3, true);
        assert_eq!(
            policy.next(Classification::Usable, 0, Stage::Refinement),
            Decision::Display { offer_feedback: false }
        );
        assert_eq!(
            policy.next(Classification::NeedsClarification, 0, Stage::Refinement),
            Decision::Display { offer_feedback: false }
        );
        assert_eq!(
            policy.next(Classification::Invalid, 0, Stage::Refinement),
            Decision::Retry
        );
    }
}
