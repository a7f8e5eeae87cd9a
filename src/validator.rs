//! Response classification.
//!
//! [`ResponseValidator::classify`] is the single decision point every
//! downstream transition depends on. It is a pure function of the response
//! text and the [`DetectionRules`] the validator was built with, so the same
//! input always yields the same [`Classification`].

use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

use crate::config::Config;
use crate::constants::{CLARIFICATION_PHRASES, CLARIFICATION_TAG};
use crate::response::extract_code_blocks;

/// How a raw response should be treated by the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Carries a solution payload.
    Usable,
    /// Asks the human something instead of answering.
    NeedsClarification,
    /// Empty or missing the requested payload.
    Invalid,
}

/// What counts as a solution payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadRule {
    /// At least one fenced code block with a non-empty body. When
    /// `languages` is non-empty, the block must be tagged with one of them.
    CodeBlock { languages: Vec<String> },
    /// Any non-empty text.
    AnyText,
}

static DEFAULT_EXPLICIT: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_all(&[regex::escape(CLARIFICATION_TAG)]));

static DEFAULT_PHRASING: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(
        &CLARIFICATION_PHRASES
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>(),
    )
});

/// Compiles built-in patterns; they are covered by tests, so a pattern that
/// fails to compile is simply skipped.
fn compile_all(patterns: &[String]) -> Vec<Regex> {
    patterns.iter().filter_map(|p| compile(p).ok()).collect()
}

fn compile(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// The injectable rule set a [`ResponseValidator`] classifies with.
///
/// - `explicit` markers always mean "needs clarification", even next to code.
/// - `phrasing` markers only count when the response carries no code, so a
///   finished answer that ends with "could you confirm this works?" stays
///   usable.
/// - `question_heuristic` treats a code-less response whose last line ends
///   in `?` as a question.
#[derive(Debug, Clone)]
pub struct DetectionRules {
    explicit: Vec<Regex>,
    phrasing: Vec<Regex>,
    question_heuristic: bool,
    payload: PayloadRule,
}

impl DetectionRules {
    /// An empty rule set: only the payload requirement applies.
    pub fn new(payload: PayloadRule) -> Self {
        Self {
            explicit: Vec::new(),
            phrasing: Vec::new(),
            question_heuristic: false,
            payload,
        }
    }

    /// Adds a marker that always signals a clarification request.
    pub fn with_explicit_marker(mut self, pattern: &str) -> Result<Self> {
        let re = compile(pattern).with_context(|| format!("Invalid marker pattern: {pattern}"))?;
        self.explicit.push(re);
        Ok(self)
    }

    /// Adds a phrasing marker, matched case-insensitively.
    pub fn with_phrase(mut self, pattern: &str) -> Result<Self> {
        let re = compile(pattern).with_context(|| format!("Invalid phrase pattern: {pattern}"))?;
        self.phrasing.push(re);
        Ok(self)
    }

    pub fn with_question_heuristic(mut self, enabled: bool) -> Self {
        self.question_heuristic = enabled;
        self
    }

    /// Builds the default rules, adjusted by the `[validator]` config section.
    pub fn from_config(config: &Config) -> Result<Self> {
        let payload = if config.validator_require_code() {
            PayloadRule::CodeBlock {
                languages: config.validator.code_languages.clone(),
            }
        } else {
            PayloadRule::AnyText
        };
        let mut rules = Self {
            payload,
            ..Self::default()
        }
        .with_question_heuristic(config.validator_question_heuristic());
        for marker in &config.validator.clarification_markers {
            rules = rules.with_phrase(marker)?;
        }
        Ok(rules)
    }

    fn has_code(&self, text: &str) -> bool {
        let languages: &[String] = match &self.payload {
            PayloadRule::CodeBlock { languages } => languages.as_slice(),
            PayloadRule::AnyText => &[],
        };
        extract_code_blocks(text)
            .iter()
            .any(|block| languages.is_empty() || languages.iter().any(|l| block.is_language(l)))
    }

    fn asks_question(&self, text: &str) -> bool {
        if self.phrasing.iter().any(|re| re.is_match(text)) {
            return true;
        }
        self.question_heuristic
            && text
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .is_some_and(|l| l.trim_end().ends_with('?'))
    }
}

impl Default for DetectionRules {
    fn default() -> Self {
        Self {
            explicit: DEFAULT_EXPLICIT.clone(),
            phrasing: DEFAULT_PHRASING.clone(),
            question_heuristic: true,
            payload: PayloadRule::CodeBlock {
                languages: Vec::new(),
            },
        }
    }
}

/// Classifies raw responses with a fixed [`DetectionRules`] set.
#[derive(Debug, Clone, Default)]
pub struct ResponseValidator {
    rules: DetectionRules,
}

impl ResponseValidator {
    pub fn new(rules: DetectionRules) -> Self {
        Self { rules }
    }

    /// Classifies `response`.
    ///
    /// Order: empty → `Invalid`; explicit marker → `NeedsClarification`;
    /// no code and a question → `NeedsClarification`; payload missing →
    /// `Invalid`; otherwise `Usable`.
    pub fn classify(&self, response: &str) -> Classification {
        let text = response.trim();
        if text.is_empty() {
            return Classification::Invalid;
        }
        if self.rules.explicit.iter().any(|re| re.is_match(text)) {
            return Classification::NeedsClarification;
        }

        let has_code = self.rules.has_code(text);
        if !has_code && self.rules.asks_question(text) {
            return Classification::NeedsClarification;
        }

        match self.rules.payload {
            PayloadRule::CodeBlock { .. } if !has_code => Classification::Invalid,
            _ => Classification::Usable,
        }
    }
}
