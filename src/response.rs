//! Structured view of a model response.
//!
//! Responses are free text, optionally following the tagged layout requested
//! by the default system prompt (`[CODE]`, `[EXPLANATION]`,
//! `[CLARIFICATION]`). Parsing never fails: missing sections are `None`.

use crate::constants::{CLARIFICATION_TAG, CODE_TAG, EXPLANATION_TAG};

/// A fenced code block found in a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Language tag after the opening fence, if present (e.g. `python`).
    pub language: Option<String>,
    /// Code between the fences, without the fence lines.
    pub body: String,
}

impl CodeBlock {
    /// Whether the block is tagged with `lang` (case-insensitive).
    ///
    /// Common aliases are accepted, so `py` matches `python`.
    pub fn is_language(&self, lang: &str) -> bool {
        let Some(tag) = self.language.as_deref() else {
            return false;
        };
        let normalize = |s: &str| match s.to_lowercase().as_str() {
            "py" | "python3" => "python".to_string(),
            "rs" => "rust".to_string(),
            "js" => "javascript".to_string(),
            "ts" => "typescript".to_string(),
            other => other.to_string(),
        };
        normalize(tag) == normalize(lang)
    }
}

/// A response split into its code and explanation sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResponse {
    pub code: Vec<CodeBlock>,
    pub explanation: Option<String>,
}

impl ParsedResponse {
    /// Parses `text` into code blocks and explanation.
    ///
    /// The explanation is the text after the last `[EXPLANATION]` tag when
    /// the tag is present, otherwise the prose outside the code blocks.
    pub fn parse(text: &str) -> Self {
        let code = extract_code_blocks(text);

        let explanation = match text.rfind(EXPLANATION_TAG) {
            Some(idx) => text[idx + EXPLANATION_TAG.len()..].trim().to_string(),
            None => prose_outside_fences(text).replace(CODE_TAG, "").trim().to_string(),
        };

        Self {
            code,
            explanation: (!explanation.is_empty()).then_some(explanation),
        }
    }

    /// First code block tagged with `lang`.
    pub fn first_in(&self, lang: &str) -> Option<&CodeBlock> {
        self.code.iter().find(|block| block.is_language(lang))
    }
}

/// Extracts every closed fenced code block from `text`.
///
/// A fence is a line starting with three backticks. Blocks that are never
/// closed are ignored, as are blocks with an empty body.
pub fn extract_code_blocks(text: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<(Option<String>, Vec<&str>)> = None;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("```") {
            match current.take() {
                Some((language, lines)) => {
                    let body = lines.join("\n");
                    if !body.trim().is_empty() {
                        blocks.push(CodeBlock { language, body });
                    }
                }
                None => {
                    let tag = rest.trim().trim_matches('`');
                    let language = (!tag.is_empty()).then(|| tag.to_string());
                    current = Some((language, Vec::new()));
                }
            }
            continue;
        }
        if let Some((_, ref mut lines)) = current {
            lines.push(line);
        }
    }

    blocks
}

/// The question text of a clarification response, with the tag removed.
pub fn clarification_question(text: &str) -> &str {
    match text.find(CLARIFICATION_TAG) {
        Some(idx) => text[idx + CLARIFICATION_TAG.len()..].trim(),
        None => text.trim(),
    }
}

/// Text outside fenced blocks, joined by newlines.
fn prose_outside_fences(text: &str) -> String {
    let mut in_fence = false;
    let mut out = Vec::new();
    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if !in_fence {
            out.push(line);
        }
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAGGED: &str = "[CODE]\n```python\ndef reverse(s: str) -> str:\n    return s[::-1]\n```\n[EXPLANATION]\nSlicing with a negative step.";

    #[test]
    fn test_parse_tagged_response() {
        let parsed = ParsedResponse::parse(TAGGED);
        assert_eq!(parsed.code.len(), 1);
        assert_eq!(parsed.code[0].language.as_deref(), Some("python"));
        assert!(parsed.code[0].body.contains("return s[::-1]"));
        assert_eq!(
            parsed.explanation.as_deref(),
            Some("Slicing with a negative step.")
        );
    }

    #[test]
    fn test_parse_untagged_response_uses_prose() {
        let text = "Here you go:\n```rust\nfn main() {}\n```\nThat is all.";
        let parsed = ParsedResponse::parse(text);
        assert_eq!(parsed.code.len(), 1);
        assert_eq!(parsed.explanation.as_deref(), Some("Here you go:\nThat is all."));
    }

    #[test]
    fn test_unclosed_and_empty_fences_are_ignored() {
        assert!(extract_code_blocks("```python\nprint(1)\n").is_empty());
        assert!(extract_code_blocks("```\n   \n```").is_empty());
    }

    #[test]
    fn test_untagged_fence_has_no_language() {
        let blocks = extract_code_blocks("```\nx = 1\n```");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].language, None);
        assert!(!blocks[0].is_language("python"));
    }

    #[test]
    fn test_language_aliases() {
        let block = CodeBlock {
            language: Some("py".to_string()),
            body: "pass".to_string(),
        };
        assert!(block.is_language("python"));
        assert!(block.is_language("Python3"));
        assert!(!block.is_language("rust"));
    }

    #[test]
    fn test_clarification_question_strips_tag() {
        assert_eq!(
            clarification_question("[CLARIFICATION] Which Python version?"),
            "Which Python version?"
        );
        assert_eq!(clarification_question("  Which one? "), "Which one?");
    }
}
