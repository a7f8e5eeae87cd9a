//! Token counting for displayed responses.
//!
//! Uses tiktoken-rs for BPE tokenization. OpenAI models get their exact
//! tokenizer; Anthropic, Ollama and unknown models fall back to cl100k_base
//! as an approximation.

use anyhow::Result;
use tiktoken_rs::get_bpe_from_model;

/// Count tokens for a text string using the appropriate tokenizer for the model.
pub fn count_tokens(text: &str, model: &str) -> Result<usize> {
    let bpe = match get_bpe_from_model(model) {
        Ok(bpe) => bpe,
        Err(_) => tiktoken_rs::cl100k_base()?,
    };
    Ok(bpe.encode_ordinary(text).len())
}

/// Formats a count with thousands separators. Example: "12,345"
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn test_count_tokens_unknown_model_falls_back() {
        let n = count_tokens("def reverse(s): return s[::-1]", "claude-sonnet-4-6").unwrap();
        assert!(n > 0);
    }
}
