//! Terminal formatting for answers, questions and history records.

use colored::Colorize;

use crate::history::InteractionRecord;
use crate::response::{clarification_question, ParsedResponse};

/// Formats a usable answer as code and explanation sections.
///
/// Sections are labelled `GENERATED`, or `IMPROVED` for the answer to a
/// refinement.
pub fn format_answer(response: &str, refined: bool) -> String {
    let label = if refined { "IMPROVED" } else { "GENERATED" };
    let parsed = ParsedResponse::parse(response);
    let mut out = String::new();

    out.push_str(&section_header(&format!("{label} CODE")));
    out.push('\n');
    if parsed.code.is_empty() {
        out.push_str(&"No code generated".dimmed().to_string());
        out.push('\n');
    }
    for block in &parsed.code {
        if let Some(lang) = &block.language {
            out.push_str(&format!("  {}\n", lang.dimmed()));
        }
        for line in block.body.lines() {
            out.push_str(&format!("  {}\n", line.cyan()));
        }
    }

    out.push('\n');
    out.push_str(&section_header(&format!("{label} EXPLANATION")));
    out.push('\n');
    match &parsed.explanation {
        Some(text) => out.push_str(&render_markdown_lite(text)),
        None => out.push_str(&"No explanation available".dimmed().to_string()),
    }
    out
}

/// Formats a question the model asked back.
pub fn format_question(response: &str) -> String {
    format!(
        "{}\n{}",
        "Clarification needed:".yellow().bold(),
        clarification_question(response)
    )
}

/// Formats one history record for `/history`.
pub fn format_record(index: usize, record: &InteractionRecord) -> String {
    let mut out = format!(
        "{} {}\n{}\n",
        format!("#{}", index + 1).dimmed(),
        "you:".green().bold(),
        record.query()
    );
    out.push_str(&format!(
        "{}\n{}",
        "assistant:".cyan().bold(),
        render_markdown_lite(record.response())
    ));
    if let Some(feedback) = record.feedback() {
        out.push_str(&format!("\n{} {}", "feedback:".yellow().bold(), feedback));
    }
    out
}

pub fn section_header(title: &str) -> String {
    format!("=== {} ===", title).bold().to_string()
}

/// Minimal markdown renderer for terminal output.
/// Not a full parser. Handles the three most common patterns
/// in LLM output: bold, inline code, and fenced code blocks.
pub fn render_markdown_lite(text: &str) -> String {
    let mut output = String::new();
    let mut in_code_block = false;

    for line in text.lines() {
        if let Some(lang) = line.strip_prefix("```") {
            in_code_block = !in_code_block;
            if in_code_block && !lang.trim().is_empty() {
                output.push_str(&format!("  {}\n", lang.trim().dimmed()));
            }
            continue;
        }

        if in_code_block {
            output.push_str(&format!("  {}\n", line.cyan()));
            continue;
        }

        output.push_str(&render_inline(line));
        output.push('\n');
    }

    if output.ends_with('\n') {
        output.pop();
    }
    output
}

/// Handle **bold** and `inline code` within a single line.
fn render_inline(line: &str) -> String {
    let mut result = String::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if chars[i..].starts_with(&['*', '*']) {
            if let Some(end) = find_closing(&chars, i + 2, &['*', '*']) {
                let bold_text: String = chars[i + 2..end].iter().collect();
                result.push_str(&bold_text.bold().to_string());
                i = end + 2;
                continue;
            }
        }

        if chars[i] == '`' {
            if let Some(end) = find_closing(&chars, i + 1, &['`']) {
                let code_text: String = chars[i + 1..end].iter().collect();
                result.push_str(&code_text.cyan().to_string());
                i = end + 1;
                continue;
            }
        }

        result.push(chars[i]);
        i += 1;
    }

    result
}

fn find_closing(chars: &[char], start: usize, pat: &[char]) -> Option<usize> {
    chars
        .get(start..)?
        .windows(pat.len())
        .position(|w| w == pat)
        .map(|offset| start + offset)
}
