//! Output rendering abstraction for streamed responses.
//!
//! Defines the [`Renderer`] trait that decouples provider streaming from the
//! display layer. [`StdoutRenderer`] prints tokens directly to the terminal
//! and knows how many lines it used so the preview can be erased.

use colored::Colorize;
use std::io::{self, Write};
use tracing::debug;

/// Trait for rendering streamed LLM output.
pub trait Renderer {
    /// Render a single token as it arrives.
    fn render_token(&mut self, token: &str);

    /// Called when the full response is complete.
    fn render_done(&mut self);

    /// Called when an error occurs during streaming.
    fn render_error(&mut self, err: &str);
}

/// Renders streaming LLM output directly to stdout.
///
/// Each token is printed immediately with an explicit flush so the user
/// sees a "typing" effect. The raw text is buffered for visual line counting.
pub struct StdoutRenderer {
    buffer: String,
    done: bool,
}

impl StdoutRenderer {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            done: false,
        }
    }

    /// Returns the accumulated raw text from all tokens.
    #[cfg(test)]
    pub fn raw_text(&self) -> &str {
        &self.buffer
    }

    /// Visual lines the streamed text occupies.
    ///
    /// Accounts for terminal line wrapping by using the actual terminal width.
    pub fn visual_line_count(&self) -> usize {
        let width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);
        visual_lines(&self.buffer, width)
    }

    /// Clears everything printed so far and leaves the cursor where the
    /// preview started. Works for finished and interrupted streams alike.
    pub fn erase(&self) {
        if self.buffer.is_empty() && !self.done {
            return;
        }
        print!("{}", erase_sequence(self.visual_line_count(), self.done));
        io::stdout().flush().ok();
    }
}

/// Escape sequence erasing a preview of `lines` visual lines. When the
/// stream finished, `render_done` already moved the cursor below it.
fn erase_sequence(lines: usize, done: bool) -> String {
    let up = if done { lines } else { lines.saturating_sub(1) };
    if up == 0 {
        "\r\x1b[J".to_string()
    } else {
        format!("\x1b[{up}A\r\x1b[J")
    }
}

impl Default for StdoutRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Visual lines `text` occupies at `width` columns.
fn visual_lines(text: &str, width: usize) -> usize {
    let width = width.max(1);
    text.split('\n')
        .map(|line| line.chars().count().div_ceil(width).max(1))
        .sum()
}

impl Renderer for StdoutRenderer {
    fn render_token(&mut self, token: &str) {
        self.buffer.push_str(token);
        print!("{}", token.dimmed());
        // Flush immediately so each token appears as it arrives
        io::stdout().flush().ok();
    }

    fn render_done(&mut self) {
        println!();
        self.done = true;
    }

    /// Logged only; the failure is reported as a turn error after the
    /// preview is erased.
    fn render_error(&mut self, err: &str) {
        debug!(error = err, "stream interrupted");
    }
}
