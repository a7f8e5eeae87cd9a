//! Optional local execution of generated code.
//!
//! Code is written to a scratch file and run by the configured interpreter
//! in a child process, with a timeout, an output cap and provider API keys
//! stripped from the environment. Imports of banned modules are refused
//! before anything is spawned.

use std::io::Write;
use std::process::Stdio;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use crate::config::Config;
use crate::constants::{EXECUTION_MAX_OUTPUT_SIZE, EXECUTION_STRIPPED_ENV_VARS};

/// Result of running one code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Exit status zero.
    Completed { stdout: String },
    /// Non-zero exit status or a spawn failure.
    Failed { stderr: String },
    /// The timeout elapsed and the child was killed.
    TimedOut,
    /// The code imports a banned module and was not run.
    Blocked { module: String },
}

/// Runs generated code with the configured interpreter.
pub struct Executor {
    interpreter: String,
    timeout: Duration,
    banned_imports: Vec<String>,
}

impl Executor {
    pub fn new(interpreter: impl Into<String>, timeout: Duration, banned_imports: Vec<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout,
            banned_imports,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.execution_interpreter(),
            config.execution_timeout(),
            config.banned_imports(),
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Check imports, then run `code` to completion or timeout.
    pub async fn run(&self, code: &str) -> Result<ExecutionOutcome> {
        if let Some(module) = check_imports(code, &self.banned_imports) {
            warn!(%module, "refusing to execute code with banned import");
            return Ok(ExecutionOutcome::Blocked { module });
        }

        let mut script = tempfile::Builder::new()
            .prefix("refine-")
            .suffix(".py")
            .tempfile()?;
        script.write_all(code.as_bytes())?;
        script.flush()?;

        let mut cmd = tokio::process::Command::new(&self.interpreter);
        cmd.arg(script.path());
        for var in EXECUTION_STRIPPED_ENV_VARS {
            cmd.env_remove(var);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return Ok(ExecutionOutcome::Failed {
                    stderr: format!("Failed to start {}: {}", self.interpreter, e),
                });
            }
        };

        // Dropping the wait future on timeout kills the child.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs_f64(), "execution timed out");
                return Ok(ExecutionOutcome::TimedOut);
            }
        };

        let code = output.status.code().unwrap_or(-1);
        debug!(exit_code = code, "execution finished");
        if output.status.success() {
            Ok(ExecutionOutcome::Completed {
                stdout: cap_output(String::from_utf8_lossy(&output.stdout).trim_end()),
            })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Ok(ExecutionOutcome::Failed {
                stderr: cap_output(&format!("{}\nExit code: {}", stderr.trim_end(), code)),
            })
        }
    }
}

/// First banned module imported by `code`, if any.
///
/// Matches `import a, b`, `import a.b as c` and `from a.b import c` on
/// their own lines.
pub fn check_imports(code: &str, banned: &[String]) -> Option<String> {
    let is_banned = |name: &str| {
        let root = name.split('.').next().unwrap_or(name).trim();
        banned.iter().any(|b| b == root).then(|| root.to_string())
    };

    for line in code.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("import ") {
            for item in rest.split(',') {
                let name = item.split_whitespace().next().unwrap_or("");
                if let Some(module) = is_banned(name) {
                    return Some(module);
                }
            }
        } else if let Some(rest) = line.strip_prefix("from ") {
            let name = rest.split_whitespace().next().unwrap_or("");
            if let Some(module) = is_banned(name) {
                return Some(module);
            }
        }
    }
    None
}

/// Truncate `output` to at most `EXECUTION_MAX_OUTPUT_SIZE` bytes, appending a
/// notice when truncation occurs.
fn cap_output(output: &str) -> String {
    if output.len() <= EXECUTION_MAX_OUTPUT_SIZE {
        return output.to_string();
    }
    let mut end = EXECUTION_MAX_OUTPUT_SIZE;
    while end > 0 && !output.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}\n... output truncated at {} bytes",
        &output[..end],
        EXECUTION_MAX_OUTPUT_SIZE
    )
}
