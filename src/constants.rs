//! Centralized constants for refine.
//!
//! All magic numbers, default strings, and configuration constants live here
//! so they can be changed in one place.

/// Application name used in CLI output and directory paths.
pub const APP_NAME: &str = "refine";

/// Default LLM model identifier.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-6";

/// Maximum tokens for LLM completions.
pub const MAX_TOKENS: u64 = 1500;

/// Default system prompt sent with every completion request.
///
/// Asks the model for the tagged layout the response parser understands.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert software developer. \
If the request is unclear, ask ONE clarifying question and nothing else, \
starting with [CLARIFICATION]. Otherwise answer with [CODE] followed by a single \
fenced code block with a language tag, then [EXPLANATION] followed by a short \
explanation of the code, its assumptions and its complexity.";

/// Configuration filename.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Per-project configuration filename.
pub const PROJECT_CONFIG_FILENAME: &str = "refine.toml";

/// Readline history filename.
pub const HISTORY_FILENAME: &str = "query_history.txt";

/// Log file prefix inside the logs directory (rotated daily).
pub const LOG_FILENAME: &str = "refine.log";

/// Default log level when neither `RUST_LOG` nor config sets one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default LLM model identifier for OpenAI.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1";

/// Default LLM model identifier for OpenRouter.
pub const DEFAULT_OPENROUTER_MODEL: &str = "arcee-ai/trinity-large-preview:free";

/// Default base URL for local Ollama server.
pub const OLLAMA_DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default LLM model identifier for Ollama.
pub const OLLAMA_DEFAULT_MODEL: &str = "llama3";

// --- Provider defaults ---

/// Default provider when none is configured.
pub const DEFAULT_PROVIDER: &str = "anthropic";

// --- Refinement defaults ---

/// Default number of automatic retries after an invalid response.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default: offer one feedback-driven refinement after a usable answer.
pub const DEFAULT_ITERATIVE_REFINEMENT: bool = true;

/// Default per-request timeout for the completion service.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Default: stream tokens to the terminal while a response is generated.
pub const DEFAULT_STREAM_OUTPUT: bool = true;

/// Prefix used when a clarification answer is folded into the prompt.
pub const CLARIFICATION_PREFIX: &str = "User clarification:";

/// Prefix used when feedback on a usable answer is folded into the prompt.
pub const FEEDBACK_PREFIX: &str = "User feedback:";

// --- Validator defaults ---

/// Default: a response must carry a fenced code block to be usable.
pub const DEFAULT_REQUIRE_CODE: bool = true;

/// Explicit tag a model uses to mark a clarifying question.
pub const CLARIFICATION_TAG: &str = "[CLARIFICATION]";

/// Tag that opens the code section of a structured answer.
pub const CODE_TAG: &str = "[CODE]";

/// Tag that opens the explanation section of a structured answer.
pub const EXPLANATION_TAG: &str = "[EXPLANATION]";

/// Phrasing that marks a response as asking the user for more information.
///
/// Matched case-insensitively, only when the response carries no code.
pub const CLARIFICATION_PHRASES: &[&str] = &[
    r"\b(could|can|would) you (please )?(clarify|specify|elaborate|confirm)\b",
    r"\b(could|can|would) you (please )?(provide|share|give) (me )?(more|additional|some) (details|information|context)\b",
    r"\bplease (clarify|specify|elaborate)\b",
    r"\b(need|require) (more|additional|further) (information|details|context)\b",
    r"\bwhat do you mean\b",
    r"\bit('s| is) (not|unclear) (entirely )?(clear )?(what|whether|which|how)\b",
];

// --- Execution defaults ---

/// Default: generated code is not executed.
pub const DEFAULT_EXECUTION_ENABLED: bool = false;

/// Interpreter used to run generated Python code.
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Wall-clock limit for a single execution.
pub const DEFAULT_EXECUTION_TIMEOUT_SECS: u64 = 5;

/// Top-level modules generated code may not import.
pub const DEFAULT_BANNED_IMPORTS: &[&str] = &["os", "sys", "subprocess"];

/// Maximum bytes of execution output shown to the user.
pub const EXECUTION_MAX_OUTPUT_SIZE: usize = 16 * 1024;

/// Environment variables removed before running generated code.
pub const EXECUTION_STRIPPED_ENV_VARS: &[&str] = &[
    "ANTHROPIC_API_KEY",
    "OPENAI_API_KEY",
    "OPENROUTER_API_KEY",
];
