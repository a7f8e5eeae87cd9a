//! Struct definitions and serde defaults for refine configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for refine, deserialized from `config.toml`.
///
/// Fields use serde defaults so refine can run with sensible defaults
/// when no config file exists.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Default model identifier (e.g. `"claude-sonnet-4-6"`).
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Default provider name (e.g., "anthropic", "openai").
    #[serde(default)]
    pub default_provider: Option<String>,
    /// System prompt sent with every completion request.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: Option<String>,
    /// Retry and refinement settings.
    #[serde(default)]
    pub refinement: RefinementConfig,
    /// Response classification settings.
    #[serde(default)]
    pub validator: ValidatorConfig,
    /// Generated-code execution settings.
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Returns the default model identifier.
///
/// Used by serde's `#[serde(default)]` attribute during deserialization.
pub(super) fn default_model() -> String {
    crate::constants::DEFAULT_MODEL.to_string()
}

/// Returns the default system prompt for completion requests.
///
/// Used by serde's `#[serde(default)]` attribute during deserialization
/// so configs without an explicit `system_prompt` still get a sensible default.
fn default_system_prompt() -> Option<String> {
    Some(crate::constants::DEFAULT_SYSTEM_PROMPT.to_string())
}

/// Provider-specific configuration map.
///
/// Each field corresponds to a supported LLM provider. Only providers
/// the user has configured will be `Some`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProviderConfig {
    /// Configuration for the OpenAI API provider.
    pub openai: Option<ProviderEntry>,
    /// Configuration for the Anthropic API provider.
    pub anthropic: Option<ProviderEntry>,
    /// Configuration for the local Ollama provider.
    pub ollama: Option<ProviderEntry>,
    /// Configuration for the OpenRouter API provider.
    pub openrouter: Option<ProviderEntry>,
}

/// Connection details for a single LLM provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderEntry {
    /// API key for authentication. Can also be set via environment variables.
    pub api_key: Option<String>,
    /// Custom base URL for the provider's API (useful for proxies or self-hosted instances).
    pub base_url: Option<String>,
    /// Model identifier to use with this provider, overriding the global default.
    pub model: Option<String>,
}

/// Controls automatic retries and feedback-driven refinement.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct RefinementConfig {
    /// Automatic retries after an invalid response before the turn aborts.
    pub max_retries: Option<u32>,
    /// Offer one feedback-driven refinement after a usable answer.
    pub iterative: Option<bool>,
    /// Seconds before a completion request is treated as a transport failure.
    pub request_timeout_secs: Option<u64>,
    /// Stream tokens to the terminal while a response is generated.
    pub stream: Option<bool>,
}

/// Controls how responses are classified.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct ValidatorConfig {
    /// Require a fenced code block for a response to be usable.
    pub require_code: Option<bool>,
    /// Accepted code block languages. Empty accepts any.
    #[serde(default)]
    pub code_languages: Vec<String>,
    /// Extra regexes that mark a response as asking for clarification.
    #[serde(default)]
    pub clarification_markers: Vec<String>,
    /// Treat a code-less response ending in `?` as a question.
    pub question_heuristic: Option<bool>,
}

/// Controls execution of accepted Python answers.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct ExecutionConfig {
    /// Run accepted Python code blocks and show the result.
    pub enabled: Option<bool>,
    /// Interpreter binary.
    pub interpreter: Option<String>,
    /// Wall-clock limit per run.
    pub timeout_secs: Option<u64>,
    /// Top-level modules that block execution when imported.
    pub banned_imports: Option<Vec<String>>,
}

/// Controls log output.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset (e.g. `"debug"`).
    pub level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            provider: ProviderConfig::default(),
            system_prompt: default_system_prompt(),
            default_provider: None,
            refinement: RefinementConfig::default(),
            validator: ValidatorConfig::default(),
            execution: ExecutionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
