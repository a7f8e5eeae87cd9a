//! Environment variable substitution, API key resolution and defaulted accessors.

use std::time::Duration;

use super::types::{Config, ProviderEntry};

use crate::constants::{
    DEFAULT_BANNED_IMPORTS, DEFAULT_EXECUTION_ENABLED, DEFAULT_EXECUTION_TIMEOUT_SECS,
    DEFAULT_INTERPRETER, DEFAULT_ITERATIVE_REFINEMENT, DEFAULT_LOG_LEVEL, DEFAULT_MAX_RETRIES,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_REQUIRE_CODE, DEFAULT_STREAM_OUTPUT,
};

impl Config {
    /// Resolve {env:VAR_NAME} patterns in string fields.
    pub(super) fn resolve_substitutions(&mut self) {
        self.model = Self::resolve_str(&self.model);
        if let Some(ref mut sp) = self.system_prompt {
            *sp = Self::resolve_str(sp);
        }
        if let Some(ref mut dp) = self.default_provider {
            *dp = Self::resolve_str(dp);
        }
        if let Some(ref mut interpreter) = self.execution.interpreter {
            *interpreter = Self::resolve_str(interpreter);
        }
        Self::resolve_provider_entry(&mut self.provider.openai);
        Self::resolve_provider_entry(&mut self.provider.anthropic);
        Self::resolve_provider_entry(&mut self.provider.ollama);
        Self::resolve_provider_entry(&mut self.provider.openrouter);
    }

    /// Resolves `{env:VAR}` patterns in a single provider entry's `api_key` and `base_url`.
    fn resolve_provider_entry(entry: &mut Option<ProviderEntry>) {
        if let Some(ref mut e) = entry {
            if let Some(ref mut key) = e.api_key {
                *key = Self::resolve_str(key);
            }
            if let Some(ref mut url) = e.base_url {
                *url = Self::resolve_str(url);
            }
        }
    }

    /// Replace {env:VAR} with the environment variable value.
    ///
    /// Substituted values are inserted verbatim and never rescanned.
    fn resolve_str(s: &str) -> String {
        let mut result = String::with_capacity(s.len());
        let mut rest = s;
        while let Some(start) = rest.find("{env:") {
            let Some(end) = rest[start..].find('}') else {
                break;
            };
            let var_name = &rest[start + 5..start + end];
            result.push_str(&rest[..start]);
            result.push_str(&std::env::var(var_name).unwrap_or_default());
            rest = &rest[start + end + 1..];
        }
        result.push_str(rest);
        result
    }

    /// Resolve API key for a provider: env var first, then config value.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        let env_key = format!("{}_API_KEY", provider.to_uppercase());
        if let Ok(val) = std::env::var(&env_key) {
            if !val.is_empty() {
                return Some(val);
            }
        }

        let entry = match provider {
            "openai" => &self.provider.openai,
            "anthropic" => &self.provider.anthropic,
            "ollama" => &self.provider.ollama,
            "openrouter" => &self.provider.openrouter,
            _ => &None,
        };
        entry
            .as_ref()
            .and_then(|e| e.api_key.clone())
            .filter(|k| !k.is_empty())
    }

    /// Get the configured default provider name, if any.
    pub fn provider_name(&self) -> Option<&str> {
        self.default_provider.as_deref()
    }

    /// Get the model name from config, stripping provider prefix if present.
    /// Returns None if the model is the compile-time default (meaning user hasn't configured it).
    pub fn model_name(&self) -> Option<String> {
        let m = &self.model;
        if m == crate::constants::DEFAULT_MODEL {
            return None;
        }
        if let Some((_prov, model)) = m.split_once('/') {
            Some(model.to_string())
        } else {
            Some(m.to_string())
        }
    }

    /// Retries allowed after an invalid response.
    pub fn max_retries(&self) -> u32 {
        self.refinement.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
    }

    /// Whether a usable answer is followed by a feedback prompt.
    pub fn iterative_refinement(&self) -> bool {
        self.refinement.iterative.unwrap_or(DEFAULT_ITERATIVE_REFINEMENT)
    }

    /// Per-request timeout for the completion service.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.refinement
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Whether responses stream to the terminal while generating.
    pub fn stream_output(&self) -> bool {
        self.refinement.stream.unwrap_or(DEFAULT_STREAM_OUTPUT)
    }

    /// Whether a usable response must carry a code block.
    pub fn validator_require_code(&self) -> bool {
        self.validator.require_code.unwrap_or(DEFAULT_REQUIRE_CODE)
    }

    /// Whether a code-less response ending in `?` counts as a question.
    pub fn validator_question_heuristic(&self) -> bool {
        self.validator.question_heuristic.unwrap_or(true)
    }

    /// Whether accepted Python answers are executed.
    pub fn execution_enabled(&self) -> bool {
        self.execution.enabled.unwrap_or(DEFAULT_EXECUTION_ENABLED)
    }

    /// Interpreter used for execution.
    pub fn execution_interpreter(&self) -> String {
        self.execution
            .interpreter
            .clone()
            .unwrap_or_else(|| DEFAULT_INTERPRETER.to_string())
    }

    /// Wall-clock limit for one execution.
    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(
            self.execution
                .timeout_secs
                .unwrap_or(DEFAULT_EXECUTION_TIMEOUT_SECS),
        )
    }

    /// Modules whose import blocks execution.
    pub fn banned_imports(&self) -> Vec<String> {
        self.execution.banned_imports.clone().unwrap_or_else(|| {
            DEFAULT_BANNED_IMPORTS
                .iter()
                .map(|m| m.to_string())
                .collect()
        })
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::default();
        assert_eq!(config.max_retries(), DEFAULT_MAX_RETRIES);
        assert!(config.iterative_refinement());
        assert!(config.validator_require_code());
        assert!(!config.execution_enabled());
        assert_eq!(config.execution_interpreter(), "python3");
        assert_eq!(config.execution_timeout(), Duration::from_secs(5));
        assert_eq!(config.banned_imports(), vec!["os", "sys", "subprocess"]);
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn test_resolve_str_substitutes_env() {
        std::env::set_var("REFINE_TEST_SUBST", "value");
        assert_eq!(
            Config::resolve_str("a-{env:REFINE_TEST_SUBST}-b"),
            "a-value-b"
        );
        assert_eq!(Config::resolve_str("{env:REFINE_TEST_UNSET_VAR}"), "");
        assert_eq!(Config::resolve_str("{env:broken"), "{env:broken");
    }

    #[test]
    fn test_resolve_str_does_not_rescan_values() {
        std::env::set_var("REFINE_TEST_NESTED", "{env:REFINE_TEST_NESTED}");
        assert_eq!(
            Config::resolve_str("x{env:REFINE_TEST_NESTED}y"),
            "x{env:REFINE_TEST_NESTED}y"
        );
        std::env::set_var("REFINE_TEST_FIRST", "1");
        std::env::set_var("REFINE_TEST_SECOND", "2");
        assert_eq!(
            Config::resolve_str("{env:REFINE_TEST_FIRST}-{env:REFINE_TEST_SECOND}"),
            "1-2"
        );
    }

    #[test]
    fn test_model_name_strips_provider_prefix() {
        let mut config = Config::default();
        assert_eq!(config.model_name(), None);
        config.model = "openai/gpt-4.1".to_string();
        assert_eq!(config.model_name().as_deref(), Some("gpt-4.1"));
    }
}
