//! File loading and merging for refine configuration.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::types::{
    default_model, Config, ExecutionConfig, LoggingConfig, RefinementConfig, ValidatorConfig,
};

impl Config {
    /// Loads the global config from `~/.config/refine/config.toml`.
    ///
    /// If no config file exists, creates one with sensible defaults
    /// (including `{env:VAR}` placeholders for API keys) and returns it.
    pub(super) fn load_global() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            let default_toml = Self::default_toml();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &default_toml)
                .with_context(|| format!("Failed to write default config to {:?}", path))?;
            let config: Config = toml::from_str(&default_toml)
                .with_context(|| "Failed to parse default config".to_string())?;
            return Ok(config);
        }
        Self::load_file(&path)
    }

    /// Reads and parses a single config file.
    pub(super) fn load_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {:?}", path))?;
        Ok(config)
    }

    /// Contents written to a fresh global config file.
    fn default_toml() -> String {
        format!(
            r#"model = "{}"

[provider]

[provider.anthropic]
api_key = "{{env:ANTHROPIC_API_KEY}}"

[provider.openai]
api_key = "{{env:OPENAI_API_KEY}}"

[provider.openrouter]
api_key = "{{env:OPENROUTER_API_KEY}}"

[provider.ollama]
base_url = "{}"

[refinement]
max_retries = {}
iterative = {}

[execution]
enabled = false
"#,
            default_model(),
            crate::constants::OLLAMA_DEFAULT_BASE_URL,
            crate::constants::DEFAULT_MAX_RETRIES,
            crate::constants::DEFAULT_ITERATIVE_REFINEMENT,
        )
    }

    /// Look for refine.toml in current dir, then walk up to git root.
    pub(super) fn load_project() -> Result<Option<Config>> {
        let mut dir = std::env::current_dir()?;
        loop {
            let candidate = dir.join(crate::constants::PROJECT_CONFIG_FILENAME);
            if candidate.exists() {
                return Self::load_file(&candidate).map(Some);
            }
            // Stop at git root or filesystem root
            if dir.join(".git").exists() || !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Merge project config over global config.
    /// Project values win when present.
    pub(super) fn merge(global: Config, project: Config) -> Config {
        Config {
            model: if project.model != default_model() {
                project.model
            } else {
                global.model
            },
            provider: global.provider,
            system_prompt: project.system_prompt.or(global.system_prompt),
            default_provider: project.default_provider.or(global.default_provider),
            refinement: RefinementConfig {
                max_retries: project.refinement.max_retries.or(global.refinement.max_retries),
                iterative: project.refinement.iterative.or(global.refinement.iterative),
                request_timeout_secs: project
                    .refinement
                    .request_timeout_secs
                    .or(global.refinement.request_timeout_secs),
                stream: project.refinement.stream.or(global.refinement.stream),
            },
            validator: ValidatorConfig {
                require_code: project.validator.require_code.or(global.validator.require_code),
                code_languages: if project.validator.code_languages.is_empty() {
                    global.validator.code_languages
                } else {
                    project.validator.code_languages
                },
                clarification_markers: global
                    .validator
                    .clarification_markers
                    .into_iter()
                    .chain(project.validator.clarification_markers)
                    .collect(),
                question_heuristic: project
                    .validator
                    .question_heuristic
                    .or(global.validator.question_heuristic),
            },
            execution: ExecutionConfig {
                enabled: project.execution.enabled.or(global.execution.enabled),
                interpreter: project.execution.interpreter.or(global.execution.interpreter),
                timeout_secs: project.execution.timeout_secs.or(global.execution.timeout_secs),
                banned_imports: project
                    .execution
                    .banned_imports
                    .or(global.execution.banned_imports),
            },
            logging: LoggingConfig {
                level: project.logging.level.or(global.logging.level),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_toml_parses() {
        let config: Config = toml::from_str(&Config::default_toml()).unwrap();
        assert_eq!(config.model, default_model());
        assert_eq!(config.refinement.max_retries, Some(crate::constants::DEFAULT_MAX_RETRIES));
        assert_eq!(config.execution.enabled, Some(false));
        assert!(config.provider.anthropic.is_some());
    }

    #[test]
    fn test_load_file_reads_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refine.toml");
        fs::write(
            &path,
            "[refinement]\nmax_retries = 1\niterative = false\n\n[validator]\ncode_languages = [\"rust\"]\n",
        )
        .unwrap();

        let config = Config::load_file(&path).unwrap();
        assert_eq!(config.refinement.max_retries, Some(1));
        assert_eq!(config.refinement.iterative, Some(false));
        assert_eq!(config.validator.code_languages, vec!["rust".to_string()]);
        assert!(config.system_prompt.is_some());
    }

    #[test]
    fn test_load_file_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refine.toml");
        fs::write(&path, "[refinement\nmax_retries = ").unwrap();
        assert!(Config::load_file(&path).is_err());
    }

    #[test]
    fn test_merge_prefers_project_values() {
        let mut global = Config::default();
        global.refinement.max_retries = Some(3);
        global.refinement.iterative = Some(true);
        global.validator.clarification_markers = vec!["global".to_string()];
        global.logging.level = Some("info".to_string());

        let mut project = Config::default();
        project.refinement.max_retries = Some(1);
        project.validator.clarification_markers = vec!["project".to_string()];

        let merged = Config::merge(global, project);
        assert_eq!(merged.refinement.max_retries, Some(1));
        assert_eq!(merged.refinement.iterative, Some(true));
        assert_eq!(
            merged.validator.clarification_markers,
            vec!["global".to_string(), "project".to_string()]
        );
        assert_eq!(merged.logging.level.as_deref(), Some("info"));
    }
}
