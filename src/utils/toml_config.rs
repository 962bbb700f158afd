//! TOML-based configuration for the research core.
//!
//! Loaded once from `research.toml` at startup. Every section and field has
//! a default, so an empty file (or no `[section]` at all) is a valid config.
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "json"
//!
//! [toggles]
//! web_search = true
//! private_search_env = "PRIVATE_SEARCH_DATASTORE_ID"
//! private_rag_env = "PRIVATE_RAG_CORPUS_ID"
//!
//! [routing]
//! policy = "targeted"
//! workflow_mode = "fast"
//! llm_fallback = true
//!
//! [runner]
//! lane_capacity = 1
//! fallback_sentinel = "Information unavailable."
//! ```

use crate::research::fallback::DEFAULT_FALLBACK_SENTINEL;
use crate::routing::selector::{RoutingPolicy, WorkflowMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure loaded from research.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Optional capability units and the env vars that enable them
    #[serde(default)]
    pub toggles: ToggleConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub runner: RunnerConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleConfig {
    /// Open web search. `ENABLE_WEB_SEARCH=false` turns it off regardless.
    #[serde(default = "default_true")]
    pub web_search: bool,

    /// Environment variable holding the private search datastore id
    #[serde(default = "default_private_search_env")]
    pub private_search_env: String,

    /// Environment variable holding the private retrieval corpus id
    #[serde(default = "default_private_rag_env")]
    pub private_rag_env: String,
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self {
            web_search: true,
            private_search_env: default_private_search_env(),
            private_rag_env: default_private_rag_env(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_private_search_env() -> String {
    "PRIVATE_SEARCH_DATASTORE_ID".to_string()
}

fn default_private_rag_env() -> String {
    "PRIVATE_RAG_CORPUS_ID".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default)]
    pub policy: RoutingPolicy,

    #[serde(default)]
    pub workflow_mode: WorkflowMode,

    /// Ask the model to classify queries the heuristics cannot route
    #[serde(default = "default_true")]
    pub llm_fallback: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            policy: RoutingPolicy::default(),
            workflow_mode: WorkflowMode::default(),
            llm_fallback: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Events buffered per unit before the unit waits for the consumer
    #[serde(default = "default_lane_capacity")]
    pub lane_capacity: usize,

    /// Artifact written in place of a failed unit's output
    #[serde(default = "default_fallback_sentinel")]
    pub fallback_sentinel: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            lane_capacity: default_lane_capacity(),
            fallback_sentinel: default_fallback_sentinel(),
        }
    }
}

fn default_lane_capacity() -> usize {
    1
}

fn default_fallback_sentinel() -> String {
    DEFAULT_FALLBACK_SENTINEL.to_string()
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl ResearchConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "Loaded research configuration");
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path.as_ref()) {
            Err(ConfigError::FileNotFound(missing)) => {
                tracing::debug!(path = %missing.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ResearchConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runner.lane_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "runner.lane_capacity must be at least 1".to_string(),
            ));
        }
        if self.runner.fallback_sentinel.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "runner.fallback_sentinel must not be empty".to_string(),
            ));
        }
        for (field, value) in [
            ("toggles.private_search_env", &self.toggles.private_search_env),
            ("toggles.private_rag_env", &self.toggles.private_rag_env),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "{} must name an environment variable",
                    field
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ResearchConfig::from_toml("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.toggles.web_search);
        assert_eq!(config.toggles.private_search_env, "PRIVATE_SEARCH_DATASTORE_ID");
        assert_eq!(config.routing.policy, RoutingPolicy::Broad);
        assert_eq!(config.routing.workflow_mode, WorkflowMode::Full);
        assert!(config.routing.llm_fallback);
        assert_eq!(config.runner.lane_capacity, 1);
        assert_eq!(config.runner.fallback_sentinel, DEFAULT_FALLBACK_SENTINEL);
    }

    #[test]
    fn test_full_config() {
        let config = ResearchConfig::from_toml(
            r#"
[logging]
level = "advisor_research=debug"
format = "json"

[toggles]
web_search = false
private_rag_env = "MY_CORPUS"

[routing]
policy = "targeted"
workflow_mode = "fast"
llm_fallback = false

[runner]
lane_capacity = 8
fallback_sentinel = "n/a"
"#,
        )
        .unwrap();

        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(!config.toggles.web_search);
        assert_eq!(config.toggles.private_rag_env, "MY_CORPUS");
        assert_eq!(config.routing.policy, RoutingPolicy::Targeted);
        assert_eq!(config.routing.workflow_mode, WorkflowMode::Fast);
        assert_eq!(config.runner.lane_capacity, 8);
    }

    #[test]
    fn test_validation_errors() {
        let err = ResearchConfig::from_toml("[runner]\nlane_capacity = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let err = ResearchConfig::from_toml("[runner]\nfallback_sentinel = \"  \"").unwrap_err();
        assert!(err.to_string().contains("fallback_sentinel"));

        let err = ResearchConfig::from_toml("[toggles]\nprivate_search_env = \"\"").unwrap_err();
        assert!(err.to_string().contains("private_search_env"));
    }

    #[test]
    fn test_parse_error() {
        let err = ResearchConfig::from_toml("[routing]\npolicy = \"sideways\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
