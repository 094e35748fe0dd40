//! Configuration for the evaluation client.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values.

use crate::error::{RagEvalError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

const APP_NAME: &str = "rag-evaluator";

/// Where the evaluation service lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the service API (e.g., "http://localhost:8000/api")
    pub api_base: String,

    /// Request timeout in seconds. Evaluation runs are slow, so this is generous.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    600
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Models and credential forwarded to the service for runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model that answers the questions during a run.
    pub query_llm: String,

    /// Model that compares configurations afterwards.
    pub judge_llm: String,

    /// API key forwarded with run and judge requests.
    pub api_key: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            query_llm: "gpt-4o-mini".to_string(),
            judge_llm: "gpt-4o-mini".to_string(),
            api_key: String::new(),
        }
    }
}

/// Local state settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StateConfig {
    /// File holding the persisted session id. Defaults to the platform data dir.
    pub session_file: Option<PathBuf>,
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub service: ServiceConfig,
    pub models: ModelConfig,
    pub state: StateConfig,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Deserialize)]
struct ConfigFile {
    service: Option<ServiceFileSection>,
    models: Option<ModelFileSection>,
    state: Option<StateFileSection>,
}

#[derive(Debug, Deserialize)]
struct ServiceFileSection {
    api_base: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ModelFileSection {
    query_llm: Option<String>,
    judge_llm: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StateFileSection {
    session_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (RAG_EVAL_API_BASE, RAG_EVAL_API_KEY, ...)
    /// 2. Config file (~/.config/rag-evaluator/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                config = Self::load_from_file(&config_path)?;
            }
        }

        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(api_base) = env::var("RAG_EVAL_API_BASE") {
            self.service.api_base = api_base;
        }

        if let Ok(timeout) = env::var("RAG_EVAL_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                self.service.timeout_secs = secs;
            }
        }

        if let Ok(api_key) = env::var("RAG_EVAL_API_KEY") {
            self.models.api_key = api_key;
        }

        if let Ok(model) = env::var("RAG_EVAL_QUERY_LLM") {
            self.models.query_llm = model;
        }

        if let Ok(model) = env::var("RAG_EVAL_JUDGE_LLM") {
            self.models.judge_llm = model;
        }

        if let Ok(path) = env::var("RAG_EVAL_SESSION_FILE") {
            self.state.session_file = Some(PathBuf::from(path));
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RagEvalError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text, filling gaps with defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file_config: ConfigFile = serde_yaml::from_str(content)
            .map_err(|e| RagEvalError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut config = Config::default();

        if let Some(service) = file_config.service {
            if let Some(api_base) = service.api_base {
                config.service.api_base = api_base;
            }
            if let Some(timeout_secs) = service.timeout_secs {
                config.service.timeout_secs = timeout_secs;
            }
        }

        if let Some(models) = file_config.models {
            if let Some(query_llm) = models.query_llm {
                config.models.query_llm = query_llm;
            }
            if let Some(judge_llm) = models.judge_llm {
                config.models.judge_llm = judge_llm;
            }
            if let Some(api_key) = models.api_key {
                config.models.api_key = api_key;
            }
        }

        if let Some(state) = file_config.state {
            config.state.session_file = state.session_file;
        }

        Ok(config)
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Resolve the session file: explicit setting first, then the platform data dir.
    pub fn session_file(&self) -> Result<PathBuf> {
        if let Some(path) = &self.state.session_file {
            return Ok(path.clone());
        }

        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|dirs| dirs.data_dir().join("session.json"))
            .ok_or_else(|| {
                RagEvalError::Config(
                    "Could not determine a data directory. Set RAG_EVAL_SESSION_FILE.".to_string(),
                )
            })
    }

    /// Validate that required configuration is present.
    pub fn validate(&self) -> Result<()> {
        let base = self.service.api_base.trim();
        if base.is_empty() {
            return Err(RagEvalError::Config(
                "Service base URL is required. Set RAG_EVAL_API_BASE environment variable or add to config file.".to_string()
            ));
        }

        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(RagEvalError::Config(format!(
                "Service base URL must start with http:// or https://, got '{}'",
                base
            )));
        }

        if self.service.timeout_secs == 0 {
            return Err(RagEvalError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate the settings needed to trigger a run or a judgment.
    pub fn validate_for_run(&self) -> Result<()> {
        self.validate()?;

        if self.models.api_key.is_empty() {
            return Err(RagEvalError::Config(
                "API key is required. Set RAG_EVAL_API_KEY environment variable or add to config file.".to_string()
            ));
        }

        if self.models.query_llm.is_empty() {
            return Err(RagEvalError::Config(
                "Query model is required. Set RAG_EVAL_QUERY_LLM environment variable or add to config file."
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Create a config pointing at an explicit service (useful for testing).
    pub fn with_service(api_base: impl Into<String>, session_file: impl Into<PathBuf>) -> Self {
        Self {
            service: ServiceConfig {
                api_base: api_base.into(),
                ..Default::default()
            },
            state: StateConfig {
                session_file: Some(session_file.into()),
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.api_base, "http://localhost:8000/api");
        assert_eq!(config.service.timeout_secs, 600);
        assert_eq!(config.models.query_llm, "gpt-4o-mini");
        assert!(config.models.api_key.is_empty());
        assert!(config.state.session_file.is_none());
    }

    #[test]
    fn test_default_validates_but_cannot_run() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.validate_for_run().is_err());
    }

    #[test]
    fn test_rejects_non_http_base() {
        let mut config = Config::default();
        config.service.api_base = "localhost:8000".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
service:
  api_base: "https://rag.example.com/api"
models:
  judge_llm: "gemini-2.0-flash"
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.service.api_base, "https://rag.example.com/api");
        assert_eq!(config.service.timeout_secs, 600);
        assert_eq!(config.models.judge_llm, "gemini-2.0-flash");
        assert_eq!(config.models.query_llm, "gpt-4o-mini");
    }

    #[test]
    fn test_with_service() {
        let config = Config::with_service("http://127.0.0.1:9000", "/tmp/s.json");
        assert_eq!(config.service.api_base, "http://127.0.0.1:9000");
        assert_eq!(
            config.session_file().unwrap(),
            PathBuf::from("/tmp/s.json")
        );
    }
}
