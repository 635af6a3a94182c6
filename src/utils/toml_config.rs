//! TOML-based configuration for Aerodesk
//!
//! Server, logging, model endpoint, orchestrator policy and conversation
//! storage are configured through a single TOML file (`aerodesk.toml`).
//! Secrets never live in the file; it only names the environment variable
//! that holds them.

use crate::agents::orchestrator::OrchestratorSettings;
use crate::guardrails::pipeline::InputGuardrailMode;
use crate::llm::OpenAIConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure loaded from aerodesk.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AerodeskConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
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

/// OpenAI-compatible model endpoint shared by agents and guardrails
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used by the agents
    #[serde(default = "default_model")]
    pub model: String,

    /// Model used by the model-backed guardrails
    #[serde(default = "default_guardrail_model")]
    pub guardrail_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum model round-trips per turn
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            guardrail_model: default_guardrail_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_turns: default_max_turns(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_model() -> String {
    "gpt-4.1".to_string()
}

fn default_guardrail_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_turns() -> usize {
    10
}

impl LlmConfig {
    /// API key from the configured environment variable, if set
    pub fn api_key(&self) -> Option<String> {
        if self.api_key_env.is_empty() {
            return None;
        }
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }

    /// Client settings for the agent model
    pub fn agent_client(&self) -> OpenAIConfig {
        self.client_for(&self.model)
    }

    /// Client settings for the guardrail model
    pub fn guardrail_client(&self) -> OpenAIConfig {
        self.client_for(&self.guardrail_model)
    }

    fn client_for(&self, model: &str) -> OpenAIConfig {
        OpenAIConfig {
            api_base: self.api_base.clone(),
            api_key: self.api_key(),
            model: model.to_string(),
            temperature: self.temperature,
            timeout_secs: self.timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Assistant reply sent when an input guardrail trips
    #[serde(default = "default_refusal_message")]
    pub refusal_message: String,

    #[serde(default)]
    pub input_guardrail_mode: InputGuardrailMode,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            refusal_message: default_refusal_message(),
            input_guardrail_mode: InputGuardrailMode::default(),
        }
    }
}

pub fn default_refusal_message() -> String {
    "Sorry, I can only answer questions related to airline travel.".to_string()
}

impl OrchestratorConfig {
    pub fn settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            refusal_message: self.refusal_message.clone(),
            input_guardrail_mode: self.input_guardrail_mode,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Directory for the `file` backend
    #[serde(default)]
    pub path: Option<PathBuf>,
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

impl AerodeskConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AerodeskConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("llm.model must not be empty".into()));
        }
        if self.llm.guardrail_model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.guardrail_model must not be empty".into(),
            ));
        }
        if self.llm.max_turns == 0 {
            return Err(ConfigError::ValidationError(
                "llm.max_turns must be at least 1".into(),
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "llm.timeout_secs must be at least 1".into(),
            ));
        }
        if self.orchestrator.refusal_message.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "orchestrator.refusal_message must not be empty".into(),
            ));
        }
        if self.store.backend == StoreBackend::File && self.store.path.is_none() {
            return Err(ConfigError::ValidationError(
                "store.path is required for the file backend".into(),
            ));
        }
        Ok(())
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
