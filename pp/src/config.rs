//! PoolPro configuration types and loading
//!
//! Configuration comes from a YAML file; secrets and a few deployment knobs
//! come from the environment. Environment values are resolved once at startup
//! into [`ResolvedLlmConfig`] and the resolved value is passed to whatever
//! needs it.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Overrides `llm.model`
pub const ENV_MODEL: &str = "OPENAI_MODEL";

/// Overrides `llm.base-url`
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";

/// Overrides `server.port`
pub const ENV_PORT: &str = "POOLPRO_PORT";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // Explicit path must load
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Project-local config: .poolpro.yml
        let local_config = PathBuf::from(".poolpro.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // User config: ~/.config/poolpro/poolpro.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("poolpro").join("poolpro.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub bind: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum accepted request body size
    #[serde(rename = "body-limit-bytes")]
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
            body_limit_bytes: 64 * 1024,
        }
    }
}

impl ServerConfig {
    /// Port after applying `POOLPRO_PORT`
    pub fn resolve_port(&self) -> u16 {
        self.port_with(|key| std::env::var(key).ok())
    }

    /// Port after applying overrides from `lookup`
    pub fn port_with(&self, lookup: impl Fn(&str) -> Option<String>) -> u16 {
        match non_blank(lookup(ENV_PORT)).map(|p| p.parse::<u16>()) {
            Some(Ok(port)) => port,
            Some(Err(e)) => {
                tracing::warn!("Ignoring invalid {}: {}", ENV_PORT, e);
                self.port
            }
            None => self.port,
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (currently only "openai" supported)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL, including the version prefix
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Sampling temperature
    pub temperature: f32,

    /// Directory with `.pmt` prompt overrides
    #[serde(rename = "prompts-dir")]
    pub prompts_dir: Option<PathBuf>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            max_tokens: 1200,
            timeout_ms: 30_000,
            temperature: 0.2,
            prompts_dir: None,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl LlmConfig {
    /// Resolve against the process environment
    pub fn resolve(&self) -> ResolvedLlmConfig {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary key lookup
    pub fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> ResolvedLlmConfig {
        debug!(provider = %self.provider, api_key_env = %self.api_key_env, "LlmConfig::resolve_with: called");
        let api_key = non_blank(lookup(&self.api_key_env));
        let model = non_blank(lookup(ENV_MODEL)).unwrap_or_else(|| self.model.clone());
        let base_url = non_blank(lookup(ENV_BASE_URL)).unwrap_or_else(|| self.base_url.clone());

        ResolvedLlmConfig {
            provider: self.provider.clone(),
            model,
            api_key_env: self.api_key_env.clone(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_tokens: self.max_tokens,
            timeout_ms: self.timeout_ms,
            temperature: self.temperature,
            prompts_dir: self.prompts_dir.clone(),
        }
    }
}

/// LLM configuration with environment values applied
#[derive(Clone)]
pub struct ResolvedLlmConfig {
    pub provider: String,
    pub model: String,
    pub api_key_env: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
    pub temperature: f32,
    pub prompts_dir: Option<PathBuf>,
}

impl ResolvedLlmConfig {
    /// True when an external text-generation capability is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// Keep the key out of logs
impl std::fmt::Debug for ResolvedLlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedLlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key_env", &self.api_key_env)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_ms", &self.timeout_ms)
            .field("temperature", &self.temperature)
            .field("prompts_dir", &self.prompts_dir)
            .finish()
    }
}
