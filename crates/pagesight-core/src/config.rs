//! Configuration management for Pagesight.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Main application configuration.
///
/// This is loaded from `~/.config/pagesight/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Retry pipeline settings
    pub pipeline: PipelineConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Vision model settings
    pub llm: LlmConfig,
    /// HTTP server settings
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from the default location, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file. The file must exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides, then validate it.
    ///
    /// When `path` is `None` the default location is used.
    ///
    /// Supports the following environment variables:
    /// - `PAGESIGHT_MAX_CAPTCHA_ATTEMPTS`: Override the CAPTCHA attempt ceiling
    /// - `PAGESIGHT_HEADLESS`: Override browser headless mode (true/false)
    /// - `PAGESIGHT_LLM_PROVIDER`: Override the model provider (ollama/openai/anthropic)
    /// - `PAGESIGHT_LLM_MODEL`: Override the model name
    /// - `PAGESIGHT_LLM_URL`: Override the provider base URL
    /// - `PAGESIGHT_HOST` / `PAGESIGHT_PORT`: Override the server bind address
    pub fn load_with_env(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    ///
    /// Values that fail to parse are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("PAGESIGHT_MAX_CAPTCHA_ATTEMPTS") {
            if let Ok(attempts) = val.parse() {
                self.pipeline.max_captcha_attempts = attempts;
                tracing::debug!("Override pipeline.max_captcha_attempts from env: {}", attempts);
            }
        }

        if let Some(val) = lookup("PAGESIGHT_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Some(val) = lookup("PAGESIGHT_LLM_PROVIDER") {
            if let Ok(provider) = val.parse() {
                self.llm.provider = provider;
                tracing::debug!("Override llm.provider from env: {}", provider);
            }
        }

        if let Some(model) = lookup("PAGESIGHT_LLM_MODEL") {
            tracing::debug!("Override llm.model from env: {}", model);
            self.llm.model = model;
        }

        if let Some(url) = lookup("PAGESIGHT_LLM_URL") {
            tracing::debug!("Override llm.base_url from env: {}", url);
            self.llm.base_url = Some(url);
        }

        if let Some(host) = lookup("PAGESIGHT_HOST") {
            tracing::debug!("Override server.host from env: {}", host);
            self.server.host = host;
        }

        if let Some(val) = lookup("PAGESIGHT_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
                tracing::debug!("Override server.port from env: {}", port);
            }
        }
    }

    /// Check values that would otherwise produce unbounded waits or invalid requests.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.browser.navigation_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "browser.navigation_timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.browser.image_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "browser.image_timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "llm.temperature".to_string(),
                reason: format!("must be between 0.0 and 2.0, got {}", self.llm.temperature),
            });
        }

        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/pagesight/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "pagesight", "pagesight").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Retry pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of CAPTCHA solve cycles before giving up
    pub max_captcha_attempts: u32,
    /// Maximum characters of page HTML passed to the solver as context
    pub max_context_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_captcha_attempts: 3,
            max_context_chars: 20_000,
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
    /// Timeout for downloading a single challenge image, in seconds
    pub image_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            navigation_timeout_secs: 60,
            image_timeout_secs: 10,
        }
    }
}

/// Supported vision model backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    /// Local Ollama server
    Ollama,
    /// `OpenAI` chat completions API
    OpenAi,
    /// Anthropic messages API
    Anthropic,
}

impl fmt::Display for LlmProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        };
        f.write_str(name)
    }
}

impl FromStr for LlmProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(ConfigError::InvalidValue {
                field: "llm.provider".to_string(),
                reason: format!("unknown provider '{other}'"),
            }),
        }
    }
}

/// Vision model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Which backend to use
    pub provider: LlmProviderKind,
    /// Model name; must accept image input
    pub model: String,
    /// Base URL override (provider default when absent)
    pub base_url: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens for completions
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::Ollama,
            model: "llava".to_string(),
            base_url: None,
            temperature: 0.5,
            max_tokens: 1024,
            timeout_secs: 120,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}
