//! LLM provider implementations.

pub mod anthropic;
pub mod common;
pub mod ollama;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use crate::error::{LlmError, Result};
use crate::provider::LlmProvider;
use pagesight_core::{LlmConfig, LlmProviderKind};
use std::sync::Arc;

const OLLAMA_URL: &str = "http://localhost:11434";
const OPENAI_URL: &str = "https://api.openai.com/v1";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1";

/// Environment variable holding the `OpenAI` API key.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable holding the Anthropic API key.
pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";

/// Construct the provider selected in `config`.
///
/// Cloud providers read their API key from the process environment.
///
/// # Errors
/// Returns [`LlmError::AuthenticationFailed`] if the required API key is not
/// set, or an internal error if the HTTP client cannot be created.
pub fn build_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    build_provider_with(config, |key| std::env::var(key).ok())
}

/// Construct the provider selected in `config`, resolving API keys through
/// `lookup`.
///
/// # Errors
/// See [`build_provider`].
pub fn build_provider_with<F>(config: &LlmConfig, lookup: F) -> Result<Arc<dyn LlmProvider>>
where
    F: Fn(&str) -> Option<String>,
{
    let api_key = |provider: &str, var: &str| {
        lookup(var)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LlmError::AuthenticationFailed {
                provider: provider.to_string(),
                message: format!("{var} is not set"),
            })
    };

    let provider: Arc<dyn LlmProvider> = match config.provider {
        LlmProviderKind::Ollama => Arc::new(OllamaProvider::with_timeout(
            config.base_url.as_deref().unwrap_or(OLLAMA_URL),
            &config.model,
            config.timeout_secs,
        )?),
        LlmProviderKind::OpenAi => Arc::new(OpenAiProvider::with_options(
            api_key("openai", OPENAI_API_KEY)?,
            &config.model,
            config.base_url.as_deref().unwrap_or(OPENAI_URL),
            config.timeout_secs,
        )?),
        LlmProviderKind::Anthropic => Arc::new(AnthropicProvider::with_options(
            api_key("anthropic", ANTHROPIC_API_KEY)?,
            &config.model,
            config.base_url.as_deref().unwrap_or(ANTHROPIC_URL),
            config.timeout_secs,
        )?),
    };

    tracing::info!(
        "Using {} provider (model: {})",
        provider.provider_id(),
        config.model
    );

    Ok(provider)
}
