//! Pagesight LLM - vision-capable model abstraction.
//!
//! This crate provides a unified interface over the inference backends used to
//! read CAPTCHA images and to answer questions about page content. Messages
//! may carry images as data URIs; each provider translates them into its own
//! wire format.
//!
//! # Example
//!
//! ```rust,no_run
//! use pagesight_llm::{CompletionRequest, LlmProvider, Message, OllamaProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OllamaProvider::with_model("llava")?;
//!
//! let request = CompletionRequest::from_messages(vec![Message::user("What text is shown?")
//!     .with_image("data:image/png;base64,iVBORw0KGgo=")])
//! .with_system_prompt("Respond with only the text you see.");
//!
//! let response = provider.complete(request).await?;
//! println!("Response: {}", response.content);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod provider;
pub mod providers;

// Re-export commonly used types
pub use error::{LlmError, Result};
pub use provider::{
    CompletionRequest, CompletionResponse, LlmProvider, Message, ProviderCapabilities, Role,
    Usage,
};
pub use providers::{build_provider, AnthropicProvider, OllamaProvider, OpenAiProvider};
