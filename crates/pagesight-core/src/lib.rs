//! Pagesight Core - Foundation crate for the Pagesight page question-answering service.
//!
//! This crate provides the shared data model, error handling and configuration
//! management that the browser, LLM and pipeline crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Fetch results, CAPTCHA challenges, analysis results, data URIs
//!
//! # Example
//!
//! ```rust
//! use pagesight_core::{AppConfig, FetchResult, ImageMap};
//!
//! let config = AppConfig::default();
//! assert_eq!(config.pipeline.max_captcha_attempts, 3);
//!
//! let mut images = ImageMap::new();
//! images.insert("/img/Captcha.png".to_string(), "data:image/png;base64,AAAA".to_string());
//! let page = FetchResult::new("<html></html>", images);
//! assert!(page.captcha_challenge().is_some());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, BrowserConfig, LlmConfig, LlmProviderKind, PipelineConfig, ServerConfig};
pub use error::{ConfigError, ConfigResult, PagesightError, Result};
pub use types::{AnalysisResult, CaptchaChallenge, DataUri, FetchResult, ImageMap};
