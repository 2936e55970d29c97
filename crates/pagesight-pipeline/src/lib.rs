//! Pagesight Pipeline - answers questions about CAPTCHA-gated web pages.
//!
//! The [`Pipeline`] ties three capabilities together:
//!
//! - a [`FetcherLauncher`](pagesight_browser::FetcherLauncher) that opens one
//!   browser session per query,
//! - a [`CaptchaSolver`] that reads challenge images with a vision model,
//! - a [`ContentAnalyzer`] that answers the question from the final page.
//!
//! Gate detection itself is the heuristic in [`detector`].
//!
//! # Example
//!
//! ```rust,no_run
//! use pagesight_core::AppConfig;
//! use pagesight_pipeline::Pipeline;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Pipeline::from_config(&AppConfig::default())?;
//!
//! let result = pipeline
//!     .process_query("https://example.com/product", "What is the price?")
//!     .await?;
//! println!("{} ({})", result.answer, result.reasoning);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod analyzer;
pub mod detector;
pub mod error;
pub mod orchestrator;
pub mod solver;

pub use analyzer::{ContentAnalyzer, VisionContentAnalyzer};
pub use detector::{detect_captcha, CaptchaDetector};
pub use error::{FailureKind, PipelineError, Result};
pub use orchestrator::{Pipeline, DEFAULT_MAX_CAPTCHA_ATTEMPTS};
pub use solver::{CaptchaSolver, VisionCaptchaSolver};
