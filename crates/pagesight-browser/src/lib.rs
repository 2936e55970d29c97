//! Browser automation for fetching rendered pages.
//!
//! Provides the [`PageFetcher`] capability the pipeline consumes, and a
//! headless Chromium implementation that renders a page and inlines the
//! images a CAPTCHA solver may need.

pub mod engine;
pub mod error;
pub mod fetcher;
pub mod fingerprint;
pub mod images;

pub use engine::{BrowserEngine, ChromiumLauncher};
pub use error::{BrowserError, Result};
pub use fetcher::{validate_url, FetcherLauncher, PageFetcher};
pub use fingerprint::FingerprintConfig;
