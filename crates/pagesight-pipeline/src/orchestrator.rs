//! Query pipeline: fetch, detect, solve, refetch, analyze.
//!
//! One [`Pipeline::process_query`] call runs a small state machine over a
//! single browser session:
//!
//! ```text
//! Fetching -> Checking -> (not gated)              -> Analyzing -> done
//!                      -> (gated, attempts left)   -> Solving
//!                      -> (gated, no attempts left) -> Failed
//! Solving  -> (no challenge image) -> Analyzing
//!          -> (image solved)       -> Fetching
//! ```
//!
//! The solved value is not submitted anywhere; the page is simply fetched
//! again. At most `max_captcha_attempts` solves and `max_captcha_attempts + 1`
//! fetches happen per query.

use crate::analyzer::{ContentAnalyzer, VisionContentAnalyzer};
use crate::detector::CaptchaDetector;
use crate::error::{PipelineError, Result};
use crate::solver::{CaptchaSolver, VisionCaptchaSolver};
use pagesight_browser::{ChromiumLauncher, FetcherLauncher, PageFetcher};
use pagesight_core::{AnalysisResult, AppConfig, FetchResult};
use pagesight_llm::build_provider;
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Default number of solve cycles before a gated page is given up on.
pub const DEFAULT_MAX_CAPTCHA_ATTEMPTS: u32 = 3;

/// State of one query.
enum PipelineStep {
    Fetching,
    Checking(FetchResult),
    Solving(FetchResult),
    Analyzing(FetchResult),
    Failed,
}

impl PipelineStep {
    fn name(&self) -> &'static str {
        match self {
            Self::Fetching => "fetching",
            Self::Checking(_) => "checking",
            Self::Solving(_) => "solving",
            Self::Analyzing(_) => "analyzing",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Answers questions about web pages, getting past CAPTCHA gates when it can.
///
/// A pipeline holds no per-query state; it can be shared behind an `Arc` and
/// serve concurrent queries, each with its own browser session.
pub struct Pipeline {
    launcher: Arc<dyn FetcherLauncher>,
    solver: Arc<dyn CaptchaSolver>,
    analyzer: Arc<dyn ContentAnalyzer>,
    detector: CaptchaDetector,
    max_captcha_attempts: u32,
}

impl Pipeline {
    /// Create a pipeline from its three collaborators.
    #[must_use]
    pub fn new(
        launcher: Arc<dyn FetcherLauncher>,
        solver: Arc<dyn CaptchaSolver>,
        analyzer: Arc<dyn ContentAnalyzer>,
    ) -> Self {
        Self {
            launcher,
            solver,
            analyzer,
            detector: CaptchaDetector::new(),
            max_captcha_attempts: DEFAULT_MAX_CAPTCHA_ATTEMPTS,
        }
    }

    /// Set the number of solve cycles allowed per query.
    ///
    /// Zero means a gated first page fails immediately without solving.
    #[must_use]
    pub fn with_max_captcha_attempts(mut self, max: u32) -> Self {
        self.max_captcha_attempts = max;
        self
    }

    /// Build a pipeline backed by headless Chromium and the configured model.
    ///
    /// The same provider serves both CAPTCHA solving and content analysis.
    ///
    /// # Errors
    /// Returns an error if the model provider cannot be constructed.
    pub fn from_config(config: &AppConfig) -> pagesight_llm::Result<Self> {
        let provider = build_provider(&config.llm)?;

        let solver = VisionCaptchaSolver::new(provider.clone())
            .with_max_context_chars(config.pipeline.max_context_chars)
            .with_temperature(config.llm.temperature)
            .with_max_tokens(config.llm.max_tokens);

        let analyzer = VisionContentAnalyzer::new(provider)
            .with_temperature(config.llm.temperature)
            .with_max_tokens(config.llm.max_tokens);

        Ok(Self::new(
            Arc::new(ChromiumLauncher::new(config.browser.clone())),
            Arc::new(solver),
            Arc::new(analyzer),
        )
        .with_max_captcha_attempts(config.pipeline.max_captcha_attempts))
    }

    /// Configured solve-cycle ceiling.
    #[must_use]
    pub fn max_captcha_attempts(&self) -> u32 {
        self.max_captcha_attempts
    }

    /// Fetch `url`, get past any CAPTCHA gate, and answer `query` about it.
    ///
    /// The browser session is released before returning, whatever the outcome.
    pub async fn process_query(&self, url: &str, query: &str) -> Result<AnalysisResult> {
        let span = tracing::info_span!("query", id = %Uuid::new_v4(), url = %url);
        self.execute(url, query).instrument(span).await
    }

    async fn execute(&self, url: &str, query: &str) -> Result<AnalysisResult> {
        tracing::info!("Processing query: {}", query);

        // Dropping the session without closing it still kills the browser
        let mut session = self.launcher.launch().await.map_err(PipelineError::Fetch)?;

        let outcome = self.run(session.as_ref(), url, query).await;

        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close browser session: {}", e);
        }

        match &outcome {
            Ok(_) => tracing::info!("Query answered"),
            Err(e) => tracing::info!("Query failed ({}): {}", e.code(), e),
        }

        outcome
    }

    async fn run(
        &self,
        fetcher: &dyn PageFetcher,
        url: &str,
        query: &str,
    ) -> Result<AnalysisResult> {
        let mut attempts: u32 = 0;
        let mut step = PipelineStep::Fetching;

        loop {
            tracing::debug!("Pipeline step: {} (attempts: {})", step, attempts);

            step = match step {
                PipelineStep::Fetching => {
                    let page = fetcher.fetch(url).await.map_err(PipelineError::Fetch)?;
                    PipelineStep::Checking(page)
                }

                PipelineStep::Checking(page) => {
                    if !self.detector.detect(&page.html) {
                        PipelineStep::Analyzing(page)
                    } else if attempts >= self.max_captcha_attempts {
                        PipelineStep::Failed
                    } else {
                        PipelineStep::Solving(page)
                    }
                }

                PipelineStep::Solving(page) => {
                    attempts += 1;

                    match page.captcha_challenge() {
                        None => {
                            tracing::debug!(
                                "Page is gated but has no challenge image, analyzing as is"
                            );
                            PipelineStep::Analyzing(page)
                        }
                        Some(challenge) => {
                            tracing::debug!(
                                "Solving CAPTCHA {} (attempt {}/{})",
                                challenge.source,
                                attempts,
                                self.max_captcha_attempts
                            );

                            self.solver
                                .solve(&challenge.image_data_uri, Some(&page.html))
                                .await
                                .map_err(PipelineError::Solve)?;

                            PipelineStep::Fetching
                        }
                    }
                }

                PipelineStep::Analyzing(page) => {
                    return self
                        .analyzer
                        .analyze(&page.html, query, Some(&page.images))
                        .await
                        .map_err(PipelineError::Analysis);
                }

                PipelineStep::Failed => {
                    tracing::warn!(
                        "Page still gated after {} CAPTCHA attempts, giving up",
                        attempts
                    );
                    return Err(PipelineError::CaptchaAttemptsExceeded { attempts });
                }
            };
        }
    }
}
