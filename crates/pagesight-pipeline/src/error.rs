//! Error types for the query pipeline.

use pagesight_browser::BrowserError;
use pagesight_llm::LlmError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why a query failed.
///
/// Each variant keeps the collaborator error that caused it so callers can
/// tell fetch, solve and analysis failures apart from gate exhaustion.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The page could not be fetched, or the browser session could not start
    #[error("fetch failed: {0}")]
    Fetch(#[source] BrowserError),

    /// The CAPTCHA solver model call failed
    #[error("CAPTCHA solve failed: {0}")]
    Solve(#[source] LlmError),

    /// The content analysis model call failed
    #[error("content analysis failed: {0}")]
    Analysis(#[source] LlmError),

    /// The page was still gated after the permitted number of solve cycles
    #[error("page still gated by a CAPTCHA after {attempts} solve attempts")]
    CaptchaAttemptsExceeded {
        /// Number of solve cycles performed
        attempts: u32,
    },
}

/// Coarse classification of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Page acquisition failed
    FetchFailure,
    /// CAPTCHA model call failed
    SolveFailure,
    /// Analysis model call failed
    AnalysisFailure,
    /// Attempt ceiling reached
    CaptchaAttemptsExceeded,
}

impl PipelineError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Fetch(_) => FailureKind::FetchFailure,
            Self::Solve(_) => FailureKind::SolveFailure,
            Self::Analysis(_) => FailureKind::AnalysisFailure,
            Self::CaptchaAttemptsExceeded { .. } => FailureKind::CaptchaAttemptsExceeded,
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }
}

impl FailureKind {
    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::FetchFailure => "FETCH_FAILED",
            Self::SolveFailure => "SOLVE_FAILED",
            Self::AnalysisFailure => "ANALYSIS_FAILED",
            Self::CaptchaAttemptsExceeded => "CAPTCHA_ATTEMPTS_EXCEEDED",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
