//! Error responses for the HTTP API.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use pagesight_pipeline::PipelineError;
use serde::Serialize;
use std::fmt;

/// Serializable error returned by API handlers.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Stable error code for clients (e.g., "CAPTCHA_ATTEMPTS_EXCEEDED")
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Optional structured context
    pub details: Option<serde_json::Value>,
    #[serde(skip)]
    status: StatusCode,
}

impl ApiError {
    /// Create an error with the given status.
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            status,
        }
    }

    /// Attach structured details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Request body failed validation.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION_ERROR",
            message,
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(self)
    }
}

/// Every pipeline failure is a server-side failure; the code tells them apart.
impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let error = Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.code(), err.to_string());

        match err {
            PipelineError::CaptchaAttemptsExceeded { attempts } => {
                error.with_details(serde_json::json!({ "attempts": attempts }))
            }
            _ => error,
        }
    }
}
