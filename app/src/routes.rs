//! HTTP routes.

use crate::error::ApiError;
use actix_web::error::JsonPayloadError;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use pagesight_browser::validate_url;
use pagesight_pipeline::Pipeline;
use serde::{Deserialize, Serialize};

/// Body of `POST /ask`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// Page to fetch
    pub url: String,
    /// Question about the page
    pub query: String,
}

/// Successful `POST /ask` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskResponse {
    /// Page that was fetched
    pub url: String,
    /// Question as asked
    pub query: String,
    /// Direct answer
    pub answer: String,
    /// How the answer was found
    pub reasoning: String,
    /// Element holding the answer, when the model named one
    pub html_element: Option<String>,
}

/// Register the API routes and JSON handling.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .service(ask)
        .service(health);
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::validation(format!("invalid request body: {err}")).into()
}

#[post("/ask")]
async fn ask(
    pipeline: web::Data<Pipeline>,
    body: web::Json<AskRequest>,
) -> Result<HttpResponse, ApiError> {
    let AskRequest { url, query } = body.into_inner();

    validate_url(&url).map_err(|e| ApiError::validation(e.to_string()))?;
    if query.trim().is_empty() {
        return Err(ApiError::validation("query must not be empty"));
    }

    let result = pipeline.process_query(&url, &query).await.map_err(|e| {
        tracing::error!("Query for {} failed: {}", url, e);
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(AskResponse {
        url,
        query,
        answer: result.answer,
        reasoning: result.reasoning,
        html_element: result.html_element,
    }))
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "healthy" }))
}
