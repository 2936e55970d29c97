use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use async_trait::async_trait;
use pagesight_app::routes::{self, AskResponse};
use pagesight_browser::{BrowserError, FetcherLauncher, PageFetcher};
use pagesight_core::{AnalysisResult, FetchResult, ImageMap};
use pagesight_llm::LlmError;
use pagesight_pipeline::{CaptchaSolver, ContentAnalyzer, Pipeline};
use serde_json::{json, Value};
use std::sync::Arc;

/// Serves one fixed page per fetch, or fails every fetch.
struct StaticLauncher {
    html: Option<&'static str>,
}

struct StaticSession {
    html: Option<&'static str>,
}

#[async_trait]
impl FetcherLauncher for StaticLauncher {
    async fn launch(&self) -> pagesight_browser::Result<Box<dyn PageFetcher>> {
        Ok(Box::new(StaticSession { html: self.html }))
    }
}

#[async_trait]
impl PageFetcher for StaticSession {
    async fn fetch(&self, _url: &str) -> pagesight_browser::Result<FetchResult> {
        match self.html {
            Some(html) => {
                let mut images = ImageMap::new();
                images.insert(
                    "captcha.png".to_string(),
                    "data:image/png;base64,QUJD".to_string(),
                );
                Ok(FetchResult::new(html, images))
            }
            None => Err(BrowserError::NavigationError(
                "net::ERR_NAME_NOT_RESOLVED".to_string(),
            )),
        }
    }
}

struct EchoSolver;

#[async_trait]
impl CaptchaSolver for EchoSolver {
    async fn solve(&self, _image: &str, _context: Option<&str>) -> pagesight_llm::Result<String> {
        Ok("X7K9P".to_string())
    }

    async fn solve_text(&self, challenge: &str) -> pagesight_llm::Result<String> {
        Ok(challenge.to_string())
    }
}

struct FixedAnalyzer {
    fail: bool,
}

#[async_trait]
impl ContentAnalyzer for FixedAnalyzer {
    async fn analyze(
        &self,
        _html: &str,
        _query: &str,
        _images: Option<&ImageMap>,
    ) -> pagesight_llm::Result<AnalysisResult> {
        if self.fail {
            return Err(LlmError::Timeout { seconds: 120 });
        }
        Ok(AnalysisResult::new(
            "$19.99",
            "Found in the price paragraph",
            Some("<p class=\"price\">$19.99</p>".to_string()),
        ))
    }
}

fn pipeline(html: Option<&'static str>, analysis_fails: bool) -> web::Data<Pipeline> {
    web::Data::new(
        Pipeline::new(
            Arc::new(StaticLauncher { html }),
            Arc::new(EchoSolver),
            Arc::new(FixedAnalyzer {
                fail: analysis_fails,
            }),
        )
        .with_max_captcha_attempts(2),
    )
}

const CLEAN_PAGE: &str = r#"<html><body><p class="price">$19.99</p></body></html>"#;
const GATED_PAGE: &str = r#"<html><body><p>Are you a robot?</p><img src="captcha.png"></body></html>"#;

macro_rules! app {
    ($pipeline:expr) => {
        test::init_service(App::new().app_data($pipeline).configure(routes::configure)).await
    };
}

#[actix_web::test]
async fn test_health() {
    let app = app!(pipeline(Some(CLEAN_PAGE), false));

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body, json!({ "status": "healthy" }));
}

#[actix_web::test]
async fn test_ask_returns_answer() {
    let app = app!(pipeline(Some(CLEAN_PAGE), false));

    let req = test::TestRequest::post()
        .uri("/ask")
        .set_json(json!({ "url": "https://example.com/product", "query": "What is the price?" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: AskResponse = test::read_body_json(resp).await;
    assert_eq!(
        body,
        AskResponse {
            url: "https://example.com/product".to_string(),
            query: "What is the price?".to_string(),
            answer: "$19.99".to_string(),
            reasoning: "Found in the price paragraph".to_string(),
            html_element: Some("<p class=\"price\">$19.99</p>".to_string()),
        }
    );
}

#[actix_web::test]
async fn test_ask_rejects_missing_fields() {
    let app = app!(pipeline(Some(CLEAN_PAGE), false));

    let req = test::TestRequest::post()
        .uri("/ask")
        .set_json(json!({ "url": "https://example.com/product" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn test_ask_rejects_non_http_url() {
    let app = app!(pipeline(Some(CLEAN_PAGE), false));

    for url in ["file:///etc/passwd", "not a url", "ftp://example.com"] {
        let req = test::TestRequest::post()
            .uri("/ask")
            .set_json(json!({ "url": url, "query": "What is this?" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "{url}");
    }
}

#[actix_web::test]
async fn test_ask_rejects_empty_query() {
    let app = app!(pipeline(Some(CLEAN_PAGE), false));

    let req = test::TestRequest::post()
        .uri("/ask")
        .set_json(json!({ "url": "https://example.com", "query": "   " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn test_ask_reports_fetch_failure() {
    let app = app!(pipeline(None, false));

    let req = test::TestRequest::post()
        .uri("/ask")
        .set_json(json!({ "url": "https://unreachable.example", "query": "Anything?" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "FETCH_FAILED");
    assert!(body["message"]
        .as_str()
        .is_some_and(|m| m.contains("ERR_NAME_NOT_RESOLVED")));
}

#[actix_web::test]
async fn test_ask_reports_captcha_exhaustion() {
    let app = app!(pipeline(Some(GATED_PAGE), false));

    let req = test::TestRequest::post()
        .uri("/ask")
        .set_json(json!({ "url": "https://example.com/gated", "query": "What is the price?" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "CAPTCHA_ATTEMPTS_EXCEEDED");
    assert_eq!(body["details"]["attempts"], 2);
}

#[actix_web::test]
async fn test_ask_reports_analysis_failure() {
    let app = app!(pipeline(Some(CLEAN_PAGE), true));

    let req = test::TestRequest::post()
        .uri("/ask")
        .set_json(json!({ "url": "https://example.com", "query": "What is the price?" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "ANALYSIS_FAILED");
}
