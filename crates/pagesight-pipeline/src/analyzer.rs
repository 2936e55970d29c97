//! Question answering over fetched page content.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use pagesight_core::{AnalysisResult, ImageMap};
use pagesight_llm::{CompletionRequest, LlmProvider, Message, Result};
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are a web content analysis expert. Given HTML content and a \
question, your task is to find the answer in the content. Analyze the HTML structure, text, \
and any embedded images to provide an accurate answer. Always include the specific HTML \
element that contains your answer.
Format your response as a JSON object with three fields:
- answer: The direct answer to the question
- reasoning: A brief explanation of how you found the answer
- html_element: The HTML element (tag and content) containing the answer";

/// Reasoning used when the model's JSON object has no `reasoning` field.
pub const DIRECT_RESPONSE_REASONING: &str = "Direct response from model";

/// Reasoning used when the model did not answer with a JSON object.
pub const RAW_RESPONSE_REASONING: &str = "Raw response from model (not in expected JSON format)";

static IMG_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("valid img tag regex"));

// Leading whitespace keeps `data-src` and similar attributes from matching
static SRC_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)(\ssrc\s*=\s*)(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("valid src attribute regex")
});

static JSON_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```(?:json)?\s*(.*?)\s*```$").expect("valid code fence regex")
});

/// Answers a natural-language question about a page.
#[async_trait]
pub trait ContentAnalyzer: Send + Sync {
    /// Answer `query` from `html`, with `images` inlined where the page references them.
    async fn analyze(
        &self,
        html: &str,
        query: &str,
        images: Option<&ImageMap>,
    ) -> Result<AnalysisResult>;
}

/// [`ContentAnalyzer`] backed by an [`LlmProvider`].
pub struct VisionContentAnalyzer {
    provider: Arc<dyn LlmProvider>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl VisionContentAnalyzer {
    /// Create an analyzer using `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the completion token limit.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[async_trait]
impl ContentAnalyzer for VisionContentAnalyzer {
    async fn analyze(
        &self,
        html: &str,
        query: &str,
        images: Option<&ImageMap>,
    ) -> Result<AnalysisResult> {
        let html = match images {
            Some(images) if !images.is_empty() => embed_images(html, images),
            _ => html.to_string(),
        };

        let prompt = format!(
            "HTML Content:\n{html}\n\nQuestion: {query}\n\n\
             Respond with a JSON object containing the answer, reasoning, and HTML element."
        );

        let mut request = CompletionRequest::from_messages(vec![Message::user(prompt)])
            .with_system_prompt(SYSTEM_PROMPT);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = self.provider.complete(request).await?;
        let result = parse_analysis(&response.content);

        tracing::debug!(
            "Analysis answered {:?} (element: {})",
            result.answer,
            result.html_element.is_some()
        );

        Ok(result)
    }
}

/// Replace `img` `src` values found in `images` with their inlined data URIs.
pub fn embed_images(html: &str, images: &ImageMap) -> String {
    IMG_TAG
        .replace_all(html, |tag: &Captures| {
            SRC_ATTR
                .replace(&tag[0], |attr: &Captures| {
                    let (value, quote) = match (attr.get(2), attr.get(3), attr.get(4)) {
                        (Some(value), _, _) => (value.as_str(), "\""),
                        (None, Some(value), _) => (value.as_str(), "'"),
                        (None, None, Some(value)) => (value.as_str(), ""),
                        (None, None, None) => return attr[0].to_string(),
                    };

                    match images.get(value.trim()) {
                        Some(data_uri) => format!("{}{quote}{data_uri}{quote}", &attr[1]),
                        None => attr[0].to_string(),
                    }
                })
                .into_owned()
        })
        .into_owned()
}

/// Interpret a model response as an [`AnalysisResult`].
///
/// Never fails: anything that is not a JSON object becomes the answer verbatim.
pub fn parse_analysis(raw: &str) -> AnalysisResult {
    let trimmed = raw.trim();
    let body = JSON_FENCE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map_or(trimmed, |m| m.as_str());

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(fields)) => AnalysisResult::new(
            field_text(fields.get("answer")).unwrap_or_else(|| raw.to_string()),
            field_text(fields.get("reasoning"))
                .unwrap_or_else(|| DIRECT_RESPONSE_REASONING.to_string()),
            fields
                .get("html_element")
                .and_then(Value::as_str)
                .map(str::to_string),
        ),
        _ => AnalysisResult::new(raw, RAW_RESPONSE_REASONING, None),
    }
}

fn field_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
