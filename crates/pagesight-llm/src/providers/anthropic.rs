//! Anthropic Claude provider implementation.

use super::common::{build_http_client, decode_image, send_json};
use crate::error::Result;
use crate::provider::{
    CompletionRequest, CompletionResponse, LlmProvider, Message, ProviderCapabilities, Role,
    Usage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const DEFAULT_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Anthropic Claude API provider.
///
/// Images are sent as base64 `image` content blocks ahead of the text block
/// of the same message.
pub struct AnthropicProvider {
    api_key: String,
    model: String,
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider with the given API key.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_model(api_key, DEFAULT_MODEL)
    }

    /// Create a new Anthropic provider with a specific model.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn with_model(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, model, DEFAULT_URL, DEFAULT_TIMEOUT_SECS)
    }

    /// Create a new Anthropic provider with custom base URL and timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn with_options(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            client: build_http_client(Some(timeout_secs))?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_secs,
        })
    }

    fn to_api_message(message: &Message) -> Result<AnthropicMessage> {
        let mut content = message
            .images
            .iter()
            .map(|uri| {
                decode_image(uri).map(|image| AnthropicContent::Image {
                    source: ImageSource {
                        source_type: "base64".to_string(),
                        media_type: image.media_type().to_string(),
                        data: image.data().to_string(),
                    },
                })
            })
            .collect::<Result<Vec<_>>>()?;

        content.push(AnthropicContent::Text {
            text: message.content.clone(),
        });

        Ok(AnthropicMessage {
            role: match message.role {
                Role::Assistant => "assistant".to_string(),
                Role::User | Role::System => "user".to_string(),
            },
            content,
        })
    }

    /// Convert internal request to Anthropic API format.
    ///
    /// System-role messages are folded into the top-level `system` field.
    fn to_api_request(&self, request: &CompletionRequest) -> Result<AnthropicRequest> {
        let mut system_parts: Vec<String> = request.system_prompt.iter().cloned().collect();
        system_parts.extend(
            request
                .messages
                .iter()
                .filter(|m| m.role == Role::System)
                .map(|m| m.content.clone()),
        );

        let messages = request
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(Self::to_api_message)
            .collect::<Result<Vec<_>>>()?;

        Ok(AnthropicRequest {
            model: self.model.clone(),
            messages,
            max_tokens: request.max_tokens.unwrap_or(4096),
            temperature: request.temperature,
            system: if system_parts.is_empty() {
                None
            } else {
                Some(system_parts.join("\n\n"))
            },
        })
    }

    /// Convert Anthropic API response to internal format.
    fn convert_api_response(response: AnthropicResponse) -> CompletionResponse {
        let content = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        CompletionResponse {
            content,
            model: response.model,
            stop_reason: response.stop_reason,
            usage: response.usage.map(|u| Usage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let api_request = self.to_api_request(&request)?;

        tracing::debug!(
            "Anthropic messages request (model: {}, with images: {})",
            self.model,
            request.has_images()
        );

        let http_request = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&api_request);

        let api_response: AnthropicResponse =
            send_json(http_request, "anthropic", self.timeout_secs).await?;

        Ok(Self::convert_api_response(api_response))
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            max_context_tokens: 200_000,
            is_local: false,
            supports_vision: true,
            model_name: self.model.clone(),
        }
    }

    fn provider_id(&self) -> &'static str {
        "anthropic"
    }
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum AnthropicContent {
    Image { source: ImageSource },
    Text { text: String },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    model: String,
    stop_reason: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;

    #[test]
    fn test_provider_creation() {
        let provider = AnthropicProvider::new("test-key").expect("create provider");
        assert_eq!(provider.provider_id(), "anthropic");
        assert_eq!(provider.base_url, "https://api.anthropic.com/v1");
    }

    #[test]
    fn test_capabilities() {
        let provider = AnthropicProvider::new("test-key").expect("create provider");
        let caps = provider.capabilities();

        assert!(!caps.is_local);
        assert!(caps.supports_vision);
        assert_eq!(caps.max_context_tokens, 200_000);
    }

    #[test]
    fn test_api_request_places_image_before_text() {
        let provider = AnthropicProvider::new("test-key").expect("create provider");
        let request = CompletionRequest::from_messages(vec![Message::user(
            "What text do you see in this CAPTCHA image?",
        )
        .with_image("data:image/jpeg;base64,QUJD")]);

        let api_request = provider.to_api_request(&request).expect("convert request");
        let json = serde_json::to_value(&api_request).expect("serialize");
        let content = &json["messages"][0]["content"];

        assert_eq!(json["max_tokens"], 4096);
        assert_eq!(content[0]["type"], "image");
        assert_eq!(content[0]["source"]["type"], "base64");
        assert_eq!(content[0]["source"]["media_type"], "image/jpeg");
        assert_eq!(content[0]["source"]["data"], "QUJD");
        assert_eq!(content[1]["type"], "text");
        assert_eq!(
            content[1]["text"],
            "What text do you see in this CAPTCHA image?"
        );
    }

    #[test]
    fn test_api_request_folds_system_messages() {
        let provider = AnthropicProvider::new("test-key").expect("create provider");
        let request = CompletionRequest::from_messages(vec![
            Message::system("Answer in JSON."),
            Message::user("What is the price?"),
        ])
        .with_system_prompt("You analyze web pages.");

        let api_request = provider.to_api_request(&request).expect("convert request");
        let json = serde_json::to_value(&api_request).expect("serialize");

        assert_eq!(json["system"], "You analyze web pages.\n\nAnswer in JSON.");
        assert_eq!(json["messages"].as_array().map(Vec::len), Some(1));
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_api_request_rejects_remote_image() {
        let provider = AnthropicProvider::new("test-key").expect("create provider");
        let request = CompletionRequest::from_messages(vec![
            Message::user("?").with_image("captcha.png")
        ]);

        assert!(matches!(
            provider.to_api_request(&request),
            Err(LlmError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_api_response_conversion_skips_unknown_blocks() {
        let body = serde_json::json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-5-sonnet-20241022",
            "content": [
                { "type": "thinking", "thinking": "..." },
                { "type": "text", "text": "X7K9P" }
            ],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 50, "output_tokens": 5 }
        });

        let response: AnthropicResponse = serde_json::from_value(body).expect("parse response");
        let converted = AnthropicProvider::convert_api_response(response);

        assert_eq!(converted.content, "X7K9P");
        assert_eq!(converted.stop_reason.as_deref(), Some("end_turn"));
        assert_eq!(converted.usage.map(|u| u.total_tokens()), Some(55));
    }
}
