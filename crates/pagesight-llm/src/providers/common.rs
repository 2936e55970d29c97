//! Common utilities shared across LLM providers.

use crate::error::{LlmError, Result};
use crate::provider::Role;
use pagesight_core::DataUri;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Default request timeout when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Build a standard HTTP client with common timeout settings.
///
/// # Arguments
/// * `timeout_secs` - Timeout in seconds (defaults to 60 if not specified)
///
/// # Errors
/// Returns error if the HTTP client cannot be created.
pub fn build_http_client(timeout_secs: Option<u64>) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(
            timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        ))
        .build()
        .map_err(|e| LlmError::Internal(format!("failed to create HTTP client: {e}")))
}

/// Send a prepared request and decode a JSON body.
///
/// Non-2xx statuses become [`LlmError::ApiError`] (or
/// [`LlmError::AuthenticationFailed`] for 401/403), client timeouts become
/// [`LlmError::Timeout`], and undecodable bodies become [`LlmError::ParseError`].
pub async fn send_json<R: DeserializeOwned>(
    request: RequestBuilder,
    provider: &str,
    timeout_secs: u64,
) -> Result<R> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            LlmError::Timeout {
                seconds: timeout_secs,
            }
        } else {
            LlmError::Network(e)
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(LlmError::AuthenticationFailed {
                provider: provider.to_string(),
                message: error_text,
            });
        }

        return Err(LlmError::ApiError {
            provider: provider.to_string(),
            status: status.as_u16(),
            message: error_text,
        });
    }

    response.json().await.map_err(|e| {
        if e.is_timeout() {
            LlmError::Timeout {
                seconds: timeout_secs,
            }
        } else {
            LlmError::ParseError {
                provider: provider.to_string(),
                message: format!("Failed to parse response: {e}"),
            }
        }
    })
}

/// Convert internal Role enum to standard role string.
///
/// Most providers use "system", "user", "assistant" roles.
#[must_use]
pub fn convert_role_standard(role: Role) -> String {
    match role {
        Role::System => "system".to_string(),
        Role::User => "user".to_string(),
        Role::Assistant => "assistant".to_string(),
    }
}

/// Split a data URI into media type and raw base64 payload.
///
/// # Errors
/// Returns [`LlmError::InvalidRequest`] if the image is not a base64 data URI.
pub fn decode_image(data_uri: &str) -> Result<DataUri> {
    DataUri::parse(data_uri).map_err(|e| LlmError::InvalidRequest(e.to_string()))
}

/// Common usage statistics structure.
///
/// Used by `OpenAI`-compatible providers to report token usage.
#[derive(Debug, Deserialize, Clone)]
pub struct StandardUsage {
    /// Number of tokens in the prompt/input
    pub prompt_tokens: u32,
    /// Number of tokens in the completion/output
    pub completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(Some(30));
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_http_client_default() {
        let client = build_http_client(None);
        assert!(client.is_ok());
    }

    #[test]
    fn test_convert_role_standard() {
        assert_eq!(convert_role_standard(Role::System), "system");
        assert_eq!(convert_role_standard(Role::User), "user");
        assert_eq!(convert_role_standard(Role::Assistant), "assistant");
    }

    #[test]
    fn test_decode_image() {
        let image = decode_image("data:image/jpeg;base64,QUJD").expect("decode image");
        assert_eq!(image.media_type(), "image/jpeg");
        assert_eq!(image.data(), "QUJD");

        let err = decode_image("https://example.com/captcha.png").unwrap_err();
        assert!(matches!(err, LlmError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_send_json_connection_refused_is_network_error() {
        let client = build_http_client(Some(1)).expect("create client");
        let request = client.post("http://127.0.0.1:9/api/chat");

        let result: Result<serde_json::Value> = send_json(request, "ollama", 1).await;
        assert!(matches!(
            result,
            Err(LlmError::Network(_) | LlmError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_send_json_stalled_body_is_timeout() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let addr = listener.local_addr().expect("local addr");

        // Headers arrive, the body never completes
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 64\r\n\r\n{\"message\":",
                )
                .await
                .expect("write partial response");
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client = build_http_client(Some(1)).expect("create client");
        let request = client.post(format!("http://{addr}/api/chat"));

        let result: Result<serde_json::Value> = send_json(request, "ollama", 1).await;
        assert!(matches!(result, Err(LlmError::Timeout { seconds: 1 })));

        server.abort();
    }
}
