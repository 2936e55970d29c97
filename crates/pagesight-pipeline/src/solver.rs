//! CAPTCHA solving with a vision-capable model.

use async_trait::async_trait;
use pagesight_llm::{CompletionRequest, LlmError, LlmProvider, Message, Result};
use std::sync::Arc;

const IMAGE_SYSTEM_PROMPT: &str = "You are a CAPTCHA solving assistant. Your task is to \
accurately read and interpret text from images, especially CAPTCHAs. Respond with ONLY the \
text you see in the image, nothing else.";

const TEXT_SYSTEM_PROMPT: &str = "You are a CAPTCHA solving assistant specialized in solving \
text-based challenges like math problems and logic puzzles. Provide ONLY the answer, no \
explanations.";

const IMAGE_QUESTION: &str = "What text do you see in this CAPTCHA image?";

/// Default character budget for page context sent along with an image.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 20_000;

/// Produces a candidate answer for a CAPTCHA challenge.
#[async_trait]
pub trait CaptchaSolver: Send + Sync {
    /// Read the challenge in `image_data_uri`, optionally guided by page context.
    ///
    /// The pipeline passes the full current HTML as `context`. Implementations
    /// may shorten it to fit the model's input.
    async fn solve(&self, image_data_uri: &str, context: Option<&str>) -> Result<String>;

    /// Answer a text challenge such as a simple arithmetic question.
    async fn solve_text(&self, challenge: &str) -> Result<String>;
}

/// [`CaptchaSolver`] backed by an [`LlmProvider`] with vision support.
///
/// Page context is truncated to the first `max_context_chars` characters
/// ([`DEFAULT_MAX_CONTEXT_CHARS`] unless configured).
pub struct VisionCaptchaSolver {
    provider: Arc<dyn LlmProvider>,
    max_context_chars: usize,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl VisionCaptchaSolver {
    /// Create a solver using `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Limit the context passed alongside the image.
    #[must_use]
    pub fn with_max_context_chars(mut self, max_context_chars: usize) -> Self {
        self.max_context_chars = max_context_chars;
        self
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

    fn request(&self, system_prompt: &str, message: Message) -> CompletionRequest {
        let mut request =
            CompletionRequest::from_messages(vec![message]).with_system_prompt(system_prompt);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        request
    }

    async fn ask(&self, request: CompletionRequest) -> Result<String> {
        let response = self.provider.complete(request).await?;
        let solution = normalize_solution(&response.content);

        if solution.is_empty() {
            return Err(LlmError::ParseError {
                provider: self.provider.provider_id().to_string(),
                message: "model returned an empty CAPTCHA solution".to_string(),
            });
        }

        Ok(solution.to_string())
    }
}

#[async_trait]
impl CaptchaSolver for VisionCaptchaSolver {
    async fn solve(&self, image_data_uri: &str, context: Option<&str>) -> Result<String> {
        let mut question = IMAGE_QUESTION.to_string();
        if let Some(context) = context.filter(|c| !c.is_empty()) {
            question.push_str("\n\nContext: ");
            question.push_str(truncate_chars(context, self.max_context_chars));
        }

        let message = Message::user(question).with_image(image_data_uri);
        let solution = self.ask(self.request(IMAGE_SYSTEM_PROMPT, message)).await?;

        tracing::debug!("CAPTCHA image read as {:?}", solution);
        Ok(solution)
    }

    async fn solve_text(&self, challenge: &str) -> Result<String> {
        let message = Message::user(format!("Solve this CAPTCHA challenge: {challenge}"));
        let solution = self.ask(self.request(TEXT_SYSTEM_PROMPT, message)).await?;

        tracing::debug!("Text challenge answered with {:?}", solution);
        Ok(solution)
    }
}

/// Trim whitespace, then surrounding quote characters.
fn normalize_solution(raw: &str) -> &str {
    raw.trim().trim_matches(|c| c == '"' || c == '\'')
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagesight_llm::{CompletionResponse, ProviderCapabilities};
    use std::sync::Mutex;

    struct ScriptedProvider {
        reply: String,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn last_request(&self) -> CompletionRequest {
            self.requests
                .lock()
                .unwrap()
                .last()
                .cloned()
                .expect("a request was sent")
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
            self.requests.lock().unwrap().push(request);
            Ok(CompletionResponse {
                content: self.reply.clone(),
                model: "scripted".to_string(),
                stop_reason: None,
                usage: None,
            })
        }

        fn capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities {
                max_context_tokens: 4096,
                is_local: true,
                supports_vision: true,
                model_name: "scripted".to_string(),
            }
        }

        fn provider_id(&self) -> &str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn test_solve_strips_whitespace_and_quotes() {
        let provider = ScriptedProvider::new("  \"X7K9P\"\n");
        let solver = VisionCaptchaSolver::new(provider.clone());

        let solution = solver
            .solve("data:image/png;base64,QUJD", None)
            .await
            .unwrap();
        assert_eq!(solution, "X7K9P");

        let request = provider.last_request();
        assert_eq!(request.messages[0].content, IMAGE_QUESTION);
        assert_eq!(request.messages[0].images, vec!["data:image/png;base64,QUJD"]);
        assert!(request
            .system_prompt
            .as_deref()
            .is_some_and(|p| p.contains("ONLY the text")));
    }

    #[tokio::test]
    async fn test_solve_appends_truncated_context() {
        let provider = ScriptedProvider::new("abc");
        let solver = VisionCaptchaSolver::new(provider.clone())
            .with_max_context_chars(5)
            .with_temperature(0.2)
            .with_max_tokens(64);

        solver
            .solve("data:image/png;base64,QUJD", Some("<html>héllo</html>"))
            .await
            .unwrap();

        let request = provider.last_request();
        assert_eq!(
            request.messages[0].content,
            "What text do you see in this CAPTCHA image?\n\nContext: <html"
        );
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(64));
    }

    #[tokio::test]
    async fn test_solve_text_prompt() {
        let provider = ScriptedProvider::new("'4'");
        let solver = VisionCaptchaSolver::new(provider.clone());

        let answer = solver.solve_text("What is 2+2?").await.unwrap();
        assert_eq!(answer, "4");

        let request = provider.last_request();
        assert_eq!(
            request.messages[0].content,
            "Solve this CAPTCHA challenge: What is 2+2?"
        );
        assert!(!request.has_images());
    }

    #[tokio::test]
    async fn test_empty_solution_is_an_error() {
        let provider = ScriptedProvider::new("  \"\"  ");
        let solver = VisionCaptchaSolver::new(provider);

        let err = solver
            .solve("data:image/png;base64,QUJD", None)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::ParseError { .. }));
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
