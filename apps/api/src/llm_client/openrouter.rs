//! OpenRouter backend (OpenAI-compatible chat completions).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    endpoint_url, response_error, send_error, GenerationOptions, InferenceBackend, LlmError,
};

const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const REFERER: &str = "https://interview-api.local";
const APP_TITLE: &str = "Interview Evaluation API";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct OpenRouterBackend {
    client: Client,
    api_key: String,
    model: String,
    url: String,
}

impl OpenRouterBackend {
    pub fn new(api_key: String, model: String, base_url: Option<String>) -> Result<Self, LlmError> {
        let url = endpoint_url(
            base_url.as_deref().unwrap_or(OPENROUTER_BASE_URL),
            "chat/completions",
        )?;
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            api_key,
            model,
            url,
        })
    }
}

#[async_trait]
impl InferenceBackend for OpenRouterBackend {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = options.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request_body = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", APP_TITLE)
            .json(&request_body)
            .send()
            .await
            .map_err(send_error)?;

        if !response.status().is_success() {
            return Err(response_error("OpenRouter", response).await);
        }

        let body: ChatResponse = response.json().await?;
        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or(LlmError::EmptyContent)?;

        debug!("OpenRouter call succeeded: {} chars", text.len());
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "openrouter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer) -> OpenRouterBackend {
        OpenRouterBackend::new(
            "sk-test".to_string(),
            "openai/gpt-4o-mini".to_string(),
            Some(server.uri()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_generate_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/chat/completions"))
            .and(matchers::header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"score\": 0.7}"}}]
            })))
            .mount(&server)
            .await;

        let text = backend_for(&server)
            .generate("evaluate", &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "{\"score\": 0.7}");
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = backend_for(&server)
            .generate("evaluate", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::RateLimited { .. }));
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = backend_for(&server)
            .generate("evaluate", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Unauthorized));
    }

    #[tokio::test]
    async fn test_blank_content_is_empty_content() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "   "}}]
            })))
            .mount(&server)
            .await;

        let err = backend_for(&server)
            .generate("evaluate", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[test]
    fn test_malformed_base_url_is_rejected_at_construction() {
        let result = OpenRouterBackend::new(
            "sk-test".to_string(),
            "openai/gpt-4o-mini".to_string(),
            Some("not a url".to_string()),
        );
        assert!(matches!(result, Err(LlmError::Client(_))));
    }

    #[tokio::test]
    async fn test_provider_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"message": "model not found"}
            })))
            .mount(&server)
            .await;

        let err = backend_for(&server)
            .generate("evaluate", &GenerationOptions::default())
            .await
            .unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "model not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unbuildable_request_scores_as_pipeline_error() {
        use std::sync::Arc;

        use crate::evaluation::models::EvaluationMethod;
        use crate::evaluation::{EvaluationPolicy, Evaluator};

        let backend = OpenRouterBackend {
            client: Client::new(),
            api_key: "sk-test".to_string(),
            model: "openai/gpt-4o-mini".to_string(),
            url: "ftp://models.internal/chat/completions".to_string(),
        };
        let evaluator = Evaluator::new(Arc::new(backend), EvaluationPolicy::default());

        let result = evaluator
            .evaluate_pair(
                "def double(n):\n    return n * 2",
                "def twice(x): return 2 * x",
                "Write a function that doubles a number.",
            )
            .await;

        assert_eq!(result.method(), EvaluationMethod::Error);
        assert_eq!(result.score(), 0.0);
    }
}
