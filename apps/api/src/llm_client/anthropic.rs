//! Anthropic Messages API backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    endpoint_url, response_error, send_error, GenerationOptions, InferenceBackend, LlmError,
};

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl AnthropicResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

/// Wraps the Anthropic Messages API with retry on 429 and 5xx responses.
#[derive(Clone)]
pub struct AnthropicBackend {
    client: Client,
    api_key: String,
    model: String,
    url: String,
}

impl AnthropicBackend {
    pub fn new(api_key: String, model: String, base_url: Option<String>) -> Result<Self, LlmError> {
        let url = endpoint_url(
            base_url.as_deref().unwrap_or(ANTHROPIC_BASE_URL),
            "v1/messages",
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

    /// Sends one Messages API request. 429, 5xx and transport failures are retried
    /// with exponential backoff; anything else returns at once.
    pub async fn call(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<AnthropicResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: &self.model,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            system: options.system.as_deref(),
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // 1s, 2s
                let delay = std::time::Duration::from_millis(1000 << (attempt - 1));
                warn!(
                    "Retrying Anthropic call ({}/{}) after {}ms",
                    attempt + 1,
                    MAX_RETRIES,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let sent = self
                .client
                .post(&self.url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&request_body)
                .send()
                .await;

            let response = match sent.map_err(send_error) {
                Ok(response) => response,
                Err(e) if e.is_upstream() => {
                    last_error = Some(e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                last_error = Some(response_error("Anthropic", response).await);
                continue;
            }
            if !status.is_success() {
                return Err(response_error("Anthropic", response).await);
            }

            let body: AnthropicResponse = response.json().await?;
            debug!(
                "Anthropic usage: input_tokens={}, output_tokens={}",
                body.usage.input_tokens, body.usage.output_tokens
            );
            return Ok(body);
        }

        Err(match last_error {
            Some(LlmError::RateLimited { .. }) | None => LlmError::RateLimited {
                retries: MAX_RETRIES,
            },
            Some(e) => e,
        })
    }
}

#[async_trait]
impl InferenceBackend for AnthropicBackend {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, LlmError> {
        let response = self.call(prompt, options).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer) -> AnthropicBackend {
        AnthropicBackend::new(
            "test-key".to_string(),
            "claude-sonnet-4-5".to_string(),
            Some(server.uri()),
        )
        .unwrap()
    }

    #[test]
    fn test_response_text_picks_first_text_block() {
        let json = r#"{
            "content": [
                {"type": "tool_use", "text": null},
                {"type": "text", "text": "{\"score\": 0.9}"}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }"#;
        let response: AnthropicResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("{\"score\": 0.9}"));
    }

    #[tokio::test]
    async fn test_generate_returns_text_block() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/v1/messages"))
            .and(matchers::header("x-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{"type": "text", "text": "hello"}],
                "usage": {"input_tokens": 3, "output_tokens": 1}
            })))
            .mount(&server)
            .await;

        let text = backend_for(&server)
            .generate("hi", &GenerationOptions::default().with_system("be brief"))
            .await
            .unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn test_unauthorized_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "invalid x-api-key"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = backend_for(&server)
            .generate("hi", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Unauthorized));
    }

    #[tokio::test]
    async fn test_client_error_surfaces_api_message() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"message": "max_tokens too large"}
            })))
            .mount(&server)
            .await;

        let err = backend_for(&server)
            .generate("hi", &GenerationOptions::default())
            .await
            .unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "max_tokens too large");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_base_url_is_rejected_at_construction() {
        let result = AnthropicBackend::new(
            "test-key".to_string(),
            "claude-sonnet-4-5".to_string(),
            Some("not a url".to_string()),
        );
        assert!(matches!(result, Err(LlmError::Client(_))));
    }

    #[tokio::test]
    async fn test_unbuildable_request_is_not_retried() {
        let backend = AnthropicBackend {
            client: Client::new(),
            api_key: "test-key".to_string(),
            model: "claude-sonnet-4-5".to_string(),
            url: "ftp://models.internal/v1/messages".to_string(),
        };
        let err = backend
            .generate("hi", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Client(_)));
    }
}
