//! LLM Client: the single seam between the service and any inference provider.
//!
//! Every feature that talks to a model (answer scoring, skill extraction, question
//! generation) goes through `InferenceBackend`. Concrete vendors live in their own
//! submodules and are picked once at startup by `build_backend`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{LlmProvider, LlmSettings};

pub mod anthropic;
pub mod openrouter;
pub mod prompts;

pub use anthropic::AnthropicBackend;
pub use openrouter::OpenRouterBackend;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("Invalid or missing API key")]
    Unauthorized,

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("No inference backend configured")]
    Unavailable,

    #[error("Client error: {0}")]
    Client(String),
}

impl LlmError {
    /// True when the failure came from the provider side (network, auth, quota,
    /// malformed payload). Such failures are retried and then degraded to a local
    /// fallback; anything else is a fault in this service.
    pub fn is_upstream(&self) -> bool {
        !matches!(self, LlmError::Client(_))
    }
}

/// Per-call generation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub system: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            system: None,
            temperature: 0.0,
            max_tokens: 1000,
        }
    }
}

impl GenerationOptions {
    pub fn with_system(mut self, system: &str) -> Self {
        self.system = Some(system.to_string());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Narrow interface over interchangeable inference vendors.
///
/// Carried in `AppState` and in `Evaluator` as `Arc<dyn InferenceBackend>`, so tests
/// can substitute a scripted backend without touching callers.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Sends one prompt and returns the raw text of the model's reply.
    async fn generate(&self, prompt: &str, options: &GenerationOptions)
        -> Result<String, LlmError>;

    /// Short backend identifier surfaced in health checks and logs.
    fn name(&self) -> &'static str;
}

/// Backend used when no credentials are configured. Every call fails with
/// `LlmError::Unavailable`, which pushes callers onto their local fallbacks.
pub struct UnavailableBackend;

#[async_trait]
impl InferenceBackend for UnavailableBackend {
    async fn generate(
        &self,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, LlmError> {
        Err(LlmError::Unavailable)
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

/// Builds the backend selected by configuration. A missing API key is not fatal:
/// the service starts in fallback mode.
pub fn build_backend(settings: &LlmSettings) -> Result<Arc<dyn InferenceBackend>, LlmError> {
    let Some(api_key) = settings.api_key.clone() else {
        warn!(
            "No API key configured for provider {:?}; LLM features run in fallback mode",
            settings.provider
        );
        return Ok(Arc::new(UnavailableBackend));
    };

    let backend: Arc<dyn InferenceBackend> = match settings.provider {
        LlmProvider::Anthropic => Arc::new(AnthropicBackend::new(
            api_key,
            settings.model.clone(),
            settings.base_url.clone(),
        )?),
        LlmProvider::OpenRouter => Arc::new(OpenRouterBackend::new(
            api_key,
            settings.model.clone(),
            settings.base_url.clone(),
        )?),
    };
    info!(
        "Inference backend initialized: {} (model: {})",
        backend.name(),
        settings.model
    );
    Ok(backend)
}

/// Joins a configured base URL with an endpoint path. Only absolute http(s)
/// URLs are accepted.
pub(crate) fn endpoint_url(base: &str, path: &str) -> Result<String, LlmError> {
    let url = format!("{}/{path}", base.trim().trim_end_matches('/'));
    match reqwest::Url::parse(&url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(url),
        Ok(parsed) => Err(LlmError::Client(format!(
            "unsupported scheme '{}' in base URL '{base}'",
            parsed.scheme()
        ))),
        Err(e) => Err(LlmError::Client(format!("invalid base URL '{base}': {e}"))),
    }
}

/// Classifies a failed `send`. A request that could not be built (bad URL,
/// unsupported scheme, unencodable body) is a fault in this service, not the provider.
pub(crate) fn send_error(e: reqwest::Error) -> LlmError {
    if e.is_builder() {
        LlmError::Client(format!("request could not be built: {e}"))
    } else {
        LlmError::Http(e)
    }
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// Maps a failed response to an error. Providers wrap failures as
/// `{"error": {"message": ...}}`; any other body is kept verbatim.
pub(crate) async fn response_error(provider: &str, response: reqwest::Response) -> LlmError {
    let status = response.status().as_u16();
    match status {
        401 => {
            error!("{provider} rejected the API key");
            LlmError::Unauthorized
        }
        429 => {
            warn!("{provider} quota exceeded");
            LlmError::RateLimited { retries: 0 }
        }
        _ => {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("{provider} returned {status}: {message}");
            LlmError::Api { status, message }
        }
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Generates a reply and deserializes it as JSON, tolerating code fences.
pub async fn generate_json<T: DeserializeOwned>(
    backend: &dyn InferenceBackend,
    prompt: &str,
    options: &GenerationOptions,
) -> Result<T, LlmError> {
    let text = backend.generate(prompt, options).await?;
    Ok(serde_json::from_str(strip_json_fences(&text))?)
}
