use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::evaluation::{CodePenalty, EvaluationPolicy};

const DEFAULT_OPENROUTER_MODEL: &str = "openai/gpt-4o-mini";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Anthropic,
    OpenRouter,
}

impl FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" => Ok(LlmProvider::Anthropic),
            "openrouter" => Ok(LlmProvider::OpenRouter),
            other => bail!("Unknown LLM_PROVIDER '{other}' (expected 'anthropic' or 'openrouter')"),
        }
    }
}

/// Which model to call and how. Passed explicitly to `build_backend`.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    /// `None` starts the service in fallback mode.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmSettings,
    pub policy: EvaluationPolicy,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let provider: LlmProvider = optional_env("LLM_PROVIDER")
            .as_deref()
            .unwrap_or("openrouter")
            .parse()?;

        let (key_var, default_model) = match provider {
            LlmProvider::Anthropic => ("ANTHROPIC_API_KEY", DEFAULT_ANTHROPIC_MODEL),
            LlmProvider::OpenRouter => ("OPENROUTER_API_KEY", DEFAULT_OPENROUTER_MODEL),
        };

        let llm = LlmSettings {
            provider,
            api_key: optional_env(key_var),
            model: optional_env("LLM_MODEL").unwrap_or_else(|| default_model.to_string()),
            base_url: optional_env("LLM_BASE_URL"),
            temperature: parse_env("LLM_TEMPERATURE", 0.0)?,
            max_tokens: parse_env("LLM_MAX_TOKENS", 200)?,
        };

        let defaults = EvaluationPolicy::default();
        let policy = EvaluationPolicy {
            copy_threshold: parse_env("EVAL_COPY_THRESHOLD", defaults.copy_threshold)?,
            max_similarity_chars: parse_env(
                "EVAL_MAX_SIMILARITY_CHARS",
                defaults.max_similarity_chars,
            )?,
            pass_threshold: parse_env("EVAL_PASS_THRESHOLD", defaults.pass_threshold)?,
            code_penalty: parse_env::<CodePenalty>("EVAL_CODE_PENALTY", defaults.code_penalty)?,
            max_attempts: parse_env("EVAL_MAX_ATTEMPTS", defaults.max_attempts)?,
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            ..defaults
        };
        policy.validate()?;

        Ok(Config {
            llm,
            policy,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Returns the variable's value, treating unset and blank the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
