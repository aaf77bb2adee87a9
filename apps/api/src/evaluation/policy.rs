use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// What to do when the expected answer contains code and the candidate's does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodePenalty {
    /// Tell the model in the rubric prompt and let it penalize.
    PromptSignal,
    /// Skip the model and return `code_penalty_score`.
    ShortCircuit,
}

impl FromStr for CodePenalty {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prompt_signal" => Ok(CodePenalty::PromptSignal),
            "short_circuit" => Ok(CodePenalty::ShortCircuit),
            other => Err(PolicyError::UnknownCodePenalty(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("{field} must be within [0, 1], got {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("max_attempts must be at least 1")]
    NoAttempts,

    #[error("max_similarity_chars must be at least 1")]
    NoSimilarityWindow,

    #[error("unknown code penalty '{0}' (expected 'prompt_signal' or 'short_circuit')")]
    UnknownCodePenalty(String),
}

/// Tunable evaluation policy. One instance drives every entry point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationPolicy {
    /// Similarity at or above which an answer counts as a copy of the prompt.
    pub copy_threshold: f64,
    /// Normalized characters of each text compared by the copy check.
    pub max_similarity_chars: usize,
    /// Default pass mark for batch results.
    pub pass_threshold: f64,
    pub code_penalty: CodePenalty,
    /// Score returned by `CodePenalty::ShortCircuit`.
    pub code_penalty_score: f64,
    /// Heuristic score when the model fails and the candidate wrote code.
    pub fallback_code_score: f64,
    /// Heuristic score when the model fails and the candidate wrote no code.
    pub fallback_plain_score: f64,
    pub max_attempts: u32,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for EvaluationPolicy {
    fn default() -> Self {
        Self {
            copy_threshold: 0.80,
            max_similarity_chars: 4000,
            pass_threshold: 0.75,
            code_penalty: CodePenalty::PromptSignal,
            code_penalty_score: 0.2,
            fallback_code_score: 0.5,
            fallback_plain_score: 0.1,
            max_attempts: 3,
            temperature: 0.0,
            max_tokens: 200,
        }
    }
}

impl EvaluationPolicy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        for (field, value) in [
            ("copy_threshold", self.copy_threshold),
            ("pass_threshold", self.pass_threshold),
            ("code_penalty_score", self.code_penalty_score),
            ("fallback_code_score", self.fallback_code_score),
            ("fallback_plain_score", self.fallback_plain_score),
        ] {
            check_unit_range(field, value)?;
        }
        if self.max_attempts == 0 {
            return Err(PolicyError::NoAttempts);
        }
        if self.max_similarity_chars == 0 {
            return Err(PolicyError::NoSimilarityWindow);
        }
        Ok(())
    }
}

/// Rejects NaN and anything outside `[0, 1]`.
pub fn check_unit_range(field: &'static str, value: f64) -> Result<(), PolicyError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PolicyError::OutOfRange { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        assert_eq!(EvaluationPolicy::default().validate(), Ok(()));
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let policy = EvaluationPolicy {
            copy_threshold: 1.5,
            ..EvaluationPolicy::default()
        };
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::OutOfRange {
                field: "copy_threshold",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let policy = EvaluationPolicy {
            max_attempts: 0,
            ..EvaluationPolicy::default()
        };
        assert_eq!(policy.validate(), Err(PolicyError::NoAttempts));
    }

    #[test]
    fn test_zero_similarity_window_rejected() {
        let policy = EvaluationPolicy {
            max_similarity_chars: 0,
            ..EvaluationPolicy::default()
        };
        assert_eq!(policy.validate(), Err(PolicyError::NoSimilarityWindow));
    }

    #[test]
    fn test_nan_is_out_of_range() {
        assert!(check_unit_range("pass_threshold", f64::NAN).is_err());
    }

    #[test]
    fn test_code_penalty_from_str() {
        assert_eq!(
            "short_circuit".parse::<CodePenalty>().unwrap(),
            CodePenalty::ShortCircuit
        );
        assert_eq!(
            "PROMPT_SIGNAL".parse::<CodePenalty>().unwrap(),
            CodePenalty::PromptSignal
        );
        assert!("sometimes".parse::<CodePenalty>().is_err());
    }
}
