//! Answer evaluation pipeline.
//!
//! Flow per question: blank check → copy pre-check → code-presence check →
//! rubric prompt → model call (bounded attempts) → score extraction →
//! heuristic fallback. Every exit produces an `EvaluationResult` whose `method`
//! records which step decided the score.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::evaluation::extractor::extract_score;
use crate::evaluation::models::{BatchEntry, EvaluationMethod, EvaluationRequest, EvaluationResult};
use crate::evaluation::policy::{CodePenalty, EvaluationPolicy};
use crate::evaluation::precheck::{
    check_copy, CodePresence, COPY_JUSTIFICATION, MISSING_CODE_JUSTIFICATION,
};
use crate::evaluation::prompts::{build_evaluation_prompt, EVALUATION_SYSTEM};
use crate::llm_client::{GenerationOptions, InferenceBackend, LlmError};

pub const FALLBACK_JUSTIFICATION: &str =
    "Heuristic fallback: the model returned no usable score";

/// Maximum characters of an internal error kept in a result's justification.
const ERROR_MESSAGE_LIMIT: usize = 100;

/// Faults inside this service, as opposed to provider failures, which are
/// absorbed by the fallback path.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("inference client failure: {0}")]
    Backend(#[from] LlmError),
}

/// The single evaluator behind every entry point.
pub struct Evaluator {
    backend: Arc<dyn InferenceBackend>,
    policy: EvaluationPolicy,
}

impl Evaluator {
    pub fn new(backend: Arc<dyn InferenceBackend>, policy: EvaluationPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn policy(&self) -> &EvaluationPolicy {
        &self.policy
    }

    /// Evaluates one answer. Never fails: internal errors become `method = error`.
    pub async fn evaluate_pair(
        &self,
        user_answer: &str,
        correct_answer: &str,
        question: &str,
    ) -> EvaluationResult {
        let request = EvaluationRequest::new(question, user_answer, correct_answer);
        self.evaluate_request(&request)
            .await
            .unwrap_or_else(|e| error_result(&e))
    }

    /// Runs the pipeline for one request, surfacing internal faults to the caller.
    pub async fn evaluate_request(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationResult, EvaluationError> {
        if request.has_blank_answer() {
            return Ok(EvaluationResult::empty());
        }

        let copy = check_copy(
            &request.candidate_answer,
            &request.expected_answer,
            &request.question,
            self.policy.max_similarity_chars,
        );
        debug!(
            "Similarity to question={:.3}, to expected={:.3}",
            copy.to_question, copy.to_expected
        );
        if copy.is_copy(self.policy.copy_threshold) {
            info!("Answer flagged as a copy of the prompt");
            return Ok(EvaluationResult::new(
                0.0,
                COPY_JUSTIFICATION,
                EvaluationMethod::Precheck,
            ));
        }

        let code = CodePresence::detect(&request.expected_answer, &request.candidate_answer);
        if code.code_missing() && self.policy.code_penalty == CodePenalty::ShortCircuit {
            return Ok(EvaluationResult::new(
                self.policy.code_penalty_score,
                MISSING_CODE_JUSTIFICATION,
                EvaluationMethod::Precheck,
            ));
        }

        let prompt = build_evaluation_prompt(request, code.code_missing());
        let options = GenerationOptions::default()
            .with_system(EVALUATION_SYSTEM)
            .with_temperature(self.policy.temperature)
            .with_max_tokens(self.policy.max_tokens);

        for attempt in 1..=self.policy.max_attempts {
            match self.backend.generate(&prompt, &options).await {
                Ok(text) => {
                    debug!("Model reply (attempt {attempt}): {text}");
                    if let Some(found) = extract_score(&text) {
                        debug!("Score extracted via {:?}", found.strategy);
                        let result = EvaluationResult::new(
                            found.score,
                            found.justification,
                            EvaluationMethod::Llm,
                        );
                        info!("Evaluation OK: score={:.2}", result.score());
                        return Ok(result);
                    }
                    warn!("No usable score in model reply (attempt {attempt})");
                }
                Err(e) if e.is_upstream() => {
                    warn!("Inference call failed (attempt {attempt}): {e}");
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(
            "All {} attempts failed, using heuristic fallback",
            self.policy.max_attempts
        );
        let score = if code.candidate_has_code {
            self.policy.fallback_code_score
        } else {
            self.policy.fallback_plain_score
        };
        Ok(EvaluationResult::new(
            score,
            FALLBACK_JUSTIFICATION,
            EvaluationMethod::Fallback,
        ))
    }

    /// Evaluates every question in `user_answers` against `correct_answers`.
    ///
    /// Questions run sequentially in key order. A question missing from
    /// `correct_answers` is treated as having an empty expected answer. One
    /// failing question never aborts the batch.
    pub async fn evaluate_batch(
        &self,
        user_answers: &BTreeMap<String, String>,
        correct_answers: &BTreeMap<String, String>,
        threshold: f64,
    ) -> BTreeMap<String, BatchEntry> {
        let total = user_answers.len();
        info!("Evaluating {total} answers");

        let mut results = BTreeMap::new();
        for (index, (question, user_answer)) in user_answers.iter().enumerate() {
            info!("Evaluating question {}/{}", index + 1, total);
            let correct = correct_answers
                .get(question)
                .map(String::as_str)
                .unwrap_or_default();
            let request = EvaluationRequest::new(question, user_answer, correct);

            let result = match self.evaluate_request(&request).await {
                Ok(result) => result,
                Err(e) => {
                    error!("Evaluation failed for question '{question}': {e}");
                    error_result(&e)
                }
            };
            results.insert(
                question.clone(),
                BatchEntry::from_result(user_answer, correct, result, threshold),
            );
        }

        info!("Evaluation finished: {} results", results.len());
        results
    }
}

fn error_result(error: &EvaluationError) -> EvaluationResult {
    let message: String = error.to_string().chars().take(ERROR_MESSAGE_LIMIT).collect();
    EvaluationResult::new(
        0.0,
        format!("Evaluation error: {message}"),
        EvaluationMethod::Error,
    )
}
