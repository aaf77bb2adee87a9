//! Axum route handlers for the Evaluation API.

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::models::{BatchEntry, EvaluationResult};
use crate::evaluation::policy::check_unit_range;
use crate::evaluation::summary::{summarize, validate_results, BatchSummary};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BatchEvaluationRequest {
    pub user_answers: BTreeMap<String, String>,
    #[serde(default)]
    pub correct_answers: BTreeMap<String, String>,
    /// Overrides the configured pass threshold for this batch.
    pub threshold: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct BatchEvaluationResponse {
    pub evaluation_id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    pub threshold: f64,
    pub results: BTreeMap<String, BatchEntry>,
    pub summary: BatchSummary,
    pub valid: bool,
}

#[derive(Debug, Deserialize)]
pub struct PairEvaluationRequest {
    #[serde(default)]
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
}

#[derive(Debug, Serialize)]
pub struct PairEvaluationResponse {
    #[serde(flatten)]
    pub result: EvaluationResult,
    #[serde(rename = "match")]
    pub matched: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/evaluations
///
/// Scores every answer in the batch. Individual failures are reported per
/// question with `method = error`; the request itself only fails on bad input.
pub async fn handle_evaluate_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchEvaluationRequest>,
) -> Result<Json<BatchEvaluationResponse>, AppError> {
    if request.user_answers.is_empty() {
        return Err(AppError::Validation(
            "user_answers cannot be empty".to_string(),
        ));
    }
    let threshold = request
        .threshold
        .unwrap_or(state.evaluator.policy().pass_threshold);
    check_unit_range("threshold", threshold).map_err(|e| AppError::Validation(e.to_string()))?;

    let results = state
        .evaluator
        .evaluate_batch(&request.user_answers, &request.correct_answers, threshold)
        .await;
    let summary = summarize(&results);
    let valid = validate_results(&results);

    Ok(Json(BatchEvaluationResponse {
        evaluation_id: Uuid::new_v4(),
        evaluated_at: Utc::now(),
        threshold,
        results,
        summary,
        valid,
    }))
}

/// POST /api/v1/evaluations/pair
///
/// Scores a single answer against its expected answer.
pub async fn handle_evaluate_pair(
    State(state): State<AppState>,
    Json(request): Json<PairEvaluationRequest>,
) -> Result<Json<PairEvaluationResponse>, AppError> {
    let result = state
        .evaluator
        .evaluate_pair(
            &request.user_answer,
            &request.correct_answer,
            &request.question,
        )
        .await;
    let matched = result.passes(state.evaluator.policy().pass_threshold);

    Ok(Json(PairEvaluationResponse { result, matched }))
}
