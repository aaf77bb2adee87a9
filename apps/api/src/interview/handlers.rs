//! Axum route handlers for the Interview API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::interview::generator::{generate_questions, generate_reference_answer};
use crate::state::AppState;

fn default_question_count() -> usize {
    3
}

#[derive(Debug, Deserialize)]
pub struct QuestionsRequest {
    #[serde(default)]
    pub knowledge_chunks: Vec<String>,
    #[serde(default = "default_question_count")]
    pub n: usize,
}

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub question: String,
    pub answer: String,
}

/// POST /api/v1/interview/questions
///
/// Generates exercises from the supplied knowledge excerpts. Never fails on
/// model errors; the built-in exercise set is returned instead.
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    Json(request): Json<QuestionsRequest>,
) -> Result<Json<QuestionsResponse>, AppError> {
    let questions =
        generate_questions(&request.knowledge_chunks, request.n, state.llm.as_ref()).await;

    Ok(Json(QuestionsResponse { questions }))
}

/// POST /api/v1/interview/answers
///
/// Writes a reference answer for one question.
pub async fn handle_generate_answer(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    if request.question.trim().is_empty() {
        return Err(AppError::Validation("question cannot be empty".to_string()));
    }

    let answer = generate_reference_answer(&request.question, state.llm.as_ref()).await;

    Ok(Json(AnswerResponse {
        question: request.question,
        answer,
    }))
}
