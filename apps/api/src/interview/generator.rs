//! Exercise generation: builds interview questions from knowledge excerpts.
//!
//! Model output is split on `Exercise:` markers. When the model is unavailable
//! or nothing parses, a fixed set of beginner exercises is returned instead,
//! so callers always get at least one question.

use tracing::{info, warn};

use crate::interview::prompts::{
    ANSWER_PROMPT_TEMPLATE, FALLBACK_EXERCISES, QUESTION_PROMPT_TEMPLATE, QUESTION_SYSTEM,
};
use crate::llm_client::{GenerationOptions, InferenceBackend};

pub const MAX_QUESTIONS: usize = 10;
/// Knowledge excerpts included in one prompt.
pub const MAX_CONTEXT_CHUNKS: usize = 3;
pub const CONTEXT_CHAR_LIMIT: usize = 3000;
const EXERCISE_MARKER: &str = "Exercise:";

/// Returns up to `n` exercises (clamped to `1..=MAX_QUESTIONS`).
pub async fn generate_questions(
    knowledge_chunks: &[String],
    n: usize,
    backend: &dyn InferenceBackend,
) -> Vec<String> {
    let n = n.clamp(1, MAX_QUESTIONS);
    let context = build_context(knowledge_chunks);
    let prompt = QUESTION_PROMPT_TEMPLATE
        .replace("{context}", &context)
        .replace("{n}", &n.to_string());
    let options = GenerationOptions::default()
        .with_system(QUESTION_SYSTEM)
        .with_temperature(0.7)
        .with_max_tokens(1000);

    match backend.generate(&prompt, &options).await {
        Ok(text) => {
            let mut questions = parse_exercises(&text);
            if questions.is_empty() {
                warn!("Model reply contained no exercises, using built-in set");
                return fallback_questions(n);
            }
            questions.truncate(n);
            info!("{} questions generated", questions.len());
            questions
        }
        Err(e) => {
            warn!("Question generation failed, using built-in set: {e}");
            fallback_questions(n)
        }
    }
}

/// Produces a model-written reference answer, or a placeholder naming the question.
pub async fn generate_reference_answer(question: &str, backend: &dyn InferenceBackend) -> String {
    let prompt = ANSWER_PROMPT_TEMPLATE.replace("{question}", question);
    let options = GenerationOptions::default()
        .with_temperature(0.3)
        .with_max_tokens(800);

    match backend.generate(&prompt, &options).await {
        Ok(answer) if !answer.trim().is_empty() => answer.trim().to_string(),
        Ok(_) => placeholder_answer(question),
        Err(e) => {
            warn!("Reference answer generation failed: {e}");
            placeholder_answer(question)
        }
    }
}

/// Splits model output into exercises, each starting at an `Exercise:` marker.
/// Text before the first marker is discarded.
pub fn parse_exercises(text: &str) -> Vec<String> {
    let mut starts: Vec<usize> = text.match_indices(EXERCISE_MARKER).map(|(i, _)| i).collect();
    starts.push(text.len());

    starts
        .windows(2)
        .map(|w| text[w[0]..w[1]].trim())
        .filter(|exercise| exercise.len() > EXERCISE_MARKER.len())
        .map(str::to_string)
        .collect()
}

pub fn fallback_questions(n: usize) -> Vec<String> {
    FALLBACK_EXERCISES
        .iter()
        .take(n)
        .map(|q| q.to_string())
        .collect()
}

fn build_context(chunks: &[String]) -> String {
    chunks
        .iter()
        .take(MAX_CONTEXT_CHUNKS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n---\n")
        .chars()
        .take(CONTEXT_CHAR_LIMIT)
        .collect()
}

fn placeholder_answer(question: &str) -> String {
    let topic: String = question.chars().take(50).collect();
    format!("Answer based on best practices for the question: {topic}...")
}
