// Evaluation LLM prompt templates.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::evaluation::models::EvaluationRequest;

/// System prompt for answer scoring. Enforces JSON-only output.
pub const EVALUATION_SYSTEM: &str = "You are a technical interview evaluator. \
    You score a candidate's answer against an expected answer using a weighted rubric. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Rubric criteria and their weights (percent). Weights sum to 100.
pub const RUBRIC: &[(&str, u32, &str)] = &[
    ("Correctness", 60, "does the program produce the right result?"),
    ("Edge cases & validation", 20, "does it respect the constraints?"),
    ("Readability", 10, "is the code clear and understandable?"),
    ("Format & robustness", 10, "is the code runnable and well structured?"),
];

pub const MISSING_CODE_NOTE: &str = "NOTE: the expected answer contains code; the candidate's \
    answer does not appear to contain any. Penalize accordingly.";

/// Answer scoring prompt. Replace: {question}, {expected_answer}, {candidate_answer},
/// {rubric}, {code_note}
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"Score the candidate's answer to a technical interview question.

QUESTION:
{question}

EXPECTED ANSWER:
{expected_answer}

CANDIDATE ANSWER:
{candidate_answer}

RUBRIC (weighting):
{rubric}

CRITICAL RULES:
- If the candidate only copies the question or the expected answer, set score=0.0 and justification="Copy - no solution".
- If the expected answer contains code but the candidate provides none, set score <= 0.2.
- If the solution is very incomplete (e.g. takes 1 input instead of 3), give a low score (0.1 to 0.3).
- Respond ONLY with valid JSON, never with text outside the JSON.
{code_note}
OUTPUT FORMAT:
{
  "score": 0.xx,
  "justification": "Short sentence (max 140 characters)"
}"#;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(question|expected_answer|candidate_answer|rubric|code_note)\}")
        .expect("valid pattern")
});

pub fn build_evaluation_prompt(request: &EvaluationRequest, code_missing: bool) -> String {
    let rubric = RUBRIC
        .iter()
        .map(|(name, weight, check)| format!("- {name} ({weight}%): {check}"))
        .collect::<Vec<_>>()
        .join("\n");
    let code_note = if code_missing {
        format!("\n{MISSING_CODE_NOTE}\n")
    } else {
        String::new()
    };

    // Single pass: placeholder-like text inside the answers is never expanded.
    PLACEHOLDER
        .replace_all(EVALUATION_PROMPT_TEMPLATE, |caps: &Captures| match &caps[1] {
            "question" => request.question.trim(),
            "expected_answer" => request.expected_answer.trim(),
            "candidate_answer" => request.candidate_answer.trim(),
            "rubric" => rubric.as_str(),
            _ => code_note.as_str(),
        })
        .into_owned()
}
