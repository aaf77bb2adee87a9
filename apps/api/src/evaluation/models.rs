use serde::Serialize;

/// Justification used when the model returns a score without one.
pub const DEFAULT_JUSTIFICATION: &str = "No justification provided";

/// How a score was obtained. Kept on every result so a recruiter can tell
/// "the model judged this answer" apart from "the pipeline degraded".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMethod {
    /// Score parsed from the model's reply.
    Llm,
    /// Candidate or expected answer was blank; no model call made.
    Empty,
    /// The pipeline itself failed for this question.
    Error,
    /// The model never produced a usable score; local heuristic applied.
    Fallback,
    /// A local pre-check (copy detection, missing code) decided the score.
    Precheck,
}

/// One question to evaluate. Built per call, never persisted here.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub question: String,
    pub candidate_answer: String,
    pub expected_answer: String,
}

impl EvaluationRequest {
    pub fn new(question: &str, candidate_answer: &str, expected_answer: &str) -> Self {
        Self {
            question: question.to_string(),
            candidate_answer: candidate_answer.to_string(),
            expected_answer: expected_answer.to_string(),
        }
    }

    pub fn has_blank_answer(&self) -> bool {
        self.candidate_answer.trim().is_empty() || self.expected_answer.trim().is_empty()
    }
}

/// Outcome of evaluating one answer.
///
/// Fields are private so the invariants hold for every instance:
/// `score` lies in `[0.0, 1.0]` and `justification` is never blank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    score: f64,
    justification: String,
    method: EvaluationMethod,
}

impl EvaluationResult {
    pub fn new(score: f64, justification: impl Into<String>, method: EvaluationMethod) -> Self {
        let justification = justification.into();
        let justification = if justification.trim().is_empty() {
            DEFAULT_JUSTIFICATION.to_string()
        } else {
            justification.trim().to_string()
        };
        Self {
            score: clamp_score(score),
            justification,
            method,
        }
    }

    pub fn empty() -> Self {
        Self::new(0.0, "Empty or missing answer", EvaluationMethod::Empty)
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn justification(&self) -> &str {
        &self.justification
    }

    pub fn method(&self) -> EvaluationMethod {
        self.method
    }

    pub fn passes(&self, threshold: f64) -> bool {
        self.score >= threshold
    }
}

/// Per-question record produced by a batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry {
    pub user: String,
    pub correct: String,
    pub score: f64,
    #[serde(rename = "match")]
    pub matched: bool,
    pub justification: String,
    pub method: EvaluationMethod,
}

impl BatchEntry {
    pub fn from_result(user: &str, correct: &str, result: EvaluationResult, threshold: f64) -> Self {
        Self {
            user: user.to_string(),
            correct: correct.to_string(),
            score: result.score,
            matched: result.passes(threshold),
            justification: result.justification,
            method: result.method,
        }
    }
}

/// Clamps to `[0.0, 1.0]`; NaN and infinities collapse to `0.0`.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_is_clamped_high() {
        let r = EvaluationResult::new(15.0, "great", EvaluationMethod::Llm);
        assert_eq!(r.score(), 1.0);
    }

    #[test]
    fn test_score_is_clamped_low() {
        let r = EvaluationResult::new(-3.0, "bad", EvaluationMethod::Llm);
        assert_eq!(r.score(), 0.0);
    }

    #[test]
    fn test_nan_score_becomes_zero() {
        let r = EvaluationResult::new(f64::NAN, "odd", EvaluationMethod::Llm);
        assert_eq!(r.score(), 0.0);
    }

    #[test]
    fn test_blank_justification_gets_default() {
        let r = EvaluationResult::new(0.5, "   ", EvaluationMethod::Llm);
        assert_eq!(r.justification(), DEFAULT_JUSTIFICATION);
    }

    #[test]
    fn test_blank_answer_detection() {
        assert!(EvaluationRequest::new("q", "  \n", "def f(): return 1").has_blank_answer());
        assert!(EvaluationRequest::new("q", "x = 1", "").has_blank_answer());
        assert!(!EvaluationRequest::new("q", "x = 1", "y = 2").has_blank_answer());
    }

    #[test]
    fn test_batch_entry_match_is_inclusive_threshold() {
        let r = EvaluationResult::new(0.75, "ok", EvaluationMethod::Llm);
        let entry = BatchEntry::from_result("a", "b", r, 0.75);
        assert!(entry.matched);
    }

    #[test]
    fn test_batch_entry_serializes_match_key() {
        let r = EvaluationResult::new(0.2, "weak", EvaluationMethod::Fallback);
        let entry = BatchEntry::from_result("a", "b", r, 0.75);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["match"], false);
        assert_eq!(json["method"], "fallback");
    }
}
