//! Local checks that run before any model call.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::evaluation::text::similarity;

pub const COPY_JUSTIFICATION: &str =
    "Invalid answer: the question or the expected answer was copied instead of solved.";
pub const MISSING_CODE_JUSTIFICATION: &str = "Code was expected but the candidate did not provide any.";

static CODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```|input\s*\(|def\s+|print\s*\(|for\s+|while\s+|return\s+|:=")
        .expect("code pattern is valid")
});

/// Similarities of the candidate answer to the two texts it must not parrot.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CopyCheck {
    pub to_question: f64,
    pub to_expected: f64,
}

impl CopyCheck {
    pub fn is_copy(&self, threshold: f64) -> bool {
        self.to_question >= threshold || self.to_expected >= threshold
    }
}

/// Compares at most `max_chars` normalized characters of each text.
pub fn check_copy(
    candidate: &str,
    expected: &str,
    question: &str,
    max_chars: usize,
) -> CopyCheck {
    CopyCheck {
        to_question: similarity(candidate, question, max_chars),
        to_expected: similarity(candidate, expected, max_chars),
    }
}

/// True when the text contains code-like tokens.
pub fn looks_like_code(text: &str) -> bool {
    CODE_PATTERN.is_match(text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodePresence {
    pub expected_has_code: bool,
    pub candidate_has_code: bool,
}

impl CodePresence {
    pub fn detect(expected: &str, candidate: &str) -> Self {
        Self {
            expected_has_code: looks_like_code(expected),
            candidate_has_code: looks_like_code(candidate),
        }
    }

    /// Code was expected but the candidate wrote none.
    pub fn code_missing(&self) -> bool {
        self.expected_has_code && !self.candidate_has_code
    }
}
