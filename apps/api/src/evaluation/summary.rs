use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::evaluation::models::{BatchEntry, EvaluationMethod};

/// Aggregate statistics over one batch of evaluations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub average_score: f64,
    pub passed: usize,
    pub failed: usize,
    /// Percentage of passed answers, one decimal.
    pub success_rate: f64,
    pub fallback_count: usize,
    pub error_count: usize,
}

pub fn summarize(results: &BTreeMap<String, BatchEntry>) -> BatchSummary {
    if results.is_empty() {
        return BatchSummary::default();
    }

    let total = results.len();
    let sum: f64 = results.values().map(|entry| entry.score).sum();
    let passed = results.values().filter(|entry| entry.matched).count();
    let count_method = |method: EvaluationMethod| {
        results
            .values()
            .filter(|entry| entry.method == method)
            .count()
    };

    BatchSummary {
        total,
        average_score: round_to(sum / total as f64, 3),
        passed,
        failed: total - passed,
        success_rate: round_to(passed as f64 / total as f64 * 100.0, 1),
        fallback_count: count_method(EvaluationMethod::Fallback),
        error_count: count_method(EvaluationMethod::Error),
    }
}

/// True when every score is a finite number in `[0, 1]`.
pub fn validate_results(results: &BTreeMap<String, BatchEntry>) -> bool {
    let mut valid = true;
    for (question, entry) in results {
        if !entry.score.is_finite() || !(0.0..=1.0).contains(&entry.score) {
            warn!("Invalid score {} for question '{question}'", entry.score);
            valid = false;
        }
    }
    valid
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
