//! Score extraction from unreliable model output.
//!
//! The model is asked for strict JSON but does not always comply. `extract_score`
//! applies an ordered cascade of strategies, strictest first, so a well-formed
//! reply is never downgraded by a looser heuristic:
//!
//! 1. Direct: the whole reply (minus code fences) parses as a JSON object.
//! 2. Pattern: a `{...}` span is located, repaired, and reparsed.
//! 3. Key/value: `score: 0.6` / `justification: "..."` pairs without valid JSON.
//! 4. Numeric scan: the first standalone number in `[0, 1]`.
//!
//! No strategy panics or errors; `None` means no score could be found anywhere.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::evaluation::models::DEFAULT_JUSTIFICATION;
use crate::llm_client::strip_json_fences;

pub const KEY_VALUE_JUSTIFICATION: &str = "Automatic evaluation";
pub const NUMERIC_SCAN_JUSTIFICATION: &str = "Score extracted from free text";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    Direct,
    Pattern,
    KeyValue,
    NumericScan,
}

/// A score recovered from model output. `score` is as found, not yet clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedScore {
    pub score: f64,
    pub justification: String,
    pub strategy: ExtractionStrategy,
}

// Increasing permissiveness: both keys without nesting, both keys across nesting,
// then any brace span at all.
static OBJECT_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)\{[^{}]*score[^{}]*justification[^{}]*\}").expect("valid pattern"),
        Regex::new(r"(?is)\{.*?score.*?justification.*?\}").expect("valid pattern"),
        Regex::new(r"(?s)\{.*?\}").expect("valid pattern"),
    ]
});

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("valid pattern"));

static QUOTED_SCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""score"\s*:\s*"\s*(-?\d*\.?\d+)\s*""#).expect("valid pattern")
});

static BARE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:").expect("valid pattern")
});

static SCORE_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)["']?\bscore["']?\s*[:=]\s*["']?(-?(?:\d+(?:\.\d+)?|\.\d+))"#)
        .expect("valid pattern")
});

static JUSTIFICATION_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)["']?\bjustification["']?\s*[:=]\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid pattern")
});

static STANDALONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+(?:\.\d+)?\b").expect("valid pattern"));

/// Runs the extraction cascade over a raw model reply.
pub fn extract_score(text: &str) -> Option<ExtractedScore> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let extracted = parse_direct(text)
        .or_else(|| parse_object_span(text))
        .or_else(|| parse_key_value(text))
        .or_else(|| scan_numbers(text));

    match &extracted {
        Some(found) => debug!(
            "Extracted score {} via {:?} strategy",
            found.score, found.strategy
        ),
        None => debug!(
            "No score found in model output: {}",
            text.chars().take(200).collect::<String>()
        ),
    }
    extracted
}

fn parse_direct(text: &str) -> Option<ExtractedScore> {
    let value: Value = serde_json::from_str(strip_json_fences(text)).ok()?;
    from_json_object(value.as_object()?, ExtractionStrategy::Direct)
}

fn parse_object_span(text: &str) -> Option<ExtractedScore> {
    OBJECT_PATTERNS.iter().find_map(|pattern| {
        pattern
            .find_iter(text)
            .find_map(|m| parse_repaired(m.as_str()))
    })
}

/// Applies increasingly invasive repairs to a candidate object, reparsing after each.
fn parse_repaired(candidate: &str) -> Option<ExtractedScore> {
    let mut repaired: String = candidate
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    repaired = TRAILING_COMMA.replace_all(&repaired, "$1").into_owned();
    repaired = QUOTED_SCORE
        .replace_all(&repaired, "\"score\": $1")
        .into_owned();
    if let Some(found) = parse_object(&repaired) {
        return Some(found);
    }

    repaired = repaired.replace('\'', "\"");
    repaired = QUOTED_SCORE
        .replace_all(&repaired, "\"score\": $1")
        .into_owned();
    if let Some(found) = parse_object(&repaired) {
        return Some(found);
    }

    repaired = BARE_KEY.replace_all(&repaired, "$1\"$2\":").into_owned();
    parse_object(&repaired)
}

fn parse_object(candidate: &str) -> Option<ExtractedScore> {
    let value: Value = serde_json::from_str(candidate).ok()?;
    from_json_object(value.as_object()?, ExtractionStrategy::Pattern)
}

fn from_json_object(
    object: &Map<String, Value>,
    strategy: ExtractionStrategy,
) -> Option<ExtractedScore> {
    let score = coerce_score(object.get("score")?)?;
    let justification = object
        .get("justification")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|j| !j.is_empty())
        .unwrap_or(DEFAULT_JUSTIFICATION)
        .to_string();
    Some(ExtractedScore {
        score,
        justification,
        strategy,
    })
}

/// Accepts JSON numbers and strings that hold a number.
fn coerce_score(value: &Value) -> Option<f64> {
    let score = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    score.is_finite().then_some(score)
}

fn parse_key_value(text: &str) -> Option<ExtractedScore> {
    let score: f64 = SCORE_PAIR.captures(text)?.get(1)?.as_str().parse().ok()?;
    let justification = JUSTIFICATION_PAIR
        .captures(text)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim())
        .filter(|j| !j.is_empty())
        .unwrap_or(KEY_VALUE_JUSTIFICATION)
        .to_string();
    Some(ExtractedScore {
        score,
        justification,
        strategy: ExtractionStrategy::KeyValue,
    })
}

fn scan_numbers(text: &str) -> Option<ExtractedScore> {
    let score = STANDALONE_NUMBER
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .find(|n| (0.0..=1.0).contains(n))?;
    Some(ExtractedScore {
        score,
        justification: NUMERIC_SCAN_JUSTIFICATION.to_string(),
        strategy: ExtractionStrategy::NumericScan,
    })
}
