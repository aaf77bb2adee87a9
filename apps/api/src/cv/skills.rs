//! Skill profiling: turns raw CV text into a structured `SkillProfile`.
//!
//! The model is asked first. Any failure (no backend, bad JSON, provider error)
//! falls back to a scan over a fixed vocabulary. `source` tells the two apart.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cv::prompts::SKILL_EXTRACTION_PROMPT_TEMPLATE;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{generate_json, GenerationOptions, InferenceBackend};

/// CV characters sent to the model.
pub const CV_PROMPT_CHAR_LIMIT: usize = 2000;
/// Skills kept by the keyword scan.
pub const KEYWORD_SKILL_LIMIT: usize = 10;

const PROGRAMMING_LANGUAGES: &[&str] = &[
    "python", "javascript", "java", "c++", "c#", "php", "ruby", "go", "rust",
];
const FRAMEWORKS: &[&str] = &["react", "angular", "vue", "django", "flask", "spring", "laravel"];
const TOOLS: &[&str] = &["docker", "kubernetes", "git", "aws", "azure", "gcp"];
const OTHER_SKILLS: &[&str] = &[
    "sql", "mysql", "postgresql", "mongodb", "redis", "linux", "windows", "html", "css",
    "sass", "bootstrap", "machine learning", "ai", "data science", "pandas", "numpy",
    "tensorflow",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillSource {
    Llm,
    Keyword,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillProfile {
    pub skills: Vec<String>,
    pub experience_years: Option<f64>,
    pub education_level: Option<String>,
    pub programming_languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub tools: Vec<String>,
    pub source: SkillSource,
}

/// Shape of the model's reply. Every field is optional so partial answers still count.
#[derive(Debug, Deserialize)]
struct SkillReply {
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default)]
    experience_years: Option<f64>,
    #[serde(default)]
    education_level: Option<String>,
    #[serde(default)]
    programming_languages: Vec<String>,
    #[serde(default)]
    frameworks: Vec<String>,
    #[serde(default)]
    tools: Vec<String>,
}

impl From<SkillReply> for SkillProfile {
    fn from(reply: SkillReply) -> Self {
        Self {
            skills: reply.skills,
            experience_years: reply.experience_years,
            education_level: reply.education_level.filter(|s| !s.trim().is_empty()),
            programming_languages: reply.programming_languages,
            frameworks: reply.frameworks,
            tools: reply.tools,
            source: SkillSource::Llm,
        }
    }
}

pub async fn extract_skill_profile(cv_text: &str, backend: &dyn InferenceBackend) -> SkillProfile {
    let excerpt: String = cv_text.chars().take(CV_PROMPT_CHAR_LIMIT).collect();
    let prompt = SKILL_EXTRACTION_PROMPT_TEMPLATE.replace("{cv_text}", &excerpt);
    let options = GenerationOptions::default()
        .with_system(JSON_ONLY_SYSTEM)
        .with_max_tokens(500);

    match generate_json::<SkillReply>(backend, &prompt, &options).await {
        Ok(reply) => {
            let profile = SkillProfile::from(reply);
            info!("Skills extracted by model: {} found", profile.skills.len());
            profile
        }
        Err(e) => {
            warn!("Model skill extraction failed, using keyword scan: {e}");
            keyword_skill_profile(cv_text)
        }
    }
}

/// Scans `cv_text` for a fixed vocabulary of technical terms.
pub fn keyword_skill_profile(cv_text: &str) -> SkillProfile {
    let haystack = cv_text.to_lowercase();
    let found: Vec<&str> = PROGRAMMING_LANGUAGES
        .iter()
        .chain(FRAMEWORKS)
        .chain(TOOLS)
        .chain(OTHER_SKILLS)
        .copied()
        .filter(|term| contains_term(&haystack, term))
        .collect();

    let pick = |group: &[&str]| -> Vec<String> {
        found
            .iter()
            .filter(|term| group.contains(term))
            .map(|term| term.to_string())
            .collect()
    };

    SkillProfile {
        skills: found
            .iter()
            .take(KEYWORD_SKILL_LIMIT)
            .map(|term| term.to_string())
            .collect(),
        experience_years: None,
        education_level: None,
        programming_languages: pick(PROGRAMMING_LANGUAGES),
        frameworks: pick(FRAMEWORKS),
        tools: pick(TOOLS),
        source: SkillSource::Keyword,
    }
}

/// True when `term` occurs in `haystack` with no alphanumeric character on
/// either side, so "go" does not match "google".
fn contains_term(haystack: &str, term: &str) -> bool {
    haystack.match_indices(term).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + term.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
