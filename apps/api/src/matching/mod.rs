//! Job matching: ranks job postings by how many of their required skills a CV covers.
//!
//! Pure keyword overlap, compared case-insensitively without any model call.
//! Job feeds arrive either nested (`{company, jobs: [...]}`) or flat (one posting
//! per record); both shapes are accepted in the same list.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod handlers;

pub const UNNAMED_COMPANY: &str = "Unnamed company";

/// A single job posting. Fields other than `title` and `skills` are carried
/// through to the response untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One record of a job feed.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JobListing {
    Company {
        #[serde(default)]
        company: Option<String>,
        jobs: Vec<JobPosting>,
    },
    Flat(JobPosting),
}

/// A posting that shares at least one skill with the CV.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobMatch {
    #[serde(flatten)]
    pub job: JobPosting,
    pub company_name: String,
    /// Percentage of the job's skills covered by the CV, two decimals.
    pub match_score: f64,
    pub matched_skills: Vec<String>,
}

/// Returns the share of `job_skills` found in `cv_skills` as a percentage,
/// plus the lowercased matched skills in sorted order.
pub fn compute_match(cv_skills: &[String], job_skills: &[String]) -> (f64, Vec<String>) {
    let cv: BTreeSet<String> = cv_skills.iter().map(|s| s.trim().to_lowercase()).collect();
    let job: BTreeSet<String> = job_skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    if job.is_empty() {
        return (0.0, Vec::new());
    }

    let matched: Vec<String> = job.intersection(&cv).cloned().collect();
    let ratio = matched.len() as f64 / job.len() as f64;
    ((ratio * 10_000.0).round() / 100.0, matched)
}

/// Scores every posting in `jobs` and returns those with a non-zero match,
/// best first. Ties keep feed order.
pub fn match_jobs(cv_skills: &[String], jobs: Vec<JobListing>) -> Vec<JobMatch> {
    let mut matches = Vec::new();

    for listing in jobs {
        match listing {
            JobListing::Company { company, jobs } => {
                let company_name = company.unwrap_or_else(|| UNNAMED_COMPANY.to_string());
                for job in jobs {
                    push_match(&mut matches, cv_skills, job, company_name.clone());
                }
            }
            JobListing::Flat(job) => {
                let company_name = flat_company_name(&job.extra);
                push_match(&mut matches, cv_skills, job, company_name);
            }
        }
    }

    matches.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
    matches
}

fn push_match(
    matches: &mut Vec<JobMatch>,
    cv_skills: &[String],
    mut job: JobPosting,
    company_name: String,
) {
    let (match_score, matched_skills) = compute_match(cv_skills, &job.skills);
    if match_score <= 0.0 {
        return;
    }
    job.extra.remove("company_name");
    matches.push(JobMatch {
        job,
        company_name,
        match_score,
        matched_skills,
    });
}

fn flat_company_name(extra: &Map<String, Value>) -> String {
    ["company_name", "company"]
        .iter()
        .find_map(|key| extra.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| UNNAMED_COMPANY.to_string())
}
