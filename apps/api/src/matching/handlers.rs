//! Axum route handlers for the Matching API.

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::matching::{match_jobs, JobListing, JobMatch};

#[derive(Debug, Deserialize)]
pub struct MatchingCv {
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct MatchingRequest {
    pub cv: MatchingCv,
    pub jobs: Vec<JobListing>,
}

#[derive(Debug, Serialize)]
pub struct MatchingResponse {
    pub total: usize,
    pub matches: Vec<JobMatch>,
}

/// POST /api/v1/matching
///
/// Ranks the supplied jobs against the CV's skills.
pub async fn handle_match_jobs(
    Json(request): Json<MatchingRequest>,
) -> Result<Json<MatchingResponse>, AppError> {
    if request.cv.skills.is_empty() {
        return Err(AppError::Validation("cv.skills cannot be empty".to_string()));
    }

    let matches = match_jobs(&request.cv.skills, request.jobs);

    Ok(Json(MatchingResponse {
        total: matches.len(),
        matches,
    }))
}
