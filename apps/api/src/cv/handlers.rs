//! Axum route handlers for the CV API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cv::pdf::extract_pdf_text;
use crate::cv::skills::{extract_skill_profile, SkillProfile};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ParseCvResponse {
    pub file_name: Option<String>,
    pub text: String,
    pub profile: SkillProfile,
}

#[derive(Debug, Deserialize)]
pub struct SkillsRequest {
    pub cv_text: String,
}

/// POST /api/v1/cv/parse
///
/// Multipart upload with a PDF in the `file` field. Returns the extracted
/// text and the skill profile built from it.
pub async fn handle_parse_cv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ParseCvResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("could not read upload: {e}")))?;
        info!("Received CV upload {:?} ({} bytes)", file_name, data.len());

        let text = extract_pdf_text(data).await?;
        let profile = extract_skill_profile(&text, state.llm.as_ref()).await;

        return Ok(Json(ParseCvResponse {
            file_name,
            text,
            profile,
        }));
    }

    Err(AppError::Validation("missing 'file' field".to_string()))
}

/// POST /api/v1/cv/skills
///
/// Builds a skill profile from already-extracted CV text.
pub async fn handle_extract_skills(
    State(state): State<AppState>,
    Json(request): Json<SkillsRequest>,
) -> Result<Json<SkillProfile>, AppError> {
    if request.cv_text.trim().is_empty() {
        return Err(AppError::Validation("cv_text cannot be empty".to_string()));
    }

    let profile = extract_skill_profile(&request.cv_text, state.llm.as_ref()).await;

    Ok(Json(profile))
}
