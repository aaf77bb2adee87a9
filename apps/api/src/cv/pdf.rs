//! PDF text extraction. Parsing is CPU-bound, so it runs on the blocking pool.

use bytes::Bytes;
use tracing::{info, warn};

use crate::errors::AppError;

pub async fn extract_pdf_text(data: Bytes) -> Result<String, AppError> {
    if data.is_empty() {
        return Err(AppError::Validation("uploaded file is empty".to_string()));
    }

    let size = data.len();
    let text = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&data).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| {
        if e.is_panic() {
            // pdf-extract panics on some malformed files
            warn!("PDF parser panicked");
            AppError::UnprocessableEntity("could not read PDF".to_string())
        } else {
            AppError::Internal(anyhow::anyhow!("spawn_blocking failed in PDF extraction: {e}"))
        }
    })?
    .map_err(|e| {
        warn!("PDF extraction failed: {e}");
        AppError::UnprocessableEntity(format!("could not read PDF: {e}"))
    })?;

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "PDF contains no extractable text".to_string(),
        ));
    }

    info!("Extracted {} chars from a {size} byte PDF", text.chars().count());
    Ok(text)
}
