//! Axum route handler for the fit analysis endpoint.

use anyhow::Context;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::pipeline::upload::StagedDocument;
use crate::state::AppState;

/// Multipart field carrying the job posting URL.
pub const FIELD_JOB_URL: &str = "job_url";
/// Multipart file field carrying the CV.
pub const FIELD_CV: &str = "cv";

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub analysis: String,
}

/// POST /api/v1/analyze
///
/// Multipart form with a `job_url` text field and a `cv` file field.
/// The file is streamed into temporary storage, which is released once the
/// pipeline run finishes.
pub async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut job_url = String::new();
    let mut document: Option<StagedDocument> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(invalid_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FIELD_JOB_URL => job_url = field.text().await.map_err(invalid_multipart)?,
            FIELD_CV => {
                let media_type = field.content_type().unwrap_or_default().to_string();
                let filename = field.file_name().unwrap_or_default().to_string();
                let mut staged = StagedDocument::new(media_type, filename)
                    .await
                    .context("Failed to create temporary upload file")?;
                while let Some(chunk) = field.chunk().await.map_err(invalid_multipart)? {
                    staged
                        .append(&chunk)
                        .await
                        .context("Failed to write temporary upload file")?;
                }
                document = Some(staged);
            }
            other => tracing::debug!("Ignoring unexpected multipart field '{other}'"),
        }
    }

    let analysis = state
        .orchestrator
        .run(&job_url, document)
        .await
        .map_err(|e| AppError::pipeline(e, state.diagnostics))?;

    Ok(Json(AnalyzeResponse {
        analysis: analysis.into_string(),
    }))
}

fn invalid_multipart(e: MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
}
