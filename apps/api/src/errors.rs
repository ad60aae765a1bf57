use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::pipeline::{ErrorKind, PipelineError};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{error}")]
    Pipeline {
        error: PipelineError,
        /// Include the internal trace in the response body.
        diagnostics: bool,
    },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn pipeline(error: PipelineError, diagnostics: bool) -> Self {
        AppError::Pipeline { error, diagnostics }
    }
}

/// HTTP status for each pipeline failure kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::MissingInput
        | ErrorKind::ContentTooShort
        | ErrorKind::CvTooShort
        | ErrorKind::JobDescriptionTooShort => StatusCode::BAD_REQUEST,
        ErrorKind::UnsupportedFormat | ErrorKind::LegacyFormatUnsupported => {
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        }
        ErrorKind::DecodeFailure => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::FetchFailure | ErrorKind::InvalidCredential | ErrorKind::RemoteServiceError => {
            StatusCode::BAD_GATEWAY
        }
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, trace) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::Pipeline { error, diagnostics } => {
                if error.kind.is_client_error() {
                    tracing::warn!("Pipeline rejected request: {}", error.trace());
                } else {
                    tracing::error!("Pipeline error: {}", error.trace());
                }
                (
                    status_for(error.kind),
                    error.kind.code(),
                    error.message.clone(),
                    diagnostics.then(|| error.trace()),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(trace) = trace {
            error["trace"] = Value::String(trace);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
