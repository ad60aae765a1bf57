//! Pipeline error taxonomy: one flat kind per failure cause.
//!
//! Every stage returns exactly one `ErrorKind`. The orchestrator only attaches
//! the failing `Stage`; it never changes the kind.

use std::fmt;

use thiserror::Error;

/// The failure cause. Tests assert on this, never on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingInput,
    FetchFailure,
    ContentTooShort,
    UnsupportedFormat,
    LegacyFormatUnsupported,
    DecodeFailure,
    CvTooShort,
    JobDescriptionTooShort,
    MissingCredential,
    InvalidCredential,
    RateLimited,
    RemoteServiceError,
}

impl ErrorKind {
    /// Machine-readable code used at the transport boundary.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::MissingInput => "MISSING_INPUT",
            ErrorKind::FetchFailure => "FETCH_FAILURE",
            ErrorKind::ContentTooShort => "CONTENT_TOO_SHORT",
            ErrorKind::UnsupportedFormat => "UNSUPPORTED_FORMAT",
            ErrorKind::LegacyFormatUnsupported => "LEGACY_FORMAT_UNSUPPORTED",
            ErrorKind::DecodeFailure => "DECODE_FAILURE",
            ErrorKind::CvTooShort => "CV_TOO_SHORT",
            ErrorKind::JobDescriptionTooShort => "JOB_DESCRIPTION_TOO_SHORT",
            ErrorKind::MissingCredential => "MISSING_CREDENTIAL",
            ErrorKind::InvalidCredential => "INVALID_CREDENTIAL",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::RemoteServiceError => "REMOTE_SERVICE_ERROR",
        }
    }

    /// Failures caused by what the caller sent, as opposed to server or
    /// upstream problems.
    pub fn is_client_error(self) -> bool {
        matches!(
            self,
            ErrorKind::MissingInput
                | ErrorKind::ContentTooShort
                | ErrorKind::UnsupportedFormat
                | ErrorKind::LegacyFormatUnsupported
                | ErrorKind::DecodeFailure
                | ErrorKind::CvTooShort
                | ErrorKind::JobDescriptionTooShort
        )
    }
}

/// The pipeline step that was running when a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Input,
    Fetch,
    Reduce,
    Extract,
    Validate,
    Analyze,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Input => "input",
            Stage::Fetch => "fetch",
            Stage::Reduce => "reduce",
            Stage::Extract => "extract",
            Stage::Validate => "validate",
            Stage::Analyze => "analyze",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineError {
    pub kind: ErrorKind,
    /// Human-readable, user-facing message.
    pub message: String,
    pub stage: Option<Stage>,
    /// Internal cause. Only exposed in diagnostic mode.
    pub detail: Option<String>,
}

impl PipelineError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stage: None,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl fmt::Display) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    /// Records the failing stage. An already-recorded stage is kept.
    pub fn at(mut self, stage: Stage) -> Self {
        self.stage.get_or_insert(stage);
        self
    }

    pub fn missing_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingInput, message)
    }

    pub fn fetch_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FetchFailure, message)
    }

    pub fn decode_failure(format: &str, cause: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::DecodeFailure,
            format!("The uploaded {format} file could not be read. Please check that it is not corrupted."),
        )
        .with_detail(cause)
    }

    /// Diagnostic trace: stage, kind and internal cause, if any.
    pub fn trace(&self) -> String {
        let stage = self
            .stage
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        match &self.detail {
            Some(detail) => format!("stage={stage} kind={:?}: {detail}", self.kind),
            None => format!("stage={stage} kind={:?}", self.kind),
        }
    }
}
