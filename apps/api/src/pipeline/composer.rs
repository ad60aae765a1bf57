//! Analysis Composer: validates both texts, builds the bounded prompt, and maps
//! the reasoning service's outcome into the pipeline's error taxonomy.

use std::sync::Arc;

use reqwest::StatusCode;
use tracing::{debug, info};

use crate::llm_client::{CompletionBackend, LlmError};
use crate::pipeline::prompts::{ANALYSIS_PROMPT_TEMPLATE, ANALYSIS_SYSTEM, MAX_ANSWER_CHARS};
use crate::pipeline::{
    truncate_chars, AnalysisResult, CvText, ErrorKind, JobText, Limits, PipelineError, Stage,
};

/// A fully composed request. Lives only for the duration of one remote call.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub system: &'static str,
    pub prompt: String,
}

#[derive(Clone)]
pub struct AnalysisComposer {
    backend: Arc<dyn CompletionBackend>,
    limits: Limits,
}

impl AnalysisComposer {
    pub fn new(backend: Arc<dyn CompletionBackend>, limits: Limits) -> Self {
        Self { backend, limits }
    }

    /// Pre-dispatch checks, in order: credential, CV length, job text length.
    pub fn validate(&self, job: &JobText, cv: &CvText) -> Result<(), PipelineError> {
        if !self.backend.has_credential() {
            return Err(PipelineError::new(
                ErrorKind::MissingCredential,
                "The analysis service is not configured. Please contact the site operator.",
            ));
        }

        let cv_len = cv.as_str().trim().chars().count();
        if cv_len < self.limits.min_cv_len {
            return Err(PipelineError::new(
                ErrorKind::CvTooShort,
                "Too little text could be read from your CV. If it is a scanned PDF, \
                 please upload a version with selectable text.",
            )
            .with_detail(format!(
                "cv text has {cv_len} chars, minimum is {}",
                self.limits.min_cv_len
            )));
        }

        let job_len = job.as_str().trim().chars().count();
        if job_len < self.limits.min_job_description_len {
            return Err(PipelineError::new(
                ErrorKind::JobDescriptionTooShort,
                "The job description is too short to analyse.",
            )
            .with_detail(format!(
                "job text has {job_len} chars, minimum is {}",
                self.limits.min_job_description_len
            )));
        }

        Ok(())
    }

    /// Embeds both texts, each cut to `prompt_inclusion_cap` characters.
    pub fn compose(&self, job: &JobText, cv: &CvText) -> AnalysisRequest {
        let cap = self.limits.prompt_inclusion_cap;
        let max_answer_chars = MAX_ANSWER_CHARS.to_string();
        let prompt = fill_template(
            ANALYSIS_PROMPT_TEMPLATE,
            &[
                ("{job_text}", truncate_chars(job.as_str(), cap)),
                ("{cv_text}", truncate_chars(cv.as_str(), cap)),
                ("{max_answer_chars}", max_answer_chars.as_str()),
            ],
        );

        AnalysisRequest {
            system: ANALYSIS_SYSTEM,
            prompt,
        }
    }

    /// Validate, compose and dispatch in one call.
    ///
    /// Rejections from the pre-dispatch checks carry `Stage::Validate`; failures
    /// of the remote call carry `Stage::Analyze`.
    pub async fn analyze(&self, job: &JobText, cv: &CvText) -> Result<AnalysisResult, PipelineError> {
        self.validate(job, cv).map_err(|e| e.at(Stage::Validate))?;
        debug!("Validated");

        self.dispatch(self.compose(job, cv))
            .await
            .map_err(|e| e.at(Stage::Analyze))
    }

    /// Sends an already validated request. Single attempt.
    pub async fn dispatch(&self, request: AnalysisRequest) -> Result<AnalysisResult, PipelineError> {
        let text = self
            .backend
            .complete(request.system, &request.prompt)
            .await
            .map_err(map_llm_error)?;

        info!(chars = text.chars().count(), "Analysis received");
        Ok(AnalysisResult::new(text))
    }
}

fn map_llm_error(err: LlmError) -> PipelineError {
    match err {
        LlmError::MissingApiKey => PipelineError::new(
            ErrorKind::MissingCredential,
            "The analysis service is not configured. Please contact the site operator.",
        ),
        LlmError::Api { status, .. } if status == StatusCode::UNAUTHORIZED => PipelineError::new(
            ErrorKind::InvalidCredential,
            "The analysis service rejected our credentials. Please contact the site operator.",
        ),
        LlmError::Api { status, .. } if status == StatusCode::TOO_MANY_REQUESTS => {
            PipelineError::new(
                ErrorKind::RateLimited,
                "The analysis service is temporarily at its usage limit. \
                 Please wait a moment and try again.",
            )
        }
        LlmError::Api {
            status,
            message: Some(message),
        } => PipelineError::new(
            ErrorKind::RemoteServiceError,
            format!("The analysis service reported an error: {message}"),
        )
        .with_detail(format!("status {status}")),
        LlmError::Api {
            status,
            message: None,
        } => PipelineError::new(
            ErrorKind::RemoteServiceError,
            format!("The analysis service reported an error (HTTP {}).", status.as_u16()),
        ),
        LlmError::Http(e) if e.is_decode() => PipelineError::new(
            ErrorKind::RemoteServiceError,
            "The analysis service returned a response that could not be read. Please try again.",
        )
        .with_detail(e),
        LlmError::Http(e) => PipelineError::new(
            ErrorKind::RemoteServiceError,
            format!("The analysis service could not be reached: {e}"),
        ),
        LlmError::EmptyContent => PipelineError::new(
            ErrorKind::RemoteServiceError,
            "The analysis service returned an empty answer. Please try again.",
        ),
    }
}

/// Substitutes placeholders in a single left-to-right pass, so placeholder
/// text inside a substituted value is never expanded.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out =
        String::with_capacity(template.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut rest = template;

    loop {
        let next = values
            .iter()
            .filter_map(|(key, value)| rest.find(key).map(|idx| (idx, *key, *value)))
            .min_by_key(|(idx, _, _)| *idx);

        match next {
            Some((idx, key, value)) => {
                out.push_str(&rest[..idx]);
                out.push_str(value);
                rest = &rest[idx + key.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}
