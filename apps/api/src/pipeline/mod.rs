// Job-fit analysis pipeline.
// Fetch → Reduce (job posting), Extract (CV), Validate → Analyze (LLM).
// All remote I/O goes through the PageFetcher and CompletionBackend seams.

pub mod composer;
pub mod docx;
pub mod error;
pub mod extractor;
pub mod fetch;
pub mod orchestrator;
pub mod prompts;
pub mod reducer;
pub mod upload;

pub use error::{ErrorKind, PipelineError, Stage};

/// Length thresholds used across the pipeline, in characters.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Reduced job text is truncated to this many characters.
    pub job_text_cap: usize,
    /// Reduced job text shorter than this is rejected as `ContentTooShort`.
    pub min_job_content: usize,
    /// Trimmed CV text shorter than this is rejected as `CvTooShort`.
    pub min_cv_len: usize,
    /// Trimmed job text shorter than this is rejected as `JobDescriptionTooShort`.
    pub min_job_description_len: usize,
    /// Each text block is truncated to this before being embedded in the prompt.
    pub prompt_inclusion_cap: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            job_text_cap: 8000,
            min_job_content: 100,
            min_cv_len: 50,
            min_job_description_len: 50,
            prompt_inclusion_cap: 6000,
        }
    }
}

/// Readable text of a job posting, bounded by `Limits::job_text_cap`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobText(String);

impl JobText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Plain text extracted from a CV document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvText(String);

impl CvText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The narrative returned by the reasoning service, unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult(String);

impl AnalysisResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Truncates to at most `max` characters. May split a word.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
