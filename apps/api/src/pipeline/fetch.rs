//! Fetch Client: retrieves the job posting page.
//!
//! Single attempt, no retries. Network errors, timeouts and non-2xx statuses
//! all surface as `FetchFailure`; only the message differs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{redirect, Client, Url};
use tracing::{debug, warn};

use crate::pipeline::PipelineError;

/// Desktop browser identity. Some job boards reject obvious bot agents outright.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const MAX_REDIRECTS: usize = 5;
/// Job pages are small; anything bigger is not worth holding in memory.
const MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;

/// Anything that can turn a URL into a raw page body.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, PipelineError>;
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Total time budget for the request, including redirects and body.
    pub timeout: Duration,
    pub max_redirects: usize,
    /// Largest body accepted, checked against `Content-Length` and while reading.
    pub max_body_bytes: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_redirects: MAX_REDIRECTS,
            max_body_bytes: MAX_BODY_BYTES,
        }
    }
}

#[derive(Clone)]
pub struct FetchClient {
    client: Client,
    max_body_bytes: u64,
}

impl FetchClient {
    pub fn new(opts: FetchOptions) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .redirect(redirect::Policy::limited(opts.max_redirects))
            .timeout(opts.timeout)
            .build()?;
        Ok(Self {
            client,
            max_body_bytes: opts.max_body_bytes,
        })
    }
}

#[async_trait]
impl PageFetcher for FetchClient {
    async fn fetch(&self, url: &str) -> Result<String, PipelineError> {
        let parsed = Url::parse(url.trim()).map_err(|e| {
            PipelineError::fetch_failure(format!("'{url}' is not a valid URL.")).with_detail(e)
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PipelineError::fetch_failure(format!(
                "Only http and https links are supported, got '{}'.",
                parsed.scheme()
            )));
        }

        debug!(url = %parsed, "Fetching job posting");

        let mut response = self.client.get(parsed.clone()).send().await.map_err(|e| {
            warn!(url = %parsed, error = %e, "Job posting fetch failed");
            if e.is_timeout() {
                PipelineError::fetch_failure(
                    "The job posting took too long to respond. Please try again later.",
                )
                .with_detail(e)
            } else {
                PipelineError::fetch_failure("The job posting could not be loaded.").with_detail(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %parsed, %status, "Job posting returned non-success status");
            return Err(PipelineError::fetch_failure(format!(
                "The job posting could not be loaded (HTTP {}).",
                status.as_u16()
            )));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_body_bytes {
                warn!(url = %parsed, len, "Job posting exceeds size limit");
                return Err(too_large(self.max_body_bytes)
                    .with_detail(format!("content-length {len} bytes")));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(read_failure)? {
            if body.len() as u64 + chunk.len() as u64 > self.max_body_bytes {
                warn!(url = %parsed, "Job posting exceeds size limit while streaming");
                return Err(too_large(self.max_body_bytes));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

fn too_large(max: u64) -> PipelineError {
    PipelineError::fetch_failure("The job posting page is too large to process.")
        .with_detail(format!("limit is {max} bytes"))
}

fn read_failure(e: reqwest::Error) -> PipelineError {
    let message = if e.is_timeout() {
        "The job posting took too long to respond. Please try again later."
    } else {
        "The job posting could not be read."
    };
    PipelineError::fetch_failure(message).with_detail(e)
}
