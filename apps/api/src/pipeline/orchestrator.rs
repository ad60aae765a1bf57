//! Orchestrator: runs one pipeline invocation end to end.
//!
//! Flow: Start → Fetched → Reduced → Extracted → Validated → Analyzed → Done.
//! Stages run strictly in order; the first failure ends the run and is
//! returned with its stage attached. No partial results.

use std::sync::Arc;

use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::pipeline::composer::AnalysisComposer;
use crate::pipeline::extractor::{panic_message, DocumentExtractor};
use crate::pipeline::fetch::PageFetcher;
use crate::pipeline::reducer::TextReducer;
use crate::pipeline::upload::StagedDocument;
use crate::pipeline::{AnalysisResult, PipelineError, Stage};

#[derive(Clone)]
pub struct Orchestrator {
    fetcher: Arc<dyn PageFetcher>,
    reducer: TextReducer,
    extractor: DocumentExtractor,
    composer: AnalysisComposer,
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        reducer: TextReducer,
        extractor: DocumentExtractor,
        composer: AnalysisComposer,
    ) -> Self {
        Self {
            fetcher,
            reducer,
            extractor,
            composer,
        }
    }

    /// Runs the pipeline for one job URL and one uploaded CV.
    ///
    /// Takes ownership of the staged upload; its temp file is released when
    /// this returns, whatever the outcome.
    pub async fn run(
        &self,
        url: &str,
        document: Option<StagedDocument>,
    ) -> Result<AnalysisResult, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", %run_id);

        let result = self.run_stages(url, document).instrument(span.clone()).await;

        // Failures are logged where they arise and once more at the HTTP boundary.
        let _entered = span.enter();
        match &result {
            Ok(analysis) => info!(chars = analysis.as_str().chars().count(), "Pipeline completed"),
            Err(e) => debug!(kind = ?e.kind, stage = ?e.stage, "Pipeline stopped"),
        }
        result
    }

    async fn run_stages(
        &self,
        url: &str,
        document: Option<StagedDocument>,
    ) -> Result<AnalysisResult, PipelineError> {
        if url.trim().is_empty() {
            return Err(
                PipelineError::missing_input("Please provide the job posting URL.").at(Stage::Input),
            );
        }
        let mut document = match document {
            Some(document) if !document.is_empty() => document,
            _ => return Err(PipelineError::missing_input("Please upload your CV.").at(Stage::Input)),
        };
        debug!(url, filename = %document.filename, bytes = document.len(), "Start");

        let page = self.fetcher.fetch(url).await.map_err(|e| e.at(Stage::Fetch))?;
        debug!(bytes = page.len(), "Fetched");

        let job_text = self.reducer.reduce(&page).map_err(|e| e.at(Stage::Reduce))?;
        drop(page);
        debug!(chars = job_text.as_str().chars().count(), "Reduced");

        let cv_document = document.load().await.map_err(|e| e.at(Stage::Extract))?;
        drop(document);
        let extractor = self.extractor;
        let cv_text = tokio::task::spawn_blocking(move || extractor.extract(&cv_document))
            .await
            .map_err(|e| {
                let cause = if e.is_panic() {
                    format!("extraction panicked: {}", panic_message(e.into_panic().as_ref()))
                } else {
                    format!("extraction task cancelled: {e}")
                };
                PipelineError::decode_failure("CV", cause).at(Stage::Extract)
            })?
            .map_err(|e| e.at(Stage::Extract))?;
        debug!(chars = cv_text.as_str().chars().count(), "Extracted");

        let analysis = self.composer.analyze(&job_text, &cv_text).await?;
        debug!("Analyzed");

        Ok(analysis)
    }
}
