use std::sync::Arc;

use crate::pipeline::orchestrator::Orchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Expose internal error traces in responses (development only).
    pub diagnostics: bool,
}
