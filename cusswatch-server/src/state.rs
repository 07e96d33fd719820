use std::sync::Arc;

use cusswatch_core::{AnalysisPipeline, CatalogClient, TmdbClient};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub catalog: Arc<CatalogClient>,
    pub tmdb: Arc<TmdbClient>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
