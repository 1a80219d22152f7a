use crate::config::Config;
use crate::pipeline::Pipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Session store plus the extraction, keyword, rewrite and render components.
    pub pipeline: Pipeline,
    pub config: Config,
}
