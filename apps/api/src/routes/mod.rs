pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::pipeline::handlers;
use crate::state::AppState;

/// Room for multipart framing and the `session_id` field on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/upload_resume", post(handlers::handle_upload_resume))
        .route(
            "/process_job_description",
            post(handlers::handle_process_job_description),
        )
        .route(
            "/generate_updated_resume/:session_id",
            post(handlers::handle_generate),
        )
        .route("/download_resume/:session_id", get(handlers::handle_download))
        .route(
            "/session/:session_id",
            get(handlers::handle_session_status).delete(handlers::handle_end_session),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
