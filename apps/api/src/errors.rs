use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::extraction::ExtractError;
use crate::render::RenderError;
use crate::rewrite::RewriteError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailure(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Missing prerequisite: {0}")]
    MissingPrerequisite(String),

    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    #[error("Not ready: {0}")]
    NotReady(String),

    #[error("Session {0} not found")]
    SessionNotFound(Uuid),

    #[error("Payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Render failed: {0}")]
    RenderFailure(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable kind, also used as the `code` in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            AppError::ExtractionFailure(_) => "EXTRACTION_FAILURE",
            AppError::EmptyInput(_) => "EMPTY_INPUT",
            AppError::MissingPrerequisite(_) => "MISSING_PREREQUISITE",
            AppError::GenerationFailure(_) => "GENERATION_FAILURE",
            AppError::NotReady(_) => "NOT_READY",
            AppError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            AppError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::RenderFailure(_) => "RENDER_FAILURE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::ExtractionFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::EmptyInput(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MissingPrerequisite(_) | AppError::NotReady(_) => StatusCode::CONFLICT,
            AppError::GenerationFailure(_) => StatusCode::BAD_GATEWAY,
            AppError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::RenderFailure(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::GenerationFailure(msg) => {
                tracing::error!("Generation error: {msg}");
                self.to_string()
            }
            AppError::RenderFailure(msg) => {
                tracing::error!("Render error: {msg}");
                "The resume document could not be rendered".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message
            }
        }));

        (self.status(), body).into_response()
    }
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::UnsupportedFormat(msg) => AppError::UnsupportedFormat(msg),
            other => AppError::ExtractionFailure(other.to_string()),
        }
    }
}

impl From<RewriteError> for AppError {
    fn from(err: RewriteError) -> Self {
        AppError::GenerationFailure(err.to_string())
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::RenderFailure(err.to_string())
    }
}
