//! Axum route handlers for the tailoring pipeline.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::KeywordSet;
use crate::models::resume::{ResumeSections, RewrittenContent};
use crate::pipeline::ResumeUpload;
use crate::session::SessionStatus;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UploadResumeResponse {
    pub status: &'static str,
    pub session_id: Uuid,
    pub file_name: String,
    pub extracted_text: String,
    pub sections: ResumeSections,
}

#[derive(Debug, Deserialize)]
pub struct JobDescriptionRequest {
    pub text: String,
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct JobDescriptionResponse {
    pub status: &'static str,
    pub session_id: Uuid,
    pub keywords: KeywordSet,
}

/// Optional body for generate: a job description to (re)submit first.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub status: &'static str,
    pub session_id: Uuid,
    pub content: RewrittenContent,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /upload_resume
///
/// Multipart form: `file` (the resume PDF) and optionally `session_id` to
/// replace the resume of an existing session.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResumeResponse>, AppError> {
    let mut upload: Option<ResumeUpload> = None;
    let mut session_id: Option<Uuid> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                upload = Some(ResumeUpload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            Some("session_id") => {
                let raw = field.text().await.map_err(multipart_error)?;
                if !raw.trim().is_empty() {
                    session_id = Some(parse_session_id(&raw)?);
                }
            }
            _ => tracing::debug!("Ignoring multipart field {:?}", name),
        }
    }

    let upload = upload
        .ok_or_else(|| AppError::Validation("multipart field 'file' is required".to_string()))?;
    let (session_id, resume) = state.pipeline.submit_resume(session_id, upload).await?;

    Ok(Json(UploadResumeResponse {
        status: "success",
        session_id,
        file_name: resume.file_name,
        extracted_text: resume.text,
        sections: resume.sections,
    }))
}

/// POST /process_job_description
pub async fn handle_process_job_description(
    State(state): State<AppState>,
    Json(request): Json<JobDescriptionRequest>,
) -> Result<Json<JobDescriptionResponse>, AppError> {
    let (session_id, keywords) = state
        .pipeline
        .submit_job_description(request.session_id, request.text)
        .await?;

    Ok(Json(JobDescriptionResponse {
        status: "success",
        session_id,
        keywords,
    }))
}

/// POST /generate_updated_resume/:session_id
///
/// Accepts an optional `{"text": ...}` body, submitted as the session's job
/// description before rewriting. An empty body rewrites the stored inputs; any
/// other body must parse or the request is rejected.
pub async fn handle_generate(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    body: Bytes,
) -> Result<Json<GenerateResponse>, AppError> {
    let session_id = parse_session_id(&session_id)?;

    if let Some(request) = parse_generate_body(&body)? {
        state
            .pipeline
            .submit_job_description(Some(session_id), request.text)
            .await?;
    }

    let content = state.pipeline.generate_rewrite(session_id).await?;

    Ok(Json(GenerateResponse {
        status: "success",
        session_id,
        content,
    }))
}

/// GET /download_resume/:session_id
pub async fn handle_download(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, AppError> {
    let session_id = parse_session_id(&session_id)?;
    let document = state.pipeline.fetch_document(session_id).await?;

    let disposition = format!("attachment; filename=\"{}\"", document.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, document.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response())
}

/// GET /session/:session_id
pub async fn handle_session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionStatus>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    Ok(Json(state.pipeline.session_status(session_id).await?))
}

/// DELETE /session/:session_id
pub async fn handle_end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let session_id = parse_session_id(&session_id)?;
    state.pipeline.end_session(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn parse_session_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::Validation(format!("'{}' is not a valid session id", raw.trim())))
}

fn parse_generate_body(body: &[u8]) -> Result<Option<GenerateRequest>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| AppError::Validation(format!("invalid generate body: {e}")))
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::Validation(format!("invalid multipart upload: {err}"))
}
