//! Pipeline Coordinator — sequences extraction, keyword analysis, rewriting
//! and rendering for one session at a time.
//!
//! Components are injected as trait objects. The session store is the only
//! shared mutable state, and it is never locked across a component call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;
use crate::extraction::sections::parse_sections;
use crate::extraction::{is_pdf, TextExtractor};
use crate::keywords::KeywordExtractor;
use crate::models::job::{JobDescription, KeywordSet};
use crate::models::resume::{GeneratedDocument, ResumeDocument, RewrittenContent};
use crate::render::DocumentRenderer;
use crate::rewrite::ResumeRewriter;
use crate::session::{DocumentState, SessionStatus, SessionStore};

pub mod handlers;

#[cfg(test)]
pub(crate) mod fakes;

/// The four capabilities the coordinator drives.
#[derive(Clone)]
pub struct Components {
    pub text_extractor: Arc<dyn TextExtractor>,
    pub keyword_extractor: Arc<dyn KeywordExtractor>,
    pub rewriter: Arc<dyn ResumeRewriter>,
    pub renderer: Arc<dyn DocumentRenderer>,
}

#[derive(Debug, Clone)]
pub struct Limits {
    pub max_upload_bytes: usize,
    pub generation_timeout: Duration,
}

impl Limits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_upload_bytes: config.max_upload_bytes,
            generation_timeout: config.generation_timeout(),
        }
    }
}

/// A resume file as received from the client.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Clone)]
pub struct Pipeline {
    sessions: SessionStore,
    components: Components,
    limits: Limits,
}

impl Pipeline {
    pub fn new(components: Components, limits: Limits) -> Self {
        Self {
            sessions: SessionStore::new(),
            components,
            limits,
        }
    }

    /// Validates and extracts a resume, then stores it against the session.
    /// A new session is created when `session_id` is `None`.
    pub async fn submit_resume(
        &self,
        session_id: Option<Uuid>,
        upload: ResumeUpload,
    ) -> Result<(Uuid, ResumeDocument), AppError> {
        let size = upload.bytes.len();
        if size > self.limits.max_upload_bytes {
            return Err(AppError::PayloadTooLarge {
                size,
                limit: self.limits.max_upload_bytes,
            });
        }
        // The declared content type is advisory; only the magic bytes count.
        if !is_pdf(&upload.bytes) {
            return Err(AppError::UnsupportedFormat(format!(
                "'{}' is not a PDF document",
                upload.file_name
            )));
        }

        let extractor = Arc::clone(&self.components.text_extractor);
        let bytes = upload.bytes.clone();
        let text = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
            .await
            .map_err(|e| AppError::ExtractionFailure(format!("extractor aborted: {e}")))??;

        if text.trim().is_empty() {
            return Err(AppError::ExtractionFailure(
                "document contains no extractable text".to_string(),
            ));
        }

        let resume = ResumeDocument {
            file_name: upload.file_name,
            content_type: upload.content_type,
            size_bytes: size,
            sections: parse_sections(&text),
            text,
            uploaded_at: Utc::now(),
        };
        let id = self.sessions.store_resume(session_id, resume.clone()).await?;

        info!(
            session_id = %id,
            file_name = %resume.file_name,
            size_bytes = size,
            chars = resume.text.len(),
            "Resume extracted"
        );
        Ok((id, resume))
    }

    /// Extracts keywords from a job description and stores both against the session.
    pub async fn submit_job_description(
        &self,
        session_id: Option<Uuid>,
        text: String,
    ) -> Result<(Uuid, KeywordSet), AppError> {
        if text.trim().is_empty() {
            return Err(AppError::EmptyInput(
                "job description text is empty".to_string(),
            ));
        }

        let description = JobDescription::new(text);
        let keywords = self.components.keyword_extractor.extract(&description);
        let id = self
            .sessions
            .store_job_description(session_id, description, keywords.clone())
            .await?;

        info!(
            session_id = %id,
            keywords = keywords.keywords.len(),
            skills = keywords.skills.len(),
            "Job description processed"
        );
        Ok((id, keywords))
    }

    /// Rewrites the session's resume against its job description. One attempt,
    /// bounded by the configured generation timeout.
    pub async fn generate_rewrite(&self, session_id: Uuid) -> Result<RewrittenContent, AppError> {
        let (request, revision) = self.sessions.snapshot_for_rewrite(session_id).await?;

        let started = Instant::now();
        let timeout = self.limits.generation_timeout;
        let content =
            match tokio::time::timeout(timeout, self.components.rewriter.rewrite(&request)).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!(session_id = %session_id, "Rewrite timed out after {:?}", timeout);
                    return Err(AppError::GenerationFailure(format!(
                        "rewrite did not finish within {} seconds",
                        timeout.as_secs()
                    )));
                }
            };

        self.sessions
            .commit_rewrite(session_id, revision, content.clone())
            .await?;

        info!(
            session_id = %session_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            keywords_used = content.keywords_used.len(),
            "Rewrite complete"
        );
        Ok(content)
    }

    /// Returns the session's PDF, rendering it on first request.
    pub async fn fetch_document(&self, session_id: Uuid) -> Result<GeneratedDocument, AppError> {
        let (content, ticket) = match self.sessions.document_state(session_id).await? {
            DocumentState::Cached(document) => return Ok(document),
            DocumentState::NeedsRender { content, ticket } => (content, ticket),
        };

        let renderer = Arc::clone(&self.components.renderer);
        let bytes = tokio::task::spawn_blocking(move || renderer.render(&content))
            .await
            .map_err(|e| AppError::RenderFailure(format!("renderer aborted: {e}")))??;

        let document = self
            .sessions
            .commit_document(session_id, ticket, GeneratedDocument::pdf(session_id, bytes))
            .await?;

        info!(
            session_id = %session_id,
            size_bytes = document.bytes.len(),
            "Document rendered"
        );
        Ok(document)
    }

    pub async fn session_status(&self, session_id: Uuid) -> Result<SessionStatus, AppError> {
        self.sessions.status(session_id).await
    }

    /// Forgets a session and everything derived from it.
    pub async fn end_session(&self, session_id: Uuid) -> Result<(), AppError> {
        self.sessions.remove(session_id).await?;
        info!(session_id = %session_id, "Session ended");
        Ok(())
    }

    pub async fn sweep_expired(&self, ttl: Duration) -> usize {
        let removed = self.sessions.sweep_expired(ttl).await;
        if removed > 0 {
            info!(removed, "Swept expired sessions");
        }
        removed
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.len().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::fakes::{pdf_upload, FakeRewriter, Harness};
    use super::*;
    use crate::session::SessionStage;

    const JOB: &str = "Seeking a backend engineer with distributed systems experience";

    #[tokio::test]
    async fn test_fetch_before_generate_is_not_ready() {
        let h = Harness::new();
        let (id, _) = h
            .pipeline
            .submit_resume(None, pdf_upload("Jane Doe\nBackend engineer"))
            .await
            .unwrap();
        h.pipeline
            .submit_job_description(Some(id), JOB.to_string())
            .await
            .unwrap();

        let err = h.pipeline.fetch_document(id).await.unwrap_err();
        assert!(matches!(err, AppError::NotReady(_)));
    }

    #[tokio::test]
    async fn test_generate_without_resume_is_missing_prerequisite() {
        let h = Harness::new();
        let (id, _) = h
            .pipeline
            .submit_job_description(None, JOB.to_string())
            .await
            .unwrap();

        let err = h.pipeline.generate_rewrite(id).await.unwrap_err();
        assert!(matches!(err, AppError::MissingPrerequisite(_)));
        assert_eq!(h.rewriter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generate_without_description_is_missing_prerequisite() {
        let h = Harness::new();
        let (id, _) = h
            .pipeline
            .submit_resume(None, pdf_upload("Jane Doe"))
            .await
            .unwrap();

        let err = h.pipeline.generate_rewrite(id).await.unwrap_err();
        assert!(matches!(err, AppError::MissingPrerequisite(_)));
    }

    #[tokio::test]
    async fn test_empty_description_never_reaches_extractor() {
        let h = Harness::new();
        for text in ["", "   \n\t "] {
            let err = h
                .pipeline
                .submit_job_description(None, text.to_string())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::EmptyInput(_)));
        }
        assert_eq!(h.keywords.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.pipeline.active_sessions().await, 0);
    }

    #[tokio::test]
    async fn test_backend_engineer_scenario() {
        let h = Harness::new();
        let (id, resume) = h
            .pipeline
            .submit_resume(
                None,
                pdf_upload("Jane Doe\n\nEXPERIENCE\n- Built backend services in Rust"),
            )
            .await
            .unwrap();
        assert_eq!(resume.sections.header, vec!["Jane Doe"]);

        let (same_id, keywords) = h
            .pipeline
            .submit_job_description(Some(id), JOB.to_string())
            .await
            .unwrap();
        assert_eq!(same_id, id);
        assert!(!keywords.keywords.is_empty());
        let terms: Vec<&str> = keywords.terms().collect();
        assert!(terms.contains(&"backend"), "terms: {terms:?}");
        assert!(terms.contains(&"distributed systems"), "terms: {terms:?}");

        let content = h.pipeline.generate_rewrite(id).await.unwrap();
        assert!(content.sections.summary.contains(JOB));

        let document = h.pipeline.fetch_document(id).await.unwrap();
        assert!(!document.bytes.is_empty());
        assert_eq!(document.session_id, id);
        assert_eq!(document.file_name, "optimized_resume.pdf");

        let status = h.pipeline.session_status(id).await.unwrap();
        assert_eq!(status.stage, SessionStage::Rendered);
    }

    #[tokio::test]
    async fn test_repeated_fetch_renders_once() {
        let h = Harness::new();
        let id = h.loaded_session("Jane Doe", JOB).await;
        h.pipeline.generate_rewrite(id).await.unwrap();

        let first = h.pipeline.fetch_document(id).await.unwrap();
        let second = h.pipeline.fetch_document(id).await.unwrap();
        assert_eq!(first.bytes, second.bytes);
        assert_eq!(h.renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_sessions_see_only_their_own_output() {
        let h = Harness::new();
        let a = h.loaded_session("Alice Resume", "Rust backend role").await;
        let b = h.loaded_session("Bob Resume", "Frontend React role").await;

        let (ra, rb) = tokio::join!(h.pipeline.generate_rewrite(a), h.pipeline.generate_rewrite(b));
        let (ra, rb) = (ra.unwrap(), rb.unwrap());
        assert!(ra.sections.summary.contains("Alice Resume"));
        assert!(ra.sections.summary.contains("Rust backend role"));
        assert!(!ra.sections.summary.contains("Bob"));
        assert!(rb.sections.summary.contains("Bob Resume"));
        assert!(!rb.sections.summary.contains("Rust backend role"));

        let (da, db) = tokio::join!(h.pipeline.fetch_document(a), h.pipeline.fetch_document(b));
        let (da, db) = (da.unwrap(), db.unwrap());
        assert_eq!(da.session_id, a);
        assert_eq!(db.session_id, b);
        assert!(String::from_utf8_lossy(&da.bytes).contains("Alice Resume"));
        assert!(!String::from_utf8_lossy(&da.bytes).contains("Bob Resume"));
        assert!(String::from_utf8_lossy(&db.bytes).contains("Bob Resume"));
    }

    #[tokio::test]
    async fn test_resubmission_resets_to_earlier_stage() {
        let h = Harness::new();
        let id = h.loaded_session("Jane Doe", JOB).await;
        h.pipeline.generate_rewrite(id).await.unwrap();
        h.pipeline.fetch_document(id).await.unwrap();

        h.pipeline
            .submit_job_description(Some(id), "Looking for a data engineer".to_string())
            .await
            .unwrap();
        let status = h.pipeline.session_status(id).await.unwrap();
        assert_eq!(status.stage, SessionStage::InputsLoaded);
        assert!(matches!(
            h.pipeline.fetch_document(id).await,
            Err(AppError::NotReady(_))
        ));

        let content = h.pipeline.generate_rewrite(id).await.unwrap();
        assert!(content.sections.summary.contains("data engineer"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rewrite_timeout_is_generation_failure() {
        let h = Harness::with_rewriter(FakeRewriter::slow(Duration::from_secs(600)));
        let id = h.loaded_session("Jane Doe", JOB).await;

        let err = h.pipeline.generate_rewrite(id).await.unwrap_err();
        assert!(matches!(err, AppError::GenerationFailure(_)));
        assert_eq!(
            h.pipeline.session_status(id).await.unwrap().stage,
            SessionStage::InputsLoaded
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_inputs_changed_during_rewrite_discards_result() {
        let h = Harness::with_rewriter(FakeRewriter::slow(Duration::from_secs(1)));
        let id = h.loaded_session("Jane Doe", JOB).await;

        let pipeline = h.pipeline.clone();
        let in_flight = tokio::spawn(async move { pipeline.generate_rewrite(id).await });
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.pipeline
            .submit_job_description(Some(id), "Looking for a data engineer".to_string())
            .await
            .unwrap();

        let result = in_flight.await.unwrap();
        assert!(matches!(result, Err(AppError::GenerationFailure(_))));
        assert!(!h.pipeline.session_status(id).await.unwrap().has_rewrite);
    }

    #[tokio::test]
    async fn test_failing_rewriter_is_generation_failure() {
        let h = Harness::failing();
        let id = h.loaded_session("Jane Doe", JOB).await;
        let err = h.pipeline.generate_rewrite(id).await.unwrap_err();
        assert_eq!(err.code(), "GENERATION_FAILURE");
    }

    #[tokio::test]
    async fn test_non_pdf_upload_is_unsupported() {
        let h = Harness::new();
        let upload = ResumeUpload {
            file_name: "resume.docx".to_string(),
            content_type: Some("application/pdf".to_string()),
            bytes: Bytes::from_static(b"PK\x03\x04 not a pdf"),
        };
        let err = h.pipeline.submit_resume(None, upload).await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFormat(_)));
        assert_eq!(h.text.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let h = Harness::new();
        let mut body = b"%PDF-1.4\n".to_vec();
        body.resize(h.limits.max_upload_bytes + 1, b'a');
        let upload = ResumeUpload {
            file_name: "huge.pdf".to_string(),
            content_type: None,
            bytes: Bytes::from(body),
        };
        let err = h.pipeline.submit_resume(None, upload).await.unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_textless_pdf_is_extraction_failure() {
        let h = Harness::new();
        let err = h
            .pipeline
            .submit_resume(None, pdf_upload("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ExtractionFailure(_)));
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let h = Harness::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            h.pipeline.generate_rewrite(id).await,
            Err(AppError::SessionNotFound(_))
        ));
        assert!(matches!(
            h.pipeline.fetch_document(id).await,
            Err(AppError::SessionNotFound(_))
        ));
        assert!(matches!(
            h.pipeline.submit_job_description(Some(id), JOB.to_string()).await,
            Err(AppError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_end_session_and_sweep() {
        let h = Harness::new();
        let a = h.loaded_session("Alice", JOB).await;
        h.loaded_session("Bob", JOB).await;

        h.pipeline.end_session(a).await.unwrap();
        assert!(matches!(
            h.pipeline.session_status(a).await,
            Err(AppError::SessionNotFound(_))
        ));
        assert_eq!(h.pipeline.sweep_expired(Duration::from_secs(3600)).await, 0);
        assert_eq!(h.pipeline.sweep_expired(Duration::ZERO).await, 1);
        assert_eq!(h.pipeline.active_sessions().await, 0);
    }
}
