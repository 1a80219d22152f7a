//! Session Store
//!
//! Holds every in-flight tailoring session in memory:
//! - inputs (resume, job description + keywords) and outputs (rewrite, PDF)
//! - a revision counter bumped on every input change, so work started on old
//!   inputs can be recognised and dropped at commit time
//! - a rewrite counter bumped on every committed rewrite, so a render of an
//!   older rewrite is never cached over a newer one
//! - idle expiry via `sweep_expired`
//!
//! The lock is only held to snapshot or commit. Nothing slow runs under it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{JobDescription, KeywordSet};
use crate::models::resume::{GeneratedDocument, ResumeDocument, RewriteRequest, RewrittenContent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStage {
    Empty,
    ResumeLoaded,
    DescriptionLoaded,
    InputsLoaded,
    Rewritten,
    Rendered,
}

/// A job description together with the keywords derived from it.
#[derive(Debug, Clone)]
pub struct JobInput {
    pub description: JobDescription,
    pub keywords: KeywordSet,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub resume: Option<ResumeDocument>,
    pub job: Option<JobInput>,
    pub rewritten: Option<RewrittenContent>,
    pub document: Option<GeneratedDocument>,
    revision: u64,
    rewrite_seq: u64,
}

impl Session {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            last_active: now,
            resume: None,
            job: None,
            rewritten: None,
            document: None,
            revision: 0,
            rewrite_seq: 0,
        }
    }

    pub fn stage(&self) -> SessionStage {
        match (&self.resume, &self.job, &self.rewritten, &self.document) {
            (_, _, _, Some(_)) => SessionStage::Rendered,
            (_, _, Some(_), None) => SessionStage::Rewritten,
            (Some(_), Some(_), None, None) => SessionStage::InputsLoaded,
            (Some(_), None, None, None) => SessionStage::ResumeLoaded,
            (None, Some(_), None, None) => SessionStage::DescriptionLoaded,
            (None, None, None, None) => SessionStage::Empty,
        }
    }

    fn render_ticket(&self) -> RenderTicket {
        RenderTicket {
            revision: self.revision,
            rewrite_seq: self.rewrite_seq,
        }
    }

    fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// Called whenever an input changes. Outputs derived from the old inputs go.
    fn inputs_changed(&mut self) {
        self.revision += 1;
        self.rewritten = None;
        self.document = None;
        self.touch();
    }
}

/// Externally visible summary of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session_id: Uuid,
    pub stage: SessionStage,
    pub has_resume: bool,
    pub has_job_description: bool,
    pub has_rewrite: bool,
    pub has_document: bool,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl From<&Session> for SessionStatus {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id,
            stage: session.stage(),
            has_resume: session.resume.is_some(),
            has_job_description: session.job.is_some(),
            has_rewrite: session.rewritten.is_some(),
            has_document: session.document.is_some(),
            created_at: session.created_at,
            last_active: session.last_active,
        }
    }
}

/// Identifies the inputs and the rewrite a render was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTicket {
    revision: u64,
    rewrite_seq: u64,
}

/// What `fetch_document` has to do for a session.
#[derive(Debug)]
pub enum DocumentState {
    Cached(GeneratedDocument),
    NeedsRender {
        content: RewrittenContent,
        ticket: RenderTicket,
    },
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Inputs
    // ========================================================================

    /// Stores a resume, creating a session when `id` is `None`.
    pub async fn store_resume(
        &self,
        id: Option<Uuid>,
        resume: ResumeDocument,
    ) -> Result<Uuid, AppError> {
        self.with_session_or_new(id, |session| {
            session.resume = Some(resume);
            session.inputs_changed();
        })
        .await
    }

    /// Stores a job description and its keywords, creating a session when `id` is `None`.
    pub async fn store_job_description(
        &self,
        id: Option<Uuid>,
        description: JobDescription,
        keywords: KeywordSet,
    ) -> Result<Uuid, AppError> {
        self.with_session_or_new(id, |session| {
            session.job = Some(JobInput {
                description,
                keywords,
            });
            session.inputs_changed();
        })
        .await
    }

    async fn with_session_or_new(
        &self,
        id: Option<Uuid>,
        apply: impl FnOnce(&mut Session),
    ) -> Result<Uuid, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = match id {
            Some(id) => sessions.get_mut(&id).ok_or(AppError::SessionNotFound(id))?,
            None => {
                let session = Session::new();
                let id = session.id;
                tracing::info!(session_id = %id, "Created session");
                sessions.entry(id).or_insert(session)
            }
        };
        apply(session);
        Ok(session.id)
    }

    // ========================================================================
    // Rewrite
    // ========================================================================

    /// Copies out everything a rewrite needs, plus the revision it was taken at.
    pub async fn snapshot_for_rewrite(&self, id: Uuid) -> Result<(RewriteRequest, u64), AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(AppError::SessionNotFound(id))?;
        session.touch();

        match (&session.resume, &session.job) {
            (Some(resume), Some(job)) => Ok((
                RewriteRequest {
                    resume_text: resume.text.clone(),
                    resume_sections: resume.sections.clone(),
                    keywords: job.keywords.clone(),
                    job_description: job.description.text.clone(),
                },
                session.revision,
            )),
            (None, Some(_)) => Err(AppError::MissingPrerequisite(
                "upload a resume before generating".to_string(),
            )),
            (Some(_), None) => Err(AppError::MissingPrerequisite(
                "submit a job description before generating".to_string(),
            )),
            (None, None) => Err(AppError::MissingPrerequisite(
                "upload a resume and submit a job description before generating".to_string(),
            )),
        }
    }

    /// Stores a rewrite unless the inputs changed since `revision` was snapshotted.
    pub async fn commit_rewrite(
        &self,
        id: Uuid,
        revision: u64,
        content: RewrittenContent,
    ) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(AppError::SessionNotFound(id))?;
        if session.revision != revision {
            return Err(AppError::GenerationFailure(
                "session inputs changed while the rewrite was running; generate again".to_string(),
            ));
        }
        session.rewritten = Some(content);
        session.rewrite_seq += 1;
        session.document = None;
        session.touch();
        Ok(())
    }

    // ========================================================================
    // Document
    // ========================================================================

    pub async fn document_state(&self, id: Uuid) -> Result<DocumentState, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(AppError::SessionNotFound(id))?;
        session.touch();

        if let Some(document) = &session.document {
            return Ok(DocumentState::Cached(document.clone()));
        }
        match &session.rewritten {
            Some(content) => Ok(DocumentState::NeedsRender {
                content: content.clone(),
                ticket: session.render_ticket(),
            }),
            None => Err(AppError::NotReady(
                "no rewritten resume yet; call generate first".to_string(),
            )),
        }
    }

    /// Caches a rendered document. If a concurrent fetch already cached one for
    /// the same rewrite, that one wins and is returned instead. A render of a
    /// rewrite that has since been replaced is dropped.
    pub async fn commit_document(
        &self,
        id: Uuid,
        ticket: RenderTicket,
        document: GeneratedDocument,
    ) -> Result<GeneratedDocument, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(AppError::SessionNotFound(id))?;
        if session.render_ticket() != ticket || session.rewritten.is_none() {
            return Err(AppError::NotReady(
                "session changed while rendering; download again".to_string(),
            ));
        }
        Ok(session.document.get_or_insert(document).clone())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    pub async fn status(&self, id: Uuid) -> Result<SessionStatus, AppError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .map(SessionStatus::from)
            .ok_or(AppError::SessionNotFound(id))
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().await;
        sessions
            .remove(&id)
            .map(|_| ())
            .ok_or(AppError::SessionNotFound(id))
    }

    /// Drops sessions idle for at least `ttl`. Returns how many were removed.
    pub async fn sweep_expired(&self, ttl: Duration) -> usize {
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return 0;
        };
        let cutoff = Utc::now() - ttl;

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.last_active > cutoff);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::ResumeSections;

    fn resume(text: &str) -> ResumeDocument {
        ResumeDocument {
            file_name: "resume.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            size_bytes: 1024,
            text: text.to_string(),
            sections: ResumeSections {
                summary: text.to_string(),
                ..Default::default()
            },
            uploaded_at: Utc::now(),
        }
    }

    fn content(summary: &str) -> RewrittenContent {
        RewrittenContent {
            sections: ResumeSections {
                summary: summary.to_string(),
                ..Default::default()
            },
            keywords_used: vec![],
        }
    }

    async fn loaded_session(store: &SessionStore) -> Uuid {
        let id = store.store_resume(None, resume("Engineer")).await.unwrap();
        store
            .store_job_description(Some(id), JobDescription::new("Rust role"), KeywordSet::default())
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn test_stage_progression() {
        let store = SessionStore::new();
        let id = store.store_resume(None, resume("Engineer")).await.unwrap();
        assert_eq!(store.status(id).await.unwrap().stage, SessionStage::ResumeLoaded);

        store
            .store_job_description(Some(id), JobDescription::new("Rust role"), KeywordSet::default())
            .await
            .unwrap();
        assert_eq!(store.status(id).await.unwrap().stage, SessionStage::InputsLoaded);

        let (_, revision) = store.snapshot_for_rewrite(id).await.unwrap();
        store.commit_rewrite(id, revision, content("New")).await.unwrap();
        assert_eq!(store.status(id).await.unwrap().stage, SessionStage::Rewritten);

        let DocumentState::NeedsRender { ticket, .. } = store.document_state(id).await.unwrap()
        else {
            panic!("expected a render job");
        };
        let doc = GeneratedDocument::pdf(id, b"%PDF-1.5".to_vec());
        store.commit_document(id, ticket, doc).await.unwrap();
        let status = store.status(id).await.unwrap();
        assert_eq!(status.stage, SessionStage::Rendered);
        assert!(status.has_document);
    }

    #[tokio::test]
    async fn test_description_only_session() {
        let store = SessionStore::new();
        let id = store
            .store_job_description(None, JobDescription::new("Rust role"), KeywordSet::default())
            .await
            .unwrap();
        assert_eq!(store.status(id).await.unwrap().stage, SessionStage::DescriptionLoaded);
        assert!(matches!(
            store.snapshot_for_rewrite(id).await,
            Err(AppError::MissingPrerequisite(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            store.store_resume(Some(id), resume("x")).await,
            Err(AppError::SessionNotFound(missing)) if missing == id
        ));
        assert!(matches!(store.status(id).await, Err(AppError::SessionNotFound(_))));
        assert!(matches!(store.remove(id).await, Err(AppError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_resubmission_discards_outputs() {
        let store = SessionStore::new();
        let id = loaded_session(&store).await;
        let (_, revision) = store.snapshot_for_rewrite(id).await.unwrap();
        store.commit_rewrite(id, revision, content("New")).await.unwrap();

        store.store_resume(Some(id), resume("Different")).await.unwrap();
        let status = store.status(id).await.unwrap();
        assert_eq!(status.stage, SessionStage::InputsLoaded);
        assert!(!status.has_rewrite);
        assert!(matches!(store.document_state(id).await, Err(AppError::NotReady(_))));
    }

    #[tokio::test]
    async fn test_stale_rewrite_is_rejected() {
        let store = SessionStore::new();
        let id = loaded_session(&store).await;
        let (_, revision) = store.snapshot_for_rewrite(id).await.unwrap();

        store
            .store_job_description(Some(id), JobDescription::new("Go role"), KeywordSet::default())
            .await
            .unwrap();

        assert!(matches!(
            store.commit_rewrite(id, revision, content("Old")).await,
            Err(AppError::GenerationFailure(_))
        ));
        assert!(!store.status(id).await.unwrap().has_rewrite);
    }

    #[tokio::test]
    async fn test_document_state_renders_once_then_caches() {
        let store = SessionStore::new();
        let id = loaded_session(&store).await;
        let (_, revision) = store.snapshot_for_rewrite(id).await.unwrap();
        store.commit_rewrite(id, revision, content("New")).await.unwrap();

        let DocumentState::NeedsRender { content, ticket } = store.document_state(id).await.unwrap()
        else {
            panic!("expected a render job");
        };
        assert_eq!(content.sections.summary, "New");

        let first = store
            .commit_document(id, ticket, GeneratedDocument::pdf(id, b"first".to_vec()))
            .await
            .unwrap();
        let second = store
            .commit_document(id, ticket, GeneratedDocument::pdf(id, b"second".to_vec()))
            .await
            .unwrap();
        assert_eq!(first.bytes, second.bytes);

        match store.document_state(id).await.unwrap() {
            DocumentState::Cached(doc) => assert_eq!(&doc.bytes[..], b"first"),
            other => panic!("expected cached document, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_render_of_replaced_rewrite_is_not_cached() {
        let store = SessionStore::new();
        let id = loaded_session(&store).await;
        let (_, revision) = store.snapshot_for_rewrite(id).await.unwrap();
        store.commit_rewrite(id, revision, content("Rewrite A")).await.unwrap();

        let DocumentState::NeedsRender { ticket, .. } = store.document_state(id).await.unwrap()
        else {
            panic!("expected a render job");
        };
        // A second generate lands while the first render is still running.
        store.commit_rewrite(id, revision, content("Rewrite B")).await.unwrap();

        let stale = GeneratedDocument::pdf(id, b"Rewrite A".to_vec());
        assert!(matches!(
            store.commit_document(id, ticket, stale).await,
            Err(AppError::NotReady(_))
        ));
        assert!(!store.status(id).await.unwrap().has_document);

        match store.document_state(id).await.unwrap() {
            DocumentState::NeedsRender { content, .. } => {
                assert_eq!(content.sections.summary, "Rewrite B")
            }
            other => panic!("expected a fresh render job, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_remove_and_sweep() {
        let store = SessionStore::new();
        let a = loaded_session(&store).await;
        let _b = loaded_session(&store).await;
        assert_eq!(store.len().await, 2);

        store.remove(a).await.unwrap();
        assert_eq!(store.len().await, 1);

        assert_eq!(store.sweep_expired(Duration::from_secs(3600)).await, 0);
        assert_eq!(store.sweep_expired(Duration::ZERO).await, 1);
        assert_eq!(store.len().await, 0);
    }
}
