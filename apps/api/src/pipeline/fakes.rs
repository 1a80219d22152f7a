//! In-memory stand-ins for the pipeline components, shared by the pipeline
//! and router tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use super::{Components, Limits, Pipeline, ResumeUpload};
use crate::extraction::{normalize_text, ExtractError, TextExtractor};
use crate::keywords::{KeywordExtractor, StatisticalKeywordExtractor};
use crate::models::job::{JobDescription, KeywordSet};
use crate::models::resume::{RewriteRequest, RewrittenContent};
use crate::render::{DocumentRenderer, RenderError};
use crate::rewrite::{ResumeRewriter, RewriteError};

/// Wraps `text` in a payload that passes the PDF magic check.
pub fn pdf_upload(text: &str) -> ResumeUpload {
    ResumeUpload {
        file_name: "resume.pdf".to_string(),
        content_type: Some("application/pdf".to_string()),
        bytes: Bytes::from(format!("%PDF-1.4\n{text}")),
    }
}

/// Returns everything after the first line of the payload as the resume text.
#[derive(Default)]
pub struct EchoTextExtractor {
    pub calls: AtomicUsize,
}

impl TextExtractor for EchoTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let raw = String::from_utf8_lossy(bytes);
        let body = raw.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
        let text = normalize_text(body);
        if text.is_empty() {
            return Err(ExtractError::NoText);
        }
        Ok(text)
    }
}

#[derive(Default)]
pub struct CountingKeywordExtractor {
    pub calls: AtomicUsize,
    inner: StatisticalKeywordExtractor,
}

impl KeywordExtractor for CountingKeywordExtractor {
    fn extract(&self, job: &JobDescription) -> KeywordSet {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.extract(job)
    }
}

/// Rewriter whose output is built only from the request it was given, so
/// tests can tell which session's inputs produced it.
pub struct FakeRewriter {
    pub calls: AtomicUsize,
    delay: Option<Duration>,
    fail: bool,
}

impl FakeRewriter {
    pub fn echo() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: None,
            fail: false,
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::echo()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::echo()
        }
    }
}

#[async_trait]
impl ResumeRewriter for FakeRewriter {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<RewrittenContent, RewriteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(RewriteError::Empty);
        }

        let mut sections = request.resume_sections.clone();
        sections.summary = format!("{} | {}", request.resume_text, request.job_description);
        Ok(RewrittenContent {
            sections,
            keywords_used: request.keywords.terms().take(3).map(str::to_string).collect(),
        })
    }
}

/// Emits a fake PDF containing the summary so tests can check provenance.
#[derive(Default)]
pub struct CountingRenderer {
    pub calls: AtomicUsize,
}

impl DocumentRenderer for CountingRenderer {
    fn render(&self, content: &RewrittenContent) -> Result<Vec<u8>, RenderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("%PDF-fake #{n}\n{}", content.sections.summary).into_bytes())
    }
}

pub struct Harness {
    pub pipeline: Pipeline,
    pub limits: Limits,
    pub text: Arc<EchoTextExtractor>,
    pub keywords: Arc<CountingKeywordExtractor>,
    pub rewriter: Arc<FakeRewriter>,
    pub renderer: Arc<CountingRenderer>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_rewriter(FakeRewriter::echo())
    }

    pub fn failing() -> Self {
        Self::with_rewriter(FakeRewriter::failing())
    }

    pub fn with_rewriter(rewriter: FakeRewriter) -> Self {
        let text = Arc::new(EchoTextExtractor::default());
        let keywords = Arc::new(CountingKeywordExtractor::default());
        let rewriter = Arc::new(rewriter);
        let renderer = Arc::new(CountingRenderer::default());
        let limits = Limits {
            max_upload_bytes: 64 * 1024,
            generation_timeout: Duration::from_secs(5),
        };

        let components = Components {
            text_extractor: text.clone(),
            keyword_extractor: keywords.clone(),
            rewriter: rewriter.clone(),
            renderer: renderer.clone(),
        };

        Self {
            pipeline: Pipeline::new(components, limits.clone()),
            limits,
            text,
            keywords,
            rewriter,
            renderer,
        }
    }

    /// Creates a session holding both inputs.
    pub async fn loaded_session(&self, resume_text: &str, job: &str) -> Uuid {
        let (id, _) = self
            .pipeline
            .submit_resume(None, pdf_upload(resume_text))
            .await
            .expect("resume upload");
        self.pipeline
            .submit_job_description(Some(id), job.to_string())
            .await
            .expect("job description");
        id
    }
}
