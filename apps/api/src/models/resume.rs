use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::KeywordSet;

/// Section structure shared by extracted resumes and rewritten content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeSections {
    /// Name and contact lines that precede the first section heading.
    #[serde(default)]
    pub header: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub experience: Vec<String>,
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    /// Projects, certifications and anything else under a heading we recognise
    /// but do not rewrite.
    #[serde(default)]
    pub additional: Vec<String>,
}

impl ResumeSections {
    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
            && self.summary.trim().is_empty()
            && self.experience.is_empty()
            && self.education.is_empty()
            && self.skills.is_empty()
            && self.additional.is_empty()
    }
}

/// An uploaded resume and the text derived from it.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeDocument {
    pub file_name: String,
    pub content_type: Option<String>,
    pub size_bytes: usize,
    pub text: String,
    pub sections: ResumeSections,
    pub uploaded_at: DateTime<Utc>,
}

/// Everything the rewriter needs, snapshotted from a single session.
#[derive(Debug, Clone, Serialize)]
pub struct RewriteRequest {
    pub resume_text: String,
    pub resume_sections: ResumeSections,
    pub keywords: KeywordSet,
    pub job_description: String,
}

/// Revised resume content. Keeps the section layout of the source resume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewrittenContent {
    #[serde(flatten)]
    pub sections: ResumeSections,
    #[serde(default)]
    pub keywords_used: Vec<String>,
}

pub const GENERATED_FILE_NAME: &str = "optimized_resume.pdf";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A rendered, downloadable resume bound to the session that produced it.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub session_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
    pub rendered_at: DateTime<Utc>,
}

impl GeneratedDocument {
    pub fn pdf(session_id: Uuid, bytes: Vec<u8>) -> Self {
        Self {
            session_id,
            file_name: GENERATED_FILE_NAME.to_string(),
            content_type: PDF_CONTENT_TYPE.to_string(),
            bytes: Bytes::from(bytes),
            rendered_at: Utc::now(),
        }
    }
}
