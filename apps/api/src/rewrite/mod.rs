//! Resume Rewriter — asks the LLM to tailor resume sections to a job's keywords.
//!
//! The model only ever sees one session's snapshot. Whatever it returns is
//! merged back over the source sections so a partial answer never drops the
//! candidate's header or education.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_FABRICATION_INSTRUCTION};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::job::KeywordSet;
use crate::models::resume::{ResumeSections, RewriteRequest, RewrittenContent};

pub mod prompts;

use prompts::{REWRITE_PROMPT_TEMPLATE, REWRITE_SYSTEM};

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("failed to build rewrite prompt: {0}")]
    Prompt(#[from] serde_json::Error),

    #[error("model returned no usable resume content")]
    Empty,
}

/// Produces revised resume content for a snapshot of one session.
///
/// Implementations must not retain the request; every call is independent.
#[async_trait]
pub trait ResumeRewriter: Send + Sync {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<RewrittenContent, RewriteError>;
}

/// Shape the model is asked to return. Every field is optional on the wire.
#[derive(Debug, Default, Deserialize)]
struct RewriteOutput {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    experience: Vec<String>,
    #[serde(default)]
    education: Vec<String>,
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default)]
    keywords_used: Vec<String>,
}

impl RewriteOutput {
    fn is_empty(&self) -> bool {
        self.summary.trim().is_empty()
            && non_blank(&self.experience).is_empty()
            && non_blank(&self.skills).is_empty()
    }
}

pub struct LlmResumeRewriter {
    llm: LlmClient,
}

impl LlmResumeRewriter {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ResumeRewriter for LlmResumeRewriter {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<RewrittenContent, RewriteError> {
        let prompt = build_prompt(request)?;
        let system = format!("{} {}", REWRITE_SYSTEM, JSON_ONLY_SYSTEM);

        debug!("Sending rewrite prompt ({} chars)", prompt.len());
        let output: RewriteOutput = self.llm.call_json(&prompt, &system).await?;

        let content = merge_output(request, output)?;
        info!(
            "Rewrite produced {} experience entries, {} skills",
            content.sections.experience.len(),
            content.sections.skills.len()
        );
        Ok(content)
    }
}

fn build_prompt(request: &RewriteRequest) -> Result<String, serde_json::Error> {
    let keywords: Vec<&str> = request
        .keywords
        .terms()
        .chain(request.keywords.skills.iter().map(String::as_str))
        .collect();
    let keywords_json = serde_json::to_string_pretty(&keywords)?;
    let requirements_json = serde_json::to_string_pretty(&request.keywords.requirements)?;

    // Text with no recognisable headings goes to the model as-is.
    let sections_json = if request.resume_sections.is_empty() {
        request.resume_text.clone()
    } else {
        let sections = ResumeSections {
            skills: prioritize_skills(&request.resume_sections.skills, &request.keywords),
            ..request.resume_sections.clone()
        };
        serde_json::to_string_pretty(&sections)?
    };

    Ok(REWRITE_PROMPT_TEMPLATE
        .replace("{no_fabrication}", NO_FABRICATION_INSTRUCTION)
        .replace("{keywords_json}", &keywords_json)
        .replace("{requirements_json}", &requirements_json)
        .replace("{sections_json}", &sections_json)
        .replace("{job_description}", &request.job_description))
}

/// Overlays the model's sections on the source resume.
///
/// The header always comes from the source. Any section the model leaves
/// blank keeps its source content, and skills are re-ordered so those the
/// job asks for come first.
fn merge_output(
    request: &RewriteRequest,
    output: RewriteOutput,
) -> Result<RewrittenContent, RewriteError> {
    if output.is_empty() {
        return Err(RewriteError::Empty);
    }
    let source = &request.resume_sections;

    let summary = match output.summary.trim() {
        "" => source.summary.clone(),
        s => s.to_string(),
    };
    let skills = match non_blank(&output.skills) {
        s if s.is_empty() => prioritize_skills(&source.skills, &request.keywords),
        s => prioritize_skills(&s, &request.keywords),
    };

    let mut keywords_used: Vec<String> = Vec::new();
    for term in non_blank(&output.keywords_used) {
        if !keywords_used.iter().any(|k| k.eq_ignore_ascii_case(&term)) {
            keywords_used.push(term);
        }
    }

    Ok(RewrittenContent {
        sections: ResumeSections {
            header: source.header.clone(),
            summary,
            experience: or_source(non_blank(&output.experience), &source.experience),
            education: or_source(non_blank(&output.education), &source.education),
            skills,
            additional: source.additional.clone(),
        },
        keywords_used,
    })
}

fn non_blank(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn or_source(items: Vec<String>, source: &[String]) -> Vec<String> {
    if items.is_empty() {
        source.to_vec()
    } else {
        items
    }
}

/// Deduplicates skills case-insensitively and moves the ones the job
/// mentions to the front. Relative order within each group is kept.
pub fn prioritize_skills(skills: &[String], keywords: &KeywordSet) -> Vec<String> {
    let mut unique: Vec<&String> = Vec::new();
    for skill in skills {
        if !unique.iter().any(|s| s.eq_ignore_ascii_case(skill)) {
            unique.push(skill);
        }
    }
    let (mut relevant, rest): (Vec<&String>, Vec<&String>) =
        unique.into_iter().partition(|s| keywords.mentions(s));
    relevant.extend(rest);
    relevant.into_iter().cloned().collect()
}
