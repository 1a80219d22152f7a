// Prompt constants for the resume rewriter.
// JSON-only and no-fabrication fragments come from llm_client::prompts.

/// Role half of the system prompt. `JSON_ONLY_SYSTEM` is appended at call time.
pub const REWRITE_SYSTEM: &str = "You are an expert resume writer and ATS optimization \
    specialist. You rewrite existing resumes so they match a target job description \
    while staying strictly truthful to the candidate's history.";

/// Rewrite prompt template.
/// Replace: {no_fabrication}, {keywords_json}, {requirements_json},
///          {sections_json}, {job_description}
pub const REWRITE_PROMPT_TEMPLATE: &str = r#"{no_fabrication}

Rewrite the resume below for the target job.

Return a JSON object with this EXACT schema (no extra fields):
{
  "summary": "3-4 sentence professional summary",
  "experience": ["one entry per role or bullet, same order as the original"],
  "education": ["unchanged education entries"],
  "skills": ["skills relevant to the job first, then the rest"],
  "keywords_used": ["job keywords that appear in your rewrite"]
}

Rules:
- SUMMARY: lead with the experience most relevant to the job. Mirror the job's wording
  where the resume supports it.
- EXPERIENCE: keep every role, employer and date. Rephrase bullets to use job keywords
  naturally, quantify achievements only with numbers already in the resume.
- EDUCATION: copy as-is.
- SKILLS: keep only skills the resume already lists or clearly demonstrates. Order them
  so those matching the job keywords come first.
- Do not add sections that are not in the schema.

JOB KEYWORDS (most important first):
{keywords_json}

JOB REQUIREMENTS:
{requirements_json}

ORIGINAL RESUME SECTIONS:
{sections_json}

TARGET JOB DESCRIPTION:
{job_description}"#;
