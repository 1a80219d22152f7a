use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-form job description text as submitted by the user. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescription {
    pub text: String,
    pub submitted_at: DateTime<Utc>,
}

impl JobDescription {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            submitted_at: Utc::now(),
        }
    }
}

/// A single ranked term extracted from a job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub term: String,
    pub score: f32,
    pub frequency: u32,
}

/// Everything the keyword extractor pulls out of a job description.
///
/// `keywords` is ordered by descending score; the other lists keep order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordSet {
    pub keywords: Vec<Keyword>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub technical_terms: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub important_phrases: Vec<String>,
}

impl KeywordSet {
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(|k| k.term.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.skills.is_empty() && self.technical_terms.is_empty()
    }

    /// Case-insensitive membership across keywords, skills and technical terms.
    pub fn mentions(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return false;
        }
        self.terms()
            .chain(self.skills.iter().map(String::as_str))
            .chain(self.technical_terms.iter().map(String::as_str))
            .any(|t| t.to_lowercase() == needle)
    }
}
