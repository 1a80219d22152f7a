//! Derives salient terms from a job description.
//!
//! Pure-Rust and deterministic. Candidates are runs of up to three
//! non-stopword tokens inside a sentence; each occurrence contributes a
//! position weight (earlier sentences count more) scaled by phrase length.
//! Skills, technical terms and requirement sentences are pulled out alongside.

use std::collections::HashMap;

use crate::models::job::{JobDescription, Keyword, KeywordSet};

pub mod lexicon;

use lexicon::{is_stopword, REQUIREMENT_INDICATORS, SKILL_LEXICON};

pub const DEFAULT_KEYWORD_LIMIT: usize = 20;
const MAX_NGRAM: usize = 3;

/// Extracts a `KeywordSet` from a job description without touching the description itself.
///
/// Carried in the pipeline as `Arc<dyn KeywordExtractor>`.
pub trait KeywordExtractor: Send + Sync {
    fn extract(&self, job: &JobDescription) -> KeywordSet;
}

/// Default extractor: stopword-delimited n-grams scored by frequency and position.
pub struct StatisticalKeywordExtractor {
    limit: usize,
}

impl StatisticalKeywordExtractor {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }
}

impl Default for StatisticalKeywordExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORD_LIMIT)
    }
}

impl KeywordExtractor for StatisticalKeywordExtractor {
    fn extract(&self, job: &JobDescription) -> KeywordSet {
        let sentences = split_sentences(&job.text);
        let tokenized: Vec<Vec<&str>> = sentences.iter().map(|s| tokenize(s)).collect();

        let keywords = rank_candidates(&tokenized, self.limit);
        let important_phrases = keywords
            .iter()
            .filter(|k| k.term.contains(' '))
            .map(|k| k.term.clone())
            .collect();

        KeywordSet {
            skills: match_skills(&tokenized),
            technical_terms: technical_terms(&tokenized),
            requirements: requirement_sentences(&sentences),
            important_phrases,
            keywords,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Text segmentation
// ────────────────────────────────────────────────────────────────────────────

/// Splits on line breaks, bullets, `!`, `?`, `;` and on `.` followed by whitespace,
/// so that "node.js" and "2.5" stay intact.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        let boundary = match c {
            '\n' | '!' | '?' | ';' | '•' => true,
            '.' => chars.peek().map_or(true, |(_, next)| next.is_whitespace()),
            _ => false,
        };
        if boundary {
            push_trimmed(&mut sentences, &text[start..idx]);
            start = idx + c.len_utf8();
        }
    }
    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, raw: &'a str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }
}

fn is_token_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '+' | '#' | '.' | '-' | '/' | '_')
}

/// Tokens keep their original case; `+#./-_` survive inside a token (C++, CI/CD, node.js).
fn tokenize(sentence: &str) -> Vec<&str> {
    sentence
        .split(|c: char| !is_token_char(c))
        .map(|t| t.trim_matches(|c: char| matches!(c, '.' | '-' | '/' | '_')))
        .filter(|t| !t.is_empty())
        .collect()
}

/// A token that can never be part of a keyword candidate.
fn is_boundary(token: &str) -> bool {
    let lower = token.to_lowercase();
    if is_stopword(&lower) || !token.chars().any(char::is_alphabetic) {
        return true;
    }
    token.chars().count() < 2 && !matches!(lower.as_str(), "c" | "r")
}

// ────────────────────────────────────────────────────────────────────────────
// Candidate ranking
// ────────────────────────────────────────────────────────────────────────────

struct Candidate {
    score: f32,
    frequency: u32,
    first_seen: usize,
}

fn position_weight(sentence_index: usize, sentence_count: usize) -> f32 {
    if sentence_count <= 1 {
        return 1.0;
    }
    1.0 - 0.5 * (sentence_index as f32 / (sentence_count - 1) as f32)
}

fn rank_candidates(sentences: &[Vec<&str>], limit: usize) -> Vec<Keyword> {
    let mut candidates: HashMap<String, Candidate> = HashMap::new();
    let mut order = 0usize;

    for (i, tokens) in sentences.iter().enumerate() {
        let weight = position_weight(i, sentences.len());

        for chunk in tokens.split(|t| is_boundary(t)) {
            for start in 0..chunk.len() {
                for n in 1..=MAX_NGRAM.min(chunk.len() - start) {
                    let term = chunk[start..start + n]
                        .iter()
                        .map(|t| t.to_lowercase())
                        .collect::<Vec<_>>()
                        .join(" ");
                    let length_bonus = 1.0 + 0.25 * (n - 1) as f32;

                    let entry = candidates.entry(term).or_insert(Candidate {
                        score: 0.0,
                        frequency: 0,
                        first_seen: order,
                    });
                    entry.score += weight * length_bonus;
                    entry.frequency += 1;
                    order += 1;
                }
            }
        }
    }

    let mut ranked: Vec<(String, Candidate)> = candidates.into_iter().collect();
    ranked.sort_by(|(_, a), (_, b)| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.first_seen.cmp(&b.first_seen))
    });

    ranked
        .into_iter()
        .take(limit)
        .map(|(term, c)| Keyword {
            term,
            score: c.score,
            frequency: c.frequency,
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Skills, technical terms, requirements
// ────────────────────────────────────────────────────────────────────────────

fn match_skills(sentences: &[Vec<&str>]) -> Vec<String> {
    let lexicon: Vec<(&str, Vec<String>)> = SKILL_LEXICON
        .iter()
        .map(|skill| {
            let parts = skill.split_whitespace().map(str::to_lowercase).collect();
            (*skill, parts)
        })
        .collect();

    let mut found: Vec<String> = Vec::new();
    for tokens in sentences {
        let lower: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
        for pos in 0..lower.len() {
            for (canonical, parts) in &lexicon {
                let end = pos + parts.len();
                if end <= lower.len()
                    && lower[pos..end] == parts[..]
                    && !found.iter().any(|f| f == canonical)
                {
                    found.push(canonical.to_string());
                }
            }
        }
    }
    found
}

fn looks_technical(token: &str, index_in_sentence: usize) -> bool {
    let has_alpha = token.chars().any(char::is_alphabetic);
    if !has_alpha || is_stopword(&token.to_lowercase()) {
        return false;
    }
    let has_digit = token.chars().any(|c| c.is_ascii_digit());
    let has_symbol = token.contains(['+', '#', '.', '/']);
    let inner_upper = token.chars().count() >= 2 && token.chars().skip(1).any(char::is_uppercase);
    let capitalized = token.chars().next().is_some_and(char::is_uppercase);

    has_digit || has_symbol || inner_upper || (capitalized && index_in_sentence > 0)
}

fn technical_terms(sentences: &[Vec<&str>]) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for tokens in sentences {
        for (i, token) in tokens.iter().enumerate() {
            if looks_technical(token, i) && !terms.iter().any(|t| t.eq_ignore_ascii_case(token)) {
                terms.push(token.to_string());
            }
        }
    }
    terms
}

fn requirement_sentences(sentences: &[&str]) -> Vec<String> {
    sentences
        .iter()
        .filter(|s| {
            let lower = s.to_lowercase();
            REQUIREMENT_INDICATORS.iter().any(|ind| lower.contains(ind))
        })
        .map(|s| s.to_string())
        .collect()
}
