//! Turns an uploaded resume file into plain text.
//!
//! `pdf-extract` does the heavy lifting; this module only validates the
//! payload and normalizes whitespace in what comes back.

use thiserror::Error;

pub mod sections;

/// Every PDF starts with these bytes regardless of what the client claims.
pub const PDF_MAGIC: &[u8] = b"%PDF";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("PDF text extraction failed: {0}")]
    Pdf(String),

    #[error("document contains no extractable text")]
    NoText,
}

/// Produces plain text from a document payload. Runs on a blocking thread.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError>;
}

/// `pdf-extract` backed extractor. The only format accepted is PDF.
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        if !is_pdf(bytes) {
            return Err(ExtractError::UnsupportedFormat(
                "payload does not start with %PDF".to_string(),
            ));
        }

        let raw = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?;

        let text = normalize_text(&raw);
        if text.is_empty() {
            return Err(ExtractError::NoText);
        }
        Ok(text)
    }
}

pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// Trims every line, drops form feeds and collapses runs of blank lines to one.
pub fn normalize_text(raw: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut previous_blank = true;

    for line in raw.lines() {
        let line = line.trim_matches(|c: char| c.is_whitespace() || c == '\u{c}');
        if line.is_empty() {
            if !previous_blank {
                out.push("");
            }
            previous_blank = true;
        } else {
            out.push(line);
            previous_blank = false;
        }
    }

    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}
