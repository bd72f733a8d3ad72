//! PDF text extraction for uploaded CVs.
//!
//! Parsing runs on the blocking pool; `pdf-extract` can panic on malformed
//! input, and a panicking task surfaces here as an ordinary extraction error.

pub mod chunking;

use std::path::Path;

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("the file is empty")]
    Empty,

    #[error("the file is not a PDF document")]
    NotPdf,

    #[error("the PDF could not be parsed: {0}")]
    Parse(String),

    #[error("the PDF has no extractable text layer")]
    NoText,
}

/// Extracts plain text from PDF bytes.
///
/// Returns an empty string when the document parses but carries no text
/// layer (for example a scanned image); callers decide whether that is fatal.
pub async fn extract_text(bytes: Bytes) -> Result<String, ExtractionError> {
    if bytes.is_empty() {
        return Err(ExtractionError::Empty);
    }
    if !looks_like_pdf(&bytes) {
        return Err(ExtractionError::NotPdf);
    }

    let raw = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| {
        if e.is_panic() {
            ExtractionError::Parse("parser aborted on malformed input".to_string())
        } else {
            ExtractionError::Parse(e.to_string())
        }
    })?
    .map_err(ExtractionError::Parse)?;

    let text = normalize_text(&raw);
    debug!(chars = text.len(), "extracted PDF text");
    Ok(text)
}

/// Checks that the data starts with the `%PDF-` header, after an optional
/// UTF-8 BOM and leading whitespace that some generators emit.
fn looks_like_pdf(bytes: &[u8]) -> bool {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(body.len());
    body[start..].starts_with(PDF_MAGIC)
}

/// Trims trailing whitespace on every line and collapses runs of blank lines
/// to a single blank line.
pub fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0usize;

    for line in raw.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        blank_run = 0;
    }

    out
}

/// Derives a candidate name from an uploaded filename:
/// `reports/Jane_Doe.pdf` becomes `Jane Doe`.
pub fn candidate_name_from_filename(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    let name = stem.replace('_', " ");
    let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        "Unknown Candidate".to_string()
    } else {
        name
    }
}

/// True when the filename carries a `.pdf` extension, ignoring case.
pub fn has_pdf_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}
