//! Text extraction from uploaded résumé documents.
//!
//! Bit-level text extraction only: no OCR and no layout reconstruction, so
//! scanned or image-only PDFs yield little or no text.

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum DocumentFormatError {
    #[error("Uploaded file is not a PDF document")]
    NotPdf,

    #[error("Could not read PDF: {0}")]
    Unreadable(String),
}

/// Extracts the text of every page of a PDF, in page order.
///
/// Pages without extractable text contribute nothing. Parsing runs on the
/// blocking pool; a parser panic is reported as an unreadable document.
pub async fn extract_pdf_text(bytes: Bytes) -> Result<String, DocumentFormatError> {
    if !looks_like_pdf(&bytes) {
        return Err(DocumentFormatError::NotPdf);
    }

    let size = bytes.len();
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| DocumentFormatError::Unreadable(format!("parser aborted: {e}")))?
        .map_err(|e| DocumentFormatError::Unreadable(e.to_string()))?;

    debug!("Extracted {} chars from {} byte PDF", text.len(), size);
    Ok(text)
}

fn looks_like_pdf(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    bytes[start..].starts_with(PDF_MAGIC)
}
