//! PDF detection and embedded text layer extraction

use bytes::Bytes;

use crate::error::ExtractionError;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Decide whether a document should take the PDF path.
///
/// The declared content type wins, then the URL suffix (query and fragment
/// ignored), then the file signature.
pub fn is_pdf(content_type: Option<&str>, url: &str, bytes: &[u8]) -> bool {
    if content_type.is_some_and(|ct| ct.to_lowercase().contains("pdf")) {
        return true;
    }

    let path = url.split(['?', '#']).next().unwrap_or(url);
    if path.to_lowercase().ends_with(".pdf") {
        return true;
    }

    bytes.starts_with(PDF_MAGIC)
}

/// Number of alphanumeric characters in `text`.
pub fn meaningful_chars(text: &str) -> usize {
    text.chars().filter(|c| c.is_alphanumeric()).count()
}

/// Extract the text layer of every page, in page order.
///
/// Parsing runs on the blocking pool. A panic inside the parser is reported
/// as `ExtractionError::Pdf`.
#[tracing::instrument(skip(data), fields(stage = "pdf_text", bytes = data.len()))]
pub async fn extract_page_texts(data: Bytes) -> Result<Vec<String>, ExtractionError> {
    let pages = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem_by_pages(&data)
            .map_err(|e| ExtractionError::Pdf(e.to_string()))
    })
    .await
    .map_err(|e| ExtractionError::Pdf(format!("PDF parser task failed: {}", e)))??;

    tracing::debug!(pages = pages.len(), "PDF text layer extracted");
    Ok(pages)
}
