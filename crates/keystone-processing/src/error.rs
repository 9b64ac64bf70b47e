use thiserror::Error;

/// Failure while turning a stored document into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Failed to fetch document: {0}")]
    Fetch(String),

    #[error("Document fetch returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Failed to read PDF: {0}")]
    Pdf(String),

    #[error("Failed to rasterize page {page}: {message}")]
    Raster { page: u32, message: String },

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("No text could be extracted from the document")]
    NoText,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
