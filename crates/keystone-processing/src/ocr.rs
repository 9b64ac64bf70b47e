use async_trait::async_trait;
use std::io::Write;
use tokio::process::Command;

use crate::error::ExtractionError;

/// Whole-image text recognition.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize the text in an encoded image (PNG, JPEG, TIFF, ...).
    /// The result is whitespace-normalized.
    async fn recognize(&self, image: &[u8]) -> Result<String, ExtractionError>;
}

/// OCR through the `tesseract` command line tool.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: String,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

/// Collapse every run of whitespace into a single space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    #[tracing::instrument(skip(self, image), fields(stage = "ocr", bytes = image.len()))]
    async fn recognize(&self, image: &[u8]) -> Result<String, ExtractionError> {
        let mut temp = tempfile::NamedTempFile::new()?;
        temp.write_all(image)?;
        temp.flush()?;

        let output = Command::new(&self.binary)
            .arg(temp.path())
            .arg("stdout")
            .output()
            .await
            .map_err(|e| ExtractionError::Ocr(format!("Failed to run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(stderr = %stderr.trim(), "tesseract exited with error");
            return Err(ExtractionError::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = normalize_whitespace(&String::from_utf8_lossy(&output.stdout));
        tracing::debug!(chars = text.len(), "OCR completed");
        Ok(text)
    }
}
