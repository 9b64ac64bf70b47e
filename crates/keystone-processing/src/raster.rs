use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::error::ExtractionError;

/// Renders a single PDF page to an image for OCR.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    /// Render `page` (1-based) of the PDF at `pdf_path` and return PNG bytes.
    async fn rasterize_page(&self, pdf_path: &Path, page: u32) -> Result<Vec<u8>, ExtractionError>;
}

/// Rasterizer backed by poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    binary: PathBuf,
    dpi: u32,
}

impl PdftoppmRasterizer {
    pub fn new(binary: impl Into<PathBuf>, dpi: u32) -> Self {
        Self {
            binary: binary.into(),
            dpi,
        }
    }

    /// Locate `pdftoppm`, preferring an explicitly configured path.
    /// Returns `None` when the tool is not installed.
    pub fn detect(explicit: Option<&str>, dpi: u32) -> Option<Self> {
        let binary = match explicit {
            Some(path) => which::which(path).ok(),
            None => which::which("pdftoppm").ok(),
        };
        match binary {
            Some(binary) => {
                tracing::info!(binary = %binary.display(), dpi, "Page rasterizer available");
                Some(Self::new(binary, dpi))
            }
            None => {
                tracing::warn!("pdftoppm not found, sparse PDF pages will not be OCR'd");
                None
            }
        }
    }
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    #[tracing::instrument(skip(self, pdf_path), fields(stage = "rasterize"))]
    async fn rasterize_page(&self, pdf_path: &Path, page: u32) -> Result<Vec<u8>, ExtractionError> {
        let out_dir = tempfile::tempdir()?;
        let prefix = out_dir.path().join(format!("page-{}", page));

        let output = Command::new(&self.binary)
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-f")
            .arg(page.to_string())
            .arg("-l")
            .arg(page.to_string())
            .arg("-png")
            .arg("-singlefile")
            .arg(pdf_path)
            .arg(&prefix)
            .output()
            .await
            .map_err(|e| ExtractionError::Raster {
                page,
                message: format!("Failed to run pdftoppm: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::Raster {
                page,
                message: stderr.trim().to_string(),
            });
        }

        let image = tokio::fs::read(prefix.with_extension("png"))
            .await
            .map_err(|e| ExtractionError::Raster {
                page,
                message: format!("Rendered image missing: {}", e),
            })?;

        if image.is_empty() {
            return Err(ExtractionError::Raster {
                page,
                message: "Rendered image is empty".to_string(),
            });
        }

        Ok(image)
    }
}
