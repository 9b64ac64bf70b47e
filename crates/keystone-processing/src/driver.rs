use async_trait::async_trait;
use bytes::Bytes;
use std::io::Write;
use std::sync::Arc;

use crate::error::ExtractionError;
use crate::fetch::DocumentSource;
use crate::ocr::OcrEngine;
use crate::pdf::{extract_page_texts, is_pdf, meaningful_chars};
use crate::raster::PageRasterizer;

/// Turns a stored document into ordered per-page text.
#[async_trait]
pub trait DocumentTextExtractor: Send + Sync {
    async fn extract_pages(
        &self,
        source_url: &str,
        declared_content_type: Option<&str>,
    ) -> Result<Vec<String>, ExtractionError>;
}

/// Fetches a document and dispatches it to the PDF or OCR path.
///
/// PDF pages whose text layer has fewer than `min_page_chars` alphanumeric
/// characters are rasterized and OCR'd when a rasterizer is available. A page
/// whose rasterization or OCR fails keeps its text layer.
pub struct TextExtractionDriver {
    source: Arc<dyn DocumentSource>,
    ocr: Arc<dyn OcrEngine>,
    rasterizer: Option<Arc<dyn PageRasterizer>>,
    min_page_chars: usize,
}

impl TextExtractionDriver {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        ocr: Arc<dyn OcrEngine>,
        rasterizer: Option<Arc<dyn PageRasterizer>>,
        min_page_chars: usize,
    ) -> Self {
        Self {
            source,
            ocr,
            rasterizer,
            min_page_chars,
        }
    }

    async fn extract_pdf(&self, data: Bytes) -> Result<Vec<String>, ExtractionError> {
        let pages = extract_page_texts(data.clone()).await?;
        Ok(self.ocr_sparse_pages(&data, pages).await)
    }

    async fn ocr_sparse_pages(&self, pdf: &[u8], mut pages: Vec<String>) -> Vec<String> {
        let sparse: Vec<usize> = pages
            .iter()
            .enumerate()
            .filter(|(_, text)| meaningful_chars(text) < self.min_page_chars)
            .map(|(idx, _)| idx)
            .collect();

        if sparse.is_empty() {
            return pages;
        }

        let Some(rasterizer) = self.rasterizer.as_ref() else {
            tracing::debug!(
                sparse_pages = sparse.len(),
                "No rasterizer available, keeping sparse text layer"
            );
            return pages;
        };

        let temp = match write_temp_pdf(pdf) {
            Ok(temp) => temp,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to stage PDF for rasterization");
                return pages;
            }
        };

        for idx in sparse {
            let page_number = (idx + 1) as u32;
            let image = match rasterizer.rasterize_page(temp.path(), page_number).await {
                Ok(image) => image,
                Err(e) => {
                    tracing::warn!(page = page_number, error = %e, "Page rasterization failed");
                    continue;
                }
            };

            match self.ocr.recognize(&image).await {
                Ok(text) if !text.trim().is_empty() => pages[idx] = text,
                Ok(_) => {
                    tracing::debug!(page = page_number, "OCR found no text on page");
                }
                Err(e) => {
                    tracing::warn!(page = page_number, error = %e, "Page OCR failed");
                }
            }
        }

        pages
    }
}

fn write_temp_pdf(pdf: &[u8]) -> std::io::Result<tempfile::NamedTempFile> {
    let mut temp = tempfile::Builder::new().suffix(".pdf").tempfile()?;
    temp.write_all(pdf)?;
    temp.flush()?;
    Ok(temp)
}

#[async_trait]
impl DocumentTextExtractor for TextExtractionDriver {
    #[tracing::instrument(skip(self), fields(stage = "extract"))]
    async fn extract_pages(
        &self,
        source_url: &str,
        declared_content_type: Option<&str>,
    ) -> Result<Vec<String>, ExtractionError> {
        let fetched = self.source.fetch(source_url).await?;
        let content_type = fetched.content_type.as_deref().or(declared_content_type);

        let pages = if is_pdf(content_type, source_url, &fetched.bytes) {
            self.extract_pdf(fetched.bytes).await?
        } else {
            vec![self.ocr.recognize(&fetched.bytes).await?]
        };

        let total: usize = pages.iter().map(|p| meaningful_chars(p)).sum();
        if total == 0 {
            return Err(ExtractionError::NoText);
        }

        tracing::debug!(pages = pages.len(), chars = total, "Text extraction completed");
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchedDocument;
    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::Mutex;

    struct StaticSource {
        result: Mutex<Option<Result<FetchedDocument, ExtractionError>>>,
    }

    impl StaticSource {
        fn ok(bytes: &'static [u8], content_type: Option<&str>) -> Self {
            Self {
                result: Mutex::new(Some(Ok(FetchedDocument {
                    bytes: Bytes::from_static(bytes),
                    content_type: content_type.map(str::to_string),
                }))),
            }
        }

        fn owned(bytes: Vec<u8>, content_type: Option<&str>) -> Self {
            Self {
                result: Mutex::new(Some(Ok(FetchedDocument {
                    bytes: Bytes::from(bytes),
                    content_type: content_type.map(str::to_string),
                }))),
            }
        }

        fn err(err: ExtractionError) -> Self {
            Self {
                result: Mutex::new(Some(Err(err))),
            }
        }
    }

    #[async_trait]
    impl DocumentSource for StaticSource {
        async fn fetch(&self, _url: &str) -> Result<FetchedDocument, ExtractionError> {
            self.result
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(ExtractionError::Fetch("already fetched".to_string())))
        }
    }

    /// Reports the image bytes back as recognized text, or fails.
    struct EchoOcr {
        fail: bool,
    }

    #[async_trait]
    impl OcrEngine for EchoOcr {
        async fn recognize(&self, image: &[u8]) -> Result<String, ExtractionError> {
            if self.fail {
                return Err(ExtractionError::Ocr("engine crashed".to_string()));
            }
            Ok(String::from_utf8_lossy(image).to_string())
        }
    }

    struct FakeRasterizer {
        failing_pages: HashSet<u32>,
    }

    #[async_trait]
    impl PageRasterizer for FakeRasterizer {
        async fn rasterize_page(&self, pdf_path: &Path, page: u32) -> Result<Vec<u8>, ExtractionError> {
            assert!(pdf_path.exists());
            if self.failing_pages.contains(&page) {
                return Err(ExtractionError::Raster {
                    page,
                    message: "render failed".to_string(),
                });
            }
            Ok(format!("Rendered text of scanned page number {}", page).into_bytes())
        }
    }

    fn driver(
        source: StaticSource,
        ocr_fails: bool,
        rasterizer: Option<FakeRasterizer>,
    ) -> TextExtractionDriver {
        TextExtractionDriver::new(
            Arc::new(source),
            Arc::new(EchoOcr { fail: ocr_fails }),
            rasterizer.map(|r| Arc::new(r) as Arc<dyn PageRasterizer>),
            20,
        )
    }

    fn layer() -> Vec<String> {
        vec![
            "CERTIFICATE OF LIABILITY INSURANCE issued by Acme Mutual".to_string(),
            String::new(),
            "p. 3".to_string(),
        ]
    }

    #[tokio::test]
    async fn test_sparse_pages_are_ocrd_in_order() {
        let d = driver(
            StaticSource::ok(b"", None),
            false,
            Some(FakeRasterizer {
                failing_pages: HashSet::new(),
            }),
        );
        let pages = d.ocr_sparse_pages(b"%PDF-1.4", layer()).await;

        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0], layer()[0]);
        assert_eq!(pages[1], "Rendered text of scanned page number 2");
        assert_eq!(pages[2], "Rendered text of scanned page number 3");
    }

    #[tokio::test]
    async fn test_failed_rasterization_keeps_text_layer() {
        let d = driver(
            StaticSource::ok(b"", None),
            false,
            Some(FakeRasterizer {
                failing_pages: HashSet::from([3]),
            }),
        );
        let pages = d.ocr_sparse_pages(b"%PDF-1.4", layer()).await;

        assert_eq!(pages[1], "Rendered text of scanned page number 2");
        assert_eq!(pages[2], "p. 3");
    }

    #[tokio::test]
    async fn test_failed_ocr_keeps_text_layer() {
        let d = driver(
            StaticSource::ok(b"", None),
            true,
            Some(FakeRasterizer {
                failing_pages: HashSet::new(),
            }),
        );
        assert_eq!(d.ocr_sparse_pages(b"%PDF-1.4", layer()).await, layer());
    }

    #[tokio::test]
    async fn test_without_rasterizer_pages_are_unchanged() {
        let d = driver(StaticSource::ok(b"", None), false, None);
        assert_eq!(d.ocr_sparse_pages(b"%PDF-1.4", layer()).await, layer());
    }

    #[tokio::test]
    async fn test_image_goes_through_ocr() {
        let d = driver(
            StaticSource::ok(b"State Contractor License 12345", Some("image/png")),
            false,
            None,
        );
        let pages = d
            .extract_pages("https://cdn.example.com/license.png", None)
            .await
            .unwrap();
        assert_eq!(pages, vec!["State Contractor License 12345".to_string()]);
    }

    #[tokio::test]
    async fn test_blank_image_is_no_text() {
        let d = driver(StaticSource::ok(b"  ..  ", Some("image/jpeg")), false, None);
        let err = d
            .extract_pages("https://cdn.example.com/blank.jpg", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NoText));
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let d = driver(
            StaticSource::err(ExtractionError::HttpStatus { status: 503 }),
            false,
            None,
        );
        let err = d
            .extract_pages("https://cdn.example.com/coi.pdf", Some("application/pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::HttpStatus { status: 503 }));
    }

    #[tokio::test]
    async fn test_unreadable_pdf_is_pdf_error() {
        let d = driver(
            StaticSource::ok(b"%PDF-1.4 truncated", Some("application/pdf")),
            false,
            None,
        );
        let err = d
            .extract_pages("https://cdn.example.com/coi.pdf", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Pdf(_)));
    }

    /// Minimal single-page PDF with `text` in a Helvetica text layer.
    fn one_page_pdf(text: &str) -> Vec<u8> {
        let content = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text);
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
                .to_string(),
            format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                content.len(),
                content
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref = pdf.len();
        let mut tail = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            tail.push_str(&format!("{:010} 00000 n \n", offset));
        }
        tail.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        ));
        pdf.extend_from_slice(tail.as_bytes());
        pdf
    }

    #[tokio::test]
    async fn test_pdf_text_layer_is_extracted() {
        let pdf = one_page_pdf("Policy Number: GL-123456789");
        let d = driver(StaticSource::owned(pdf, None), false, None);

        let pages = d
            .extract_pages("https://cdn.example.com/coi.pdf", None)
            .await
            .unwrap();

        assert_eq!(pages.len(), 1);
        assert!(pages[0].contains("GL-123456789"));
    }
}
