//! Keystone document processing
//!
//! Turns a stored compliance document into per-page text: HTTP fetch, PDF
//! text layer, page rasterization and OCR.

pub mod driver;
pub mod error;
pub mod fetch;
pub mod ocr;
pub mod pdf;
pub mod raster;

pub use driver::{DocumentTextExtractor, TextExtractionDriver};
pub use error::ExtractionError;
pub use fetch::{DocumentSource, FetchedDocument, HttpDocumentSource};
pub use ocr::{OcrEngine, TesseractOcr};
pub use raster::{PageRasterizer, PdftoppmRasterizer};
