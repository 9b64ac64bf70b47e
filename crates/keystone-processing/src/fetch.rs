use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

use crate::error::ExtractionError;

/// Raw document bytes with the content type reported by the server.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// Where document bytes come from (CDN, object storage, ...)
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, ExtractionError>;
}

/// Fetches documents over HTTP with a bounded timeout.
#[derive(Clone)]
pub struct HttpDocumentSource {
    client: reqwest::Client,
}

impl HttpDocumentSource {
    pub fn new(timeout: Duration) -> Result<Self, ExtractionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractionError::Fetch(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    #[tracing::instrument(skip(self), fields(stage = "fetch"))]
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, ExtractionError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ExtractionError::Fetch(e.to_string()))?;

        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            tracing::warn!(status = status.as_u16(), "Document fetch returned error status");
            return Err(ExtractionError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_lowercase());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExtractionError::Fetch(format!("Failed to read body: {}", e)))?;

        tracing::debug!(
            bytes = bytes.len(),
            content_type = ?content_type,
            "Document fetched"
        );

        Ok(FetchedDocument {
            bytes,
            content_type,
        })
    }
}
