use anyhow::{Context, Result};
use async_trait::async_trait;
use keystone_core::models::ModelFields;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::prompt::{build_prompt, parse_model_reply, SYSTEM_PROMPT};
use super::FieldExtractionProvider;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    system: &'a str,
    stream: bool,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Local model served by Ollama.
pub struct OllamaProvider {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for Ollama")?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl FieldExtractionProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    #[tracing::instrument(skip(self, text), fields(provider = "ollama", model = %self.model))]
    async fn extract(&self, text: &str) -> Result<Option<ModelFields>> {
        let body = GenerateRequest {
            model: &self.model,
            prompt: build_prompt(text),
            system: SYSTEM_PROMPT,
            stream: false,
            format: "json",
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "Ollama request failed: {} - {}",
                status,
                error_text
            ));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(parse_model_reply(&parsed.response))
    }
}
