//! Language-model field extraction
//!
//! Providers are tried in order until one returns fields. A provider that
//! errors or returns nothing is logged and skipped; the chain itself never
//! fails, so the caller always falls back to the regex output.

mod ollama;
mod openai;
mod prompt;

use anyhow::Result;
use async_trait::async_trait;
use keystone_core::models::ModelFields;
use std::sync::Arc;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use prompt::{build_prompt, parse_model_reply, SYSTEM_PROMPT};

/// A source of structured fields read from document text by a language model.
#[async_trait]
pub trait FieldExtractionProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// `Ok(None)` when the model answered but nothing usable could be parsed.
    async fn extract(&self, text: &str) -> Result<Option<ModelFields>>;
}

/// Ordered list of providers with a shared input limit.
pub struct ProviderChain {
    providers: Vec<Arc<dyn FieldExtractionProvider>>,
    max_chars: usize,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn FieldExtractionProvider>>, max_chars: usize) -> Self {
        Self {
            providers,
            max_chars,
        }
    }

    /// Chain without providers; every call returns `None`.
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[tracing::instrument(skip(self, text), fields(stage = "llm", chars = text.len()))]
    pub async fn extract(&self, text: &str) -> Option<ModelFields> {
        if self.providers.is_empty() {
            return None;
        }

        let input = truncate_chars(text, self.max_chars);
        for provider in &self.providers {
            match provider.extract(input).await {
                Ok(Some(fields)) => {
                    tracing::debug!(provider = provider.name(), "Model fields extracted");
                    return Some(fields);
                }
                Ok(None) => {
                    tracing::info!(provider = provider.name(), "Model reply had no usable fields");
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "Model provider failed");
                }
            }
        }

        None
    }
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
