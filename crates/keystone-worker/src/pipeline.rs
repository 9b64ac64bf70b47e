//! One verification attempt, end to end.

use anyhow::Result;
use chrono::Utc;
use keystone_core::models::{
    ComplianceDocument, DocumentStatus, VerificationOutcome, VerificationUpdate,
};
use keystone_core::{AppError, Config, DecisionPolicy, LogLevel};
use keystone_db::VerificationStore;
use keystone_infra::VerificationMetrics;
use keystone_processing::DocumentTextExtractor;
use keystone_services::{
    decide_verification, merge_fields, Notifier, ProviderChain, RegexFieldExtractor,
    VerificationNotice,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Tunables for the verification chain.
#[derive(Clone, Debug)]
pub struct PipelineSettings {
    pub decision: DecisionPolicy,
    pub policy_number_min_len: usize,
    /// Base URL for document links in notifications.
    pub frontend_url: Option<String>,
    /// Upper bound on notification delivery for one attempt.
    pub notify_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            decision: DecisionPolicy::default(),
            policy_number_min_len: 4,
            frontend_url: None,
            notify_timeout: Duration::from_secs(30),
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            decision: config.decision.clone(),
            policy_number_min_len: config.policy_number_min_len,
            frontend_url: config.email.frontend_url.clone(),
            ..Self::default()
        }
    }
}

/// Fetch, extract, merge, decide, persist and notify for a single document.
pub struct VerificationPipeline {
    store: Arc<dyn VerificationStore>,
    extractor: Arc<dyn DocumentTextExtractor>,
    providers: ProviderChain,
    notifier: Arc<dyn Notifier>,
    metrics: VerificationMetrics,
    fields: RegexFieldExtractor,
    settings: PipelineSettings,
}

impl VerificationPipeline {
    pub fn new(
        store: Arc<dyn VerificationStore>,
        extractor: Arc<dyn DocumentTextExtractor>,
        providers: ProviderChain,
        notifier: Arc<dyn Notifier>,
        metrics: VerificationMetrics,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            extractor,
            providers,
            notifier,
            metrics,
            fields: RegexFieldExtractor::new(settings.policy_number_min_len),
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn VerificationStore> {
        &self.store
    }

    /// Run one attempt. Never fails: any error is written back as the
    /// manual-review fallback and reported as `VerificationOutcome::Failed`.
    #[tracing::instrument(skip(self), fields(document.id = %document_id))]
    pub async fn verify(&self, document_id: Uuid) -> VerificationOutcome {
        let started = Instant::now();

        let document = match self.store.load_document(document_id).await {
            Ok(Some(document)) => document,
            Ok(None) => {
                tracing::warn!("Document not found, skipping verification");
                self.metrics
                    .record_attempt("unknown", VerificationOutcome::Failed.as_label(), started.elapsed());
                return VerificationOutcome::Failed;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load document");
                self.write_fallback(document_id, &e.to_string()).await;
                self.metrics
                    .record_attempt("unknown", VerificationOutcome::Failed.as_label(), started.elapsed());
                return VerificationOutcome::Failed;
            }
        };

        let update = match self.attempt(&document).await {
            Ok(update) => update,
            Err(e) => {
                tracing::warn!(
                    document.type = %document.doc_type,
                    error = %e,
                    "Verification attempt failed, falling back to manual review"
                );
                match self.write_fallback(document.id, &e.to_string()).await {
                    Some(update) => {
                        self.clear_badge(&document).await;
                        update
                    }
                    None => {
                        self.metrics.record_attempt(
                            document.doc_type.as_label(),
                            VerificationOutcome::Failed.as_label(),
                            started.elapsed(),
                        );
                        return VerificationOutcome::Failed;
                    }
                }
            }
        };

        let notice =
            VerificationNotice::new(&document, &update, self.settings.frontend_url.as_deref());
        if tokio::time::timeout(
            self.settings.notify_timeout,
            notice.deliver(self.notifier.as_ref()),
        )
        .await
        .is_err()
        {
            tracing::warn!(
                timeout_secs = self.settings.notify_timeout.as_secs_f64(),
                "Notification delivery timed out"
            );
        }

        let outcome = update.outcome();
        let elapsed = started.elapsed();
        self.metrics
            .record_attempt(document.doc_type.as_label(), outcome.as_label(), elapsed);

        tracing::info!(
            document.type = %document.doc_type,
            outcome = %outcome,
            status = %update.status(),
            confidence = update.ai_confidence(),
            duration_ms = elapsed.as_millis() as u64,
            "Verification finished"
        );

        outcome
    }

    async fn attempt(&self, document: &ComplianceDocument) -> Result<VerificationUpdate> {
        let pages = self
            .extractor
            .extract_pages(&document.source_url, document.content_type.as_deref())
            .await?;
        let text = pages.join("\n");

        let regex_fields = self.fields.extract(document.doc_type, &text);
        let model_fields = self.providers.extract(&text).await;
        let fields = merge_fields(
            &regex_fields,
            model_fields.as_ref(),
            self.settings.policy_number_min_len,
        );

        let decision =
            decide_verification(document.doc_type, &fields, Utc::now(), &self.settings.decision);
        let update = VerificationUpdate::from_decision(&decision);

        self.store.apply_verification(document.id, &update).await?;
        self.store
            .update_contractor_badge(
                document.user_id,
                document.doc_type,
                update.status() == DocumentStatus::Approved,
            )
            .await?;

        Ok(update)
    }

    /// Clear the contractor badge once a fallback is written. Failures are
    /// only logged.
    async fn clear_badge(&self, document: &ComplianceDocument) {
        if let Err(e) = self
            .store
            .update_contractor_badge(document.user_id, document.doc_type, false)
            .await
        {
            log_store_error(document.id, &e, "Failed to clear contractor badge after fallback");
        }
    }

    /// Returns the written update, or `None` when the write failed too and
    /// the document keeps its previous state.
    async fn write_fallback(&self, document_id: Uuid, message: &str) -> Option<VerificationUpdate> {
        let update = VerificationUpdate::failed(message);
        match self.store.apply_verification(document_id, &update).await {
            Ok(()) => Some(update),
            Err(e) => {
                log_store_error(
                    document_id,
                    &e,
                    "Failed to write fallback verification; document keeps its previous state",
                );
                None
            }
        }
    }
}

fn log_store_error(document_id: Uuid, error: &AppError, message: &str) {
    match error.log_level() {
        LogLevel::Warn => tracing::warn!(
            document.id = %document_id,
            error = %error,
            error_code = error.error_code(),
            recoverable = error.is_recoverable(),
            "{}",
            message
        ),
        LogLevel::Error => tracing::error!(
            document.id = %document_id,
            error = %error,
            error_code = error.error_code(),
            recoverable = error.is_recoverable(),
            "{}",
            message
        ),
    }
}
