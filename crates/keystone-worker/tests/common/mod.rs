//! In-memory fakes for the worker's seams.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use keystone_core::models::{
    AiStatus, ComplianceDocument, DocumentStatus, DocumentType, VerificationOutcome,
    VerificationUpdate,
};
use keystone_core::AppError;
use keystone_db::VerificationStore;
use keystone_infra::VerificationMetrics;
use keystone_processing::{DocumentTextExtractor, ExtractionError};
use keystone_services::{Notifier, ProviderChain};
use keystone_worker::{PipelineSettings, VerificationPipeline};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Semaphore};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    pub documents: Mutex<HashMap<Uuid, ComplianceDocument>>,
    pub badges: Mutex<Vec<(Uuid, DocumentType, bool)>>,
    pub updates: AtomicUsize,
    pub fail_badges: bool,
}

impl MemoryStore {
    pub fn insert(&self, document: ComplianceDocument) {
        self.documents.lock().unwrap().insert(document.id, document);
    }

    pub fn get(&self, id: Uuid) -> ComplianceDocument {
        self.documents.lock().unwrap().get(&id).cloned().unwrap()
    }
}

#[async_trait]
impl VerificationStore for MemoryStore {
    async fn load_document(&self, id: Uuid) -> Result<Option<ComplianceDocument>, AppError> {
        Ok(self.documents.lock().unwrap().get(&id).cloned())
    }

    async fn apply_verification(
        &self,
        id: Uuid,
        update: &VerificationUpdate,
    ) -> Result<(), AppError> {
        let mut documents = self.documents.lock().unwrap();
        let doc = documents
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Compliance document {}", id)))?;

        doc.status = update.status();
        doc.ai_status = update.ai_status();
        doc.ai_confidence = Some(update.ai_confidence());
        doc.ai_reason = Some(update.ai_reason().to_string());
        if !update.keeps_stored_fields() {
            doc.issuer = update.issuer().map(str::to_string);
            doc.policy_number = update.policy_number().map(str::to_string);
            doc.effective_from = update.effective_from();
            doc.effective_to = update.effective_to();
        }
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn find_pending_unverified(&self) -> Result<Vec<ComplianceDocument>, AppError> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .values()
            .filter(|doc| doc.awaits_verification())
            .cloned()
            .collect())
    }

    async fn update_contractor_badge(
        &self,
        user_id: Uuid,
        doc_type: DocumentType,
        verified: bool,
    ) -> Result<(), AppError> {
        if self.fail_badges {
            return Err(AppError::Internal("badge table locked".to_string()));
        }
        self.badges.lock().unwrap().push((user_id, doc_type, verified));
        Ok(())
    }
}

/// Serves canned pages per source URL. Optionally holds every call until
/// permits are added to `gate`, and tracks how many calls overlap.
#[derive(Default)]
pub struct ScriptedExtractor {
    pages: Mutex<HashMap<String, Vec<String>>>,
    pub gate: Option<Arc<Semaphore>>,
    pub running: AtomicUsize,
    pub max_running: AtomicUsize,
}

impl ScriptedExtractor {
    pub fn serve(&self, url: &str, text: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), vec![text.to_string()]);
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Default::default()
        }
    }
}

#[async_trait]
impl DocumentTextExtractor for ScriptedExtractor {
    async fn extract_pages(
        &self,
        source_url: &str,
        _declared_content_type: Option<&str>,
    ) -> Result<Vec<String>, ExtractionError> {
        let now_running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now_running, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        } else {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }

        self.running.fetch_sub(1, Ordering::SeqCst);
        self.pages
            .lock()
            .unwrap()
            .get(source_url)
            .cloned()
            .ok_or(ExtractionError::HttpStatus { status: 404 })
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub emails: Mutex<Vec<(String, String)>>,
    pub in_app: Mutex<Vec<(Uuid, String, JsonValue)>>,
    pub fail: bool,
    /// Hold every email for this long before answering.
    pub delay: Option<std::time::Duration>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_email(&self, to: &str, subject: &str, _text: &str, _html: &str) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(anyhow::anyhow!("smtp unavailable"));
        }
        self.emails
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }

    async fn create_in_app_notification(
        &self,
        user_id: Uuid,
        kind: &str,
        payload: &JsonValue,
    ) -> Result<()> {
        if self.fail {
            return Err(anyhow::anyhow!("notifications table missing"));
        }
        self.in_app
            .lock()
            .unwrap()
            .push((user_id, kind.to_string(), payload.clone()));
        Ok(())
    }
}

pub fn document(doc_type: DocumentType, source_url: &str) -> ComplianceDocument {
    let now = Utc::now();
    ComplianceDocument {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        owner_email: Some("contractor@example.com".to_string()),
        doc_type,
        source_url: source_url.to_string(),
        content_type: Some("application/pdf".to_string()),
        status: DocumentStatus::Pending,
        ai_status: AiStatus::None,
        ai_confidence: None,
        ai_reason: None,
        issuer: None,
        policy_number: None,
        effective_from: None,
        effective_to: None,
        created_at: now,
        updated_at: now,
    }
}

fn us_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

/// Certificate text whose coverage window is around today.
pub fn current_certificate() -> String {
    let today = Utc::now().date_naive();
    certificate(today - Duration::days(7), today + Duration::days(30))
}

pub fn certificate(from: NaiveDate, to: NaiveDate) -> String {
    format!(
        "CERTIFICATE OF LIABILITY INSURANCE\n\
         Policy Number: GL-123456789\n\
         Insurer: Lone Star General Insurance Co.\n\
         Effective Date: {}\n\
         Expiration Date: {}\n\
         Commercial General Liability",
        us_date(from),
        us_date(to)
    )
}

pub fn pipeline(
    store: Arc<MemoryStore>,
    extractor: Arc<ScriptedExtractor>,
    notifier: Arc<RecordingNotifier>,
) -> Arc<VerificationPipeline> {
    pipeline_with(store, extractor, notifier, PipelineSettings::default())
}

pub fn pipeline_with(
    store: Arc<MemoryStore>,
    extractor: Arc<ScriptedExtractor>,
    notifier: Arc<RecordingNotifier>,
    settings: PipelineSettings,
) -> Arc<VerificationPipeline> {
    Arc::new(VerificationPipeline::new(
        store,
        extractor,
        ProviderChain::empty(),
        notifier,
        VerificationMetrics::default(),
        settings,
    ))
}

/// Certificate text with a start date and no expiration.
pub fn open_ended_certificate(from: NaiveDate) -> String {
    format!(
        "CERTIFICATE OF LIABILITY INSURANCE\n\
         Policy Number: GL-123456789\n\
         Insurer: Lone Star General Insurance Co.\n\
         Effective Date: {}\n\
         Commercial General Liability",
        us_date(from)
    )
}

/// Wait until `extractor` has `count` calls running at once.
pub async fn wait_for_running(extractor: &ScriptedExtractor, count: usize) {
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while extractor.running.load(Ordering::SeqCst) < count {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("extractor calls did not start in time");
}

pub async fn next_finished(
    rx: &mut mpsc::Receiver<(Uuid, VerificationOutcome)>,
) -> (Uuid, VerificationOutcome) {
    tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
        .await
        .expect("verification did not finish in time")
        .expect("finished channel closed")
}
