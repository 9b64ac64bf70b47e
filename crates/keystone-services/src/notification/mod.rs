//! Owner notifications
//!
//! Every verification attempt tells the document owner what happened, by
//! email and as an in-app notification. Both are best-effort side effects:
//! failures are logged and never retried.

mod email;

use anyhow::Result;
use async_trait::async_trait;
use keystone_core::models::{ComplianceDocument, DocumentStatus, DocumentType, VerificationUpdate};
use keystone_db::NotificationRepository;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

pub use email::EmailService;

/// Notification kind stored for in-app rows.
pub const VERIFICATION_NOTIFICATION_KIND: &str = "DOCUMENT_VERIFICATION";

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, text: &str, html: &str) -> Result<()>;

    async fn create_in_app_notification(
        &self,
        user_id: Uuid,
        kind: &str,
        payload: &JsonValue,
    ) -> Result<()>;
}

/// Notifier that delivers over whichever channels are configured.
#[derive(Clone, Default)]
pub struct ChannelNotifier {
    email: Option<EmailService>,
    in_app: Option<NotificationRepository>,
}

impl ChannelNotifier {
    pub fn new(email: Option<EmailService>, in_app: Option<NotificationRepository>) -> Self {
        Self { email, in_app }
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn send_email(&self, to: &str, subject: &str, text: &str, html: &str) -> Result<()> {
        match &self.email {
            Some(email) => email.send(to, subject, text, html).await,
            None => {
                tracing::debug!("Email not configured, skipping");
                Ok(())
            }
        }
    }

    async fn create_in_app_notification(
        &self,
        user_id: Uuid,
        kind: &str,
        payload: &JsonValue,
    ) -> Result<()> {
        if let Some(repo) = &self.in_app {
            repo.create_notification(user_id, kind, payload).await?;
        }
        Ok(())
    }
}

fn document_label(doc_type: DocumentType) -> &'static str {
    match doc_type {
        DocumentType::License => "license",
        DocumentType::Insurance => "insurance certificate",
        DocumentType::Cert => "certification",
        DocumentType::Other => "document",
    }
}

fn status_phrase(status: DocumentStatus) -> &'static str {
    match status {
        DocumentStatus::Approved => "has been verified",
        DocumentStatus::Rejected => "could not be accepted",
        DocumentStatus::Expired => "has expired",
        DocumentStatus::NeedsReview | DocumentStatus::Pending => "needs a manual review",
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Message sent to a document owner after an attempt.
#[derive(Debug, Clone)]
pub struct VerificationNotice {
    pub document_id: Uuid,
    pub user_id: Uuid,
    pub owner_email: Option<String>,
    pub doc_type: DocumentType,
    pub status: DocumentStatus,
    pub confidence: f64,
    pub reason: String,
    pub document_url: Option<String>,
}

impl VerificationNotice {
    pub fn new(
        document: &ComplianceDocument,
        update: &VerificationUpdate,
        frontend_url: Option<&str>,
    ) -> Self {
        Self {
            document_id: document.id,
            user_id: document.user_id,
            owner_email: document.owner_email.clone(),
            doc_type: document.doc_type,
            status: update.status(),
            confidence: update.ai_confidence(),
            reason: update.ai_reason().to_string(),
            document_url: frontend_url.map(|base| {
                format!(
                    "{}/settings/compliance/{}",
                    base.trim_end_matches('/'),
                    document.id
                )
            }),
        }
    }

    pub fn subject(&self) -> String {
        format!(
            "Your {} {}",
            document_label(self.doc_type),
            status_phrase(self.status)
        )
    }

    pub fn text_body(&self) -> String {
        let mut body = format!(
            "Your {} {}.\n\nStatus: {}\nConfidence: {:.0}%\nDetails: {}\n",
            document_label(self.doc_type),
            status_phrase(self.status),
            self.status,
            self.confidence * 100.0,
            self.reason
        );
        if let Some(url) = &self.document_url {
            body.push_str(&format!("\nView the document: {}\n", url));
        }
        body
    }

    pub fn html_body(&self) -> String {
        let link = self
            .document_url
            .as_deref()
            .map(|url| format!("<p><a href=\"{0}\">View the document</a></p>", escape_html(url)))
            .unwrap_or_default();
        format!(
            "<p>Your {} {}.</p><ul><li>Status: {}</li><li>Confidence: {:.0}%</li><li>Details: {}</li></ul>{}",
            document_label(self.doc_type),
            status_phrase(self.status),
            self.status,
            self.confidence * 100.0,
            escape_html(&self.reason),
            link
        )
    }

    pub fn payload(&self) -> JsonValue {
        json!({
            "documentId": self.document_id,
            "documentType": self.doc_type,
            "status": self.status,
            "confidence": self.confidence,
            "reason": self.reason,
        })
    }

    /// Send over every channel. Failures are logged and swallowed.
    pub async fn deliver(&self, notifier: &dyn Notifier) {
        match self.owner_email.as_deref() {
            Some(to) => {
                if let Err(e) = notifier
                    .send_email(to, &self.subject(), &self.text_body(), &self.html_body())
                    .await
                {
                    tracing::warn!(
                        document.id = %self.document_id,
                        error = %e,
                        "Failed to send verification email"
                    );
                }
            }
            None => {
                tracing::debug!(document.id = %self.document_id, "Owner has no email address");
            }
        }

        if let Err(e) = notifier
            .create_in_app_notification(self.user_id, VERIFICATION_NOTIFICATION_KIND, &self.payload())
            .await
        {
            tracing::warn!(
                document.id = %self.document_id,
                error = %e,
                "Failed to create in-app notification"
            );
        }
    }
}
