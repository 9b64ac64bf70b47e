use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use super::document::{AiStatus, DocumentStatus};
use super::fields::ExtractedFields;

/// Confidence recorded when an attempt fails before a decision could be made.
pub const FAILURE_CONFIDENCE: f64 = 0.3;

/// Prefix of the reason written when an attempt fails.
pub const FAILURE_REASON_PREFIX: &str = "Automated verification failed";

/// Result of scoring one set of extracted fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationDecision {
    pub ai_status: AiStatus,
    pub status: DocumentStatus,
    pub confidence: f64,
    pub reason: String,
    pub fields: ExtractedFields,
}

/// The single write applied to a document at the end of an attempt.
///
/// Fields are private: an update can only be built from a decision or from a
/// failure, so the status is always written together with its rationale.
/// A decision replaces the stored issuer, number and dates with what the
/// attempt extracted; a failure leaves them untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationUpdate {
    status: DocumentStatus,
    ai_status: AiStatus,
    ai_confidence: f64,
    ai_reason: String,
    issuer: Option<String>,
    policy_number: Option<String>,
    effective_from: Option<NaiveDate>,
    effective_to: Option<NaiveDate>,
    keep_stored_fields: bool,
}

impl VerificationUpdate {
    pub fn from_decision(decision: &VerificationDecision) -> Self {
        Self {
            status: decision.status,
            ai_status: decision.ai_status,
            ai_confidence: decision.confidence,
            ai_reason: decision.reason.clone(),
            issuer: decision.fields.issuer.clone(),
            policy_number: decision.fields.policy_number.clone(),
            effective_from: decision.fields.effective_from,
            effective_to: decision.fields.effective_to,
            keep_stored_fields: false,
        }
    }

    /// Fallback written when any stage of an attempt fails.
    pub fn failed(message: impl Display) -> Self {
        Self {
            status: DocumentStatus::NeedsReview,
            ai_status: AiStatus::NeedsReview,
            ai_confidence: FAILURE_CONFIDENCE,
            ai_reason: format!("{}: {}", FAILURE_REASON_PREFIX, message),
            issuer: None,
            policy_number: None,
            effective_from: None,
            effective_to: None,
            keep_stored_fields: true,
        }
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    pub fn ai_status(&self) -> AiStatus {
        self.ai_status
    }

    pub fn ai_confidence(&self) -> f64 {
        self.ai_confidence
    }

    pub fn ai_reason(&self) -> &str {
        &self.ai_reason
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    pub fn policy_number(&self) -> Option<&str> {
        self.policy_number.as_deref()
    }

    pub fn effective_from(&self) -> Option<NaiveDate> {
        self.effective_from
    }

    pub fn effective_to(&self) -> Option<NaiveDate> {
        self.effective_to
    }

    /// Whether the stored extracted fields survive this write.
    pub fn keeps_stored_fields(&self) -> bool {
        self.keep_stored_fields
    }

    pub fn outcome(&self) -> VerificationOutcome {
        if self.ai_reason.starts_with(FAILURE_REASON_PREFIX) {
            return VerificationOutcome::Failed;
        }
        match self.status {
            DocumentStatus::Approved => VerificationOutcome::Approved,
            DocumentStatus::Rejected | DocumentStatus::Expired => VerificationOutcome::Rejected,
            DocumentStatus::NeedsReview | DocumentStatus::Pending => VerificationOutcome::NeedsReview,
        }
    }
}

/// How an attempt ended, used for metrics and completion notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    Approved,
    NeedsReview,
    Rejected,
    Failed,
}

impl VerificationOutcome {
    pub fn as_label(&self) -> &'static str {
        match self {
            VerificationOutcome::Approved => "approved",
            VerificationOutcome::NeedsReview => "needs_review",
            VerificationOutcome::Rejected => "rejected",
            VerificationOutcome::Failed => "failed",
        }
    }
}

impl Display for VerificationOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_label())
    }
}
