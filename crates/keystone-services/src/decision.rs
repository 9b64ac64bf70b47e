//! Decision engine
//!
//! Scores merged fields and turns them into a verification decision. Pure:
//! the clock is passed in so the same inputs always give the same result.

use chrono::{DateTime, NaiveDate, Utc};
use keystone_core::models::{AiStatus, DocumentStatus, DocumentType, ExtractedFields, VerificationDecision};
use keystone_core::DecisionPolicy;

const EXPIRED_REASON: &str = "auto-rejected, coverage appears expired";
const APPROVED_REASON: &str = "auto-approved";
const REVIEW_REASON: &str = "needs manual review";
const NO_SIGNALS_REASON: &str = "no verifiable fields found";

fn covers_liability(fields: &ExtractedFields) -> bool {
    fields.coverage.iter().any(|label| {
        let lower = label.to_lowercase();
        lower.contains("liability") || lower.contains("workers comp")
    })
}

/// Within the coverage window: started on or before today and not yet ended.
/// A document that expires today is still in force.
fn within_window(fields: &ExtractedFields, today: NaiveDate) -> bool {
    let started = fields.effective_from.is_some_and(|from| from <= today);
    let not_ended = fields.effective_to.map_or(true, |to| to >= today);
    started && not_ended
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[tracing::instrument(skip(fields, policy), fields(stage = "decide", document.type = %doc_type))]
pub fn decide_verification(
    doc_type: DocumentType,
    fields: &ExtractedFields,
    now: DateTime<Utc>,
    policy: &DecisionPolicy,
) -> VerificationDecision {
    let today = now.date_naive();
    let mut confidence = policy.base_confidence;
    let mut reasons: Vec<&str> = Vec::new();

    if fields.policy_number.is_some() {
        confidence += policy.policy_number_weight;
        reasons.push(match doc_type {
            DocumentType::License => "license number found",
            _ => "policy number found",
        });
    }
    if fields.issuer.is_some() {
        confidence += policy.issuer_weight;
        reasons.push("issuer found");
    }
    if fields.has_both_dates() {
        confidence += policy.dates_weight;
        reasons.push("effective dates found");
    }
    let in_window = within_window(fields, today);
    if in_window {
        confidence += policy.window_weight;
        reasons.push("currently within coverage window");
    }
    if covers_liability(fields) {
        confidence += policy.coverage_weight;
        reasons.push("liability coverage listed");
    }
    if reasons.is_empty() {
        reasons.push(NO_SIGNALS_REASON);
    }

    confidence = confidence.min(policy.max_confidence);

    let expired = fields.effective_to.is_some_and(|to| to < today);
    let (ai_status, status) = if expired {
        reasons.push(EXPIRED_REASON);
        (AiStatus::Rejected, DocumentStatus::Rejected)
    } else if fields.policy_number.is_some() && fields.issuer.is_some() && in_window {
        confidence = confidence.max(policy.approve_floor);
        reasons.push(APPROVED_REASON);
        let status = if confidence >= policy.approve_threshold {
            DocumentStatus::Approved
        } else {
            DocumentStatus::NeedsReview
        };
        (AiStatus::Approved, status)
    } else {
        reasons.push(REVIEW_REASON);
        (AiStatus::NeedsReview, DocumentStatus::NeedsReview)
    };

    let decision = VerificationDecision {
        ai_status,
        status,
        confidence: round2(confidence),
        reason: reasons.join("; "),
        fields: fields.clone(),
    };

    tracing::debug!(
        ai_status = %decision.ai_status,
        status = %decision.status,
        confidence = decision.confidence,
        "Verification decided"
    );

    decision
}
