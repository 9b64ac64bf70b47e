use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    License,
    Insurance,
    Cert,
    Other,
}

impl DocumentType {
    /// Lowercase label used in metrics attributes and notification copy.
    pub fn as_label(&self) -> &'static str {
        match self {
            DocumentType::License => "license",
            DocumentType::Insurance => "insurance",
            DocumentType::Cert => "cert",
            DocumentType::Other => "other",
        }
    }
}

impl Display for DocumentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DocumentType::License => write!(f, "LICENSE"),
            DocumentType::Insurance => write!(f, "INSURANCE"),
            DocumentType::Cert => write!(f, "CERT"),
            DocumentType::Other => write!(f, "OTHER"),
        }
    }
}

impl FromStr for DocumentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LICENSE" => Ok(DocumentType::License),
            "INSURANCE" => Ok(DocumentType::Insurance),
            "CERT" => Ok(DocumentType::Cert),
            "OTHER" => Ok(DocumentType::Other),
            _ => Err(anyhow::anyhow!("Invalid document type: {}", s)),
        }
    }
}

/// Verification status shown to users and used by the marketplace.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Pending,
    Approved,
    NeedsReview,
    Rejected,
    Expired,
}

impl Display for DocumentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DocumentStatus::Pending => write!(f, "PENDING"),
            DocumentStatus::Approved => write!(f, "APPROVED"),
            DocumentStatus::NeedsReview => write!(f, "NEEDS_REVIEW"),
            DocumentStatus::Rejected => write!(f, "REJECTED"),
            DocumentStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

impl FromStr for DocumentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(DocumentStatus::Pending),
            "APPROVED" => Ok(DocumentStatus::Approved),
            "NEEDS_REVIEW" => Ok(DocumentStatus::NeedsReview),
            "REJECTED" => Ok(DocumentStatus::Rejected),
            "EXPIRED" => Ok(DocumentStatus::Expired),
            _ => Err(anyhow::anyhow!("Invalid document status: {}", s)),
        }
    }
}

/// Outcome of the automated verifier, kept separately from the user-facing status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AiStatus {
    None,
    Approved,
    NeedsReview,
    Rejected,
}

impl Display for AiStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AiStatus::None => write!(f, "NONE"),
            AiStatus::Approved => write!(f, "APPROVED"),
            AiStatus::NeedsReview => write!(f, "NEEDS_REVIEW"),
            AiStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

impl FromStr for AiStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(AiStatus::None),
            "APPROVED" => Ok(AiStatus::Approved),
            "NEEDS_REVIEW" => Ok(AiStatus::NeedsReview),
            "REJECTED" => Ok(AiStatus::Rejected),
            _ => Err(anyhow::anyhow!("Invalid AI status: {}", s)),
        }
    }
}

/// A compliance document uploaded by a contractor, with its verification state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceDocument {
    pub id: Uuid,
    pub user_id: Uuid,
    pub owner_email: Option<String>,
    pub doc_type: DocumentType,
    pub source_url: String,
    pub content_type: Option<String>,
    pub status: DocumentStatus,
    pub ai_status: AiStatus,
    pub ai_confidence: Option<f64>,
    pub ai_reason: Option<String>,
    pub issuer: Option<String>,
    pub policy_number: Option<String>,
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ComplianceDocument {
    /// Whether the startup sweep should pick this document up again.
    pub fn awaits_verification(&self) -> bool {
        self.status == DocumentStatus::Pending
            && matches!(self.ai_status, AiStatus::None | AiStatus::NeedsReview)
    }
}
