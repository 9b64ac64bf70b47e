use async_trait::async_trait;
use keystone_core::models::{ComplianceDocument, DocumentType, VerificationUpdate};
use keystone_core::AppError;
use uuid::Uuid;

/// Persistence operations the verification worker relies on.
///
/// `ComplianceDocumentRepository` implements this over PostgreSQL; tests use
/// in-memory implementations.
#[async_trait]
pub trait VerificationStore: Send + Sync {
    /// Load a document together with its owner's email address
    async fn load_document(&self, id: Uuid) -> Result<Option<ComplianceDocument>, AppError>;

    /// Write the outcome of an attempt in a single statement.
    /// Returns `AppError::NotFound` when the document no longer exists.
    async fn apply_verification(
        &self,
        id: Uuid,
        update: &VerificationUpdate,
    ) -> Result<(), AppError>;

    /// Documents still PENDING whose AI status is NONE or NEEDS_REVIEW
    async fn find_pending_unverified(&self) -> Result<Vec<ComplianceDocument>, AppError>;

    /// Set or clear the contractor badge derived from a document type.
    /// Types without a badge are a no-op.
    async fn update_contractor_badge(
        &self,
        user_id: Uuid,
        doc_type: DocumentType,
        verified: bool,
    ) -> Result<(), AppError>;
}
