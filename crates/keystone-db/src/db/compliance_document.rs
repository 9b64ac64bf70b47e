use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use keystone_core::models::{ComplianceDocument, DocumentType, VerificationUpdate};
use keystone_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::store::VerificationStore;

/// Channel upload handlers notify with the id of a new document.
pub const NOTIFY_CHANNEL: &str = "compliance_document_uploaded";

const DOCUMENT_COLUMNS: &str = r#"
    d.id, d.user_id, u.email AS owner_email, d.doc_type, d.source_url, d.content_type,
    d.status, d.ai_status, d.ai_confidence, d.ai_reason, d.issuer, d.policy_number,
    d.effective_from, d.effective_to, d.created_at, d.updated_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct ComplianceDocumentRow {
    id: Uuid,
    user_id: Uuid,
    owner_email: Option<String>,
    doc_type: String,
    source_url: String,
    content_type: Option<String>,
    status: String,
    ai_status: String,
    ai_confidence: Option<f64>,
    ai_reason: Option<String>,
    issuer: Option<String>,
    policy_number: Option<String>,
    effective_from: Option<NaiveDate>,
    effective_to: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ComplianceDocumentRow {
    fn to_model(self) -> Result<ComplianceDocument, AppError> {
        let id = self.id;
        let parse_err =
            |e: anyhow::Error| AppError::Internal(format!("Corrupt compliance document {}: {}", id, e));
        Ok(ComplianceDocument {
            id: self.id,
            user_id: self.user_id,
            owner_email: self.owner_email,
            doc_type: self.doc_type.parse().map_err(parse_err)?,
            source_url: self.source_url,
            content_type: self.content_type,
            status: self.status.parse().map_err(parse_err)?,
            ai_status: self.ai_status.parse().map_err(parse_err)?,
            ai_confidence: self.ai_confidence,
            ai_reason: self.ai_reason,
            issuer: self.issuer,
            policy_number: self.policy_number,
            effective_from: self.effective_from,
            effective_to: self.effective_to,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Badge column on `contractor_profiles` backed by a document type.
fn badge_column(doc_type: DocumentType) -> Option<&'static str> {
    match doc_type {
        DocumentType::License => Some("license_verified"),
        DocumentType::Insurance => Some("insurance_verified"),
        DocumentType::Cert | DocumentType::Other => None,
    }
}

/// Repository for compliance documents and the contractor badges derived from them
#[derive(Clone)]
pub struct ComplianceDocumentRepository {
    pool: PgPool,
}

impl ComplianceDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "compliance_documents", db.operation = "select", db.record_id = %id))]
    pub async fn get_document(&self, id: Uuid) -> Result<Option<ComplianceDocument>, AppError> {
        let query = format!(
            "SELECT {} FROM compliance_documents d LEFT JOIN users u ON u.id = d.user_id WHERE d.id = $1",
            DOCUMENT_COLUMNS
        );
        let row = sqlx::query_as::<Postgres, ComplianceDocumentRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ComplianceDocumentRow::to_model).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "compliance_documents", db.operation = "select"))]
    pub async fn list_pending_unverified(&self) -> Result<Vec<ComplianceDocument>, AppError> {
        let query = format!(
            r#"
            SELECT {}
            FROM compliance_documents d
            LEFT JOIN users u ON u.id = d.user_id
            WHERE d.status = 'PENDING' AND d.ai_status IN ('NONE', 'NEEDS_REVIEW')
            ORDER BY d.created_at ASC
            "#,
            DOCUMENT_COLUMNS
        );
        let rows = sqlx::query_as::<Postgres, ComplianceDocumentRow>(&query)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(ComplianceDocumentRow::to_model)
            .collect()
    }

    /// Write one attempt's result. A decision overwrites the extracted scalars,
    /// unset ones included; a failure fallback keeps the stored values.
    #[tracing::instrument(skip(self, update), fields(db.table = "compliance_documents", db.operation = "update", db.record_id = %id, status = %update.status()))]
    pub async fn update_verification(
        &self,
        id: Uuid,
        update: &VerificationUpdate,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE compliance_documents
            SET status = $2,
                ai_status = $3,
                ai_confidence = $4,
                ai_reason = $5,
                issuer = CASE WHEN $10 THEN issuer ELSE $6 END,
                policy_number = CASE WHEN $10 THEN policy_number ELSE $7 END,
                effective_from = CASE WHEN $10 THEN effective_from ELSE $8 END,
                effective_to = CASE WHEN $10 THEN effective_to ELSE $9 END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.status().to_string())
        .bind(update.ai_status().to_string())
        .bind(update.ai_confidence())
        .bind(update.ai_reason())
        .bind(update.issuer())
        .bind(update.policy_number())
        .bind(update.effective_from())
        .bind(update.effective_to())
        .bind(update.keeps_stored_fields())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Compliance document {} not found",
                id
            )));
        }

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "contractor_profiles", db.operation = "upsert"))]
    pub async fn set_contractor_badge(
        &self,
        user_id: Uuid,
        doc_type: DocumentType,
        verified: bool,
    ) -> Result<(), AppError> {
        let Some(column) = badge_column(doc_type) else {
            tracing::debug!(doc_type = %doc_type, "Document type carries no contractor badge");
            return Ok(());
        };

        let query = format!(
            r#"
            INSERT INTO contractor_profiles (user_id, {column})
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE
            SET {column} = EXCLUDED.{column}, updated_at = NOW()
            "#
        );
        sqlx::query(&query)
            .bind(user_id)
            .bind(verified)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl VerificationStore for ComplianceDocumentRepository {
    async fn load_document(&self, id: Uuid) -> Result<Option<ComplianceDocument>, AppError> {
        self.get_document(id).await
    }

    async fn apply_verification(
        &self,
        id: Uuid,
        update: &VerificationUpdate,
    ) -> Result<(), AppError> {
        self.update_verification(id, update).await
    }

    async fn find_pending_unverified(&self) -> Result<Vec<ComplianceDocument>, AppError> {
        self.list_pending_unverified().await
    }

    async fn update_contractor_badge(
        &self,
        user_id: Uuid,
        doc_type: DocumentType,
        verified: bool,
    ) -> Result<(), AppError> {
        self.set_contractor_badge(user_id, doc_type, verified).await
    }
}
