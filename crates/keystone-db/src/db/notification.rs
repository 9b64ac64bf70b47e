use keystone_core::AppError;
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Repository for in-app notifications shown in the contractor dashboard
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, payload), fields(db.table = "notifications", db.operation = "insert"))]
    pub async fn create_notification(
        &self,
        user_id: Uuid,
        kind: &str,
        payload: &JsonValue,
    ) -> Result<Uuid, AppError> {
        let id = sqlx::query_scalar::<Postgres, Uuid>(
            r#"
            INSERT INTO notifications (user_id, kind, payload)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(payload)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }
}
