//! LISTEN/NOTIFY trigger for newly uploaded documents.

use keystone_db::NOTIFY_CHANNEL;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use crate::orchestrator::VerificationOrchestrator;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const FORCE_PREFIX: &str = "force:";

/// Parse a notification payload: a document id, optionally prefixed with
/// `force:` to bypass deduplication.
pub fn parse_upload_payload(payload: &str) -> Option<(Uuid, bool)> {
    let payload = payload.trim();
    let (id, force) = match payload.strip_prefix(FORCE_PREFIX) {
        Some(rest) => (rest, true),
        None => (payload, false),
    };
    Uuid::parse_str(id.trim()).ok().map(|id| (id, force))
}

/// Queue every document announced on the upload channel. Reconnects on
/// connection loss; runs until the surrounding task is dropped.
pub async fn listen_for_uploads(pool: PgPool, orchestrator: &VerificationOrchestrator) {
    loop {
        let mut listener = match PgListener::connect_with(&pool).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::warn!(error = %e, "PgListener connect failed, will retry");
                tokio::time::sleep(RECONNECT_DELAY).await;
                continue;
            }
        };

        if let Err(e) = listener.listen(NOTIFY_CHANNEL).await {
            tracing::warn!(error = %e, "LISTEN failed, will retry");
            tokio::time::sleep(RECONNECT_DELAY).await;
            continue;
        }
        tracing::info!(channel = NOTIFY_CHANNEL, "Listening for document uploads");

        loop {
            match listener.recv().await {
                Ok(notification) => match parse_upload_payload(notification.payload()) {
                    Some((document_id, force)) => {
                        orchestrator.enqueue_verification(document_id, force);
                    }
                    None => {
                        tracing::warn!(
                            payload = notification.payload(),
                            "Ignoring malformed upload notification"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Upload listener disconnected, reconnecting");
                    break;
                }
            }
        }
    }
}
