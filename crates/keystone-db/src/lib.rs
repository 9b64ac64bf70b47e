//! Keystone persistence layer
//!
//! PostgreSQL repositories for compliance documents, contractor badges and
//! in-app notifications, plus the `VerificationStore` seam the verification
//! worker depends on.

pub mod db;

pub use db::{
    ComplianceDocumentRepository, NotificationRepository, VerificationStore,
    NOTIFY_CHANNEL,
};
