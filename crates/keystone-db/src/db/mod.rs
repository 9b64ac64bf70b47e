//! Database repositories for the verification pipeline
//
// Compliance documents and contractor badges
pub mod compliance_document;
//
// In-app notifications
pub mod notification;
//
// Trait seam used by the worker
pub mod store;

pub use compliance_document::{ComplianceDocumentRepository, NOTIFY_CHANNEL};
pub use notification::NotificationRepository;
pub use store::VerificationStore;
