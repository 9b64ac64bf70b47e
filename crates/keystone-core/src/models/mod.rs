pub mod decision;
pub mod document;
pub mod fields;

pub use decision::{VerificationDecision, VerificationOutcome, VerificationUpdate};
pub use document::{AiStatus, ComplianceDocument, DocumentStatus, DocumentType};
pub use fields::{ExtractedFields, ModelFields};
