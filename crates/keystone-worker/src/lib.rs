//! Keystone verification worker
//!
//! Runs the verification chain for compliance documents on a bounded worker
//! pool, with per-document deduplication, a startup sweep and a
//! LISTEN/NOTIFY trigger for new uploads.

pub mod listener;
pub mod orchestrator;
pub mod pipeline;

pub use listener::{listen_for_uploads, parse_upload_payload};
pub use orchestrator::{
    OrchestratorConfig, VerificationFinishedSender, VerificationOrchestrator,
};
pub use pipeline::{PipelineSettings, VerificationPipeline};
