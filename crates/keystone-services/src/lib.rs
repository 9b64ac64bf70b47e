//! Keystone Services Layer
//!
//! Field extraction, language-model enrichment, merging and the decision
//! engine that turn document text into a verification decision, plus owner
//! notifications.

pub mod decision;
pub mod extraction;
pub mod llm;

#[cfg(feature = "notifications")]
pub mod notification;

pub use decision::decide_verification;
pub use extraction::{merge_fields, parse_date, RegexFieldExtractor};
pub use llm::{
    FieldExtractionProvider, OllamaProvider, OpenAiProvider, ProviderChain,
};

#[cfg(feature = "notifications")]
pub use notification::{ChannelNotifier, EmailService, Notifier, VerificationNotice};
