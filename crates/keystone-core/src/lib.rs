//! Keystone Core Library
//!
//! Domain models, error types and configuration shared by every crate of the
//! compliance verification pipeline.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, DecisionPolicy, EmailConfig, TelemetryConfig};
pub use error::{AppError, LogLevel};
