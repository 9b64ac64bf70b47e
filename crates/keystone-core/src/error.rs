//! Error types module
//!
//! `AppError` covers the persistence failures shared by the verifier crates. The `Database` variant and `From<sqlx::Error>` are gated
//! behind the `sqlx` feature.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected errors such as a document deleted mid-attempt
    Warn,
    /// Unexpected failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

/// Static metadata for each variant: (error_code, recoverable, log_level).
fn app_error_static_metadata(err: &AppError) -> (&'static str, bool, LogLevel) {
    match err {
        AppError::Database(_) => ("DATABASE_ERROR", true, LogLevel::Error),
        AppError::NotFound(_) => ("NOT_FOUND", false, LogLevel::Warn),
        AppError::Internal(_) => ("INTERNAL_ERROR", true, LogLevel::Error),
        AppError::InternalWithSource { .. } => ("INTERNAL_ERROR", true, LogLevel::Error),
    }
}

impl AppError {
    /// Machine-readable error code (e.g. "DATABASE_ERROR")
    pub fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).0
    }

    /// Whether a later attempt may succeed without operator action
    pub fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).1
    }

    pub fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).2
    }
}
