//! Error types for the fincheck-core library.

use thiserror::Error;

/// Main error type for the fincheck library.
///
/// Malformed OCR content is never an error: it surfaces as unset fields and
/// anomalies. Only structurally unusable input and configuration problems
/// end up here.
#[derive(Error, Debug)]
pub enum FincheckError {
    /// Document text is empty or not text at all.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Summarizer failed and no fallback was allowed.
    #[error(transparent)]
    Summary(#[from] SummaryError),
}

/// Errors returned by a summarizer collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SummaryError {
    /// The backend is temporarily unavailable; the call may be retried.
    #[error("summarizer unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the request; retrying will not help.
    #[error("summarizer rejected request: {0}")]
    Rejected(String),
}

impl SummaryError {
    /// Whether the failure is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, SummaryError::Unavailable(_))
    }
}

/// Result type for the fincheck library.
pub type Result<T> = std::result::Result<T, FincheckError>;
