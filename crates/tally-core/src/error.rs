//! Shared error type across tally crates.

use thiserror::Error;

/// Stable error codes (safe to match on in tests and logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// A metric name is already taken in the registry.
    DuplicateMetricName,
    /// Metric or label name violates the exposition naming rules.
    InvalidName,
    /// Wrong number of label values for an instrument.
    LabelMismatch,
    /// A scrape could not be produced.
    SnapshotFailure,
    /// `initialize` was called twice in one process.
    AlreadyInitialized,
    /// Configuration parse or validation failure.
    Config,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::DuplicateMetricName => "DUPLICATE_METRIC_NAME",
            ErrorCode::InvalidName => "INVALID_NAME",
            ErrorCode::LabelMismatch => "LABEL_MISMATCH",
            ErrorCode::SnapshotFailure => "SNAPSHOT_FAILURE",
            ErrorCode::AlreadyInitialized => "ALREADY_INITIALIZED",
            ErrorCode::Config => "CONFIG",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TallyError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("duplicate metric name: {0}")]
    DuplicateMetricName(String),
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("label mismatch for {metric}: expected {expected} values, got {got}")]
    LabelMismatch {
        metric: String,
        expected: usize,
        got: usize,
    },
    #[error("snapshot failed: {0}")]
    SnapshotFailure(String),
    #[error("metrics registry already initialized")]
    AlreadyInitialized,
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl TallyError {
    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            TallyError::DuplicateMetricName(_) => ErrorCode::DuplicateMetricName,
            TallyError::InvalidName(_) => ErrorCode::InvalidName,
            TallyError::LabelMismatch { .. } => ErrorCode::LabelMismatch,
            TallyError::SnapshotFailure(_) => ErrorCode::SnapshotFailure,
            TallyError::AlreadyInitialized => ErrorCode::AlreadyInitialized,
            TallyError::Config(_) => ErrorCode::Config,
            TallyError::Internal(_) => ErrorCode::Internal,
        }
    }
}
