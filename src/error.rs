//! Error types for kyrolabel.
//!
//! All errors are strongly typed using thiserror. Nothing in this crate
//! is retryable: resolution is a pure transformation, so the same input
//! always fails the same way.

use thiserror::Error;

/// Validation errors raised while normalizing or resolving input records.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field '{field}' is missing at record {row}")]
    MissingField {
        field: String,
        row: usize,
    },

    #[error("Field '{field}' at record {row} holds {found}, which cannot be coerced to a label")]
    TypeMismatch {
        field: String,
        row: usize,
        found: String,
    },

    #[error("Record {row} resolves to an empty label")]
    EmptyResolvedLabel {
        row: usize,
    },

    #[error("Invalid label priority: {reason}")]
    InvalidPriority {
        reason: String,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Execution errors raised when components are wired together incorrectly.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Shape mismatch: {what} has {actual} records, expected {expected}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("Shard worker '{worker}' disconnected before returning its result")]
    WorkerDisconnected {
        worker: String,
    },
}

/// Top-level error type for kyrolabel.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl LabelError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a shape-mismatch error.
    #[must_use]
    pub fn shape_mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::Execution(ExecutionError::ShapeMismatch {
            what: what.into(),
            expected,
            actual,
        })
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if the caller broke the record-count contract between
    /// the resolver, the evaluator and the remover.
    #[must_use]
    pub const fn is_contract_violation(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::ShapeMismatch { .. }))
    }
}

/// Result type alias for kyrolabel operations.
pub type LabelResult<T> = Result<T, LabelError>;

/// Fails with `ShapeMismatch` unless `actual == expected`.
pub(crate) fn ensure_len(what: &str, expected: usize, actual: usize) -> LabelResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(LabelError::shape_mismatch(what, expected, actual))
    }
}
