//! Error types for document retrieval
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for ingestion, training and retrieval operations
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Caller supplied something empty, zero or malformed
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// A collaborator produced nothing where a value was required
    #[error("Computation failed during {operation}: {reason}")]
    ComputationFailure { operation: String, reason: String },

    #[error("Failed to write report to '{path}': {source}")]
    ReportWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RetrievalError {
    /// Shorthand for [`RetrievalError::InvalidArgument`].
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`RetrievalError::ComputationFailure`].
    pub fn computation(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ComputationFailure {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::ComputationFailure { .. } => "COMPUTATION_FAILURE",
            Self::ReportWrite { .. } => "REPORT_WRITE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::InvalidArgument { .. } => vec![
                "Check that the corpus and query are non-empty",
                "Neighbour and example counts must be greater than zero",
            ],
            Self::ComputationFailure { .. } => vec![
                "The query may consist only of stop words or punctuation",
                "Make sure the corpus was ingested before searching",
            ],
            Self::ReportWrite { .. } => vec![
                "Check that the parent directory exists and is writable",
            ],
            Self::Serialization(_) => vec![],
        }
    }
}

/// Result type alias for retrieval operations
pub type RetrievalResult<T> = Result<T, RetrievalError>;
