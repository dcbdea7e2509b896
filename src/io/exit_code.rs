//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success - documents were retrieved or the report was written
//! - `1`: General error - unspecified failure
//! - `3`: Nothing matched the query
//! - `4-7`: Specific failures that scripts can branch on
//! - `126-255`: Reserved by shell

use crate::error::RetrievalError;

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// The query ran but returned no documents (code 3)
    NotFound = 3,

    /// Empty corpus, empty query or a zero count (code 4)
    InvalidArgument = 4,

    /// Corpus, stop word or report file could not be read or written (code 5)
    IoError = 5,

    /// Configuration error (code 6)
    ConfigError = 6,

    /// Tokenization, vectorization or training produced nothing usable (code 7)
    ComputationFailure = 7,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

impl ExitCode {
    /// `Success` when at least one document came back, `NotFound` otherwise.
    pub fn from_results<T>(results: &[T]) -> Self {
        if results.is_empty() {
            ExitCode::NotFound
        } else {
            ExitCode::Success
        }
    }

    /// Map a library error to the code scripts should see.
    pub fn from_error(error: &RetrievalError) -> Self {
        match error {
            RetrievalError::InvalidArgument { .. } => ExitCode::InvalidArgument,
            RetrievalError::ComputationFailure { .. } => ExitCode::ComputationFailure,
            RetrievalError::ReportWrite { .. } => ExitCode::IoError,
            RetrievalError::Serialization(_) => ExitCode::GeneralError,
        }
    }

    /// Map an error surfaced at the binary boundary.
    ///
    /// Looks through the `anyhow` chain for a library error first, then for
    /// I/O failures.
    pub fn from_anyhow(error: &anyhow::Error) -> Self {
        for cause in error.chain() {
            if let Some(e) = cause.downcast_ref::<RetrievalError>() {
                return Self::from_error(e);
            }
            if cause.is::<std::io::Error>() {
                return ExitCode::IoError;
            }
        }
        ExitCode::GeneralError
    }

    /// Get a human-readable description of the exit code.
    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::NotFound => "No matching documents",
            ExitCode::InvalidArgument => "Invalid argument",
            ExitCode::IoError => "I/O error",
            ExitCode::ConfigError => "Configuration error",
            ExitCode::ComputationFailure => "Computation failure",
        }
    }
}
