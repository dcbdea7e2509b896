//! Core vector types.

use crate::error::{RetrievalError, RetrievalResult};

/// Fixed-length score vector, one slot per vocabulary term.
pub type Vector = Vec<f64>;

/// Type-safe wrapper for vector dimensions.
///
/// Ensures runtime validation of vector dimensions to prevent mismatches
/// between documents, centroids and queries of the same database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorDimension(usize);

impl VectorDimension {
    /// Creates a new `VectorDimension` with validation.
    ///
    /// Returns an error if the dimension is zero.
    pub fn new(dim: usize) -> RetrievalResult<Self> {
        if dim == 0 {
            return Err(RetrievalError::invalid_argument(
                "vector dimension cannot be zero",
            ));
        }
        Ok(Self(dim))
    }

    /// Returns the underlying dimension value.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Validates that a vector has the expected dimension.
    pub fn validate_vector(&self, vector: &[f64]) -> RetrievalResult<()> {
        if vector.len() != self.0 {
            return Err(RetrievalError::invalid_argument(format!(
                "vector dimension mismatch: expected {}, got {}",
                self.0,
                vector.len()
            )));
        }
        Ok(())
    }
}
