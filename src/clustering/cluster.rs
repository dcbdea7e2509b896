//! A single k-means cluster: one centroid plus its member documents.

use crate::error::{RetrievalError, RetrievalResult};
use crate::vector::Vector;

/// Centroid and insertion-ordered membership of one cluster.
///
/// The centroid is never empty. Membership holds each document index at
/// most once; uniqueness across clusters is the trainer's concern.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterDto {
    centroid: Vector,
    indices: Vec<usize>,
}

impl ClusterDto {
    /// Create a cluster with no members around `centroid`.
    pub fn new(centroid: Vector) -> RetrievalResult<Self> {
        if centroid.is_empty() {
            return Err(RetrievalError::invalid_argument(
                "cluster centroid cannot be empty",
            ));
        }
        Ok(Self {
            centroid,
            indices: Vec::new(),
        })
    }

    #[must_use]
    pub fn get_centroid(&self) -> &[f64] {
        &self.centroid
    }

    /// Replace the centroid wholesale.
    pub fn set_new_centroid(&mut self, new_centroid: Vector) -> RetrievalResult<()> {
        if new_centroid.is_empty() {
            return Err(RetrievalError::invalid_argument(
                "new cluster centroid cannot be empty",
            ));
        }
        self.centroid = new_centroid;
        Ok(())
    }

    /// Drop every member, keeping the centroid.
    pub fn erase_indices(&mut self) {
        self.indices.clear();
    }

    /// Add a member. Returns `false` if it was already present.
    pub fn add_document_index(&mut self, index: usize) -> bool {
        if self.indices.contains(&index) {
            return false;
        }
        self.indices.push(index);
        true
    }

    /// Member document indices in insertion order.
    #[must_use]
    pub fn get_indices(&self) -> &[usize] {
        &self.indices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
