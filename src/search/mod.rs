//! Retrieval engines.
//!
//! Every engine answers the same question through [`Retriever`]: given a
//! query and a neighbour count, which documents are closest? They differ in
//! how they search:
//!
//! - [`BasicSearchEngine`] scans every indexed vector
//! - [`SearchEngine`] walks a [`NaiveKdTree`] for the single nearest document
//! - [`AdvancedSearchEngine`] walks a [`KdTree`] for the k nearest
//! - [`ClusteringSearchEngine`] trains k-means and searches one cluster
//! - [`VectorDbSearchEngine`] scans the database's stored vectors
//!
//! [`VectorDbEngine`] binds one of them to a [`DocumentVectorDb`].
//!
//! [`DocumentVectorDb`]: crate::vector::DocumentVectorDb

mod basic;
mod clustering;
mod kdtree;
mod tree;
mod vectordb;

pub use basic::{BasicSearchEngine, calculate_knn};
pub use clustering::ClusteringSearchEngine;
pub use kdtree::{KdTree, NaiveKdTree};
pub use tree::{AdvancedSearchEngine, SearchEngine};
pub use vectordb::{VectorDbEngine, VectorDbSearchEngine};

use tracing::{debug, warn};

use crate::error::{RetrievalError, RetrievalResult};
use crate::text::{Tokenizer, Vectorizer};
use crate::vector::{Vector, VectorDimension};

/// A strategy that ranks documents against a text query.
pub trait Retriever {
    /// Up to `n_neighbours` `(distance, document)` pairs, ascending by
    /// distance.
    fn retrieve_relevant_documents(
        &mut self,
        query: &str,
        n_neighbours: usize,
    ) -> RetrievalResult<Vec<(f64, String)>>;
}

/// Reject empty queries and zero neighbour counts.
pub(crate) fn validate_request(query: &str, n_neighbours: usize) -> RetrievalResult<()> {
    if query.trim().is_empty() {
        return Err(RetrievalError::invalid_argument("query cannot be empty"));
    }
    if n_neighbours == 0 {
        return Err(RetrievalError::invalid_argument(
            "number of neighbours must be greater than zero",
        ));
    }
    Ok(())
}

/// Turn a text query into a vector in the vectorizer's space.
///
/// Fails when the query has no tokens left after stop word removal, or when
/// the vectorizer has not been fitted.
pub fn vectorize_query(
    tokenizer: &Tokenizer,
    vectorizer: &dyn Vectorizer,
    query: &str,
) -> RetrievalResult<Vector> {
    let tokens = tokenizer.tokenize(query);
    if tokens.is_empty() {
        return Err(RetrievalError::computation(
            "query vectorization",
            format!("query {query:?} has no usable tokens"),
        ));
    }
    let vector = vectorizer.vectorize(&tokens)?;
    if vector.is_empty() {
        return Err(RetrievalError::computation(
            "query vectorization",
            "vectorizer produced an empty vector",
        ));
    }
    VectorDimension::new(vectorizer.dimension())?.validate_vector(&vector)?;

    let matched = vectorizer.vector2tokens(&vector);
    if matched.is_empty() {
        warn!("No query term of {query:?} is in the vocabulary");
    } else {
        debug!("Query terms in vocabulary: {matched:?}");
    }
    Ok(vector)
}
