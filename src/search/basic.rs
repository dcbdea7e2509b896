//! Exact nearest neighbour search over indexed documents.

use tracing::debug;

use crate::error::{RetrievalError, RetrievalResult};
use crate::text::{Tokenizer, Vectorizer};
use crate::vector::{Vector, calculate_distance};

use super::{Retriever, validate_request, vectorize_query};

/// `(position, distance)` of the `n_neighbours` vectors closest to `query`,
/// ascending by distance.
pub fn calculate_knn(
    query: &[f64],
    document_vectors: &[&[f64]],
    n_neighbours: usize,
) -> RetrievalResult<Vec<(usize, f64)>> {
    if query.is_empty() || n_neighbours == 0 {
        return Err(RetrievalError::invalid_argument(
            "query vector must be non-empty and n_neighbours positive",
        ));
    }

    let mut distances = document_vectors
        .iter()
        .enumerate()
        .map(|(position, vector)| {
            calculate_distance(query, vector)
                .map(|distance| (position, distance))
                .ok_or_else(|| {
                    RetrievalError::computation(
                        "nearest neighbour search",
                        "query and document vectors differ in length",
                    )
                })
        })
        .collect::<RetrievalResult<Vec<_>>>()?;

    distances.sort_by(|a, b| a.1.total_cmp(&b.1));
    distances.truncate(n_neighbours);
    Ok(distances)
}

/// Indexes raw documents with a tokenizer and vectorizer, then answers
/// queries with an exhaustive scan.
pub struct BasicSearchEngine<'a> {
    tokenizer: &'a Tokenizer,
    vectorizer: &'a dyn Vectorizer,
    documents: Vec<String>,
    document_vectors: Vec<Vector>,
}

impl std::fmt::Debug for BasicSearchEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicSearchEngine")
            .field("documents", &self.documents.len())
            .field("dimension", &self.vectorizer.dimension())
            .finish()
    }
}

impl<'a> BasicSearchEngine<'a> {
    /// Create an engine with no documents, using already-fitted collaborators.
    pub fn new(tokenizer: &'a Tokenizer, vectorizer: &'a dyn Vectorizer) -> Self {
        Self {
            tokenizer,
            vectorizer,
            documents: Vec::new(),
            document_vectors: Vec::new(),
        }
    }

    /// Replace the indexed documents.
    ///
    /// Fails without changing the index if any document cannot be tokenized
    /// or vectorized.
    pub fn index_documents<S: AsRef<str>>(&mut self, documents: &[S]) -> RetrievalResult<()> {
        if documents.is_empty() {
            return Err(RetrievalError::invalid_argument(
                "cannot index an empty list of documents",
            ));
        }

        let vectors = documents
            .iter()
            .map(|doc| self.index_document(doc.as_ref()))
            .collect::<RetrievalResult<Vec<_>>>()?;

        self.documents = documents.iter().map(|d| d.as_ref().to_string()).collect();
        self.document_vectors = vectors;
        debug!("Indexed {} documents", self.documents.len());
        Ok(())
    }

    fn index_document(&self, document: &str) -> RetrievalResult<Vector> {
        let tokens = self.tokenizer.tokenize(document);
        if tokens.is_empty() {
            return Err(RetrievalError::computation(
                "document indexing",
                format!("document {document:?} has no usable tokens"),
            ));
        }
        self.vectorizer.vectorize(&tokens)
    }

    /// Tokenize and vectorize a query with the engine's collaborators.
    pub fn vectorize_query(&self, query: &str) -> RetrievalResult<Vector> {
        vectorize_query(self.tokenizer, self.vectorizer, query)
    }

    /// Indexed documents in indexing order.
    #[must_use]
    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    /// Vectors of the indexed documents, aligned with [`Self::documents`].
    #[must_use]
    pub fn document_vectors(&self) -> &[Vector] {
        &self.document_vectors
    }

    fn ensure_indexed(&self) -> RetrievalResult<()> {
        if self.documents.is_empty() {
            return Err(RetrievalError::computation(
                "retrieval",
                "no documents have been indexed",
            ));
        }
        Ok(())
    }

    /// Look up indexed document texts for `(distance, position)` hits.
    pub(crate) fn resolve(&self, hits: Vec<(f64, usize)>) -> RetrievalResult<Vec<(f64, String)>> {
        hits.into_iter()
            .map(|(distance, position)| {
                self.documents
                    .get(position)
                    .map(|doc| (distance, doc.clone()))
                    .ok_or_else(|| {
                        RetrievalError::computation(
                            "retrieval",
                            format!("neighbour {position} is not an indexed document"),
                        )
                    })
            })
            .collect()
    }

    /// Query vector for a validated request against a non-empty index.
    pub(crate) fn prepare(&self, query: &str, n_neighbours: usize) -> RetrievalResult<Vector> {
        validate_request(query, n_neighbours)?;
        self.ensure_indexed()?;
        self.vectorize_query(query)
    }
}

impl Retriever for BasicSearchEngine<'_> {
    fn retrieve_relevant_documents(
        &mut self,
        query: &str,
        n_neighbours: usize,
    ) -> RetrievalResult<Vec<(f64, String)>> {
        let query_vector = self.prepare(query, n_neighbours)?;
        let vectors: Vec<&[f64]> = self.document_vectors.iter().map(Vec::as_slice).collect();
        let knn = calculate_knn(&query_vector, &vectors, n_neighbours)?;
        self.resolve(
            knn.into_iter()
                .map(|(position, distance)| (distance, position))
                .collect(),
        )
    }
}
