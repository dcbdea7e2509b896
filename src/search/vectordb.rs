//! Engines bound to a [`DocumentVectorDb`].

use crate::config::{ClusteringConfig, EngineKind};
use crate::error::{RetrievalError, RetrievalResult};
use crate::vector::DocumentVectorDb;

use super::{
    AdvancedSearchEngine, ClusteringSearchEngine, Retriever, SearchEngine, calculate_knn,
    validate_request, vectorize_query,
};

/// Exact k nearest neighbour scan over the vectors already stored in the
/// database. Nothing is re-vectorized at construction.
#[derive(Debug)]
pub struct VectorDbSearchEngine<'a> {
    db: &'a DocumentVectorDb,
}

impl<'a> VectorDbSearchEngine<'a> {
    pub fn new(db: &'a DocumentVectorDb) -> Self {
        Self { db }
    }
}

impl Retriever for VectorDbSearchEngine<'_> {
    fn retrieve_relevant_documents(
        &mut self,
        query: &str,
        n_neighbours: usize,
    ) -> RetrievalResult<Vec<(f64, String)>> {
        validate_request(query, n_neighbours)?;
        let stored = self.db.get_vectors(None);
        if stored.is_empty() {
            return Err(RetrievalError::computation(
                "retrieval",
                "the database holds no vectors",
            ));
        }
        let query_vector = vectorize_query(self.db.get_tokenizer(), self.db.get_vectorizer(), query)?;

        let vectors: Vec<&[f64]> = stored.iter().map(|(_, v)| v.as_slice()).collect();
        calculate_knn(&query_vector, &vectors, n_neighbours)?
            .into_iter()
            .map(|(position, distance)| {
                let index = stored[position].0;
                self.db
                    .get_document(index)
                    .map(|doc| (distance, doc.to_string()))
                    .ok_or_else(|| {
                        RetrievalError::computation(
                            "retrieval",
                            format!("vector {index} has no stored document"),
                        )
                    })
            })
            .collect()
    }
}

/// A database plus the retrieval strategy answering queries against it.
pub struct VectorDbEngine<'a> {
    db: &'a DocumentVectorDb,
    engine: Box<dyn Retriever + 'a>,
}

impl std::fmt::Debug for VectorDbEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorDbEngine")
            .field("documents", &self.db.document_count())
            .finish_non_exhaustive()
    }
}

impl<'a> VectorDbEngine<'a> {
    /// Bind an arbitrary strategy to `db`.
    pub fn new(db: &'a DocumentVectorDb, engine: Box<dyn Retriever + 'a>) -> Self {
        Self { db, engine }
    }

    /// Exact scan over the stored vectors.
    pub fn exact(db: &'a DocumentVectorDb) -> Self {
        Self::new(db, Box::new(VectorDbSearchEngine::new(db)))
    }

    /// Single nearest neighbour through a naive KD-tree over every document.
    pub fn tree(db: &'a DocumentVectorDb) -> RetrievalResult<Self> {
        let mut engine = SearchEngine::new(db.get_tokenizer(), db.get_vectorizer());
        engine.index_documents(&db.get_raw_documents(None)?)?;
        Ok(Self::new(db, Box::new(engine)))
    }

    /// k nearest neighbours through a pruning KD-tree over every document.
    pub fn advanced(db: &'a DocumentVectorDb) -> RetrievalResult<Self> {
        let mut engine = AdvancedSearchEngine::new(db.get_tokenizer(), db.get_vectorizer());
        engine.index_documents(&db.get_raw_documents(None)?)?;
        Ok(Self::new(db, Box::new(engine)))
    }

    /// K-means backed retrieval; the model retrains on every query.
    pub fn clustering(db: &'a DocumentVectorDb, config: &ClusteringConfig) -> RetrievalResult<Self> {
        let engine = ClusteringSearchEngine::with_config(db, config)?;
        Ok(Self::new(db, Box::new(engine)))
    }

    /// Build the engine selected in configuration.
    pub fn from_kind(
        db: &'a DocumentVectorDb,
        kind: EngineKind,
        config: &ClusteringConfig,
    ) -> RetrievalResult<Self> {
        match kind {
            EngineKind::Basic => Ok(Self::exact(db)),
            EngineKind::Tree => Self::tree(db),
            EngineKind::Advanced => Self::advanced(db),
            EngineKind::Clustering => Self::clustering(db, config),
        }
    }

    pub fn retrieve_relevant_documents(
        &mut self,
        query: &str,
        n_neighbours: usize,
    ) -> RetrievalResult<Vec<(f64, String)>> {
        self.engine.retrieve_relevant_documents(query, n_neighbours)
    }

    #[must_use]
    pub fn db(&self) -> &DocumentVectorDb {
        self.db
    }
}
