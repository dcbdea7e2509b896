//! Cluster-restricted retrieval and cluster reports.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::clustering::{ClusterInfo, KMeans, TrainingOutcome};
use crate::config::ClusteringConfig;
use crate::error::{RetrievalError, RetrievalResult};
use crate::vector::DocumentVectorDb;

use super::{Retriever, validate_request, vectorize_query};

/// Search engine that trains k-means over a database and answers queries
/// from the cluster nearest to them.
#[derive(Debug)]
pub struct ClusteringSearchEngine<'a> {
    db: &'a DocumentVectorDb,
    kmeans: KMeans<'a>,
}

impl<'a> ClusteringSearchEngine<'a> {
    pub fn new(db: &'a DocumentVectorDb, n_clusters: usize) -> RetrievalResult<Self> {
        Self::with_config(db, &ClusteringConfig::with_clusters(n_clusters))
    }

    pub fn with_config(db: &'a DocumentVectorDb, config: &ClusteringConfig) -> RetrievalResult<Self> {
        Ok(Self {
            db,
            kmeans: KMeans::with_config(db, config)?,
        })
    }

    /// Train the underlying model. Retrieval does this on every call; reports
    /// and SSE use whatever the model currently holds.
    pub fn train(&mut self) -> RetrievalResult<TrainingOutcome> {
        self.kmeans.train()
    }

    /// Write up to `num_examples` documents per cluster to `output_path` as
    /// pretty-printed JSON. Returns what was written.
    pub fn make_report(
        &self,
        num_examples: usize,
        output_path: &Path,
    ) -> RetrievalResult<Vec<ClusterInfo>> {
        if output_path.as_os_str().is_empty() {
            return Err(RetrievalError::invalid_argument(
                "report output path cannot be empty",
            ));
        }

        let info = self.kmeans.get_clusters_info(num_examples)?;
        let json = serde_json::to_string_pretty(&info)?;
        fs::write(output_path, json).map_err(|source| RetrievalError::ReportWrite {
            path: output_path.to_path_buf(),
            source,
        })?;

        info!(
            clusters = info.len(),
            path = %output_path.display(),
            "Wrote cluster report"
        );
        Ok(info)
    }

    pub fn calculate_square_sum(&self) -> RetrievalResult<f64> {
        self.kmeans.calculate_square_sum()
    }

    #[must_use]
    pub fn kmeans(&self) -> &KMeans<'a> {
        &self.kmeans
    }
}

impl Retriever for ClusteringSearchEngine<'_> {
    fn retrieve_relevant_documents(
        &mut self,
        query: &str,
        n_neighbours: usize,
    ) -> RetrievalResult<Vec<(f64, String)>> {
        validate_request(query, n_neighbours)?;
        let query_vector = vectorize_query(self.db.get_tokenizer(), self.db.get_vectorizer(), query)?;

        let outcome = self.kmeans.train()?;
        debug!("Trained in {} iterations before retrieval", outcome.iterations());

        self.kmeans
            .infer(&query_vector, n_neighbours)?
            .into_iter()
            .map(|(distance, index)| {
                self.db
                    .get_document(index)
                    .map(|doc| (distance, doc.to_string()))
                    .ok_or_else(|| {
                        RetrievalError::computation(
                            "retrieval",
                            format!("cluster member {index} has no stored document"),
                        )
                    })
            })
            .collect()
    }
}
