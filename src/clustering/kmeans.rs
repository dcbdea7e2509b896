//! K-means training and cluster-restricted nearest neighbour inference.
//!
//! # Algorithm Details
//! - Distance metric: Euclidean
//! - Initialization: the first k stored vectors, in index order
//! - Assignment ties: lowest cluster index wins
//! - Empty clusters keep their previous centroid
//! - Convergence: every centroid moved by at most the threshold
//!
//! # Performance Characteristics
//! - O(iterations * n * k * d) training time
//! - O(k * d) space for centroids
//! - Training is deterministic for a fixed corpus

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ClusteringConfig;
use crate::error::{RetrievalError, RetrievalResult};
use crate::vector::{DocumentVectorDb, Vector, calculate_distance, squared_distance};

use super::ClusterDto;

/// Default convergence tolerance for centroid movement.
pub const DEFAULT_CONVERGENCE_THRESHOLD: f64 = 1e-7;

/// Default cap on training iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 300;

/// How a training run ended. Both outcomes leave a usable model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingOutcome {
    /// No centroid moved by more than the threshold.
    Converged { iterations: usize },
    /// The iteration cap was hit first.
    MaxIterationsReached { iterations: usize },
}

impl TrainingOutcome {
    #[must_use]
    pub fn iterations(&self) -> usize {
        match self {
            Self::Converged { iterations } | Self::MaxIterationsReached { iterations } => {
                *iterations
            }
        }
    }

    #[must_use]
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }
}

/// Example documents of one cluster, as written to the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub cluster_id: usize,
    pub documents: Vec<String>,
}

/// K-means model over the vectors of one database.
#[derive(Debug)]
pub struct KMeans<'a> {
    db: &'a DocumentVectorDb,
    clusters: Vec<ClusterDto>,
    n_clusters: usize,
    threshold: f64,
    max_iterations: usize,
}

impl<'a> KMeans<'a> {
    /// Create an untrained model with default convergence settings.
    pub fn new(db: &'a DocumentVectorDb, n_clusters: usize) -> RetrievalResult<Self> {
        Self::with_config(db, &ClusteringConfig::with_clusters(n_clusters))
    }

    /// Create an untrained model from a clustering configuration.
    pub fn with_config(db: &'a DocumentVectorDb, config: &ClusteringConfig) -> RetrievalResult<Self> {
        if config.n_clusters == 0 {
            return Err(RetrievalError::invalid_argument(
                "number of clusters must be greater than zero",
            ));
        }
        validate_threshold(config.convergence_threshold)?;
        if config.max_iterations == 0 {
            return Err(RetrievalError::invalid_argument(
                "max_iterations must be greater than zero",
            ));
        }
        Ok(Self {
            db,
            clusters: Vec::new(),
            n_clusters: config.n_clusters,
            threshold: config.convergence_threshold,
            max_iterations: config.max_iterations,
        })
    }

    /// Train until convergence or the iteration cap.
    ///
    /// The first call seeds the clusters; later calls continue from the
    /// current centroids, so a converged model settles after one iteration.
    pub fn train(&mut self) -> RetrievalResult<TrainingOutcome> {
        if self.clusters.is_empty() {
            self.seed()?;
        }

        for iteration in 1..=self.max_iterations {
            let new_clusters = self.run_single_train_iteration()?;
            let converged = self.is_convergence_reached(&new_clusters, self.threshold)?;
            self.clusters = new_clusters;

            if converged {
                info!(
                    iterations = iteration,
                    clusters = self.clusters.len(),
                    "K-means converged"
                );
                return Ok(TrainingOutcome::Converged {
                    iterations: iteration,
                });
            }
        }

        warn!(
            "K-means did not converge after {} iterations",
            self.max_iterations
        );
        Ok(TrainingOutcome::MaxIterationsReached {
            iterations: self.max_iterations,
        })
    }

    /// One cluster per each of the first k stored vectors.
    fn seed(&mut self) -> RetrievalResult<()> {
        let vectors = self.db.get_vectors(None);
        if vectors.is_empty() {
            return Err(RetrievalError::computation(
                "k-means seeding",
                "the database holds no vectors",
            ));
        }
        if vectors.len() < self.n_clusters {
            warn!(
                "Requested {} clusters but only {} vectors are stored; seeding {}",
                self.n_clusters,
                vectors.len(),
                vectors.len()
            );
        }

        self.clusters = vectors
            .into_iter()
            .take(self.n_clusters)
            .map(|(_, vector)| ClusterDto::new(vector.clone()))
            .collect::<RetrievalResult<Vec<_>>>()?;
        debug!("Seeded {} clusters", self.clusters.len());
        Ok(())
    }

    /// Compute the clusters that follow the current ones.
    ///
    /// Membership is rebuilt from scratch, then each centroid becomes the
    /// mean of its members. The current model is left untouched.
    pub fn run_single_train_iteration(&self) -> RetrievalResult<Vec<ClusterDto>> {
        if self.clusters.is_empty() {
            return Err(RetrievalError::computation(
                "k-means iteration",
                "clusters have not been seeded",
            ));
        }

        let mut clusters = self.clusters.clone();
        for cluster in &mut clusters {
            cluster.erase_indices();
        }

        let vectors = self.db.get_vectors(None);
        for (index, vector) in &vectors {
            let nearest = nearest_cluster(vector, &clusters)?;
            clusters[nearest].add_document_index(*index);
        }

        for (position, cluster) in clusters.iter_mut().enumerate() {
            if cluster.is_empty() {
                debug!("Cluster {position} received no members, keeping its centroid");
                continue;
            }
            let members = self.db.get_vectors(Some(cluster.get_indices()));
            let centroid = mean_vector(members.iter().map(|(_, vector)| vector.as_slice()))?;
            cluster.set_new_centroid(centroid)?;
        }

        Ok(clusters)
    }

    /// Whether every centroid of `new_clusters` lies within `threshold` of
    /// the matching current centroid.
    pub fn is_convergence_reached(
        &self,
        new_clusters: &[ClusterDto],
        threshold: f64,
    ) -> RetrievalResult<bool> {
        if new_clusters.is_empty() {
            return Err(RetrievalError::invalid_argument(
                "cannot check convergence against an empty cluster list",
            ));
        }
        validate_threshold(threshold)?;
        if new_clusters.len() != self.clusters.len() {
            return Err(RetrievalError::invalid_argument(format!(
                "expected {} clusters, got {}",
                self.clusters.len(),
                new_clusters.len()
            )));
        }

        for (old, new) in self.clusters.iter().zip(new_clusters) {
            let movement = calculate_distance(old.get_centroid(), new.get_centroid())
                .ok_or_else(|| {
                    RetrievalError::computation("convergence check", "centroid shapes differ")
                })?;
            if movement > threshold {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The `n_neighbours` members of the nearest cluster closest to
    /// `query_vector`, as `(distance, document_index)` ascending.
    ///
    /// Documents outside the nearest cluster are never considered.
    pub fn infer(
        &self,
        query_vector: &[f64],
        n_neighbours: usize,
    ) -> RetrievalResult<Vec<(f64, usize)>> {
        if query_vector.is_empty() || n_neighbours == 0 {
            return Err(RetrievalError::invalid_argument(
                "query vector must be non-empty and n_neighbours positive",
            ));
        }
        if let Some(dimension) = self.db.dimension() {
            dimension.validate_vector(query_vector)?;
        }
        if self.clusters.is_empty() {
            return Err(RetrievalError::computation(
                "inference",
                "the model has not been trained",
            ));
        }

        let closest = nearest_cluster(query_vector, &self.clusters)?;
        debug!("Query assigned to cluster {closest}");

        let members = self
            .db
            .get_vectors(Some(self.clusters[closest].get_indices()));
        let mut neighbours = members
            .into_iter()
            .map(|(index, vector)| {
                calculate_distance(query_vector, vector)
                    .map(|distance| (distance, index))
                    .ok_or_else(|| {
                        RetrievalError::computation(
                            "inference",
                            "query and document vectors differ in length",
                        )
                    })
            })
            .collect::<RetrievalResult<Vec<_>>>()?;

        neighbours.sort_by(|a, b| a.0.total_cmp(&b.0));
        neighbours.truncate(n_neighbours);
        Ok(neighbours)
    }

    /// Up to `num_examples` documents per cluster, closest to the centroid
    /// first.
    pub fn get_clusters_info(&self, num_examples: usize) -> RetrievalResult<Vec<ClusterInfo>> {
        if num_examples == 0 {
            return Err(RetrievalError::invalid_argument(
                "num_examples must be greater than zero",
            ));
        }

        self.clusters
            .iter()
            .enumerate()
            .map(|(cluster_id, cluster)| {
                let mut ranked = self
                    .db
                    .get_vectors(Some(cluster.get_indices()))
                    .into_iter()
                    .map(|(index, vector)| {
                        calculate_distance(cluster.get_centroid(), vector)
                            .map(|distance| (distance, index))
                            .ok_or_else(|| {
                                RetrievalError::computation(
                                    "cluster report",
                                    "centroid and document vectors differ in length",
                                )
                            })
                    })
                    .collect::<RetrievalResult<Vec<_>>>()?;
                ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

                let indices: Vec<usize> = ranked
                    .into_iter()
                    .take(num_examples)
                    .map(|(_, index)| index)
                    .collect();
                let documents = self
                    .db
                    .get_raw_documents(Some(indices.as_slice()))?
                    .into_iter()
                    .map(str::to_string)
                    .collect();

                Ok(ClusterInfo {
                    cluster_id,
                    documents,
                })
            })
            .collect()
    }

    /// Sum over all clusters of the squared distance from each member to its
    /// centroid.
    pub fn calculate_square_sum(&self) -> RetrievalResult<f64> {
        let mut sse = 0.0;
        for cluster in &self.clusters {
            for (_, vector) in self.db.get_vectors(Some(cluster.get_indices())) {
                sse += squared_distance(cluster.get_centroid(), vector).ok_or_else(|| {
                    RetrievalError::computation(
                        "sum of squared errors",
                        "centroid and document vectors differ in length",
                    )
                })?;
            }
        }
        Ok(sse)
    }

    /// Current clusters, empty until the first training run.
    #[must_use]
    pub fn get_clusters(&self) -> &[ClusterDto] {
        &self.clusters
    }

    /// Requested number of clusters.
    #[must_use]
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }
}

fn validate_threshold(threshold: f64) -> RetrievalResult<()> {
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(RetrievalError::invalid_argument(format!(
            "convergence threshold must be a positive finite number, got {threshold}"
        )));
    }
    Ok(())
}

/// Index of the cluster whose centroid is closest to `vector`.
///
/// Uses a strict comparison, so the lowest index wins exact ties. Falls back
/// to cluster 0 when there is nothing to compare.
fn nearest_cluster(vector: &[f64], clusters: &[ClusterDto]) -> RetrievalResult<usize> {
    let mut best: Option<(f64, usize)> = None;
    for (position, cluster) in clusters.iter().enumerate() {
        let distance = calculate_distance(vector, cluster.get_centroid()).ok_or_else(|| {
            RetrievalError::computation(
                "cluster assignment",
                "vector and centroid differ in length",
            )
        })?;
        if best.is_none_or(|(best_distance, _)| distance < best_distance) {
            best = Some((distance, position));
        }
    }
    Ok(best.map_or(0, |(_, position)| position))
}

/// Coordinate-wise arithmetic mean.
fn mean_vector<'v>(vectors: impl Iterator<Item = &'v [f64]>) -> RetrievalResult<Vector> {
    let mut sum: Vector = Vec::new();
    let mut count = 0usize;
    for vector in vectors {
        if sum.is_empty() {
            sum = vec![0.0; vector.len()];
        } else if sum.len() != vector.len() {
            return Err(RetrievalError::computation(
                "centroid update",
                "member vectors differ in length",
            ));
        }
        for (total, value) in sum.iter_mut().zip(vector) {
            *total += value;
        }
        count += 1;
    }
    if count == 0 {
        return Err(RetrievalError::computation(
            "centroid update",
            "cannot average an empty set of vectors",
        ));
    }
    Ok(sum.into_iter().map(|total| total / count as f64).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animals_db() -> DocumentVectorDb {
        let mut db = DocumentVectorDb::new(["the", "and"]);
        db.put_corpus(&["the cat sat", "the dog ran", "cats and dogs play"])
            .unwrap();
        db
    }

    fn grouped_db() -> DocumentVectorDb {
        let mut db = DocumentVectorDb::new(["the", "a", "on"]);
        db.put_corpus(&[
            "the cat sat on the mat",
            "the cat sat on a cat mat",
            "stocks fell sharply today",
            "stocks rose sharply today",
            "the cat mat",
            "stocks today",
        ])
        .unwrap();
        db
    }

    #[test]
    fn test_rejects_invalid_configuration() {
        let db = animals_db();
        assert!(KMeans::new(&db, 0).is_err());

        let config = ClusteringConfig {
            n_clusters: 2,
            convergence_threshold: 0.0,
            max_iterations: 10,
        };
        assert!(KMeans::with_config(&db, &config).is_err());

        let config = ClusteringConfig {
            convergence_threshold: f64::NAN,
            ..config
        };
        assert!(KMeans::with_config(&db, &config).is_err());
    }

    #[test]
    fn test_train_seeds_from_first_vectors() {
        let db = animals_db();
        let mut kmeans = KMeans::new(&db, 2).unwrap();
        assert!(kmeans.get_clusters().is_empty());

        let outcome = kmeans.train().unwrap();
        assert!(outcome.is_converged());
        assert_eq!(kmeans.get_clusters().len(), 2);

        // doc 2 is equidistant from both seeds and goes to the lower cluster
        assert_eq!(kmeans.get_clusters()[0].get_indices(), &[0, 2]);
        assert_eq!(kmeans.get_clusters()[1].get_indices(), &[1]);
    }

    #[test]
    fn test_every_vector_assigned_exactly_once() {
        let db = grouped_db();
        let mut kmeans = KMeans::new(&db, 3).unwrap();
        kmeans.train().unwrap();

        let mut assigned: Vec<usize> = kmeans
            .get_clusters()
            .iter()
            .flat_map(|cluster| cluster.get_indices().iter().copied())
            .collect();
        assigned.sort_unstable();
        assert_eq!(assigned, (0..db.vector_count()).collect::<Vec<_>>());
    }

    #[test]
    fn test_converged_model_does_not_move() {
        let db = grouped_db();
        let mut kmeans = KMeans::new(&db, 2).unwrap();
        kmeans.train().unwrap();

        let next = kmeans.run_single_train_iteration().unwrap();
        assert!(
            kmeans
                .is_convergence_reached(&next, DEFAULT_CONVERGENCE_THRESHOLD)
                .unwrap()
        );

        let again = kmeans.train().unwrap();
        assert_eq!(again, TrainingOutcome::Converged { iterations: 1 });
    }

    #[test]
    fn test_empty_cluster_keeps_centroid() {
        let mut db = DocumentVectorDb::new(Vec::<String>::new());
        db.put_corpus(&["apple banana", "apple banana", "cherry"])
            .unwrap();
        let mut kmeans = KMeans::new(&db, 2).unwrap();
        kmeans.seed().unwrap();

        // Both seeds are identical, so every vector ties and lands in
        // cluster 0, leaving cluster 1 without members.
        let clusters = kmeans.run_single_train_iteration().unwrap();
        assert_eq!(clusters[0].get_indices(), &[0, 1, 2]);
        assert!(clusters[1].is_empty());
        assert_eq!(clusters[1].get_centroid(), db.get_vector(1).unwrap().as_slice());
        assert_ne!(clusters[0].get_centroid(), db.get_vector(0).unwrap().as_slice());

        // Training still terminates with both clusters intact
        kmeans.train().unwrap();
        assert_eq!(kmeans.get_clusters().len(), 2);
    }

    #[test]
    fn test_is_convergence_reached_validates_input() {
        let db = animals_db();
        let mut kmeans = KMeans::new(&db, 2).unwrap();
        kmeans.train().unwrap();

        assert!(matches!(
            kmeans.is_convergence_reached(&[], DEFAULT_CONVERGENCE_THRESHOLD),
            Err(RetrievalError::InvalidArgument { .. })
        ));
        let clusters = kmeans.get_clusters().to_vec();
        assert!(kmeans.is_convergence_reached(&clusters, -1.0).is_err());
        assert!(kmeans.is_convergence_reached(&clusters, 1e-7).unwrap());
    }

    #[test]
    fn test_max_iterations_is_a_terminal_outcome() {
        let db = grouped_db();
        let config = ClusteringConfig {
            n_clusters: 3,
            convergence_threshold: 1e-12,
            max_iterations: 1,
        };
        let mut kmeans = KMeans::with_config(&db, &config).unwrap();
        let outcome = kmeans.train().unwrap();
        assert_eq!(outcome.iterations(), 1);
    }

    #[test]
    fn test_infer_stays_inside_nearest_cluster() {
        let db = grouped_db();
        let mut kmeans = KMeans::new(&db, 2).unwrap();
        kmeans.train().unwrap();

        let query = db.get_vector(2).unwrap().clone();
        let results = kmeans.infer(&query, 10).unwrap();

        let owning = kmeans
            .get_clusters()
            .iter()
            .find(|cluster| cluster.get_indices().contains(&2))
            .unwrap();
        assert!(!results.is_empty());
        assert!(results.len() <= owning.len());
        for (_, index) in &results {
            assert!(owning.get_indices().contains(index));
        }
        assert_eq!(results[0], (0.0, 2));
        assert!(results.windows(2).all(|pair| pair[0].0 <= pair[1].0));
    }

    #[test]
    fn test_infer_rejects_bad_input_and_untrained_model() {
        let db = animals_db();
        let kmeans = KMeans::new(&db, 2).unwrap();
        let query = db.get_vector(0).unwrap().clone();

        assert!(matches!(
            kmeans.infer(&query, 1),
            Err(RetrievalError::ComputationFailure { .. })
        ));
        assert!(matches!(
            kmeans.infer(&[], 1),
            Err(RetrievalError::InvalidArgument { .. })
        ));
        assert!(matches!(
            kmeans.infer(&query, 0),
            Err(RetrievalError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_infer_rejects_query_of_wrong_dimension() {
        let db = animals_db();
        let mut kmeans = KMeans::new(&db, 2).unwrap();
        kmeans.train().unwrap();

        let mut query = db.get_vector(0).unwrap().clone();
        query.push(0.5);
        assert!(matches!(
            kmeans.infer(&query, 1),
            Err(RetrievalError::InvalidArgument { .. })
        ));
        assert!(matches!(
            kmeans.infer(&query[..3], 1),
            Err(RetrievalError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_assignment_follows_document_keys_with_gaps() {
        let mut db = DocumentVectorDb::new(["the", "a", "on"]);
        db.put_corpus(&[
            "the cat sat on the mat",
            "stocks fell sharply today",
            "heavy rain flooded the valley",
            "the cat slept on the mat",
            "stocks rose sharply today",
            "light rain flooded the valley",
        ])
        .unwrap();
        let removed = db.remove_vector(3).unwrap();
        assert_eq!(db.vector_count(), 5);

        let mut kmeans = KMeans::new(&db, 3).unwrap();
        assert!(kmeans.train().unwrap().is_converged());

        let clusters = kmeans.get_clusters();
        assert_eq!(clusters[0].get_indices(), &[0]);
        assert_eq!(clusters[1].get_indices(), &[1, 4]);
        assert_eq!(clusters[2].get_indices(), &[2, 5]);

        // The removed document can still be queried, it just is not a candidate
        let results = kmeans.infer(&removed, 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1, 0);

        let query = db.get_vector(4).unwrap().clone();
        let results = kmeans.infer(&query, 10).unwrap();
        assert_eq!(results[0], (0.0, 4));
        assert!(results.iter().all(|(_, index)| [1, 4].contains(index)));

        let info = kmeans.get_clusters_info(2).unwrap();
        assert!(
            info.iter()
                .flat_map(|cluster| &cluster.documents)
                .all(|document| document != "the cat slept on the mat")
        );
    }

    #[test]
    fn test_clusters_info_ranks_by_centroid_distance() {
        let db = animals_db();
        let mut kmeans = KMeans::new(&db, 2).unwrap();
        kmeans.train().unwrap();

        let info = kmeans.get_clusters_info(5).unwrap();
        assert_eq!(info.len(), 2);
        assert_eq!(info[0].cluster_id, 0);
        assert_eq!(info[0].documents.len(), 2);
        assert_eq!(info[1].documents, vec!["the dog ran"]);

        let limited = kmeans.get_clusters_info(1).unwrap();
        assert!(limited.iter().all(|cluster| cluster.documents.len() <= 1));
        assert!(kmeans.get_clusters_info(0).is_err());
    }

    #[test]
    fn test_square_sum() {
        let db = animals_db();
        let mut kmeans = KMeans::new(&db, 3).unwrap();
        kmeans.train().unwrap();
        // Every document is its own cluster
        assert!(kmeans.calculate_square_sum().unwrap().abs() < 1e-12);

        let mut coarse = KMeans::new(&db, 1).unwrap();
        coarse.train().unwrap();
        assert!(coarse.calculate_square_sum().unwrap() > 0.0);
    }

    #[test]
    fn test_mean_vector() {
        let a = [1.0, 2.0];
        let b = [3.0, 6.0];
        let mean = mean_vector([a.as_slice(), b.as_slice()].into_iter()).unwrap();
        assert_eq!(mean, vec![2.0, 4.0]);
        assert!(mean_vector(std::iter::empty::<&[f64]>()).is_err());
    }
}
