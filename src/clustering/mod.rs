//! K-means clustering over the document vector database.
//!
//! Training partitions the stored vectors into a fixed number of clusters;
//! inference then searches only the cluster nearest to a query, trading
//! recall for fewer distance computations.

mod cluster;
mod kmeans;

pub use cluster::ClusterDto;
pub use kmeans::{
    ClusterInfo, DEFAULT_CONVERGENCE_THRESHOLD, DEFAULT_MAX_ITERATIONS, KMeans, TrainingOutcome,
};
