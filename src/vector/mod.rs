//! Vector storage for document retrieval.
//!
//! This module holds the document/vector database and the distance function
//! every retrieval strategy uses to compare vectors.
//!
//! # Architecture
//! Documents are tokenized and weighted with BM25 into dense vectors over a
//! sorted vocabulary. Vectors live in an ordered map keyed by document index
//! so iteration order is always the ingestion order.

mod db;
mod distance;
mod types;

pub use db::DocumentVectorDb;
pub use distance::{calculate_distance, squared_distance};
pub use types::{Vector, VectorDimension};
