/// The main library module for docluster
pub mod clustering;
pub mod config;
pub mod display;
pub mod error;
pub mod io;
pub mod search;
pub mod text;
pub mod vector;

// Explicit exports for better API clarity
pub use clustering::{ClusterDto, ClusterInfo, KMeans, TrainingOutcome};
pub use config::{EngineKind, Settings};
pub use error::{RetrievalError, RetrievalResult};
pub use search::{
    AdvancedSearchEngine, BasicSearchEngine, ClusteringSearchEngine, Retriever, SearchEngine,
    VectorDbEngine, VectorDbSearchEngine,
};
pub use text::{Bm25Params, Bm25Vectorizer, Tokenizer, Vectorizer};
pub use vector::{DocumentVectorDb, Vector, calculate_distance};
