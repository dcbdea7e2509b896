//! Test: End-to-end retrieval through the public API
//!
//! Ingests small corpora into a DocumentVectorDb and queries every engine.

use docluster::config::ClusteringConfig;
use docluster::{
    ClusteringSearchEngine, DocumentVectorDb, EngineKind, RetrievalError, Retriever,
    VectorDbEngine,
};

const ANIMALS: [&str; 3] = ["the cat sat", "the dog ran", "cats and dogs play"];

fn animals_db() -> DocumentVectorDb {
    let mut db = DocumentVectorDb::new(["the", "and"]);
    db.put_corpus(&ANIMALS).expect("corpus should ingest");
    db
}

#[test]
fn test_clustering_engine_finds_cat_document() {
    let db = animals_db();
    let mut engine = ClusteringSearchEngine::new(&db, 2).unwrap();

    let results = engine.retrieve_relevant_documents("cat", 1).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].1, "the cat sat");

    let clusters = engine.kmeans().get_clusters();
    assert_eq!(clusters[0].get_indices(), &[0, 2]);
    assert_eq!(clusters[1].get_indices(), &[1]);
}

#[test]
fn test_results_are_bounded_and_ascending() {
    let db = animals_db();
    let config = ClusteringConfig::with_clusters(1);

    for kind in [EngineKind::Basic, EngineKind::Advanced, EngineKind::Clustering] {
        let mut engine = VectorDbEngine::from_kind(&db, kind, &config).unwrap();
        for n in [1, 2, 3, 50] {
            let results = engine.retrieve_relevant_documents("dogs play", n).unwrap();
            assert!(results.len() <= n, "{kind:?} returned too many for n={n}");
            assert!(
                results.windows(2).all(|pair| pair[0].0 <= pair[1].0),
                "{kind:?} results out of order"
            );
        }
        // A single cluster holds everything, so every engine sees the whole corpus
        let all = engine.retrieve_relevant_documents("dogs play", 50).unwrap();
        assert_eq!(all.len(), ANIMALS.len(), "{kind:?}");
        assert_eq!(all[0].1, "cats and dogs play", "{kind:?}");
    }
}

#[test]
fn test_empty_corpus_is_rejected() {
    let mut db = DocumentVectorDb::new(["the"]);
    let empty: [&str; 0] = [];
    assert!(matches!(
        db.put_corpus(&empty),
        Err(RetrievalError::InvalidArgument { .. })
    ));
    assert!(matches!(
        db.put_corpus(&["the", "42 !!"]),
        Err(RetrievalError::ComputationFailure { .. })
    ));
    assert!(db.is_empty());
}

#[test]
fn test_unusable_documents_are_dropped() {
    let mut db = DocumentVectorDb::new(["the"]);
    db.put_corpus(&["the cat sat", "the", "the dog ran"]).unwrap();

    assert_eq!(db.document_count(), 2);
    assert_eq!(
        db.get_raw_documents(None).unwrap(),
        vec!["the cat sat", "the dog ran"]
    );
    assert_eq!(
        db.get_raw_documents(Some(&[1, 0, 1][..])).unwrap(),
        vec!["the dog ran", "the cat sat"]
    );
}

#[test]
fn test_clustering_retrains_on_every_query() {
    let db = animals_db();
    let mut engine = ClusteringSearchEngine::new(&db, 2).unwrap();

    let first = engine.retrieve_relevant_documents("dog", 2).unwrap();
    let centroids: Vec<Vec<f64>> = engine
        .kmeans()
        .get_clusters()
        .iter()
        .map(|cluster| cluster.get_centroid().to_vec())
        .collect();

    let second = engine.retrieve_relevant_documents("dog", 2).unwrap();
    assert_eq!(first, second);
    for (cluster, centroid) in engine.kmeans().get_clusters().iter().zip(&centroids) {
        assert_eq!(cluster.get_centroid(), centroid.as_slice());
    }
}

#[test]
fn test_query_of_stop_words_fails() {
    let db = animals_db();
    let mut engine = VectorDbEngine::exact(&db);
    assert!(matches!(
        engine.retrieve_relevant_documents("the and", 1),
        Err(RetrievalError::ComputationFailure { .. })
    ));
    assert!(matches!(
        engine.retrieve_relevant_documents("", 1),
        Err(RetrievalError::InvalidArgument { .. })
    ));
}
