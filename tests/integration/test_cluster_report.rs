//! Test: Cluster reports written to disk
//!
//! Trains on a corpus with three obvious topics and checks the JSON report.

use docluster::{ClusterInfo, ClusteringSearchEngine, DocumentVectorDb, RetrievalError};
use tempfile::TempDir;

/// Three topics with two documents each. Every shared topic word appears in
/// two of six documents, so its IDF stays positive.
fn topics_db() -> DocumentVectorDb {
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
    db
}

fn topic(document: &str) -> &'static str {
    if document.contains("cat") {
        "cats"
    } else if document.contains("stocks") {
        "markets"
    } else {
        "weather"
    }
}

#[test]
fn test_report_groups_topics() {
    let db = topics_db();
    let mut engine = ClusteringSearchEngine::new(&db, 3).unwrap();
    let outcome = engine.train().unwrap();
    assert!(outcome.is_converged());

    let temp_dir = TempDir::new().unwrap();
    let report_path = temp_dir.path().join("cluster_report.json");
    engine.make_report(5, &report_path).unwrap();

    let contents = std::fs::read_to_string(&report_path).unwrap();
    let report: Vec<ClusterInfo> = serde_json::from_str(&contents).unwrap();
    assert_eq!(report.len(), 3);

    for cluster in &report {
        assert_eq!(cluster.documents.len(), 2, "{:?}", cluster.documents);
        let first = topic(&cluster.documents[0]);
        assert!(
            cluster.documents.iter().all(|d| topic(d) == first),
            "cluster {} mixes topics: {:?}",
            cluster.cluster_id,
            cluster.documents
        );
    }
}

#[test]
fn test_report_limits_examples() {
    let db = topics_db();
    let mut engine = ClusteringSearchEngine::new(&db, 3).unwrap();
    engine.train().unwrap();

    let temp_dir = TempDir::new().unwrap();
    let report_path = temp_dir.path().join("report.json");
    let written = engine.make_report(1, &report_path).unwrap();
    assert!(written.iter().all(|cluster| cluster.documents.len() == 1));

    assert!(matches!(
        engine.make_report(0, &report_path),
        Err(RetrievalError::InvalidArgument { .. })
    ));
}

#[test]
fn test_square_sum_drops_with_more_clusters() {
    let db = topics_db();

    let mut coarse = ClusteringSearchEngine::new(&db, 1).unwrap();
    coarse.train().unwrap();
    let mut fine = ClusteringSearchEngine::new(&db, 3).unwrap();
    fine.train().unwrap();

    let coarse_sse = coarse.calculate_square_sum().unwrap();
    let fine_sse = fine.calculate_square_sum().unwrap();
    assert!(fine_sse < coarse_sse);
    assert!(fine_sse >= 0.0);
}
