//! Test: Settings files drive corpus ingestion
//!
//! Loads settings from a temp directory and builds a database from them.

use docluster::config::ClusteringConfig;
use docluster::io::read_corpus;
use docluster::{DocumentVectorDb, EngineKind, Settings, VectorDbEngine};
use tempfile::TempDir;

#[test]
fn test_settings_file_configures_search() {
    let temp_dir = TempDir::new().unwrap();
    let stop_words_path = temp_dir.path().join("stop_words.txt");
    std::fs::write(&stop_words_path, "and\n").unwrap();

    let settings_path = temp_dir.path().join("settings.toml");
    let settings_content = format!(
        r#"
[corpus]
stop_words = ["the"]
stop_words_path = "{}"

[clustering]
n_clusters = 2

[search]
engine = "basic"
n_neighbours = 2
"#,
        stop_words_path.display()
    );
    std::fs::write(&settings_path, settings_content).unwrap();

    let corpus_path = temp_dir.path().join("corpus.txt");
    std::fs::write(&corpus_path, "the cat sat\nthe dog ran\n\ncats and dogs play\n").unwrap();

    let settings = Settings::load_from(&settings_path).expect("Should load settings");
    assert_eq!(settings.search.engine, EngineKind::Basic);
    assert_eq!(settings.stop_words().unwrap(), vec!["the", "and"]);

    let documents = read_corpus(&corpus_path).unwrap();
    let mut db =
        DocumentVectorDb::with_bm25_params(settings.stop_words().unwrap(), settings.bm25.into())
            .unwrap();
    db.put_corpus(&documents).unwrap();
    assert_eq!(db.document_count(), 3);
    assert!(!db.get_vectorizer().vocabulary().contains(&"and".to_string()));

    let mut engine =
        VectorDbEngine::from_kind(&db, settings.search.engine, &settings.clustering).unwrap();
    let results = engine
        .retrieve_relevant_documents("cat", settings.search.n_neighbours)
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].1, "the cat sat");
}

#[test]
fn test_saved_settings_round_trip_clustering() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join(".docluster").join("settings.toml");

    let mut settings = Settings::default();
    settings.clustering = ClusteringConfig {
        n_clusters: 4,
        convergence_threshold: 1e-5,
        max_iterations: 25,
    };
    settings.save(&settings_path).unwrap();

    let loaded = Settings::load_from(&settings_path).unwrap();
    assert_eq!(loaded.clustering, settings.clustering);
}
