//! Tree-backed engines sharing the basic engine's indexing step.

use tracing::debug;

use crate::error::RetrievalResult;
use crate::text::{Tokenizer, Vectorizer};

use super::{BasicSearchEngine, KdTree, NaiveKdTree, Retriever};

/// Single nearest neighbour search over a [`NaiveKdTree`].
///
/// Whatever `n_neighbours` is requested, at most one document comes back.
#[derive(Debug)]
pub struct SearchEngine<'a> {
    base: BasicSearchEngine<'a>,
    tree: NaiveKdTree,
}

impl<'a> SearchEngine<'a> {
    pub fn new(tokenizer: &'a Tokenizer, vectorizer: &'a dyn Vectorizer) -> Self {
        Self {
            base: BasicSearchEngine::new(tokenizer, vectorizer),
            tree: NaiveKdTree::default(),
        }
    }

    /// Index documents and rebuild the tree over their vectors.
    pub fn index_documents<S: AsRef<str>>(&mut self, documents: &[S]) -> RetrievalResult<()> {
        self.base.index_documents(documents)?;
        self.tree = NaiveKdTree::build(self.base.document_vectors().to_vec())?;
        debug!("Built naive KD-tree over {} documents", documents.len());
        Ok(())
    }

    #[must_use]
    pub fn documents(&self) -> &[String] {
        self.base.documents()
    }
}

impl Retriever for SearchEngine<'_> {
    fn retrieve_relevant_documents(
        &mut self,
        query: &str,
        n_neighbours: usize,
    ) -> RetrievalResult<Vec<(f64, String)>> {
        let query_vector = self.base.prepare(query, n_neighbours)?;
        let hits = self.tree.query(&query_vector)?;
        self.base.resolve(hits)
    }
}

/// k nearest neighbour search over a [`KdTree`].
#[derive(Debug)]
pub struct AdvancedSearchEngine<'a> {
    base: BasicSearchEngine<'a>,
    tree: KdTree,
}

impl<'a> AdvancedSearchEngine<'a> {
    pub fn new(tokenizer: &'a Tokenizer, vectorizer: &'a dyn Vectorizer) -> Self {
        Self {
            base: BasicSearchEngine::new(tokenizer, vectorizer),
            tree: KdTree::default(),
        }
    }

    /// Index documents and rebuild the tree over their vectors.
    pub fn index_documents<S: AsRef<str>>(&mut self, documents: &[S]) -> RetrievalResult<()> {
        self.base.index_documents(documents)?;
        self.tree = KdTree::build(self.base.document_vectors().to_vec())?;
        debug!("Built KD-tree over {} documents", documents.len());
        Ok(())
    }

    #[must_use]
    pub fn documents(&self) -> &[String] {
        self.base.documents()
    }
}

impl Retriever for AdvancedSearchEngine<'_> {
    fn retrieve_relevant_documents(
        &mut self,
        query: &str,
        n_neighbours: usize,
    ) -> RetrievalResult<Vec<(f64, String)>> {
        let query_vector = self.base.prepare(query, n_neighbours)?;
        let hits = self.tree.query(&query_vector, n_neighbours)?;
        self.base.resolve(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RetrievalError;
    use crate::vector::DocumentVectorDb;

    fn animals_db() -> DocumentVectorDb {
        let mut db = DocumentVectorDb::new(["the", "and"]);
        db.put_corpus(&["the cat sat", "the dog ran", "cats and dogs play"])
            .unwrap();
        db
    }

    #[test]
    fn test_naive_engine_returns_single_nearest() {
        let db = animals_db();
        let mut engine = SearchEngine::new(db.get_tokenizer(), db.get_vectorizer());
        engine
            .index_documents(&db.get_raw_documents(None).unwrap())
            .unwrap();

        let results = engine.retrieve_relevant_documents("dog", 3).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1, "the dog ran");
    }

    #[test]
    fn test_advanced_engine_matches_exact_scan() {
        let db = animals_db();
        let documents = db.get_raw_documents(None).unwrap();

        let mut exact = BasicSearchEngine::new(db.get_tokenizer(), db.get_vectorizer());
        exact.index_documents(&documents).unwrap();
        let mut advanced = AdvancedSearchEngine::new(db.get_tokenizer(), db.get_vectorizer());
        advanced.index_documents(&documents).unwrap();

        for query in ["cat", "dog", "cats play"] {
            let expected = exact.retrieve_relevant_documents(query, 2).unwrap();
            let actual = advanced.retrieve_relevant_documents(query, 2).unwrap();
            assert_eq!(actual.len(), 2);
            for (a, e) in actual.iter().zip(&expected) {
                assert!((a.0 - e.0).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_unindexed_tree_engines_fail() {
        let db = animals_db();
        let mut engine = AdvancedSearchEngine::new(db.get_tokenizer(), db.get_vectorizer());
        assert!(matches!(
            engine.retrieve_relevant_documents("cat", 1),
            Err(RetrievalError::ComputationFailure { .. })
        ));
        assert!(engine.documents().is_empty());
    }
}
