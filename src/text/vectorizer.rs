//! Fixed-vocabulary vectorizers.
//!
//! A vectorizer is fitted once on a tokenized corpus and then maps any
//! tokenized document onto a vector with one slot per vocabulary term.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::error::{RetrievalError, RetrievalResult};
use crate::text::bm25::{Bm25Params, calculate_bm25, calculate_idf};
use crate::vector::Vector;

/// Maps tokenized documents to fixed-length score vectors.
pub trait Vectorizer {
    /// Produce a vector for `tokenized_document`.
    ///
    /// Must only be called after the vectorizer was fitted on a corpus.
    fn vectorize(&self, tokenized_document: &[String]) -> RetrievalResult<Vector>;

    /// Number of dimensions of produced vectors.
    fn dimension(&self) -> usize;

    /// Vocabulary terms with a non-zero weight in `vector`.
    fn vector2tokens(&self, vector: &[f64]) -> Vec<String>;
}

/// BM25 vectorizer.
#[derive(Debug, Clone, Default)]
pub struct Bm25Vectorizer {
    params: Bm25Params,
    corpus: Vec<Vec<String>>,
    avg_doc_len: f64,
    vocabulary: Vec<String>,
    token2ind: HashMap<String, usize>,
    idf_values: HashMap<String, f64>,
}

impl Bm25Vectorizer {
    /// Create an unfitted vectorizer with default BM25 parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unfitted vectorizer with custom BM25 parameters.
    #[must_use]
    pub fn with_params(params: Bm25Params) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Store the tokenized corpus and its average document length.
    pub fn set_tokenized_corpus(&mut self, tokenized_corpus: Vec<Vec<String>>) -> RetrievalResult<()> {
        if tokenized_corpus.is_empty() {
            return Err(RetrievalError::invalid_argument(
                "tokenized corpus must contain at least one document",
            ));
        }
        let total_tokens: usize = tokenized_corpus.iter().map(Vec::len).sum();
        self.avg_doc_len = total_tokens as f64 / tokenized_corpus.len() as f64;
        self.corpus = tokenized_corpus;
        Ok(())
    }

    /// Build vocabulary, term positions and IDF values from the stored corpus.
    pub fn build(&mut self) -> RetrievalResult<()> {
        self.params.validate()?;
        if self.corpus.is_empty() {
            return Err(RetrievalError::computation(
                "vectorizer build",
                "no tokenized corpus was set",
            ));
        }

        let unique: BTreeSet<&String> = self.corpus.iter().flatten().collect();
        self.vocabulary = unique.into_iter().cloned().collect();
        if self.vocabulary.is_empty() {
            return Err(RetrievalError::computation(
                "vectorizer build",
                "corpus has an empty vocabulary",
            ));
        }

        self.token2ind = self
            .vocabulary
            .iter()
            .enumerate()
            .map(|(index, term)| (term.clone(), index))
            .collect();
        self.idf_values = calculate_idf(&self.vocabulary, &self.corpus);

        debug!(
            vocabulary = self.vocabulary.len(),
            documents = self.corpus.len(),
            avg_doc_len = self.avg_doc_len,
            "Fitted BM25 vectorizer"
        );
        Ok(())
    }

    /// Vocabulary in vector slot order.
    #[must_use]
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Average tokenized document length of the fitted corpus.
    #[must_use]
    pub fn avg_doc_len(&self) -> f64 {
        self.avg_doc_len
    }
}

impl Vectorizer for Bm25Vectorizer {
    fn vectorize(&self, tokenized_document: &[String]) -> RetrievalResult<Vector> {
        if tokenized_document.is_empty() {
            return Err(RetrievalError::invalid_argument(
                "cannot vectorize an empty token list",
            ));
        }
        if self.vocabulary.is_empty() {
            return Err(RetrievalError::computation(
                "vectorization",
                "vectorizer has not been built",
            ));
        }

        let scores = calculate_bm25(
            &self.vocabulary,
            tokenized_document,
            &self.idf_values,
            self.params,
            self.avg_doc_len,
            tokenized_document.len(),
        )
        .ok_or_else(|| RetrievalError::computation("vectorization", "BM25 produced no scores"))?;

        let mut vector = vec![0.0; self.vocabulary.len()];
        for (term, index) in &self.token2ind {
            if let Some(score) = scores.get(term) {
                if !score.is_finite() {
                    return Err(RetrievalError::computation(
                        "vectorization",
                        format!("BM25 score for {term:?} is not finite"),
                    ));
                }
                vector[*index] = *score;
            }
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    fn vector2tokens(&self, vector: &[f64]) -> Vec<String> {
        vector
            .iter()
            .zip(&self.vocabulary)
            .filter(|(score, _)| **score != 0.0)
            .map(|(_, term)| term.clone())
            .collect()
    }
}
