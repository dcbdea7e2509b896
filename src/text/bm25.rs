//! Inverse document frequency and BM25 term weighting.
//!
//! Both functions are pure: they take a vocabulary and tokenized documents
//! and return per-term scores without touching any shared state.

use std::collections::HashMap;

use crate::error::{RetrievalError, RetrievalResult};

/// Default BM25 term-frequency saturation.
pub const DEFAULT_K1: f64 = 1.5;

/// Default BM25 length normalization.
pub const DEFAULT_B: f64 = 0.75;

/// Tunable BM25 parameters.
///
/// `k1` must be positive and finite, `b` must lie in `[0, 1]`. Outside those
/// ranges the score denominator can reach zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
}

impl Bm25Params {
    /// Validated parameters.
    pub fn new(k1: f64, b: f64) -> RetrievalResult<Self> {
        let params = Self { k1, b };
        params.validate()?;
        Ok(params)
    }

    /// Reject parameters that make the BM25 formula undefined.
    pub fn validate(&self) -> RetrievalResult<()> {
        if !self.k1.is_finite() || self.k1 <= 0.0 {
            return Err(RetrievalError::invalid_argument(format!(
                "BM25 k1 must be a positive finite number, got {}",
                self.k1
            )));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(RetrievalError::invalid_argument(format!(
                "BM25 b must lie in [0, 1], got {}",
                self.b
            )));
        }
        Ok(())
    }
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: DEFAULT_K1,
            b: DEFAULT_B,
        }
    }
}

/// Computes `ln((N - n + 0.5) / (n + 0.5))` for every vocabulary term.
///
/// `n` is the number of documents containing the term. Terms present in more
/// than half of the corpus get a negative weight.
pub fn calculate_idf(vocabulary: &[String], documents: &[Vec<String>]) -> HashMap<String, f64> {
    let total = documents.len() as f64;
    vocabulary
        .iter()
        .map(|term| {
            let containing = documents
                .iter()
                .filter(|doc| doc.iter().any(|token| token == term))
                .count() as f64;
            let idf = ((total - containing + 0.5) / (containing + 0.5)).ln();
            (term.clone(), idf)
        })
        .collect()
}

/// Scores every vocabulary term against one tokenized document.
///
/// Returns `None` when the inputs cannot produce a score: empty vocabulary,
/// empty document or a non-positive average length.
pub fn calculate_bm25(
    vocabulary: &[String],
    document: &[String],
    idf: &HashMap<String, f64>,
    params: Bm25Params,
    avg_doc_len: f64,
    doc_len: usize,
) -> Option<HashMap<String, f64>> {
    if vocabulary.is_empty() || document.is_empty() || avg_doc_len <= 0.0 {
        return None;
    }

    let mut frequencies: HashMap<&str, usize> = HashMap::new();
    for token in document {
        *frequencies.entry(token.as_str()).or_default() += 1;
    }

    let length_norm = 1.0 - params.b + params.b * doc_len as f64 / avg_doc_len;
    let scores = vocabulary
        .iter()
        .map(|term| {
            let tf = frequencies.get(term.as_str()).copied().unwrap_or(0) as f64;
            let weight = idf.get(term).copied().unwrap_or(0.0);
            let score = weight * tf * (params.k1 + 1.0) / (tf + params.k1 * length_norm);
            (term.clone(), score)
        })
        .collect();

    Some(scores)
}
