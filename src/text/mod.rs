//! Text processing collaborators: tokenization and BM25 vectorization.
//!
//! These are the pieces the vector database consumes through narrow
//! interfaces. Tokenizing turns raw text into normalized terms, the BM25
//! functions weight those terms and the vectorizer lays the weights out on a
//! fixed vocabulary.

pub mod bm25;
mod tokenizer;
mod vectorizer;

pub use bm25::{Bm25Params, calculate_bm25, calculate_idf};
pub use tokenizer::Tokenizer;
pub use vectorizer::{Bm25Vectorizer, Vectorizer};

use crate::error::{RetrievalError, RetrievalResult};

/// Split a text into trimmed, non-blank paragraphs (one per line).
pub fn get_paragraphs(text: &str) -> RetrievalResult<Vec<String>> {
    if text.is_empty() {
        return Err(RetrievalError::invalid_argument(
            "cannot split an empty text into paragraphs",
        ));
    }
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .map(str::to_string)
        .collect())
}
