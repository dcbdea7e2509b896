//! Stop-word aware tokenizer.

use std::collections::HashSet;

use crate::error::{RetrievalError, RetrievalResult};

/// Turns raw text into lowercase alphabetic tokens with stop words removed.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    stop_words: HashSet<String>,
}

impl Tokenizer {
    /// Create a tokenizer that drops the given stop words.
    ///
    /// Stop words are matched after lowercasing, so `"The"` and `"the"`
    /// behave the same.
    pub fn new<I, S>(stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stop_words: stop_words
                .into_iter()
                .map(|word| word.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Tokenize a single text.
    ///
    /// Characters that are neither alphabetic nor whitespace are removed
    /// before splitting, so `"dog's"` becomes `"dogs"`. An empty result
    /// means the text has nothing usable.
    #[must_use]
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphabetic() || c.is_whitespace())
            .collect();

        cleaned
            .split_whitespace()
            .filter(|token| !self.stop_words.contains(*token))
            .map(str::to_string)
            .collect()
    }

    /// Tokenize every text of a corpus, preserving order.
    pub fn tokenize_documents<S: AsRef<str>>(
        &self,
        documents: &[S],
    ) -> RetrievalResult<Vec<Vec<String>>> {
        if documents.is_empty() {
            return Err(RetrievalError::invalid_argument(
                "cannot tokenize an empty list of documents",
            ));
        }
        Ok(documents
            .iter()
            .map(|doc| self.tokenize(doc.as_ref()))
            .collect())
    }

    /// Number of configured stop words.
    #[must_use]
    pub fn stop_word_count(&self) -> usize {
        self.stop_words.len()
    }
}
