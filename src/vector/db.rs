//! In-memory document and vector store.
//!
//! The database owns the raw documents, their BM25 vectors and the tokenizer
//! and vectorizer that produced them, so every engine built on top of it
//! shares one vocabulary.
//!
//! # Index semantics
//! Documents are indexed densely from 0 in ingestion order, counting only the
//! documents that survived tokenization. The vector map is keyed by the same
//! index but may have gaps: a document whose vectorization produced nothing
//! usable keeps its document slot and simply has no vector.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info};

use crate::error::{RetrievalError, RetrievalResult};
use crate::text::{Bm25Params, Bm25Vectorizer, Tokenizer, Vectorizer};
use crate::vector::{Vector, VectorDimension};

/// Document and vector database.
#[derive(Debug, Clone)]
pub struct DocumentVectorDb {
    vectors: BTreeMap<usize, Vector>,
    documents: Vec<String>,
    tokenizer: Tokenizer,
    vectorizer: Bm25Vectorizer,
    dimension: Option<VectorDimension>,
}

impl DocumentVectorDb {
    /// Create an empty database with the given stop words and default BM25
    /// parameters.
    pub fn new<I, S>(stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::empty(stop_words, Bm25Params::default())
    }

    /// Create an empty database with custom BM25 parameters.
    ///
    /// Fails with [`RetrievalError::InvalidArgument`] when `k1` is not a
    /// positive finite number or `b` lies outside `[0, 1]`.
    pub fn with_bm25_params<I, S>(stop_words: I, params: Bm25Params) -> RetrievalResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        params.validate()?;
        Ok(Self::empty(stop_words, params))
    }

    fn empty<I, S>(stop_words: I, params: Bm25Params) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            vectors: BTreeMap::new(),
            documents: Vec::new(),
            tokenizer: Tokenizer::new(stop_words),
            vectorizer: Bm25Vectorizer::with_params(params),
            dimension: None,
        }
    }

    /// Fill documents and vectors from a corpus.
    ///
    /// Texts that tokenize to nothing are dropped silently. On error the
    /// database is left exactly as it was before the call.
    pub fn put_corpus<S: AsRef<str>>(&mut self, corpus: &[S]) -> RetrievalResult<()> {
        if corpus.is_empty() {
            return Err(RetrievalError::invalid_argument("corpus is empty"));
        }

        let mut documents = Vec::with_capacity(corpus.len());
        let mut tokenized_docs = Vec::with_capacity(corpus.len());
        for text in corpus {
            let tokens = self.tokenizer.tokenize(text.as_ref());
            if tokens.is_empty() {
                debug!("Dropping document with no usable tokens: {:?}", text.as_ref());
                continue;
            }
            documents.push(text.as_ref().to_string());
            tokenized_docs.push(tokens);
        }
        if tokenized_docs.is_empty() {
            return Err(RetrievalError::computation(
                "corpus tokenization",
                "every document tokenized to nothing",
            ));
        }

        let mut vectorizer = self.vectorizer.clone();
        vectorizer.set_tokenized_corpus(tokenized_docs.clone())?;
        vectorizer.build()?;
        let dimension = VectorDimension::new(vectorizer.dimension())?;

        let mut vectors = BTreeMap::new();
        for (index, tokens) in tokenized_docs.iter().enumerate() {
            match vectorizer
                .vectorize(tokens)
                .and_then(|vector| dimension.validate_vector(&vector).map(|()| vector))
            {
                Ok(vector) => {
                    vectors.insert(index, vector);
                }
                Err(e) => debug!("Document {index} could not be vectorized, skipping: {e}"),
            }
        }

        info!(
            received = corpus.len(),
            stop_words = self.tokenizer.stop_word_count(),
            documents = documents.len(),
            vectors = vectors.len(),
            dimension = dimension.get(),
            "Ingested corpus"
        );

        self.documents = documents;
        self.vectors = vectors;
        self.vectorizer = vectorizer;
        self.dimension = Some(dimension);
        Ok(())
    }

    /// Shared tokenizer.
    #[must_use]
    pub fn get_tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Shared, fitted vectorizer.
    #[must_use]
    pub fn get_vectorizer(&self) -> &Bm25Vectorizer {
        &self.vectorizer
    }

    /// Dimension of every stored vector, once a corpus has been ingested.
    #[must_use]
    pub fn dimension(&self) -> Option<VectorDimension> {
        self.dimension
    }

    /// `(index, vector)` pairs in ascending index order.
    ///
    /// `None` returns every stored pair. `Some(indices)` returns only pairs
    /// whose index appears in `indices`; an empty filter returns nothing.
    #[must_use]
    pub fn get_vectors(&self, indices: Option<&[usize]>) -> Vec<(usize, &Vector)> {
        match indices {
            None => self.vectors.iter().map(|(index, v)| (*index, v)).collect(),
            Some(filter) => {
                let wanted: HashSet<usize> = filter.iter().copied().collect();
                self.vectors
                    .iter()
                    .filter(|(index, _)| wanted.contains(index))
                    .map(|(index, v)| (*index, v))
                    .collect()
            }
        }
    }

    /// Vector stored for one document, if any.
    #[must_use]
    pub fn get_vector(&self, index: usize) -> Option<&Vector> {
        self.vectors.get(&index)
    }

    /// Raw documents.
    ///
    /// `None` returns every document. `Some(indices)` returns documents in
    /// the order of `indices`, keeping only the first occurrence of a
    /// repeated index.
    pub fn get_raw_documents(&self, indices: Option<&[usize]>) -> RetrievalResult<Vec<&str>> {
        let Some(indices) = indices else {
            return Ok(self.documents.iter().map(String::as_str).collect());
        };

        let mut seen = HashSet::with_capacity(indices.len());
        let mut documents = Vec::with_capacity(indices.len());
        for &index in indices {
            if !seen.insert(index) {
                continue;
            }
            let document = self.documents.get(index).ok_or_else(|| {
                RetrievalError::invalid_argument(format!(
                    "document index {index} is out of range (documents: {})",
                    self.documents.len()
                ))
            })?;
            documents.push(document.as_str());
        }
        Ok(documents)
    }

    /// Raw text of one document.
    #[must_use]
    pub fn get_document(&self, index: usize) -> Option<&str> {
        self.documents.get(index).map(String::as_str)
    }

    /// Number of stored documents.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Number of stored vectors.
    #[must_use]
    pub fn vector_count(&self) -> usize {
        self.vectors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Drop one stored vector, leaving its document in place.
    #[cfg(test)]
    pub(crate) fn remove_vector(&mut self, index: usize) -> Option<Vector> {
        self.vectors.remove(&index)
    }
}
