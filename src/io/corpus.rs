//! Corpus loading.

use std::path::Path;

use anyhow::Context;

use crate::text::get_paragraphs;

/// Read a text file and split it into one document per non-blank line.
pub fn read_corpus(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus file '{}'", path.display()))?;
    let documents = get_paragraphs(&text)
        .with_context(|| format!("Corpus file '{}' is empty", path.display()))?;
    tracing::debug!("Read {} documents from {}", documents.len(), path.display());
    Ok(documents)
}
