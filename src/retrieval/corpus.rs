//! Knowledge base corpus

use super::RetrievalError;
use std::path::Path;

/// Snippets shipped with the binary
pub const DEFAULT_DOCUMENTS: &[&str] = &[
    "Cognitive Behavioral Therapy (CBT) is effective for anxiety management.",
    "Mindfulness techniques can help reduce stress and improve emotional regulation.",
    "Signs of depression include persistent sadness and loss of interest in activities.",
    "Regular exercise has been shown to improve mood and reduce anxiety symptoms.",
    "The suicide prevention hotline is available 24/7 at 1-800-273-TALK.",
    "Maintaining a consistent sleep schedule helps with emotional stability.",
    "Social connections are crucial for mental health maintenance.",
    "Breathing exercises can help manage acute anxiety attacks.",
];

/// Ordered, immutable corpus. Position in the corpus breaks score ties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeBase {
    documents: Vec<String>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::from_documents(DEFAULT_DOCUMENTS.iter().copied())
    }
}

impl KnowledgeBase {
    pub fn from_documents<I, S>(documents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            documents: documents.into_iter().map(Into::into).collect(),
        }
    }

    /// Load a corpus with one snippet per non-empty line
    pub fn from_file(path: &Path) -> Result<Self, RetrievalError> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| RetrievalError::KnowledgeBase {
                path: path.to_path_buf(),
                source,
            })?;

        let kb = Self::from_documents(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        );

        if kb.is_empty() {
            tracing::warn!(path = %path.display(), "Knowledge base file has no snippets");
        } else {
            tracing::info!(path = %path.display(), documents = kb.len(), "Loaded knowledge base");
        }
        Ok(kb)
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
