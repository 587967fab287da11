//! Retrieval over the mental-health knowledge base
//!
//! Retrieval is best effort. Stages log a [`RetrievalError`] and carry on
//! without context; an empty result means "nothing relevant".

mod corpus;
mod embedding;

pub use corpus::{KnowledgeBase, DEFAULT_DOCUMENTS};
pub use embedding::{cosine_similarity, Embedder, EmbeddingRetriever, OpenAIEmbedder};

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Snippets fetched per query unless configured otherwise
pub const DEFAULT_TOP_K: usize = 3;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("retrieval service unavailable: {0}")]
    Unavailable(String),

    #[error("retrieval service returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("failed to load knowledge base from {}: {source}", path.display())]
    KnowledgeBase {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Similarity search over a fixed corpus
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `k` snippets, best first; ties keep corpus order
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, RetrievalError>;

    /// Short label for logs
    fn name(&self) -> &str;
}

// ============================================================================
// Lexical retriever
// ============================================================================

const IGNORED_TERMS: &[&str] = &[
    "the", "and", "for", "with", "can", "are", "has", "have", "been", "you", "your", "this",
    "that", "was", "not", "but", "about", "into", "from", "help", "feel", "feeling",
];

/// Term-overlap scoring; needs no external service
pub struct LexicalRetriever {
    kb: Arc<KnowledgeBase>,
    index: Vec<HashSet<String>>,
}

impl LexicalRetriever {
    pub fn new(kb: Arc<KnowledgeBase>) -> Self {
        let index = kb.documents().iter().map(|d| terms(d)).collect();
        Self { kb, index }
    }
}

#[async_trait]
impl Retriever for LexicalRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, RetrievalError> {
        let query_terms = terms(query);

        let mut scored: Vec<(usize, usize)> = self
            .index
            .iter()
            .enumerate()
            .map(|(i, doc_terms)| (i, doc_terms.intersection(&query_terms).count()))
            .filter(|(_, score)| *score > 0)
            .collect();
        // Stable: equal scores keep corpus order
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, _)| self.kb.documents()[i].clone())
            .collect())
    }

    fn name(&self) -> &str {
        "lexical"
    }
}

/// Lowercased alphanumeric terms with a crude plural fold
fn terms(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 3 && !IGNORED_TERMS.contains(t))
        .map(|t| {
            t.strip_suffix('s')
                .filter(|stem| stem.len() >= 3 && !stem.ends_with('s'))
                .unwrap_or(t)
                .to_string()
        })
        .collect()
}

// ============================================================================
// Logging
// ============================================================================

/// Logging wrapper for retrievers
pub struct LoggingRetriever {
    inner: Arc<dyn Retriever>,
}

impl LoggingRetriever {
    pub fn new(inner: Arc<dyn Retriever>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Retriever for LoggingRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, RetrievalError> {
        let start = Instant::now();
        let result = self.inner.retrieve(query, k).await;
        let duration = start.elapsed();

        match &result {
            Ok(snippets) => {
                tracing::info!(
                    retriever = %self.inner.name(),
                    duration_ms = %duration.as_millis(),
                    k,
                    hits = snippets.len(),
                    "Retrieval completed"
                );
            }
            Err(e) => {
                tracing::warn!(
                    retriever = %self.inner.name(),
                    duration_ms = %duration.as_millis(),
                    error = %e,
                    "Retrieval failed"
                );
            }
        }

        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
