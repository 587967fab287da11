//! Embedding-backed retrieval
//!
//! The corpus is embedded once, on first use, and cached for the life of the
//! retriever. Every query costs one embedding call.

use super::{KnowledgeBase, RetrievalError, Retriever};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Turns text into vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input, in input order
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError>;

    fn model_id(&self) -> &str;
}

// ============================================================================
// OpenAI-compatible embeddings endpoint
// ============================================================================

pub struct OpenAIEmbedder {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAIEmbedder {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RetrievalError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RetrievalError::Unavailable(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| RetrievalError::Unavailable(format!("Embedding request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RetrievalError::Unavailable(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(RetrievalError::Unavailable(format!("HTTP {status}: {body}")));
        }

        parse_embeddings(&body, inputs.len())
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

fn parse_embeddings(body: &str, expected: usize) -> Result<Vec<Vec<f32>>, RetrievalError> {
    let mut parsed: EmbeddingResponse = serde_json::from_str(body)
        .map_err(|e| RetrievalError::InvalidResponse(format!("{e} - body: {body}")))?;

    if parsed.data.len() != expected {
        return Err(RetrievalError::InvalidResponse(format!(
            "expected {expected} embeddings, got {}",
            parsed.data.len()
        )));
    }

    // Servers may answer out of order
    parsed.data.sort_by_key(|d| d.index);
    Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

// ============================================================================
// Retriever
// ============================================================================

/// Cosine-similarity search over an embedded corpus
pub struct EmbeddingRetriever {
    kb: Arc<KnowledgeBase>,
    embedder: Arc<dyn Embedder>,
    corpus: OnceCell<Vec<Vec<f32>>>,
}

impl EmbeddingRetriever {
    pub fn new(kb: Arc<KnowledgeBase>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            kb,
            embedder,
            corpus: OnceCell::new(),
        }
    }

    async fn corpus_vectors(&self) -> Result<&Vec<Vec<f32>>, RetrievalError> {
        self.corpus
            .get_or_try_init(|| async {
                tracing::debug!(
                    model = %self.embedder.model_id(),
                    documents = self.kb.len(),
                    "Embedding knowledge base"
                );
                let vectors = self.embedder.embed(self.kb.documents()).await?;
                if vectors.len() != self.kb.len() {
                    return Err(RetrievalError::InvalidResponse(format!(
                        "expected {} corpus embeddings, got {}",
                        self.kb.len(),
                        vectors.len()
                    )));
                }
                Ok(vectors)
            })
            .await
    }
}

#[async_trait]
impl Retriever for EmbeddingRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, RetrievalError> {
        if k == 0 || self.kb.is_empty() {
            return Ok(Vec::new());
        }

        let corpus = self.corpus_vectors().await?;
        let query_vector = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::InvalidResponse("no query embedding".to_string()))?;

        let mut scored: Vec<(&String, f32)> = self
            .kb
            .documents()
            .iter()
            .zip(corpus)
            .map(|(doc, vector)| (doc, cosine_similarity(&query_vector, vector)))
            .collect();
        // Stable: equal scores keep corpus order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(doc, _)| doc.clone())
            .collect())
    }

    fn name(&self) -> &str {
        "embedding"
    }
}

/// Cosine similarity; zero vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
