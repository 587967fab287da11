//! LLM provider abstraction
//!
//! Stages talk to the completion backend through [`LlmService`]. The concrete
//! provider is wrapped in [`ResilientService`] (per-attempt timeout, retries)
//! and [`LoggingService`] (structured request logs).

mod error;
mod openai;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use openai::OpenAIService;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Common interface for LLM providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

// ============================================================================
// Logging
// ============================================================================

/// Logging wrapper for LLM services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    messages = request.messages.len(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "LLM request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "LLM request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Timeout and retry
// ============================================================================

/// Attempt budget for a single logical completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    /// Delay before the second attempt; doubles for each later one
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(120),
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff: 1s, 2s, 4s with the default base
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * (1 << attempt.saturating_sub(1).min(16))
    }
}

/// Bounds every attempt with a timeout and retries retryable failures
pub struct ResilientService {
    inner: Arc<dyn LlmService>,
    policy: RetryPolicy,
}

impl ResilientService {
    pub fn new(inner: Arc<dyn LlmService>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl LlmService for ResilientService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let mut attempt = 1;
        loop {
            let result =
                match tokio::time::timeout(self.policy.attempt_timeout, self.inner.complete(request))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(LlmError::timeout(format!(
                        "No response within {}s",
                        self.policy.attempt_timeout.as_secs()
                    ))),
                };

            match result {
                Err(e) if e.kind.is_retryable() && attempt < self.policy.max_attempts => {
                    let delay = e.retry_after.unwrap_or_else(|| self.policy.delay_for(attempt));
                    tracing::warn!(
                        model = %self.inner.model_id(),
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = %delay.as_millis(),
                        error = %e.message,
                        "Retrying LLM request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}
