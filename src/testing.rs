//! Mock implementations for testing
//!
//! These mocks enable stage and workflow tests without a terminal, a
//! completion backend, or a knowledge base.

use crate::console::{Console, Dialogue};
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use crate::retrieval::{RetrievalError, Retriever};
use crate::stages::{Stage, StageError};
use crate::state::{ConversationState, StateUpdate};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Mock LLM Service
// ============================================================================

/// Mock completion backend that returns queued responses
pub struct MockLlmService {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    delay: Option<Duration>,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmService {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before answering each request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue a successful plain-text response
    pub fn queue_text(&self, text: impl Into<String>) {
        self.queue_response(LlmResponse::text(text));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Scripted Console
// ============================================================================

/// Console fed from a fixed script. Output is captured as `(speaker, text)`.
pub struct ScriptedConsole {
    input: Arc<Mutex<VecDeque<String>>>,
    output: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedConsole {
    pub fn new<I>(lines: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            input: Arc::new(Mutex::new(lines.into_iter().map(Into::into).collect())),
            output: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Lines not yet read, shared with the console after it is boxed
    pub fn remaining_handle(&self) -> Arc<Mutex<VecDeque<String>>> {
        Arc::clone(&self.input)
    }

    /// Everything shown so far
    pub fn output_handle(&self) -> Arc<Mutex<Vec<(String, String)>>> {
        Arc::clone(&self.output)
    }
}

#[async_trait]
impl Console for ScriptedConsole {
    async fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.input.lock().unwrap().pop_front())
    }

    fn show(&mut self, speaker: &str, text: &str) -> io::Result<()> {
        self.output
            .lock()
            .unwrap()
            .push((speaker.to_string(), text.to_string()));
        Ok(())
    }
}

// ============================================================================
// Mock Retriever
// ============================================================================

/// Retriever that returns queued results, empty once the queue runs dry
#[derive(Default)]
pub struct MockRetriever {
    results: Mutex<VecDeque<Result<Vec<String>, RetrievalError>>>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl MockRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_snippets<I>(&self, snippets: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let snippets = snippets.into_iter().map(Into::into).collect();
        self.results.lock().unwrap().push_back(Ok(snippets));
    }

    pub fn queue_error(&self, error: RetrievalError) {
        self.results.lock().unwrap().push_back(Err(error));
    }

    /// `(query, k)` for every call
    pub fn recorded_queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, RetrievalError> {
        self.queries.lock().unwrap().push((query.to_string(), k));
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Function Stage
// ============================================================================

/// Stage backed by a plain function of the state, for graph tests
pub struct FnStage {
    f: Box<dyn Fn(&ConversationState) -> StateUpdate + Send + Sync>,
}

impl FnStage {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ConversationState) -> StateUpdate + Send + Sync + 'static,
    {
        Self { f: Box::new(f) }
    }
}

#[async_trait]
impl Stage for FnStage {
    async fn run(
        &self,
        state: &ConversationState,
        _dialogue: &mut Dialogue,
    ) -> Result<StateUpdate, StageError> {
        Ok((self.f)(state))
    }
}
