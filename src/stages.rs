//! Stage functions
//!
//! A stage reads the current [`ConversationState`], may talk to the user
//! through the [`Dialogue`], and returns a [`StateUpdate`] for the engine to
//! merge. Stages never see each other; everything flows through the state.

mod analysis;
mod assignment;
mod check_in;
mod counselor;
mod reception;
mod support;

pub use analysis::Analysis;
pub use assignment::Assignment;
pub use check_in::{CheckIn, StaticResponder};
pub use counselor::Counselor;
pub use reception::Reception;
pub use support::Support;

use crate::classifier::{Classifier, ClassifierMode};
use crate::console::Dialogue;
use crate::followup::{self, DEFAULT_ROUNDS};
use crate::llm::{LlmError, LlmRequest, LlmService};
use crate::prompts;
use crate::retrieval::{Retriever, DEFAULT_TOP_K};
use crate::state::{ConversationState, Message, StateUpdate};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Failures that abort the current stage and the run
#[derive(Debug, Error)]
pub enum StageError {
    #[error("completion backend unavailable: {0}")]
    Completion(#[from] LlmError),

    #[error("console I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One node of the workflow graph
#[async_trait]
pub trait Stage: Send + Sync {
    async fn run(
        &self,
        state: &ConversationState,
        dialogue: &mut Dialogue,
    ) -> Result<StateUpdate, StageError>;
}

// ============================================================================
// Shared services
// ============================================================================

/// Tunables shared by the stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOptions {
    /// How the analysis stage reads its single "how are you feeling" answer
    pub analysis_mode: ClassifierMode,
    pub follow_up_rounds: usize,
    pub top_k: usize,
    pub max_tokens: Option<u32>,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            analysis_mode: ClassifierMode::ExactFeeling,
            follow_up_rounds: DEFAULT_ROUNDS,
            top_k: DEFAULT_TOP_K,
            max_tokens: None,
        }
    }
}

/// Handles to the external collaborators, injected into every stage
#[derive(Clone)]
pub struct Services {
    pub llm: Arc<dyn LlmService>,
    /// `None` when retrieval augmentation is disabled
    pub retriever: Option<Arc<dyn Retriever>>,
    pub classifier: Arc<Classifier>,
    pub options: StageOptions,
}

impl Services {
    pub fn new(llm: Arc<dyn LlmService>, classifier: Arc<Classifier>) -> Self {
        Self {
            llm,
            retriever: None,
            classifier,
            options: StageOptions::default(),
        }
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn with_options(mut self, options: StageOptions) -> Self {
        self.options = options;
        self
    }

    pub fn retrieval_enabled(&self) -> bool {
        self.retriever.is_some()
    }

    /// Best-effort retrieval. Failures are logged and read as "no context".
    pub async fn retrieve(&self, query: &str) -> Vec<String> {
        let Some(retriever) = &self.retriever else {
            return Vec::new();
        };
        match retriever.retrieve(query, self.options.top_k).await {
            Ok(snippets) => snippets,
            Err(e) => {
                tracing::warn!(error = %e, "Continuing without retrieved context");
                Vec::new()
            }
        }
    }

    /// Complete `transcript` plus a trailing instruction, reasoning stripped
    pub async fn complete(
        &self,
        transcript: &[Message],
        instruction: String,
    ) -> Result<String, LlmError> {
        let request = LlmRequest::from_transcript(transcript)
            .with_system(prompts::SYSTEM_PROMPT)
            .with_instruction(instruction)
            .with_max_tokens(self.options.max_tokens);
        let response = self.llm.complete(&request).await?;
        Ok(followup::strip_reasoning(&response.text))
    }
}

/// `yes` or `y`, ignoring case and surrounding whitespace
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "yes" | "y")
}
