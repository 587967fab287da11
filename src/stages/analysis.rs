//! Asks how the user feels and, for negative answers, why

use super::{Services, Stage, StageError};
use crate::console::{Dialogue, Reply};
use crate::prompts;
use crate::state::{ConversationState, StateUpdate};
use async_trait::async_trait;

const SPEAKER: &str = "Analysis Agent";

/// Collects the feeling answer. Mood assignment is left to the assignment
/// stage, which sees the whole transcript.
pub struct Analysis {
    services: Services,
}

impl Analysis {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Stage for Analysis {
    async fn run(
        &self,
        _state: &ConversationState,
        dialogue: &mut Dialogue,
    ) -> Result<StateUpdate, StageError> {
        let mut update = StateUpdate::new();

        let feeling = match dialogue.ask(SPEAKER, prompts::FEELING_QUESTION).await? {
            Reply::Cancelled => return Ok(update.cancel()),
            Reply::Answer(feeling) => feeling,
        };
        update.push_user(feeling.clone());

        let mode = self.services.options.analysis_mode;
        let mood = self.services.classifier.classify_with(mode, &feeling);
        tracing::debug!(?mode, ?mood, "Feeling answer classified");

        if mood.is_some_and(|m| m.is_negative()) {
            match dialogue.ask(SPEAKER, prompts::ELABORATION_QUESTION).await? {
                Reply::Cancelled => return Ok(update.cancel()),
                Reply::Answer(reason) => update.push_user(reason),
            }
        }

        Ok(update)
    }
}
