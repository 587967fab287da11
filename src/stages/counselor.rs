//! Crisis escalation. Always the fixed resource message, never generated.

use super::{Stage, StageError};
use crate::console::Dialogue;
use crate::prompts::CRISIS_RESOURCES;
use crate::state::{ConversationState, Message, StateUpdate};
use async_trait::async_trait;

const SPEAKER: &str = "Counselor Recommendation";

pub struct Counselor;

#[async_trait]
impl Stage for Counselor {
    async fn run(
        &self,
        state: &ConversationState,
        dialogue: &mut Dialogue,
    ) -> Result<StateUpdate, StageError> {
        tracing::warn!(mood = ?state.mood, "Escalating to crisis resources");
        dialogue.say(SPEAKER, CRISIS_RESOURCES)?;
        Ok(StateUpdate::new()
            .with_message(Message::assistant(CRISIS_RESOURCES))
            .with_awaiting_follow_up(false))
    }
}
