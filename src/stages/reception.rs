//! Greets the user and collects an opening statement

use super::{Stage, StageError};
use crate::console::{Dialogue, Reply};
use crate::prompts;
use crate::state::{ConversationState, Message, StateUpdate};
use async_trait::async_trait;

const SPEAKER: &str = "Reception Agent";

pub struct Reception;

#[async_trait]
impl Stage for Reception {
    async fn run(
        &self,
        _state: &ConversationState,
        dialogue: &mut Dialogue,
    ) -> Result<StateUpdate, StageError> {
        dialogue.say(SPEAKER, prompts::RECEPTION_GREETING)?;

        match dialogue.ask(SPEAKER, prompts::RECEPTION_QUESTION).await? {
            Reply::Cancelled => Ok(StateUpdate::new().cancel()),
            Reply::Answer(opening) => Ok(StateUpdate::new().with_message(Message::user(opening))),
        }
    }
}
