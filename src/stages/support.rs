//! Optional secondary support, then the farewell

use super::{is_affirmative, Services, Stage, StageError};
use crate::console::{Dialogue, Reply};
use crate::prompts;
use crate::state::{ConversationState, StateUpdate};
use async_trait::async_trait;

const SPEAKER: &str = "Support Agent";
const RECOMMENDATION_SPEAKER: &str = "Support Agent Recommendations";

pub struct Support {
    services: Services,
}

impl Support {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Stage for Support {
    async fn run(
        &self,
        state: &ConversationState,
        dialogue: &mut Dialogue,
    ) -> Result<StateUpdate, StageError> {
        let mut update = StateUpdate::new().with_awaiting_follow_up(false);

        if state.awaiting_follow_up {
            let wants_more = match dialogue.ask(SPEAKER, prompts::SUPPORT_QUESTION).await? {
                Reply::Cancelled => return Ok(update.cancel()),
                Reply::Answer(answer) => {
                    let wants_more = is_affirmative(&answer);
                    update.push_user(format!("{} {answer}", prompts::SUPPORT_QUESTION));
                    wants_more
                }
            };

            if wants_more {
                let details =
                    match dialogue.ask(SPEAKER, prompts::SUPPORT_DETAILS_QUESTION).await? {
                        Reply::Cancelled => return Ok(update.cancel()),
                        Reply::Answer(details) => details,
                    };
                update.push_user(format!("{} {details}", prompts::SUPPORT_DETAILS_QUESTION));

                let resources = self.services.retrieve(&details).await;
                let recommendations = self
                    .services
                    .complete(
                        &update.transcript_after(state),
                        prompts::support_instruction(&details, &resources),
                    )
                    .await?;
                update = update.with_context(resources);

                dialogue.say(RECOMMENDATION_SPEAKER, &recommendations)?;
                update.push_assistant(recommendations);
            } else {
                dialogue.say(SPEAKER, prompts::SUPPORT_DECLINED)?;
            }
        }

        dialogue.say(SPEAKER, prompts::FAREWELL)?;
        Ok(update)
    }
}
