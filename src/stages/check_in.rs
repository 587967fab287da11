//! Single-question check-in and its canned responders

use super::{Services, Stage, StageError};
use crate::console::{Dialogue, Reply};
use crate::prompts;
use crate::state::{ConversationState, Message, StateUpdate};
use async_trait::async_trait;

const SPEAKER: &str = "Check-in Agent";

/// Asks one question and classifies the answer lexically
pub struct CheckIn {
    services: Services,
}

impl CheckIn {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Stage for CheckIn {
    async fn run(
        &self,
        _state: &ConversationState,
        dialogue: &mut Dialogue,
    ) -> Result<StateUpdate, StageError> {
        let answer = match dialogue.ask(SPEAKER, prompts::CHECK_IN_QUESTION).await? {
            Reply::Cancelled => return Ok(StateUpdate::new().cancel()),
            Reply::Answer(answer) => answer,
        };

        let classifier = &self.services.classifier;
        let mood = classifier.classify(&answer);
        let unrecognized = classifier.unrecognized_terms(&answer);
        if !unrecognized.is_empty() {
            tracing::debug!(terms = ?unrecognized, "Terms outside the classifier vocabulary");
        }
        tracing::info!(mood = %mood, "Check-in classified");

        Ok(StateUpdate::new()
            .with_message(Message::user(answer))
            .with_mood(mood))
    }
}

/// Says a fixed response
pub struct StaticResponder {
    speaker: &'static str,
    text: &'static str,
}

impl StaticResponder {
    pub fn new(speaker: &'static str, text: &'static str) -> Self {
        Self { speaker, text }
    }
}

#[async_trait]
impl Stage for StaticResponder {
    async fn run(
        &self,
        _state: &ConversationState,
        dialogue: &mut Dialogue,
    ) -> Result<StateUpdate, StageError> {
        dialogue.say(self.speaker, self.text)?;
        Ok(StateUpdate::new().with_message(Message::assistant(self.text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use crate::state::Mood;
    use crate::testing::{MockLlmService, ScriptedConsole};
    use std::sync::Arc;

    fn services() -> Services {
        Services::new(
            Arc::new(MockLlmService::new("mock")),
            Arc::new(Classifier::new()),
        )
    }

    #[tokio::test]
    async fn test_check_in_sets_mood() {
        let mut dialogue = Dialogue::new(Box::new(ScriptedConsole::new(["Pretty worried lately"])));
        let update = CheckIn::new(services())
            .run(&ConversationState::new(), &mut dialogue)
            .await
            .unwrap();

        assert_eq!(update.mood, Some(Mood::Anxiety));
        assert_eq!(update.messages, vec![Message::user("Pretty worried lately")]);
    }

    #[tokio::test]
    async fn test_check_in_positive_answer() {
        let mut dialogue = Dialogue::new(Box::new(ScriptedConsole::new(["great"])));
        let update = CheckIn::new(services())
            .run(&ConversationState::new(), &mut dialogue)
            .await
            .unwrap();
        assert_eq!(update.mood, Some(Mood::Positive));
    }

    #[tokio::test]
    async fn test_check_in_exit() {
        let mut dialogue = Dialogue::new(Box::new(ScriptedConsole::new(["exit"])));
        let update = CheckIn::new(services())
            .run(&ConversationState::new(), &mut dialogue)
            .await
            .unwrap();
        assert!(update.cancelled);
        assert!(update.mood.is_none());
    }

    #[tokio::test]
    async fn test_responder_says_only_its_text() {
        let console = ScriptedConsole::new(Vec::<String>::new());
        let output = console.output_handle();
        let mut dialogue = Dialogue::new(Box::new(console));

        let update = StaticResponder::new("Anxiety Agent", prompts::ANXIETY_RESPONSE)
            .run(&ConversationState::new(), &mut dialogue)
            .await
            .unwrap();

        assert_eq!(update.messages, vec![Message::assistant(prompts::ANXIETY_RESPONSE)]);
        let shown: Vec<_> = output.lock().unwrap().iter().map(|(_, t)| t.clone()).collect();
        assert_eq!(shown, vec![prompts::ANXIETY_RESPONSE]);
    }
}
