//! Settles the mood, asks the tailored questions, and synthesises advice
//!
//! Order within the stage is fixed: classify, retrieve, ask, generate. A
//! crisis mood skips generation entirely so escalation never waits on the
//! completion backend.

use super::{Services, Stage, StageError};
use crate::console::{Dialogue, Reply};
use crate::followup::FollowUpProtocol;
use crate::prompts;
use crate::state::{ConversationState, Mood, StateUpdate};
use async_trait::async_trait;

const SPEAKER: &str = "Assignment Agent";
const CONCLUSION_SPEAKER: &str = "Assignment Agent Conclusion";

pub struct Assignment {
    services: Services,
}

impl Assignment {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    /// Mood already on the state, else classify the transcript, else ask.
    ///
    /// Returns `None` if the user ended the session while clarifying.
    async fn settle_mood(
        &self,
        state: &ConversationState,
        update: &mut StateUpdate,
        dialogue: &mut Dialogue,
    ) -> Result<Option<Mood>, StageError> {
        if let Some(mood) = state.mood {
            return Ok(Some(mood));
        }

        let classifier = &self.services.classifier;
        let text = state.user_text();
        let mood = classifier.classify(&text);
        let unrecognized = classifier.unrecognized_terms(&text);
        if !unrecognized.is_empty() {
            tracing::debug!(terms = ?unrecognized, "Terms outside the classifier vocabulary");
        }
        if mood != Mood::General {
            return Ok(Some(mood));
        }

        match dialogue.ask(SPEAKER, prompts::CLARIFICATION_QUESTION).await? {
            Reply::Cancelled => Ok(None),
            Reply::Answer(clarification) => {
                let mood = classifier.classify(&clarification);
                update.push_user(format!("{} {clarification}", prompts::CLARIFICATION_QUESTION));
                Ok(Some(mood))
            }
        }
    }
}

#[async_trait]
impl Stage for Assignment {
    async fn run(
        &self,
        state: &ConversationState,
        dialogue: &mut Dialogue,
    ) -> Result<StateUpdate, StageError> {
        let mut update = StateUpdate::new();

        let Some(mood) = self.settle_mood(state, &mut update, dialogue).await? else {
            return Ok(update.cancel());
        };
        update = update.with_mood(mood);
        tracing::info!(mood = %mood, "Mood assigned");

        if self.services.retrieval_enabled() {
            let mut query = state.user_text();
            for message in &update.messages {
                query.push(' ');
                query.push_str(&message.content.to_lowercase());
            }
            let snippets = self.services.retrieve(&query).await;
            update = update.with_context(snippets);
        }

        for question in prompts::tailored_questions(mood) {
            match dialogue.ask(SPEAKER, question).await? {
                Reply::Cancelled => return Ok(update.cancel()),
                Reply::Answer(answer) => update.push_user(format!("{question} {answer}")),
            }
        }

        if mood == Mood::Crisis {
            tracing::info!("Crisis mood, skipping generated follow-ups");
            return Ok(update.with_awaiting_follow_up(false));
        }

        FollowUpProtocol::new(&*self.services.llm, self.services.options.follow_up_rounds)
            .with_max_tokens(self.services.options.max_tokens)
            .run(state, &mut update, dialogue, SPEAKER)
            .await?;
        if update.cancelled {
            return Ok(update);
        }

        let mut context = state.retrieved_context.clone();
        context.extend(update.retrieved_context.iter().cloned());
        let conclusion = self
            .services
            .complete(
                &update.transcript_after(state),
                prompts::synthesis_instruction(&context),
            )
            .await?;
        dialogue.say(CONCLUSION_SPEAKER, &conclusion)?;
        update.push_assistant(conclusion);

        Ok(update.with_awaiting_follow_up(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use crate::llm::LlmError;
    use crate::state::{Message, Role};
    use crate::testing::{MockLlmService, MockRetriever, ScriptedConsole};
    use std::sync::Arc;

    fn state_with(user: &[&str]) -> ConversationState {
        let mut state = ConversationState::new();
        for text in user {
            state.apply(StateUpdate::new().with_message(Message::user(*text)));
        }
        state
    }

    fn services(llm: Arc<MockLlmService>) -> Services {
        let mut services = Services::new(llm, Arc::new(Classifier::new()));
        services.options.follow_up_rounds = 1;
        services
    }

    #[tokio::test]
    async fn test_anxiety_pair_then_generation() {
        let llm = Arc::new(MockLlmService::new("mock"));
        llm.queue_text("1. When does it peak?\n2. Who knows about it?");
        llm.queue_text("Insights and steps.");

        let console = ScriptedConsole::new(["deadlines", "breathing", "mornings", "my sister"]);
        let output = console.output_handle();
        let mut dialogue = Dialogue::new(Box::new(console));
        let state = state_with(&["I'm stressed about work"]);

        let update = Assignment::new(services(llm.clone()))
            .run(&state, &mut dialogue)
            .await
            .unwrap();

        assert_eq!(update.mood, Some(Mood::Anxiety));
        let [q1, q2] = prompts::tailored_questions(Mood::Anxiety);
        let contents: Vec<_> = update.messages.iter().map(|m| m.content.clone()).collect();
        assert_eq!(
            contents,
            vec![
                format!("{q1} deadlines"),
                format!("{q2} breathing"),
                "When does it peak? mornings".to_string(),
                "Who knows about it? my sister".to_string(),
                "Insights and steps.".to_string(),
            ]
        );
        assert_eq!(update.messages[4].role, Role::Assistant);
        assert_eq!(update.awaiting_follow_up, Some(true));
        assert_eq!(llm.recorded_requests().len(), 2);

        let shown = output.lock().unwrap();
        assert_eq!(shown[0].1, q1);
    }

    #[tokio::test]
    async fn test_crisis_skips_generation() {
        let llm = Arc::new(MockLlmService::new("mock"));
        let mut dialogue = Dialogue::new(Box::new(ScriptedConsole::new(["no", "maybe"])));
        let state = state_with(&["I want to hurt myself"]);

        let update = Assignment::new(services(llm.clone()))
            .run(&state, &mut dialogue)
            .await
            .unwrap();

        assert_eq!(update.mood, Some(Mood::Crisis));
        assert_eq!(update.messages.len(), 2);
        assert!(llm.recorded_requests().is_empty());
        assert_eq!(update.awaiting_follow_up, Some(false));
    }

    #[tokio::test]
    async fn test_general_mood_asks_for_clarification() {
        let llm = Arc::new(MockLlmService::new("mock"));
        llm.queue_text("1. What makes you sad?");
        llm.queue_text("Be gentle with yourself.");
        let mut dialogue = Dialogue::new(Box::new(ScriptedConsole::new([
            "honestly just sad",
            "friends moved away",
            "not much",
            "the move",
        ])));
        let state = state_with(&["Nothing much to report"]);

        let update = Assignment::new(services(llm))
            .run(&state, &mut dialogue)
            .await
            .unwrap();

        assert_eq!(update.mood, Some(Mood::Depression));
        assert_eq!(
            update.messages[0].content,
            format!("{} honestly just sad", prompts::CLARIFICATION_QUESTION)
        );
    }

    #[tokio::test]
    async fn test_existing_mood_is_kept() {
        let llm = Arc::new(MockLlmService::new("mock"));
        let mut state = state_with(&["I want to hurt myself"]);
        state.apply(StateUpdate::new().with_mood(Mood::Crisis));
        let mut dialogue = Dialogue::new(Box::new(ScriptedConsole::new(["a", "b"])));

        let update = Assignment::new(services(llm))
            .run(&state, &mut dialogue)
            .await
            .unwrap();

        assert_eq!(update.mood, Some(Mood::Crisis));
        assert_eq!(update.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_retrieved_context_reaches_prompts() {
        let llm = Arc::new(MockLlmService::new("mock"));
        llm.queue_text("1. Do you exercise?");
        llm.queue_text("Try CBT.");
        let retriever = Arc::new(MockRetriever::new());
        retriever.queue_snippets(["CBT is effective for anxiety management."]);

        let services = services(llm.clone()).with_retriever(retriever.clone());
        let mut dialogue =
            Dialogue::new(Box::new(ScriptedConsole::new(["work", "nothing", "rarely"])));
        let state = state_with(&["I'm so anxious"]);

        let update = Assignment::new(services).run(&state, &mut dialogue).await.unwrap();

        assert_eq!(update.retrieved_context, vec!["CBT is effective for anxiety management."]);
        let queries = retriever.recorded_queries();
        assert_eq!(queries, vec![("i'm so anxious".to_string(), 3)]);
        for request in llm.recorded_requests() {
            let instruction = &request.messages.last().unwrap().content;
            assert!(instruction.contains("CBT is effective"));
        }
    }

    #[tokio::test]
    async fn test_retrieval_failure_is_not_fatal() {
        let llm = Arc::new(MockLlmService::new("mock"));
        llm.queue_text("1. Anything else?");
        llm.queue_text("Keep going.");
        let retriever = Arc::new(MockRetriever::new());
        retriever.queue_error(crate::retrieval::RetrievalError::Unavailable("down".to_string()));

        let services = services(llm).with_retriever(retriever);
        let mut dialogue = Dialogue::new(Box::new(ScriptedConsole::new(["a", "b", "c"])));
        let state = state_with(&["I'm so anxious"]);

        let update = Assignment::new(services).run(&state, &mut dialogue).await.unwrap();
        assert!(update.retrieved_context.is_empty());
        assert_eq!(update.awaiting_follow_up, Some(true));
    }

    #[tokio::test]
    async fn test_completion_failure_aborts_stage() {
        let llm = Arc::new(MockLlmService::new("mock"));
        llm.queue_error(LlmError::auth("bad key"));
        let mut dialogue = Dialogue::new(Box::new(ScriptedConsole::new(["a", "b"])));
        let state = state_with(&["I'm so anxious"]);

        let err = Assignment::new(services(llm))
            .run(&state, &mut dialogue)
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::Completion(_)));
    }

    #[tokio::test]
    async fn test_exit_during_tailored_questions() {
        let llm = Arc::new(MockLlmService::new("mock"));
        let mut dialogue = Dialogue::new(Box::new(ScriptedConsole::new(["work", "exit"])));
        let state = state_with(&["I'm so anxious"]);

        let update = Assignment::new(services(llm.clone()))
            .run(&state, &mut dialogue)
            .await
            .unwrap();

        assert!(update.cancelled);
        assert_eq!(update.mood, Some(Mood::Anxiety));
        assert_eq!(update.messages.len(), 1);
        assert!(llm.recorded_requests().is_empty());
    }
}
