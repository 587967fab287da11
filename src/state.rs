//! Conversation state threaded through the workflow graph
//!
//! Stages never mutate the state directly. They return a [`StateUpdate`]
//! which the engine merges with [`ConversationState::apply`]; merging can only
//! append, overwrite the mood, or raise the cancellation flag.

use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(test)]
mod proptests;

// ============================================================================
// Transcript
// ============================================================================

/// Author of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the session transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ============================================================================
// Mood
// ============================================================================

/// Emotional bucket driving routing decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Crisis,
    Anxiety,
    Depression,
    Positive,
    /// Default bucket when nothing more specific matched
    General,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Crisis,
        Mood::Anxiety,
        Mood::Depression,
        Mood::Positive,
        Mood::General,
    ];

    /// Stable routing key used by conditional edges
    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Crisis => "crisis",
            Mood::Anxiety => "anxiety",
            Mood::Depression => "depression",
            Mood::Positive => "positive",
            Mood::General => "general",
        }
    }

    /// Categories that warrant an elaboration turn
    pub fn is_negative(self) -> bool {
        matches!(self, Mood::Crisis | Mood::Anxiety | Mood::Depression)
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Conversation State
// ============================================================================

/// The single record threaded through every stage of a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Append-only transcript in canonical order
    pub messages: Vec<Message>,
    /// Set by the classifier; authoritative once present
    pub mood: Option<Mood>,
    /// Raised when the user ends the session; never lowered
    pub cancelled: bool,
    /// Snippets from the knowledge base, in retrieval order, duplicates kept
    pub retrieved_context: Vec<String>,
    /// Whether an initial response is waiting on a conditional secondary one
    pub awaiting_follow_up: bool,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a partial update produced by a stage
    pub fn apply(&mut self, update: StateUpdate) {
        self.messages.extend(update.messages);
        if let Some(mood) = update.mood {
            if self.mood.is_some_and(|current| current != mood) {
                tracing::debug!(from = ?self.mood, to = %mood, "Mood re-classified");
            }
            self.mood = Some(mood);
        }
        self.cancelled |= update.cancelled;
        self.retrieved_context.extend(update.retrieved_context);
        if let Some(awaiting) = update.awaiting_follow_up {
            self.awaiting_follow_up = awaiting;
        }
    }

    /// Lowercased concatenation of everything the user has said so far
    pub fn user_text(&self) -> String {
        self.messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// Most recent user utterance, if any
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

// ============================================================================
// State Update
// ============================================================================

/// Partial state returned by a stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateUpdate {
    pub messages: Vec<Message>,
    pub mood: Option<Mood>,
    pub cancelled: bool,
    pub retrieved_context: Vec<String>,
    pub awaiting_follow_up: Option<bool>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_mood(mut self, mood: Mood) -> Self {
        self.mood = Some(mood);
        self
    }

    pub fn with_context(mut self, snippets: impl IntoIterator<Item = String>) -> Self {
        self.retrieved_context.extend(snippets);
        self
    }

    pub fn with_awaiting_follow_up(mut self, awaiting: bool) -> Self {
        self.awaiting_follow_up = Some(awaiting);
        self
    }

    /// Mark the session as ended by the user, keeping anything gathered so far
    pub fn cancel(mut self) -> Self {
        self.cancelled = true;
        self
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Transcript as it will look once this update is merged into `state`
    pub fn transcript_after(&self, state: &ConversationState) -> Vec<Message> {
        state
            .messages
            .iter()
            .chain(self.messages.iter())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_appends_messages_in_order() {
        let mut state = ConversationState::new();
        state.apply(StateUpdate::new().with_message(Message::user("first")));
        state.apply(
            StateUpdate::new()
                .with_message(Message::user("second"))
                .with_message(Message::assistant("third")),
        );

        let contents: Vec<_> = state.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_mood_overwritten_not_merged() {
        let mut state = ConversationState::new();
        state.apply(StateUpdate::new().with_mood(Mood::General));
        state.apply(StateUpdate::new().with_mood(Mood::Anxiety));
        assert_eq!(state.mood, Some(Mood::Anxiety));

        // An update without a mood leaves it alone
        state.apply(StateUpdate::new());
        assert_eq!(state.mood, Some(Mood::Anxiety));
    }

    #[test]
    fn test_cancelled_is_sticky() {
        let mut state = ConversationState::new();
        state.apply(StateUpdate::new().cancel());
        state.apply(StateUpdate::new());
        assert!(state.cancelled);
    }

    #[test]
    fn test_retrieved_context_keeps_duplicates() {
        let mut state = ConversationState::new();
        state.apply(StateUpdate::new().with_context(vec!["a".to_string(), "b".to_string()]));
        state.apply(StateUpdate::new().with_context(vec!["a".to_string()]));
        assert_eq!(state.retrieved_context, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_user_text_skips_assistant_messages() {
        let mut state = ConversationState::new();
        state.apply(
            StateUpdate::new()
                .with_message(Message::user("I feel STRESSED"))
                .with_message(Message::assistant("Tell me more"))
                .with_message(Message::user("About Work")),
        );
        assert_eq!(state.user_text(), "i feel stressed about work");
        assert_eq!(state.last_user_message(), Some("About Work"));
    }

    #[test]
    fn test_transcript_after_does_not_touch_state() {
        let mut state = ConversationState::new();
        state.apply(StateUpdate::new().with_message(Message::user("hello")));
        let update = StateUpdate::new().with_message(Message::user("again"));

        let transcript = update.transcript_after(&state);
        assert_eq!(transcript.len(), 2);
        assert_eq!(state.messages.len(), 1);
    }
}
