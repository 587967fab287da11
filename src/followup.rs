//! Dynamic follow-up questions
//!
//! Each round asks the completion backend for two numbered questions about
//! the conversation so far, parses them out of free text, and puts them to
//! the user one at a time. The instruction is sent as a scratch message; the
//! stored transcript never sees it.

#[cfg(test)]
mod proptests;

use crate::console::{Dialogue, Reply};
use crate::llm::{LlmRequest, LlmService};
use crate::prompts;
use crate::stages::StageError;
use crate::state::{ConversationState, Message, StateUpdate};
use regex::Regex;
use std::sync::LazyLock;

pub const DEFAULT_ROUNDS: usize = 2;
pub const QUESTIONS_PER_ROUND: usize = 2;

/// Reasoning models wrap their scratch work in these tags
static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid think-block pattern"));

/// Line markers a generated question may start with
const MARKERS: &[&str] = &["1.", "2.", "- "];

/// Drop reasoning blocks and surrounding whitespace from generated text
pub fn strip_reasoning(generated: &str) -> String {
    THINK_BLOCK.replace_all(generated, "").trim().to_string()
}

/// Extract up to `limit` questions from generated text
pub fn parse_questions(generated: &str, limit: usize) -> Vec<String> {
    let visible = THINK_BLOCK.replace_all(generated, "");
    visible
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            MARKERS
                .iter()
                .find_map(|marker| line.strip_prefix(marker))
                .map(str::trim)
        })
        .filter(|question| !question.is_empty())
        .take(limit)
        .map(str::to_string)
        .collect()
}

/// Multi-round question generation bound to one session's services
pub struct FollowUpProtocol<'a> {
    llm: &'a dyn LlmService,
    rounds: usize,
    max_tokens: Option<u32>,
}

impl<'a> FollowUpProtocol<'a> {
    pub fn new(llm: &'a dyn LlmService, rounds: usize) -> Self {
        Self {
            llm,
            rounds,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Run every round, appending answered questions to `update`.
    ///
    /// Cancellation marks `update` cancelled and returns immediately with
    /// whatever was gathered. A completion failure aborts the protocol.
    pub async fn run(
        &self,
        state: &ConversationState,
        update: &mut StateUpdate,
        dialogue: &mut Dialogue,
        speaker: &str,
    ) -> Result<(), StageError> {
        for round in 1..=self.rounds {
            let transcript: Vec<Message> = update.transcript_after(state);
            let mut context = state.retrieved_context.clone();
            context.extend(update.retrieved_context.iter().cloned());

            let request = LlmRequest::from_transcript(&transcript)
                .with_system(prompts::SYSTEM_PROMPT)
                .with_instruction(prompts::follow_up_instruction(&context))
                .with_max_tokens(self.max_tokens);
            let response = self.llm.complete(&request).await?;

            let questions = parse_questions(&response.text, QUESTIONS_PER_ROUND);
            if questions.len() < QUESTIONS_PER_ROUND {
                tracing::warn!(
                    round,
                    expected = QUESTIONS_PER_ROUND,
                    parsed = questions.len(),
                    "Generated fewer follow-up questions than requested"
                );
            }

            for question in questions {
                match dialogue.ask(speaker, &question).await? {
                    Reply::Cancelled => {
                        update.cancelled = true;
                        return Ok(());
                    }
                    Reply::Answer(answer) => {
                        update.push_user(format!("{question} {answer}"));
                    }
                }
            }
        }
        Ok(())
    }
}
