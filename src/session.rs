//! Session driver
//!
//! A session starts from a fresh state and invokes the graph once, or pass
//! after pass until the user exits. The driver tags the run with an id and
//! start time for the logs and turns the engine's outcome into something the
//! binary can report.

use crate::console::Dialogue;
use crate::graph::{CompiledGraph, GraphError, RunOutcome};
use crate::state::ConversationState;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    /// The user typed the exit sentinel, closed input, or pressed Ctrl-C
    EndedByUser,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session {session_id} failed: {source}")]
    Graph {
        session_id: Uuid,
        #[source]
        source: GraphError,
    },

    #[error("session {session_id} could not say goodbye: {source}")]
    Farewell {
        session_id: Uuid,
        #[source]
        source: std::io::Error,
    },
}

/// How many passes over the graph one session makes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// A single pass from START to END
    Once,
    /// Pass after pass, the transcript carried forward, until the user exits.
    /// `farewell` is said once on the way out.
    UntilExit { farewell: &'static str },
}

/// Everything known about a finished session
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub outcome: SessionOutcome,
    /// Completed passes over the graph
    pub passes: usize,
    /// Stages in the order they ran, across every pass
    pub path: Vec<String>,
    pub state: ConversationState,
}

/// Run `graph` once from an empty state
pub async fn run_session(
    graph: &CompiledGraph,
    dialogue: &mut Dialogue,
) -> Result<SessionReport, SessionError> {
    run_session_with(graph, dialogue, Repeat::Once).await
}

/// Run `graph` from an empty state, repeating as `repeat` says
pub async fn run_session_with(
    graph: &CompiledGraph,
    dialogue: &mut Dialogue,
    repeat: Repeat,
) -> Result<SessionReport, SessionError> {
    let session_id = Uuid::new_v4();
    let started_at = Utc::now();
    let span = tracing::info_span!("session", id = %session_id);

    async move {
        tracing::info!(started_at = %started_at.to_rfc3339(), ?repeat, "Session started");

        let mut state = ConversationState::new();
        let mut path = Vec::new();
        let mut passes = 0;
        let outcome = loop {
            let run = graph.invoke(state, dialogue).await.map_err(|source| {
                tracing::error!(error = %source, pass = passes + 1, "Session failed");
                SessionError::Graph { session_id, source }
            })?;
            state = run.state;
            path.extend(run.path);

            match (run.outcome, repeat) {
                (RunOutcome::Cancelled { .. }, Repeat::Once) => break SessionOutcome::EndedByUser,
                (RunOutcome::Cancelled { .. }, Repeat::UntilExit { farewell }) => {
                    dialogue
                        .say("System", farewell)
                        .map_err(|source| SessionError::Farewell { session_id, source })?;
                    break SessionOutcome::EndedByUser;
                }
                (RunOutcome::Completed, Repeat::Once) => {
                    passes += 1;
                    break SessionOutcome::Completed;
                }
                (RunOutcome::Completed, Repeat::UntilExit { .. }) => {
                    passes += 1;
                    tracing::debug!(passes, "Pass completed, starting another");
                }
            }
        };

        let elapsed = Utc::now() - started_at;
        tracing::info!(
            outcome = ?outcome,
            mood = ?state.mood,
            passes,
            stages = path.len(),
            messages = state.messages.len(),
            elapsed_ms = elapsed.num_milliseconds(),
            "Session finished"
        );

        Ok(SessionReport {
            session_id,
            started_at,
            outcome,
            passes,
            path,
            state,
        })
    }
    .instrument(span)
    .await
}
