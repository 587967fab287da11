//! Workflow assembly
//!
//! Two topologies share the engine and the stage set:
//!
//! - **Staged**: reception, analysis, assignment, then a mood branch to the
//!   counselor (crisis) or support (everything else).
//! - **Check-in**: one question, then a five-way branch to static responders,
//!   repeated until the user exits.

use crate::graph::{CompiledGraph, GraphDefinitionError, StateGraph, END, START};
use crate::prompts;
use crate::session::Repeat;
use crate::stages::{
    Analysis, Assignment, CheckIn, Counselor, Reception, Services, StaticResponder, Support,
};
use crate::state::{ConversationState, Mood};

/// Which topology to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowKind {
    #[default]
    Staged,
    CheckIn,
}

impl WorkflowKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "staged" => Some(Self::Staged),
            "check_in" | "check-in" | "checkin" => Some(Self::CheckIn),
            _ => None,
        }
    }

    pub fn build(self, services: &Services) -> Result<CompiledGraph, GraphDefinitionError> {
        match self {
            Self::Staged => build_staged(services),
            Self::CheckIn => build_check_in(services),
        }
    }

    /// The check-in asks again after every answer until the user exits
    pub fn repeat(self) -> Repeat {
        match self {
            Self::Staged => Repeat::Once,
            Self::CheckIn => Repeat::UntilExit {
                farewell: prompts::CHECK_IN_FAREWELL,
            },
        }
    }
}

/// Routing key for mood branches. Unset mood routes as `general`.
fn route_by_mood(state: &ConversationState) -> String {
    state.mood.unwrap_or(Mood::General).as_str().to_string()
}

pub fn build_staged(services: &Services) -> Result<CompiledGraph, GraphDefinitionError> {
    let mut graph = StateGraph::new();
    graph
        .add_node("reception", Reception)
        .add_node("analysis", Analysis::new(services.clone()))
        .add_node("assignment", Assignment::new(services.clone()))
        .add_node("counselor", Counselor)
        .add_node("support", Support::new(services.clone()))
        .add_edge(START, "reception")
        .add_edge("reception", "analysis")
        .add_edge("analysis", "assignment")
        .add_conditional_edge(
            "assignment",
            route_by_mood,
            Mood::ALL.map(|mood| {
                let target = if mood == Mood::Crisis { "counselor" } else { "support" };
                (mood.as_str(), target)
            }),
        )
        .add_edge("counselor", END)
        .add_edge("support", END);
    graph.compile()
}

pub fn build_check_in(services: &Services) -> Result<CompiledGraph, GraphDefinitionError> {
    let mut graph = StateGraph::new();
    graph
        .add_node("check_in", CheckIn::new(services.clone()))
        .add_node(
            "anxiety",
            StaticResponder::new("Anxiety Agent", prompts::ANXIETY_RESPONSE),
        )
        .add_node(
            "depression",
            StaticResponder::new("Depression Agent", prompts::DEPRESSION_RESPONSE),
        )
        .add_node(
            "positive",
            StaticResponder::new("Positive Agent", prompts::POSITIVE_RESPONSE),
        )
        .add_node(
            "general",
            StaticResponder::new("General Agent", prompts::GENERAL_RESPONSE),
        )
        .add_node("counselor", Counselor)
        .add_edge(START, "check_in")
        .add_conditional_edge(
            "check_in",
            route_by_mood,
            [
                ("crisis", "counselor"),
                ("anxiety", "anxiety"),
                ("depression", "depression"),
                ("positive", "positive"),
                ("general", "general"),
            ],
        );
    for node in ["anxiety", "depression", "positive", "general", "counselor"] {
        graph.add_edge(node, END);
    }
    graph.compile()
}
