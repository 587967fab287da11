//! Workflow graph engine
//!
//! Named stages joined by direct or conditional edges. A [`StateGraph`] is a
//! definition; [`StateGraph::compile`] validates it once and yields a
//! [`CompiledGraph`] that walks the stages for a session.

use crate::console::Dialogue;
use crate::stages::{Stage, StageError};
use crate::state::ConversationState;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Source marker for the entry edge
pub const START: &str = "__start__";
/// Target marker for terminal edges
pub const END: &str = "__end__";

/// Stages a single run may execute before it is considered runaway
pub const DEFAULT_STEP_LIMIT: usize = 25;

/// Picks a routing key from the current state
pub type Router = Arc<dyn Fn(&ConversationState) -> String + Send + Sync>;

// ============================================================================
// Errors
// ============================================================================

/// Problems found while compiling a graph definition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphDefinitionError {
    #[error("no edge from START")]
    MissingEntry,

    #[error("edge from {from} points at unregistered node {target}")]
    UnknownNode { from: String, target: String },

    #[error("edge leaves unregistered node {0}")]
    UnknownSource(String),

    #[error("node {0} is reachable but has no outgoing edge")]
    MissingOutgoingEdge(String),

    #[error("node {0} has more than one outgoing edge")]
    DuplicateOutgoingEdge(String),

    #[error("node {0} is registered twice")]
    DuplicateNode(String),

    #[error("{0} is reserved and cannot name a node")]
    ReservedName(String),
}

/// Failures while walking a compiled graph
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("router at {node} returned {key:?}, which has no route")]
    Unroutable { node: String, key: String },

    #[error("run exceeded {limit} steps")]
    StepLimit { limit: usize },

    #[error("stage {stage} failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: StageError,
    },
}

// ============================================================================
// Definition
// ============================================================================

#[derive(Clone)]
enum Edge {
    Direct(String),
    Conditional {
        router: Router,
        routes: BTreeMap<String, String>,
    },
}

impl Edge {
    fn targets(&self) -> Vec<&str> {
        match self {
            Edge::Direct(to) => vec![to.as_str()],
            Edge::Conditional { routes, .. } => routes.values().map(String::as_str).collect(),
        }
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Direct(to) => f.debug_tuple("Direct").field(to).finish(),
            Edge::Conditional { routes, .. } => {
                f.debug_struct("Conditional").field("routes", routes).finish_non_exhaustive()
            }
        }
    }
}

/// Graph under construction
pub struct StateGraph {
    nodes: Vec<(String, Arc<dyn Stage>)>,
    edges: Vec<(String, Edge)>,
    step_limit: usize,
}

impl Default for StateGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl StateGraph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    pub fn add_node(&mut self, name: &str, stage: impl Stage + 'static) -> &mut Self {
        self.nodes.push((name.to_string(), Arc::new(stage)));
        self
    }

    /// Unconditional transition. `from` may be [`START`]; `to` may be [`END`].
    pub fn add_edge(&mut self, from: &str, to: &str) -> &mut Self {
        self.edges.push((from.to_string(), Edge::Direct(to.to_string())));
        self
    }

    /// Transition to `routes[router(state)]`
    pub fn add_conditional_edge<F, I, K, V>(&mut self, from: &str, router: F, routes: I) -> &mut Self
    where
        F: Fn(&ConversationState) -> String + Send + Sync + 'static,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let routes = routes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.edges.push((
            from.to_string(),
            Edge::Conditional {
                router: Arc::new(router),
                routes,
            },
        ));
        self
    }

    pub fn with_step_limit(&mut self, limit: usize) -> &mut Self {
        self.step_limit = limit;
        self
    }

    /// Validate the definition and freeze it
    pub fn compile(&self) -> Result<CompiledGraph, GraphDefinitionError> {
        let mut nodes: HashMap<String, Arc<dyn Stage>> = HashMap::new();
        for (name, stage) in &self.nodes {
            if name == START || name == END {
                return Err(GraphDefinitionError::ReservedName(name.clone()));
            }
            if nodes.insert(name.clone(), Arc::clone(stage)).is_some() {
                return Err(GraphDefinitionError::DuplicateNode(name.clone()));
            }
        }

        let mut edges: HashMap<String, Edge> = HashMap::new();
        for (from, edge) in &self.edges {
            if from != START && !nodes.contains_key(from) {
                return Err(GraphDefinitionError::UnknownSource(from.clone()));
            }
            for target in edge.targets() {
                if target != END && !nodes.contains_key(target) {
                    return Err(GraphDefinitionError::UnknownNode {
                        from: from.clone(),
                        target: target.to_string(),
                    });
                }
            }
            if edges.insert(from.clone(), edge.clone()).is_some() {
                return Err(GraphDefinitionError::DuplicateOutgoingEdge(from.clone()));
            }
        }

        let entry = edges.get(START).ok_or(GraphDefinitionError::MissingEntry)?;

        // Every reachable node must be able to move on
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = entry.targets().into_iter().collect();
        while let Some(name) = queue.pop_front() {
            if name == END || !seen.insert(name) {
                continue;
            }
            let edge = edges
                .get(name)
                .ok_or_else(|| GraphDefinitionError::MissingOutgoingEdge(name.to_string()))?;
            queue.extend(edge.targets());
        }

        for name in nodes.keys() {
            if !seen.contains(name.as_str()) {
                tracing::warn!(node = %name, "Node is unreachable from START");
            }
        }

        Ok(CompiledGraph {
            nodes,
            edges,
            step_limit: self.step_limit,
        })
    }
}

// ============================================================================
// Execution
// ============================================================================

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Reached [`END`]
    Completed,
    /// The user ended the session during stage `at`, or before it started (`at == START`)
    Cancelled { at: String },
}

/// Result of one run
#[derive(Debug, Clone)]
pub struct Invocation {
    pub state: ConversationState,
    /// Stages in the order they ran
    pub path: Vec<String>,
    pub outcome: RunOutcome,
}

/// Validated, runnable graph
pub struct CompiledGraph {
    nodes: HashMap<String, Arc<dyn Stage>>,
    edges: HashMap<String, Edge>,
    step_limit: usize,
}

impl fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.nodes.keys().collect();
        names.sort();
        f.debug_struct("CompiledGraph")
            .field("nodes", &names)
            .field("edges", &self.edges)
            .field("step_limit", &self.step_limit)
            .finish()
    }
}

impl CompiledGraph {
    /// Walk the graph from [`START`] until [`END`] or cancellation
    pub async fn invoke(
        &self,
        mut state: ConversationState,
        dialogue: &mut Dialogue,
    ) -> Result<Invocation, GraphError> {
        let mut path = Vec::new();
        if state.cancelled {
            tracing::info!("Run skipped, state already cancelled");
            return Ok(Invocation {
                state,
                path,
                outcome: RunOutcome::Cancelled {
                    at: START.to_string(),
                },
            });
        }
        let mut current = self.next_node(START, &state)?;

        while current != END {
            if path.len() >= self.step_limit {
                return Err(GraphError::StepLimit {
                    limit: self.step_limit,
                });
            }
            // compile() guarantees every target is registered
            let Some(stage) = self.nodes.get(&current) else {
                return Err(GraphError::Unroutable {
                    node: path.last().cloned().unwrap_or_else(|| START.to_string()),
                    key: current,
                });
            };

            tracing::debug!(stage = %current, step = path.len() + 1, "Running stage");
            let update = stage
                .run(&state, dialogue)
                .await
                .map_err(|source| GraphError::Stage {
                    stage: current.clone(),
                    source,
                })?;
            state.apply(update);
            path.push(current.clone());

            if state.cancelled {
                tracing::info!(stage = %current, "Run cancelled by user");
                return Ok(Invocation {
                    state,
                    path,
                    outcome: RunOutcome::Cancelled { at: current },
                });
            }

            current = self.next_node(&current, &state)?;
        }

        Ok(Invocation {
            state,
            path,
            outcome: RunOutcome::Completed,
        })
    }

    fn next_node(&self, from: &str, state: &ConversationState) -> Result<String, GraphError> {
        match self.edges.get(from) {
            Some(Edge::Direct(to)) => Ok(to.clone()),
            Some(Edge::Conditional { router, routes }) => {
                let key = router(state);
                match routes.get(&key) {
                    Some(to) => {
                        tracing::debug!(from, key = %key, to = %to, "Conditional edge resolved");
                        Ok(to.clone())
                    }
                    None => Err(GraphError::Unroutable {
                        node: from.to_string(),
                        key,
                    }),
                }
            }
            None => Ok(END.to_string()),
        }
    }
}
