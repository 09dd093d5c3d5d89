//! The traversal loop.

use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::join_all;
use tracing::info;

use crate::error::EngineError;
use crate::graph::{Graph, Hop, NodeId, Transition};
use crate::traits::GraphState;

/// Drives a [`Graph`]: sequential edges in declared order, typed
/// conditional routing, and fan-out/fan-in with snapshot-isolated
/// branches. Every node execution ticks a shared atomic step counter;
/// crossing the ceiling aborts the run rather than looping forever.
pub struct Engine<S: GraphState, D: Send + Sync> {
    graph: Graph<S, D>,
    ceiling: u64,
    steps: AtomicU64,
}

impl<S: GraphState, D: Send + Sync> Engine<S, D> {
    pub fn new(graph: Graph<S, D>, step_ceiling: u64) -> Self {
        Self {
            graph,
            ceiling: step_ceiling,
            steps: AtomicU64::new(0),
        }
    }

    /// Total node executions so far, across `run`/`run_from` calls.
    pub fn steps_executed(&self) -> u64 {
        self.steps.load(Ordering::SeqCst)
    }

    /// Run from the entry node until the graph ends.
    pub async fn run(&self, state: &mut S, deps: &D) -> Result<(), EngineError> {
        let entry = self.graph.entry_name().to_string();
        self.run_from(&entry, state, deps).await
    }

    /// Run from a named node. Used to resume a run after a lead-scoped
    /// failure: the caller repairs the state and re-enters at the loop
    /// check. The step counter carries over, so resuming cannot be used
    /// to escape the ceiling.
    pub async fn run_from(
        &self,
        start: &str,
        state: &mut S,
        deps: &D,
    ) -> Result<(), EngineError> {
        let mut current = self
            .graph
            .id_of(start)
            .ok_or_else(|| EngineError::UnknownStart(start.to_string()))?;

        loop {
            let update = self.execute(current, state, deps).await?;
            state.apply(update);

            match &self.graph.transitions[current] {
                Transition::Edge(hop) => match hop {
                    Hop::Node(next) => current = *next,
                    Hop::End => return Ok(()),
                },
                Transition::Conditional { selector, targets } => {
                    let node = self.graph.nodes[current].name().to_string();
                    let idx = selector(state).ok_or(EngineError::NoRoute { node })?;
                    match targets[idx] {
                        Hop::Node(next) => current = next,
                        Hop::End => return Ok(()),
                    }
                }
                Transition::FanOut { branches, join } => {
                    // Every branch sees the same pre-fan-out snapshot; the
                    // join blocks until all branches completed or failed.
                    let snapshot: &S = state;
                    let results = join_all(
                        branches
                            .iter()
                            .map(|branch| self.execute(*branch, snapshot, deps)),
                    )
                    .await;

                    let mut updates = Vec::with_capacity(results.len());
                    for result in results {
                        updates.push(result?);
                    }
                    for update in updates {
                        state.apply(update);
                    }
                    current = *join;
                }
            }
        }
    }

    async fn execute(
        &self,
        id: NodeId,
        state: &S,
        deps: &D,
    ) -> Result<S::Update, EngineError> {
        let node = &self.graph.nodes[id];
        let step = self.steps.fetch_add(1, Ordering::SeqCst) + 1;
        if step > self.ceiling {
            return Err(EngineError::StepCeiling {
                node: node.name().to_string(),
                ceiling: self.ceiling,
            });
        }

        info!(stage = node.name(), step, "----- Entering stage -----");
        node.run(state, deps)
            .await
            .map_err(|source| EngineError::Node {
                node: node.name().to_string(),
                source,
            })
    }
}
