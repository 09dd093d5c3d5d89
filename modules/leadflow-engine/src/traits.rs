//! Core traits for the workflow engine.

use anyhow::Result;
use async_trait::async_trait;

/// State threaded through a graph traversal.
///
/// Nodes never mutate state directly: they receive a snapshot and return
/// an `Update`, which the engine folds in with `apply`. At a fan-out
/// point every branch gets its own snapshot and the branch updates are
/// applied at the join, in branch-declared order. Updates emitted by
/// fan-out branches must therefore commute (append-style accumulation,
/// not replacement).
pub trait GraphState: Clone + Send + Sync + 'static {
    type Update: Send + 'static;

    /// Fold one update into the state.
    fn apply(&mut self, update: Self::Update);
}

/// One unit of work in the graph.
#[async_trait]
pub trait Node<S: GraphState, D: Send + Sync>: Send + Sync {
    /// Stable name used for wiring, logging, and error reporting.
    fn name(&self) -> &str;

    /// Execute against a state snapshot, returning an update to merge.
    async fn run(&self, state: &S, deps: &D) -> Result<S::Update>;
}
