//! Integration tests for the graph engine: sequential ordering, typed
//! conditional routing, fan-out isolation and merge, loops, and the step
//! ceiling.

use anyhow::Result;
use async_trait::async_trait;
use leadflow_engine::{EdgeTarget, Engine, EngineError, GraphBuilder, GraphState, Node};

// ---------------------------------------------------------------------------
// Test state: a visit log plus a counter, updated via deltas
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct TestState {
    visited: Vec<String>,
    counter: u32,
    /// What each fan-out branch observed in its snapshot.
    branch_observations: Vec<(String, usize)>,
}

#[derive(Debug)]
enum Delta {
    Visited(String),
    Increment(u32),
    Observed { branch: String, visits_seen: usize },
}

impl GraphState for TestState {
    type Update = Vec<Delta>;

    fn apply(&mut self, update: Vec<Delta>) {
        for delta in update {
            match delta {
                Delta::Visited(name) => self.visited.push(name),
                Delta::Increment(n) => self.counter += n,
                Delta::Observed { branch, visits_seen } => {
                    self.branch_observations.push((branch, visits_seen));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Test nodes
// ---------------------------------------------------------------------------

/// Records its own name and bumps the counter.
struct Visit(&'static str);

#[async_trait]
impl Node<TestState, ()> for Visit {
    fn name(&self) -> &str {
        self.0
    }

    async fn run(&self, _state: &TestState, _deps: &()) -> Result<Vec<Delta>> {
        Ok(vec![Delta::Visited(self.0.to_string()), Delta::Increment(1)])
    }
}

/// Records how many visits were already in its snapshot, used to prove
/// fan-out branches cannot see each other's updates.
struct Observer(&'static str);

#[async_trait]
impl Node<TestState, ()> for Observer {
    fn name(&self) -> &str {
        self.0
    }

    async fn run(&self, state: &TestState, _deps: &()) -> Result<Vec<Delta>> {
        Ok(vec![
            Delta::Visited(self.0.to_string()),
            Delta::Observed {
                branch: self.0.to_string(),
                visits_seen: state.visited.len(),
            },
        ])
    }
}

/// Always fails.
struct Failing(&'static str);

#[async_trait]
impl Node<TestState, ()> for Failing {
    fn name(&self) -> &str {
        self.0
    }

    async fn run(&self, _state: &TestState, _deps: &()) -> Result<Vec<Delta>> {
        anyhow::bail!("boom")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Continue,
    Stop,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sequential_edges_run_in_declared_order() {
    let graph = GraphBuilder::new()
        .add_node(Visit("a"))
        .add_node(Visit("b"))
        .add_node(Visit("c"))
        .entry("a")
        .add_edge("a", "b")
        .add_edge("b", "c")
        .add_edge("c", EdgeTarget::End)
        .finish()
        .unwrap();

    let engine = Engine::new(graph, 100);
    let mut state = TestState::default();
    engine.run(&mut state, &()).await.unwrap();

    assert_eq!(state.visited, vec!["a", "b", "c"]);
    assert_eq!(engine.steps_executed(), 3);
}

#[tokio::test]
async fn conditional_edge_routes_on_typed_key() {
    // "check" loops back to itself until the counter reaches 3.
    let graph = GraphBuilder::new()
        .add_node(Visit("check"))
        .add_node(Visit("done"))
        .entry("check")
        .add_conditional_edge(
            "check",
            |s: &TestState| {
                if s.counter < 3 {
                    Route::Continue
                } else {
                    Route::Stop
                }
            },
            vec![
                (Route::Continue, EdgeTarget::node("check")),
                (Route::Stop, EdgeTarget::node("done")),
            ],
        )
        .add_edge("done", EdgeTarget::End)
        .finish()
        .unwrap();

    let engine = Engine::new(graph, 100);
    let mut state = TestState::default();
    engine.run(&mut state, &()).await.unwrap();

    assert_eq!(state.visited, vec!["check", "check", "check", "done"]);
}

#[tokio::test]
async fn fanout_merges_all_branches_and_isolates_snapshots() {
    let graph = GraphBuilder::new()
        .add_node(Visit("start"))
        .add_node(Observer("left"))
        .add_node(Observer("mid"))
        .add_node(Observer("right"))
        .add_node(Visit("join"))
        .entry("start")
        .add_fanout("start", &["left", "mid", "right"], "join")
        .add_edge("join", EdgeTarget::End)
        .finish()
        .unwrap();

    let engine = Engine::new(graph, 100);
    let mut state = TestState::default();
    engine.run(&mut state, &()).await.unwrap();

    // All branch updates merged, join ran last.
    assert_eq!(state.visited.len(), 5);
    assert_eq!(state.visited[0], "start");
    assert_eq!(state.visited[4], "join");

    // Each branch saw only the pre-fan-out snapshot (1 visit: "start"),
    // never a sibling's update.
    assert_eq!(state.branch_observations.len(), 3);
    assert!(state
        .branch_observations
        .iter()
        .all(|(_, seen)| *seen == 1));
}

#[tokio::test]
async fn failing_branch_aborts_after_join() {
    let graph = GraphBuilder::new()
        .add_node(Visit("start"))
        .add_node(Visit("ok"))
        .add_node(Failing("bad"))
        .add_node(Visit("join"))
        .entry("start")
        .add_fanout("start", &["ok", "bad"], "join")
        .add_edge("join", EdgeTarget::End)
        .finish()
        .unwrap();

    let engine = Engine::new(graph, 100);
    let mut state = TestState::default();
    let err = engine.run(&mut state, &()).await.unwrap_err();

    match err {
        EngineError::Node { node, .. } => assert_eq!(node, "bad"),
        other => panic!("expected node failure, got {other:?}"),
    }
    // The join node never ran.
    assert!(!state.visited.iter().any(|v| v == "join"));
}

#[tokio::test]
async fn step_ceiling_aborts_runaway_loop() {
    // "spin" unconditionally loops back to itself.
    let graph = GraphBuilder::new()
        .add_node(Visit("spin"))
        .entry("spin")
        .add_edge("spin", "spin")
        .finish()
        .unwrap();

    let engine = Engine::new(graph, 5);
    let mut state = TestState::default();
    let err = engine.run(&mut state, &()).await.unwrap_err();

    match err {
        EngineError::StepCeiling { node, ceiling } => {
            assert_eq!(node, "spin");
            assert_eq!(ceiling, 5);
        }
        other => panic!("expected step ceiling, got {other:?}"),
    }
    assert_eq!(state.visited.len(), 5);
}

#[tokio::test]
async fn run_from_resumes_mid_graph_and_keeps_step_count() {
    let graph = GraphBuilder::new()
        .add_node(Visit("a"))
        .add_node(Visit("b"))
        .entry("a")
        .add_edge("a", "b")
        .add_edge("b", EdgeTarget::End)
        .finish()
        .unwrap();

    let engine = Engine::new(graph, 100);
    let mut state = TestState::default();
    engine.run(&mut state, &()).await.unwrap();
    engine.run_from("b", &mut state, &()).await.unwrap();

    assert_eq!(state.visited, vec!["a", "b", "b"]);
    assert_eq!(engine.steps_executed(), 3);
}

#[tokio::test]
async fn unknown_edge_target_fails_at_build_time() {
    let result = GraphBuilder::<TestState, ()>::new()
        .add_node(Visit("a"))
        .entry("a")
        .add_edge("a", "missing")
        .finish();

    assert!(matches!(
        result.err(),
        Some(leadflow_engine::GraphBuildError::UnknownNode(name)) if name == "missing"
    ));
}
