//! Graph assembly: nodes, edges, conditional routes, fan-out points.

use std::collections::HashMap;

use crate::error::GraphBuildError;
use crate::traits::{GraphState, Node};

pub(crate) type NodeId = usize;

/// Where an edge lands: another node, or the end of the traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeTarget {
    Node(String),
    End,
}

impl EdgeTarget {
    pub fn node(name: impl Into<String>) -> Self {
        EdgeTarget::Node(name.into())
    }
}

impl From<&str> for EdgeTarget {
    fn from(name: &str) -> Self {
        EdgeTarget::Node(name.to_string())
    }
}

/// A resolved edge destination.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Hop {
    Node(NodeId),
    End,
}

/// Outgoing transition of a node, resolved to node ids.
pub(crate) enum Transition<S> {
    Edge(Hop),
    /// Typed routing: the selector maps state to an index into `targets`.
    /// `None` means the route key matched no declared target.
    Conditional {
        selector: Box<dyn Fn(&S) -> Option<usize> + Send + Sync>,
        targets: Vec<Hop>,
    },
    /// Run all branches concurrently on a snapshot, merge their updates,
    /// then continue at `join`.
    FanOut { branches: Vec<NodeId>, join: NodeId },
}

enum PendingTransition<S> {
    Edge(EdgeTarget),
    Conditional {
        selector: Box<dyn Fn(&S) -> Option<usize> + Send + Sync>,
        targets: Vec<EdgeTarget>,
    },
    FanOut {
        branches: Vec<String>,
        join: String,
    },
}

/// An immutable, validated graph ready for execution.
pub struct Graph<S: GraphState, D: Send + Sync> {
    pub(crate) nodes: Vec<Box<dyn Node<S, D>>>,
    pub(crate) ids: HashMap<String, NodeId>,
    /// Indexed by NodeId. Nodes with no declared transition end the
    /// traversal (only fan-out branch nodes should be in that position).
    pub(crate) transitions: Vec<Transition<S>>,
    pub(crate) entry: NodeId,
}

impl<S: GraphState, D: Send + Sync> Graph<S, D> {
    pub(crate) fn id_of(&self, name: &str) -> Option<NodeId> {
        self.ids.get(name).copied()
    }

    pub fn entry_name(&self) -> &str {
        self.nodes[self.entry].name()
    }
}

/// Builder for [`Graph`]. Nodes are registered by name; edges reference
/// names and are resolved and validated by [`GraphBuilder::finish`].
pub struct GraphBuilder<S: GraphState, D: Send + Sync> {
    nodes: Vec<Box<dyn Node<S, D>>>,
    ids: HashMap<String, NodeId>,
    pending: Vec<(String, PendingTransition<S>)>,
    entry: Option<String>,
    error: Option<GraphBuildError>,
}

impl<S: GraphState, D: Send + Sync> Default for GraphBuilder<S, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: GraphState, D: Send + Sync> GraphBuilder<S, D> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            ids: HashMap::new(),
            pending: Vec::new(),
            entry: None,
            error: None,
        }
    }

    pub fn add_node(mut self, node: impl Node<S, D> + 'static) -> Self {
        let name = node.name().to_string();
        if self.ids.contains_key(&name) {
            self.error
                .get_or_insert(GraphBuildError::DuplicateNode(name));
            return self;
        }
        self.ids.insert(name, self.nodes.len());
        self.nodes.push(Box::new(node));
        self
    }

    pub fn entry(mut self, name: &str) -> Self {
        self.entry = Some(name.to_string());
        self
    }

    pub fn add_edge(mut self, from: &str, to: impl Into<EdgeTarget>) -> Self {
        self.pending
            .push((from.to_string(), PendingTransition::Edge(to.into())));
        self
    }

    /// Conditional routing keyed on a closed type, not free text: the
    /// router produces a route value and the edge follows the target
    /// declared for that value.
    pub fn add_conditional_edge<R, F>(
        mut self,
        from: &str,
        router: F,
        routes: Vec<(R, EdgeTarget)>,
    ) -> Self
    where
        R: PartialEq + Send + Sync + 'static,
        F: Fn(&S) -> R + Send + Sync + 'static,
    {
        let (keys, targets): (Vec<R>, Vec<EdgeTarget>) = routes.into_iter().unzip();
        let selector = Box::new(move |state: &S| {
            let route = router(state);
            keys.iter().position(|key| *key == route)
        });
        self.pending.push((
            from.to_string(),
            PendingTransition::Conditional { selector, targets },
        ));
        self
    }

    /// Fan out into `branches` (run concurrently, no relative order, no
    /// shared visibility), then continue at `join` once every branch has
    /// completed or failed.
    pub fn add_fanout(mut self, from: &str, branches: &[&str], join: &str) -> Self {
        self.pending.push((
            from.to_string(),
            PendingTransition::FanOut {
                branches: branches.iter().map(|b| b.to_string()).collect(),
                join: join.to_string(),
            },
        ));
        self
    }

    /// Resolve names, validate, and produce an executable graph.
    pub fn finish(self) -> Result<Graph<S, D>, GraphBuildError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let ids = self.ids;
        let resolve = |name: &str| -> Result<NodeId, GraphBuildError> {
            ids.get(name)
                .copied()
                .ok_or_else(|| GraphBuildError::UnknownNode(name.to_string()))
        };
        let resolve_target = |target: &EdgeTarget| -> Result<Hop, GraphBuildError> {
            match target {
                EdgeTarget::Node(name) => resolve(name).map(Hop::Node),
                EdgeTarget::End => Ok(Hop::End),
            }
        };

        let mut transitions: Vec<Option<Transition<S>>> =
            (0..self.nodes.len()).map(|_| None).collect();

        for (from, pending) in self.pending {
            let from_id = resolve(&from)?;
            if transitions[from_id].is_some() {
                return Err(GraphBuildError::DuplicateTransition(from));
            }
            let transition = match pending {
                PendingTransition::Edge(target) => Transition::Edge(resolve_target(&target)?),
                PendingTransition::Conditional { selector, targets } => {
                    let targets = targets
                        .iter()
                        .map(resolve_target)
                        .collect::<Result<Vec<_>, _>>()?;
                    Transition::Conditional { selector, targets }
                }
                PendingTransition::FanOut { branches, join } => Transition::FanOut {
                    branches: branches
                        .iter()
                        .map(|b| resolve(b))
                        .collect::<Result<Vec<_>, _>>()?,
                    join: resolve(&join)?,
                },
            };
            transitions[from_id] = Some(transition);
        }

        let entry = self.entry.ok_or(GraphBuildError::MissingEntry)?;
        let entry = resolve(&entry)?;

        Ok(Graph {
            nodes: self.nodes,
            ids,
            transitions: transitions
                .into_iter()
                .map(|t| t.unwrap_or(Transition::Edge(Hop::End)))
                .collect(),
            entry,
        })
    }
}
