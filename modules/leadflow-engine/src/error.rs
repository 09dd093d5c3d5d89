use thiserror::Error;

/// Errors raised while assembling a graph.
#[derive(Debug, Error)]
pub enum GraphBuildError {
    #[error("duplicate node '{0}'")]
    DuplicateNode(String),

    #[error("edge references unknown node '{0}'")]
    UnknownNode(String),

    #[error("node '{0}' has more than one outgoing transition")]
    DuplicateTransition(String),

    #[error("no entry node set")]
    MissingEntry,
}

/// Errors raised during a traversal.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The global step ceiling was hit. Always fatal to the run: it means
    /// a stage corrupted the loop condition and the traversal would not
    /// terminate on its own.
    #[error("step ceiling of {ceiling} reached at node '{node}'")]
    StepCeiling { node: String, ceiling: u64 },

    #[error("node '{node}' failed")]
    Node {
        node: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("conditional edge from '{node}' produced a route with no target")]
    NoRoute { node: String },

    #[error("unknown start node '{0}'")]
    UnknownStart(String),
}
