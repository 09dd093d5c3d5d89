//! Directed-graph workflow engine.
//!
//! A graph is a set of named nodes wired by plain edges, typed conditional
//! edges, and fan-out/fan-in points. Nodes receive a read-only state
//! snapshot and return an update; the engine owns all state mutation, so
//! concurrent fan-out branches can never clobber one another.

pub mod engine;
pub mod error;
pub mod graph;
pub mod traits;

pub use engine::Engine;
pub use error::{EngineError, GraphBuildError};
pub use graph::{EdgeTarget, Graph, GraphBuilder};
pub use traits::{GraphState, Node};
