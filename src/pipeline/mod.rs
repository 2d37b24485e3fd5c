//! Pipeline graph model and definition input.

pub mod definition;
pub mod graph;
pub mod node;

pub use definition::{NodeRecord, PipelineDefinition};
pub use graph::PipelineGraph;
pub use node::{Node, NodeKind};
