/// Validated constructors for nodes and edges.
pub mod factory;

/// The in-memory graph container and its indices.
pub mod knowledge_graph;

/// Parsed document to graph conversion.
pub mod builder;

/// Breadth-first neighbourhood extraction.
pub mod traversal;

mod keywords;

pub use builder::GraphBuilder;
pub use factory::GraphFactory;
pub use keywords::extract_keywords;
pub use knowledge_graph::{GraphValidationReport, KnowledgeGraph, SerializedGraph};
pub use traversal::{GraphTraverser, Subgraph, TraversalDirection, TraversalOptions};
