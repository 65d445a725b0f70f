/// Reference resolution module.
///
/// Maps detected textual references onto nodes of a built graph using a
/// priority-ordered set of strategies.
mod resolver;

/// The resolution strategies and their shared context types.
pub mod strategies;

pub use resolver::{create_reference_edges, ReferenceResolutionService, ResolutionSummary};
pub use strategies::{
    DocumentStructure, PositionalMatcher, ResolutionContext, ResolutionStrategy, SemanticMatcher,
    StrategyMatch,
};
