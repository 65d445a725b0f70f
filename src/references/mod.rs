/// Pattern-based detection of textual cross-references.
pub mod matcher;

/// The static reference pattern catalogue.
pub mod patterns;

pub use matcher::{MatchResult, ReferenceMatcher};
pub use patterns::{CompiledPattern, ReferencePattern};
