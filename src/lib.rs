pub mod accuracy;
pub mod config;
pub mod docgraph;
pub mod errors;
pub mod graph;
pub mod logging;
pub mod references;
pub mod resolution;
pub mod types;
pub mod validation;

pub use docgraph::{DocGraph, LinkResult, ProcessResult};
