//! Dependency graph construction: normalization, cycle breaking,
//! topological order, and wave partitioning.

pub mod builder;
pub mod types;

pub use builder::{GraphBuilder, GraphStats};
pub use types::DependencyGraph;
