//! Dependency analysis: a symbol index over the plan's atoms and four edge
//! extractors (import, data, call, type) producing the raw multigraph.

pub mod analyzer;
pub mod symbols;

pub use analyzer::DependencyAnalyzer;
pub use symbols::SymbolIndex;
