//! Recursive decomposition of tasks into atomic units.
//!
//! The splitter walks the structural AST coarsest-boundary-first (module →
//! class/function → block → statement group); the context injector attaches
//! a ContextBundle to every draft; the atomicity gate scores the result.

pub mod atomicity;
pub mod context;
pub mod decomposer;
pub mod splitter;

pub use atomicity::{AtomicityReport, AtomicityValidator};
pub use context::ContextInjector;
pub use decomposer::{AtomAnalysis, DecomposedTask, Decomposer};
pub use splitter::AtomDraft;
