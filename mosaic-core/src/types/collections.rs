//! Hash collections used across the workspace.
//!
//! FxHash is deterministic per-process but iteration order is not stable;
//! anything that crosses a determinism boundary (topological order, waves,
//! summaries) must sort before emitting.

pub use rustc_hash::{FxHashMap, FxHashSet};
