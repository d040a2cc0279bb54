//! # mosaic-analysis
//!
//! CPU-bound analysis for the Mosaic pipeline: language parsers, the
//! recursive decomposer with context injection, the atomicity gate, the
//! dependency analyzer, and the graph builder. Nothing in this crate
//! suspends on I/O; parallelism is rayon where it pays.

pub mod decompose;
pub mod deps;
pub mod graph;
pub mod parsers;
