//! DependencyAnalyzer — parallel extraction of the four edge classes.

use std::time::{Duration, Instant};

use rayon::prelude::*;

use mosaic_core::model::atom::AtomicUnit;
use mosaic_core::model::context::ImportSource;
use mosaic_core::model::edge::{DependencyEdge, EdgeKind};
use mosaic_core::types::identifiers::AtomId;
use mosaic_core::FxHashMap;

use super::symbols::SymbolIndex;
use crate::decompose::decomposer::AtomAnalysis;

/// Stats for one analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerStats {
    pub import_edges: usize,
    pub data_edges: usize,
    pub call_edges: usize,
    pub type_edges: usize,
    pub duration: Duration,
}

/// Computes the raw dependency multigraph over a plan's atoms.
pub struct DependencyAnalyzer;

impl DependencyAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Extract every edge class for every atom. Edges run producer →
    /// consumer. The result is deduplicated on (from, to, kind) and sorted
    /// deterministically; self-references never produce edges.
    pub fn analyze(
        &self,
        atoms: &[AtomicUnit],
        analyses: &FxHashMap<AtomId, AtomAnalysis>,
    ) -> (Vec<DependencyEdge>, AnalyzerStats) {
        let start = Instant::now();
        let index = SymbolIndex::build(analyses);

        let mut edges: Vec<DependencyEdge> = atoms
            .par_iter()
            .flat_map_iter(|atom| {
                let analysis = analyses.get(&atom.id);
                let mut out: Vec<DependencyEdge> = Vec::new();

                // Import edges: the bundle resolved a symbol to another atom.
                for binding in &atom.context.imports {
                    if let ImportSource::Atom(owner) = &binding.source {
                        let owner = AtomId::new(owner.clone());
                        if owner != atom.id {
                            out.push(DependencyEdge::new(
                                owner,
                                atom.id.clone(),
                                EdgeKind::Import,
                            ));
                        }
                    }
                }

                if let Some(analysis) = analysis {
                    // Call edges: a call resolves to a symbol declared elsewhere.
                    for call in &analysis.calls {
                        if let Some(owner) = index.declarer_of(call) {
                            if owner != &atom.id {
                                out.push(DependencyEdge::new(
                                    owner.clone(),
                                    atom.id.clone(),
                                    EdgeKind::Call,
                                ));
                            }
                        }
                    }

                    // Type edges: a referenced name is another atom's type.
                    for referenced in &analysis.referenced {
                        if let Some(owner) = index.type_declarer_of(referenced) {
                            if owner != &atom.id {
                                out.push(DependencyEdge::new(
                                    owner.clone(),
                                    atom.id.clone(),
                                    EdgeKind::Type,
                                ));
                            }
                        }
                    }

                    // Data edges: a typed input is produced by another atom.
                    let inputs = atom
                        .context
                        .types
                        .iter()
                        .filter(|schema| !schema.is_output);
                    for schema in inputs {
                        if let Some(owner) = index.declarer_of(&schema.symbol) {
                            if owner != &atom.id {
                                out.push(DependencyEdge::new(
                                    owner.clone(),
                                    atom.id.clone(),
                                    EdgeKind::Data,
                                ));
                            }
                        }
                    }
                }

                out
            })
            .collect();

        edges.sort_by(|a, b| a.key().cmp(&b.key()));
        edges.dedup_by(|a, b| a.key() == b.key());

        let mut stats = AnalyzerStats {
            duration: start.elapsed(),
            ..Default::default()
        };
        for edge in &edges {
            match edge.kind {
                EdgeKind::Import => stats.import_edges += 1,
                EdgeKind::Data => stats.data_edges += 1,
                EdgeKind::Call => stats.call_edges += 1,
                EdgeKind::Type => stats.type_edges += 1,
            }
        }

        (edges, stats)
    }
}

impl Default for DependencyAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
