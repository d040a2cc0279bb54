//! The immutable dependency graph.
//!
//! Atoms never hold references to each other; all adjacency lives here.
//! Once built for a plan the graph is read-only and lock-free to share.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use mosaic_core::model::edge::DependencyEdge;
use mosaic_core::model::wave::Wave;
use mosaic_core::types::identifiers::AtomId;
use mosaic_core::FxHashMap;

/// Acyclic dependency graph with its topological order and wave partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyGraph {
    nodes: Vec<AtomId>,
    edges: Vec<DependencyEdge>,
    topo_order: Vec<AtomId>,
    waves: Vec<Wave>,
    level: FxHashMap<AtomId, usize>,
    /// atom → its dependencies (producers it waits on).
    dependencies: FxHashMap<AtomId, BTreeSet<AtomId>>,
    /// atom → its dependants (consumers waiting on it).
    dependants: FxHashMap<AtomId, BTreeSet<AtomId>>,
}

impl DependencyGraph {
    pub(crate) fn new(
        nodes: Vec<AtomId>,
        edges: Vec<DependencyEdge>,
        topo_order: Vec<AtomId>,
        waves: Vec<Wave>,
        level: FxHashMap<AtomId, usize>,
    ) -> Self {
        let mut dependencies: FxHashMap<AtomId, BTreeSet<AtomId>> = FxHashMap::default();
        let mut dependants: FxHashMap<AtomId, BTreeSet<AtomId>> = FxHashMap::default();
        for node in &nodes {
            dependencies.entry(node.clone()).or_default();
            dependants.entry(node.clone()).or_default();
        }
        for edge in &edges {
            dependencies
                .entry(edge.to.clone())
                .or_default()
                .insert(edge.from.clone());
            dependants
                .entry(edge.from.clone())
                .or_default()
                .insert(edge.to.clone());
        }
        Self {
            nodes,
            edges,
            topo_order,
            waves,
            level,
            dependencies,
            dependants,
        }
    }

    pub fn nodes(&self) -> &[AtomId] {
        &self.nodes
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn topological_order(&self) -> &[AtomId] {
        &self.topo_order
    }

    pub fn waves(&self) -> &[Wave] {
        &self.waves
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains(&self, atom: &AtomId) -> bool {
        self.level.contains_key(atom)
    }

    /// Wave index (level) of an atom.
    pub fn wave_of(&self, atom: &AtomId) -> Option<usize> {
        self.level.get(atom).copied()
    }

    /// Producers the atom depends on.
    pub fn dependencies_of(&self, atom: &AtomId) -> impl Iterator<Item = &AtomId> {
        self.dependencies.get(atom).into_iter().flatten()
    }

    /// Consumers that depend on the atom.
    pub fn dependants_of(&self, atom: &AtomId) -> impl Iterator<Item = &AtomId> {
        self.dependants.get(atom).into_iter().flatten()
    }

    /// Every transitive dependant of the atom, in breadth-first order.
    pub fn transitive_dependants(&self, atom: &AtomId) -> Vec<AtomId> {
        let mut seen: BTreeSet<AtomId> = BTreeSet::new();
        let mut queue: Vec<&AtomId> = self.dependants_of(atom).collect();
        while let Some(next) = queue.pop() {
            if seen.insert(next.clone()) {
                queue.extend(self.dependants_of(next));
            }
        }
        seen.into_iter().collect()
    }
}
