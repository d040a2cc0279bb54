//! GraphBuilder — normalize, break cycles (Tarjan SCC via petgraph), Kahn
//! topological sort, and wave partition. Deterministic: the same raw
//! multigraph always yields byte-identical order and waves.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};
use std::time::{Duration, Instant};

use petgraph::graph::{DiGraph, NodeIndex};

use mosaic_core::config::GraphConfig;
use mosaic_core::errors::GraphError;
use mosaic_core::model::edge::{DependencyEdge, EdgeKind};
use mosaic_core::model::wave::Wave;
use mosaic_core::types::identifiers::AtomId;
use mosaic_core::FxHashMap;

use super::types::DependencyGraph;

/// Stats for one graph build.
#[derive(Debug, Clone, Default)]
pub struct GraphStats {
    /// Edge count after normalization, before cycle breaking.
    pub normalized_edges: usize,
    pub duplicate_edges_merged: usize,
    pub self_loops_dropped: usize,
    /// Edges removed to restore acyclicity, in removal order.
    pub broken_edges: Vec<DependencyEdge>,
    /// broken / normalized, 0 when the graph has no edges.
    pub break_ratio: f64,
    /// True when the break ratio exceeded the warn threshold.
    pub degraded: bool,
    pub build_duration: Duration,
}

/// Builds the immutable dependency graph for a plan.
pub struct GraphBuilder<'a> {
    config: &'a GraphConfig,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(config: &'a GraphConfig) -> Self {
        Self { config }
    }

    /// Normalize the raw multigraph, break cycles, sort, and partition.
    ///
    /// Fails with [`GraphError::ExcessiveCycleBreaking`] when more than the
    /// abort ratio of edges had to be removed, and with
    /// [`GraphError::DanglingEdge`] when an edge references an unknown atom.
    pub fn build(
        &self,
        mut nodes: Vec<AtomId>,
        raw_edges: Vec<DependencyEdge>,
    ) -> Result<(DependencyGraph, GraphStats), GraphError> {
        let start = Instant::now();
        nodes.sort();
        nodes.dedup();

        let node_set: std::collections::BTreeSet<&AtomId> = nodes.iter().collect();
        for edge in &raw_edges {
            if !node_set.contains(&edge.from) || !node_set.contains(&edge.to) {
                return Err(GraphError::DanglingEdge {
                    from: edge.from.to_string(),
                    to: edge.to.to_string(),
                });
            }
        }

        let mut stats = GraphStats::default();
        let mut edges = normalize(raw_edges, &mut stats);
        stats.normalized_edges = edges.len();

        self.break_cycles(&nodes, &mut edges, &mut stats)?;

        let topo_order = kahn_topo_sort(&nodes, &edges);
        debug_assert_eq!(topo_order.len(), nodes.len(), "cycle survived breaking");

        let (level, waves) = partition_waves(&topo_order, &edges);

        stats.build_duration = start.elapsed();
        let graph = DependencyGraph::new(nodes, edges, topo_order, waves, level);
        Ok((graph, stats))
    }

    /// Remove minimum-weight intra-SCC edges until the graph is acyclic.
    ///
    /// Tie order for removal: lowest weight, then least-important kind
    /// (data before call before type before import), then lexicographic
    /// (from, to). Every removal is logged.
    fn break_cycles(
        &self,
        nodes: &[AtomId],
        edges: &mut Vec<DependencyEdge>,
        stats: &mut GraphStats,
    ) -> Result<(), GraphError> {
        loop {
            let Some(victim) = min_cycle_edge(nodes, edges) else {
                break;
            };
            tracing::warn!(
                from = %victim.from,
                to = %victim.to,
                kind = victim.kind.name(),
                weight = victim.weight,
                "breaking dependency cycle"
            );
            edges.retain(|edge| edge.key() != victim.key());
            stats.broken_edges.push(victim);
        }

        stats.break_ratio = if stats.normalized_edges == 0 {
            0.0
        } else {
            stats.broken_edges.len() as f64 / stats.normalized_edges as f64
        };

        if stats.break_ratio > self.config.effective_cycle_break_abort_ratio() {
            return Err(GraphError::ExcessiveCycleBreaking {
                broken: stats.broken_edges.len(),
                total: stats.normalized_edges,
                ratio: stats.break_ratio * 100.0,
            });
        }
        if stats.break_ratio > self.config.effective_cycle_break_warn_ratio() {
            stats.degraded = true;
            tracing::warn!(
                broken = stats.broken_edges.len(),
                total = stats.normalized_edges,
                "plan degraded: cycle breaking removed more edges than the warn threshold"
            );
        }
        Ok(())
    }
}

/// Merge duplicate (from, to, kind) edges and drop self-loops.
fn normalize(raw: Vec<DependencyEdge>, stats: &mut GraphStats) -> Vec<DependencyEdge> {
    let mut edges: Vec<DependencyEdge> = Vec::with_capacity(raw.len());
    let mut seen: std::collections::BTreeSet<(AtomId, AtomId, EdgeKind)> =
        std::collections::BTreeSet::new();

    for edge in raw {
        if edge.from == edge.to {
            stats.self_loops_dropped += 1;
            continue;
        }
        let key = (edge.from.clone(), edge.to.clone(), edge.kind);
        if seen.insert(key) {
            edges.push(edge);
        } else {
            stats.duplicate_edges_merged += 1;
        }
    }

    edges.sort_by(|a, b| a.key().cmp(&b.key()));
    edges
}

/// Removal priority of an edge kind: least important first.
fn kind_removal_rank(kind: EdgeKind) -> u8 {
    match kind {
        EdgeKind::Data => 0,
        EdgeKind::Call => 1,
        EdgeKind::Type => 2,
        EdgeKind::Import => 3,
    }
}

/// The edge to remove next: the minimum-weight edge inside any strongly
/// connected component of size > 1, or None when the graph is acyclic.
fn min_cycle_edge(nodes: &[AtomId], edges: &[DependencyEdge]) -> Option<DependencyEdge> {
    let mut pg: DiGraph<usize, usize> = DiGraph::new();
    let mut node_map: FxHashMap<&AtomId, NodeIndex> = FxHashMap::default();
    for (i, node) in nodes.iter().enumerate() {
        node_map.insert(node, pg.add_node(i));
    }
    for (edge_idx, edge) in edges.iter().enumerate() {
        let (Some(&from), Some(&to)) = (node_map.get(&edge.from), node_map.get(&edge.to)) else {
            continue;
        };
        pg.add_edge(from, to, edge_idx);
    }

    let sccs = petgraph::algo::tarjan_scc(&pg);

    let mut candidate: Option<&DependencyEdge> = None;
    for scc in sccs {
        if scc.len() < 2 {
            continue;
        }
        let members: std::collections::BTreeSet<NodeIndex> = scc.into_iter().collect();
        for edge in edges {
            let (Some(from), Some(to)) = (node_map.get(&edge.from), node_map.get(&edge.to)) else {
                continue;
            };
            if !members.contains(from) || !members.contains(to) {
                continue;
            }
            let better = match candidate {
                None => true,
                Some(current) => {
                    let lhs = (
                        edge.weight,
                        kind_removal_rank(edge.kind),
                        &edge.from,
                        &edge.to,
                    );
                    let rhs = (
                        current.weight,
                        kind_removal_rank(current.kind),
                        &current.from,
                        &current.to,
                    );
                    lhs.0.total_cmp(&rhs.0).then_with(|| lhs.1.cmp(&rhs.1))
                        .then_with(|| lhs.2.cmp(rhs.2))
                        .then_with(|| lhs.3.cmp(rhs.3))
                        .is_lt()
                }
            };
            if better {
                candidate = Some(edge);
            }
        }
    }
    candidate.cloned()
}

/// Kahn's algorithm with a lexicographic tie-break on atom id.
fn kahn_topo_sort(nodes: &[AtomId], edges: &[DependencyEdge]) -> Vec<AtomId> {
    let mut in_degree: BTreeMap<&AtomId, usize> = nodes.iter().map(|n| (n, 0)).collect();
    let mut successors: BTreeMap<&AtomId, Vec<&AtomId>> = BTreeMap::new();
    for edge in edges {
        *in_degree.entry(&edge.to).or_insert(0) += 1;
        successors.entry(&edge.from).or_default().push(&edge.to);
    }

    let mut ready: BinaryHeap<Reverse<&AtomId>> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(&node, _)| Reverse(node))
        .collect();

    let mut order: Vec<AtomId> = Vec::with_capacity(nodes.len());
    while let Some(Reverse(node)) = ready.pop() {
        order.push(node.clone());
        if let Some(next) = successors.get(node) {
            for &succ in next {
                if let Some(degree) = in_degree.get_mut(succ) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(succ));
                    }
                }
            }
        }
    }
    order
}

/// Level-assign every node: sources at 0, otherwise 1 + max over
/// predecessors. Wave k holds the nodes at level k, ascending.
fn partition_waves(
    topo_order: &[AtomId],
    edges: &[DependencyEdge],
) -> (FxHashMap<AtomId, usize>, Vec<Wave>) {
    let mut predecessors: FxHashMap<&AtomId, Vec<&AtomId>> = FxHashMap::default();
    for edge in edges {
        predecessors.entry(&edge.to).or_default().push(&edge.from);
    }

    let mut level: FxHashMap<AtomId, usize> = FxHashMap::default();
    for node in topo_order {
        let node_level = predecessors
            .get(node)
            .map(|preds| {
                preds
                    .iter()
                    .map(|pred| level.get(*pred).copied().unwrap_or(0) + 1)
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0);
        level.insert(node.clone(), node_level);
    }

    let mut grouped: BTreeMap<usize, Vec<AtomId>> = BTreeMap::new();
    for node in topo_order {
        grouped
            .entry(level[node])
            .or_default()
            .push(node.clone());
    }
    let waves = grouped
        .into_iter()
        .map(|(index, atoms)| Wave::new(index, atoms))
        .collect();

    (level, waves)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kahn_breaks_ties_lexicographically() {
        let nodes: Vec<AtomId> = ["b", "a", "c"].iter().map(|s| AtomId::from(*s)).collect();
        let order = kahn_topo_sort(&nodes, &[]);
        let ids: Vec<&str> = order.iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn removal_rank_prefers_data_edges() {
        assert!(kind_removal_rank(EdgeKind::Data) < kind_removal_rank(EdgeKind::Call));
        assert!(kind_removal_rank(EdgeKind::Call) < kind_removal_rank(EdgeKind::Type));
        assert!(kind_removal_rank(EdgeKind::Type) < kind_removal_rank(EdgeKind::Import));
    }
}
