//! Graph builder coverage: normalization, cycle breaking, topological
//! order, and wave partitioning.

use mosaic_analysis::graph::GraphBuilder;
use mosaic_core::config::GraphConfig;
use mosaic_core::errors::GraphError;
use mosaic_core::model::edge::{DependencyEdge, EdgeKind};
use mosaic_core::types::identifiers::AtomId;

fn ids(names: &[&str]) -> Vec<AtomId> {
    names.iter().map(|n| AtomId::from(*n)).collect()
}

fn edge(from: &str, to: &str, kind: EdgeKind) -> DependencyEdge {
    DependencyEdge::new(from, to, kind)
}

// ─── Normalization ─────────────────────────────────────────────────────────

#[test]
fn normalization_merges_duplicates_and_drops_self_loops() {
    let config = GraphConfig::default();
    let builder = GraphBuilder::new(&config);
    let edges = vec![
        edge("a1", "a2", EdgeKind::Import),
        edge("a1", "a2", EdgeKind::Import),
        edge("a1", "a2", EdgeKind::Call),
        edge("a2", "a2", EdgeKind::Data),
    ];

    let (graph, stats) = builder.build(ids(&["a1", "a2"]), edges).unwrap();
    // Both kinds survive as distinct edges; the duplicate import and the
    // self-loop do not.
    assert_eq!(graph.edge_count(), 2);
    assert_eq!(stats.duplicate_edges_merged, 1);
    assert_eq!(stats.self_loops_dropped, 1);
}

#[test]
fn dangling_edges_are_rejected() {
    let config = GraphConfig::default();
    let builder = GraphBuilder::new(&config);
    let error = builder
        .build(ids(&["a1"]), vec![edge("a1", "ghost", EdgeKind::Call)])
        .unwrap_err();
    assert!(matches!(error, GraphError::DanglingEdge { .. }));
}

// ─── Cycle breaking ────────────────────────────────────────────────────────

#[test]
fn diamond_with_back_edge_breaks_the_data_edge() {
    // a1→a2, a1→a3, a2→a4, a3→a4, plus a back edge a4→a2 of kind data
    // (the lowest weight in the cycle).
    let config = GraphConfig::default();
    let builder = GraphBuilder::new(&config);
    let edges = vec![
        edge("a1", "a2", EdgeKind::Import),
        edge("a1", "a3", EdgeKind::Import),
        edge("a2", "a4", EdgeKind::Call),
        edge("a3", "a4", EdgeKind::Call),
        edge("a4", "a2", EdgeKind::Data),
    ];

    let (graph, stats) = builder.build(ids(&["a1", "a2", "a3", "a4"]), edges).unwrap();

    assert_eq!(stats.broken_edges.len(), 1);
    let broken = &stats.broken_edges[0];
    assert_eq!(broken.from.as_str(), "a4");
    assert_eq!(broken.to.as_str(), "a2");
    assert_eq!(broken.kind, EdgeKind::Data);

    // 1 of 5 edges broken (20 %) exceeds the 5 % warn ratio.
    assert!(stats.degraded);

    let waves: Vec<Vec<&str>> = graph
        .waves()
        .iter()
        .map(|wave| wave.atoms.iter().map(|id| id.as_str()).collect())
        .collect();
    assert_eq!(waves, vec![vec!["a1"], vec!["a2", "a3"], vec!["a4"]]);
}

#[test]
fn weight_ties_break_lexicographically() {
    // A two-cycle of equal weight; the lexicographically smaller
    // (from, to) pair is removed.
    let config = GraphConfig {
        cycle_break_abort_ratio: Some(0.9),
        ..Default::default()
    };
    let builder = GraphBuilder::new(&config);
    let edges = vec![
        edge("a1", "a2", EdgeKind::Data),
        edge("a2", "a1", EdgeKind::Data),
    ];

    let (graph, stats) = builder.build(ids(&["a1", "a2"]), edges).unwrap();
    assert_eq!(stats.broken_edges.len(), 1);
    assert_eq!(stats.broken_edges[0].from.as_str(), "a1");
    assert_eq!(graph.edges()[0].from.as_str(), "a2");
}

#[test]
fn excessive_breaking_aborts_the_plan() {
    // Only edges are the two-cycle: breaking one of two is 50 %, past the
    // default 20 % abort ratio.
    let config = GraphConfig::default();
    let builder = GraphBuilder::new(&config);
    let edges = vec![
        edge("a1", "a2", EdgeKind::Data),
        edge("a2", "a1", EdgeKind::Data),
    ];

    let error = builder.build(ids(&["a1", "a2"]), edges).unwrap_err();
    assert!(matches!(error, GraphError::ExcessiveCycleBreaking { .. }));
}

// ─── Waves ─────────────────────────────────────────────────────────────────

#[test]
fn independent_atoms_share_one_wave() {
    let config = GraphConfig::default();
    let builder = GraphBuilder::new(&config);
    let (graph, _) = builder.build(ids(&["a3", "a1", "a2"]), Vec::new()).unwrap();

    assert_eq!(graph.waves().len(), 1);
    let members: Vec<&str> = graph.waves()[0].atoms.iter().map(|id| id.as_str()).collect();
    assert_eq!(members, vec!["a1", "a2", "a3"]);
}

#[test]
fn waves_partition_nodes_and_respect_edges() {
    let config = GraphConfig::default();
    let builder = GraphBuilder::new(&config);
    let edges = vec![
        edge("a1", "a2", EdgeKind::Call),
        edge("a2", "a3", EdgeKind::Call),
        edge("a1", "a4", EdgeKind::Type),
        edge("a4", "a3", EdgeKind::Data),
    ];
    let (graph, _) = builder.build(ids(&["a1", "a2", "a3", "a4"]), edges).unwrap();

    // Partition: every node in exactly one wave.
    let mut seen: Vec<&AtomId> = Vec::new();
    for wave in graph.waves() {
        for atom in &wave.atoms {
            assert!(!seen.contains(&atom), "atom {atom} in two waves");
            seen.push(atom);
        }
    }
    assert_eq!(seen.len(), graph.node_count());

    // Edge discipline: strictly increasing wave index along edges.
    for edge in graph.edges() {
        assert!(graph.wave_of(&edge.from).unwrap() < graph.wave_of(&edge.to).unwrap());
    }
}

#[test]
fn dependants_track_reverse_adjacency() {
    let config = GraphConfig::default();
    let builder = GraphBuilder::new(&config);
    let edges = vec![
        edge("a1", "a2", EdgeKind::Call),
        edge("a1", "a3", EdgeKind::Call),
        edge("a2", "a4", EdgeKind::Call),
    ];
    let (graph, _) = builder.build(ids(&["a1", "a2", "a3", "a4"]), edges).unwrap();

    let dependants = graph.transitive_dependants(&AtomId::from("a1"));
    let names: Vec<&str> = dependants.iter().map(|id| id.as_str()).collect();
    assert_eq!(names, vec!["a2", "a3", "a4"]);

    let deps: Vec<&str> = graph
        .dependencies_of(&AtomId::from("a4"))
        .map(|id| id.as_str())
        .collect();
    assert_eq!(deps, vec!["a2"]);
}
