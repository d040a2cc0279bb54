//! Property tests over the graph builder: invariants that must hold for
//! ANY raw multigraph, not just hand-crafted cases.

use proptest::prelude::*;

use mosaic_analysis::graph::GraphBuilder;
use mosaic_core::config::GraphConfig;
use mosaic_core::errors::GraphError;
use mosaic_core::model::edge::{DependencyEdge, EdgeKind};
use mosaic_core::types::identifiers::AtomId;

fn kind_from(index: usize) -> EdgeKind {
    match index % 4 {
        0 => EdgeKind::Import,
        1 => EdgeKind::Type,
        2 => EdgeKind::Call,
        _ => EdgeKind::Data,
    }
}

/// A permissive config so dense random graphs still build.
fn permissive() -> GraphConfig {
    GraphConfig {
        cycle_break_warn_ratio: Some(0.05),
        cycle_break_abort_ratio: Some(1.0),
    }
}

proptest! {
    /// The built graph is always acyclic: Kahn consumes every node.
    #[test]
    fn built_graph_is_acyclic(
        node_count in 2usize..10,
        raw in proptest::collection::vec((0usize..10, 0usize..10, 0usize..4), 0..40),
    ) {
        let nodes: Vec<AtomId> = (0..node_count)
            .map(|i| AtomId::new(format!("a{i:02}")))
            .collect();
        let edges: Vec<DependencyEdge> = raw
            .iter()
            .map(|(from, to, kind)| {
                DependencyEdge::new(
                    format!("a{:02}", from % node_count),
                    format!("a{:02}", to % node_count),
                    kind_from(*kind),
                )
            })
            .collect();

        let config = permissive();
        let builder = GraphBuilder::new(&config);
        let (graph, _) = builder.build(nodes.clone(), edges).unwrap();

        prop_assert_eq!(graph.topological_order().len(), nodes.len());
    }

    /// Waves partition the node set, and every surviving edge crosses
    /// strictly forward in wave index.
    #[test]
    fn waves_partition_and_edges_point_forward(
        node_count in 2usize..10,
        raw in proptest::collection::vec((0usize..10, 0usize..10, 0usize..4), 0..40),
    ) {
        let nodes: Vec<AtomId> = (0..node_count)
            .map(|i| AtomId::new(format!("a{i:02}")))
            .collect();
        let edges: Vec<DependencyEdge> = raw
            .iter()
            .map(|(from, to, kind)| {
                DependencyEdge::new(
                    format!("a{:02}", from % node_count),
                    format!("a{:02}", to % node_count),
                    kind_from(*kind),
                )
            })
            .collect();

        let config = permissive();
        let builder = GraphBuilder::new(&config);
        let (graph, _) = builder.build(nodes.clone(), edges).unwrap();

        let mut wave_members: Vec<&AtomId> = graph
            .waves()
            .iter()
            .flat_map(|wave| wave.atoms.iter())
            .collect();
        wave_members.sort();
        wave_members.dedup();
        prop_assert_eq!(wave_members.len(), nodes.len());

        for edge in graph.edges() {
            let from_wave = graph.wave_of(&edge.from).unwrap();
            let to_wave = graph.wave_of(&edge.to).unwrap();
            prop_assert!(from_wave < to_wave);
        }

        // Wave indices ascend without gaps.
        for (index, wave) in graph.waves().iter().enumerate() {
            prop_assert_eq!(wave.index, index);
            prop_assert!(!wave.is_empty());
        }
    }

    /// Builds are deterministic run-to-run for arbitrary inputs.
    #[test]
    fn builds_are_deterministic(
        node_count in 2usize..8,
        raw in proptest::collection::vec((0usize..8, 0usize..8, 0usize..4), 0..30),
    ) {
        let nodes: Vec<AtomId> = (0..node_count)
            .map(|i| AtomId::new(format!("a{i:02}")))
            .collect();
        let make_edges = || -> Vec<DependencyEdge> {
            raw.iter()
                .map(|(from, to, kind)| {
                    DependencyEdge::new(
                        format!("a{:02}", from % node_count),
                        format!("a{:02}", to % node_count),
                        kind_from(*kind),
                    )
                })
                .collect()
        };

        let config = permissive();
        let builder = GraphBuilder::new(&config);
        let (first, _) = builder.build(nodes.clone(), make_edges()).unwrap();
        let (second, _) = builder.build(nodes, make_edges()).unwrap();

        prop_assert_eq!(first.topological_order(), second.topological_order());
        prop_assert_eq!(first.edges(), second.edges());
    }

    /// With the default config, a build either succeeds or fails with
    /// the excessive-cycle-breaking error; nothing panics.
    #[test]
    fn default_config_fails_closed(
        node_count in 2usize..8,
        raw in proptest::collection::vec((0usize..8, 0usize..8, 0usize..4), 0..30),
    ) {
        let nodes: Vec<AtomId> = (0..node_count)
            .map(|i| AtomId::new(format!("a{i:02}")))
            .collect();
        let edges: Vec<DependencyEdge> = raw
            .iter()
            .map(|(from, to, kind)| {
                DependencyEdge::new(
                    format!("a{:02}", from % node_count),
                    format!("a{:02}", to % node_count),
                    kind_from(*kind),
                )
            })
            .collect();

        let config = GraphConfig::default();
        let builder = GraphBuilder::new(&config);
        match builder.build(nodes, edges) {
            Ok((graph, stats)) => {
                prop_assert_eq!(graph.topological_order().len(), graph.node_count());
                prop_assert!(stats.break_ratio <= 0.20 + f64::EPSILON);
            }
            Err(GraphError::ExcessiveCycleBreaking { .. }) => {}
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }
}
