//! Graph builder benchmarks: layered DAGs and cycle-heavy multigraphs.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mosaic_analysis::graph::GraphBuilder;
use mosaic_core::config::GraphConfig;
use mosaic_core::model::edge::{DependencyEdge, EdgeKind};
use mosaic_core::types::identifiers::AtomId;

/// A layered DAG: `layers` layers of `width` atoms, each atom depending on
/// two atoms of the previous layer.
fn layered(layers: usize, width: usize) -> (Vec<AtomId>, Vec<DependencyEdge>) {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for layer in 0..layers {
        for slot in 0..width {
            let id = AtomId::new(format!("l{layer:02}s{slot:02}"));
            if layer > 0 {
                for offset in 0..2usize {
                    let pred = format!("l{:02}s{:02}", layer - 1, (slot + offset) % width);
                    edges.push(DependencyEdge::new(
                        pred,
                        id.as_str(),
                        if offset == 0 { EdgeKind::Call } else { EdgeKind::Data },
                    ));
                }
            }
            nodes.push(id);
        }
    }
    (nodes, edges)
}

fn bench_layered_build(c: &mut Criterion) {
    let (nodes, edges) = layered(20, 50);
    let config = GraphConfig::default();
    c.bench_function("graph_build_layered_1000", |b| {
        b.iter(|| {
            let builder = GraphBuilder::new(&config);
            let (graph, _) = builder
                .build(black_box(nodes.clone()), black_box(edges.clone()))
                .unwrap();
            black_box(graph.waves().len())
        })
    });
}

fn bench_cycle_breaking(c: &mut Criterion) {
    let (nodes, mut edges) = layered(10, 20);
    // Add back edges to force cycle breaking.
    for slot in 0..20usize {
        edges.push(DependencyEdge::new(
            format!("l09s{slot:02}"),
            format!("l00s{slot:02}"),
            EdgeKind::Data,
        ));
    }
    let config = GraphConfig {
        cycle_break_abort_ratio: Some(1.0),
        ..Default::default()
    };
    c.bench_function("graph_build_with_cycles_200", |b| {
        b.iter(|| {
            let builder = GraphBuilder::new(&config);
            let (graph, stats) = builder
                .build(black_box(nodes.clone()), black_box(edges.clone()))
                .unwrap();
            black_box((graph.edge_count(), stats.broken_edges.len()))
        })
    });
}

criterion_group!(benches, bench_layered_build, bench_cycle_breaking);
criterion_main!(benches);
