use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fragment_assembler::{
    AssemblyConfig, Fragment, FragmentGenerator, GeneratorConfig, GreedyAssembler, NoopObserver,
    OrientationSelector, OverlapConfig, OverlapGraph, SelectionMode,
};
use std::time::Duration;

/// Seeded fragment set cut from a random source of `total_length` bases.
fn synthetic_fragments(total_length: usize, reverse_ratio: f64) -> Vec<Fragment> {
    let config = GeneratorConfig {
        total_length,
        avg_fragment_length: 100,
        min_overlap: 30,
        shuffle: true,
        reverse_ratio,
        seed: 42,
    };
    FragmentGenerator::new(config)
        .expect("valid generator config")
        .generate()
        .fragments
}

fn bench_graph_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_construction");
    group.measurement_time(Duration::from_secs(10));

    for total in [2_000, 5_000, 10_000].iter() {
        let fragments = synthetic_fragments(*total, 0.0);

        group.bench_with_input(
            BenchmarkId::new("build", fragments.len()),
            &fragments,
            |b, fragments| {
                b.iter(|| {
                    let _graph =
                        OverlapGraph::build(black_box(fragments.clone()), OverlapConfig::default());
                });
            },
        );
    }

    group.finish();
}

fn bench_greedy_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("greedy_assembly");
    group.measurement_time(Duration::from_secs(15));
    group.sample_size(20);

    for total in [2_000, 5_000, 10_000].iter() {
        let fragments = synthetic_fragments(*total, 0.0);
        let graph = OverlapGraph::build(fragments.clone(), OverlapConfig::default())
            .expect("unique fragment ids");

        group.bench_with_input(
            BenchmarkId::new("assemble", fragments.len()),
            &graph,
            |b, graph| {
                b.iter(|| {
                    let _contig = GreedyAssembler::new()
                        .assemble_observed(black_box(graph.clone()), &mut NoopObserver);
                });
            },
        );
    }

    group.finish();
}

fn bench_orientation(c: &mut Criterion) {
    let mut group = c.benchmark_group("orientation");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    let selector = OrientationSelector::new(AssemblyConfig::default());
    for total in [1_200, 3_000].iter() {
        let fragments = synthetic_fragments(*total, 0.5);

        for mode in [SelectionMode::Local, SelectionMode::Global] {
            group.bench_with_input(
                BenchmarkId::new(mode.to_string(), fragments.len()),
                &fragments,
                |b, fragments| {
                    b.iter(|| {
                        let _oriented =
                            selector.select_observed(black_box(fragments), mode, &mut NoopObserver);
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_graph_construction,
    bench_greedy_assembly,
    bench_orientation
);
criterion_main!(benches);
