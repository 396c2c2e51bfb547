use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use litgraph_analytics::collaboration::{CollaborationNetwork, CollaborationParams};
use litgraph_analytics::influence::{InfluenceEngine, InfluenceParams, PropagationMode};
use litgraph_analytics::similarity::{KeywordIndex, SimilarityEngine, SimilarityParams};
use litgraph_analytics::Deadline;
use litgraph_common::graph::synthetic::{SyntheticConfig, SyntheticGraph};
use litgraph_common::graph::GraphStore;
use litgraph_common::keywords::StopwordExtractor;

fn bench_influence(c: &mut Criterion) {
    let mut group = c.benchmark_group("influence");

    for papers in [1_000usize, 5_000] {
        let snapshot = SyntheticGraph::new(SyntheticConfig {
            papers,
            ..SyntheticConfig::default()
        })
        .generate();
        group.throughput(Throughput::Elements(snapshot.citation_count() as u64));

        for mode in [PropagationMode::Cumulative, PropagationMode::Frontier] {
            let params = InfluenceParams {
                mode,
                ..Default::default()
            };
            let id = BenchmarkId::new(format!("{:?}", mode), papers);
            group.bench_with_input(id, &params, |b, params| {
                b.iter(|| {
                    black_box(InfluenceEngine::new(&snapshot).compute(params, &Deadline::none()))
                })
            });
        }
    }

    group.finish();
}

fn bench_similarity(c: &mut Criterion) {
    let snapshot = SyntheticGraph::generate_with_seed(7);
    let extractor = StopwordExtractor::default();
    let targets: Vec<_> = snapshot.papers().iter().take(20).map(|p| p.id).collect();

    let mut group = c.benchmark_group("similarity");
    group.throughput(Throughput::Elements(targets.len() as u64));

    group.bench_function("index_build", |b| {
        b.iter(|| black_box(KeywordIndex::build(&snapshot, &extractor)))
    });

    let index = KeywordIndex::build(&snapshot, &extractor);
    let params = SimilarityParams::default();
    group.bench_function("find_similar", |b| {
        b.iter(|| {
            let engine = SimilarityEngine::new(&snapshot, &index, &extractor);
            for target in &targets {
                black_box(engine.find_similar(*target, &params, &Deadline::none()).ok());
            }
        })
    });

    group.finish();
}

fn bench_collaboration(c: &mut Criterion) {
    let snapshot = SyntheticGraph::generate_with_seed(7);
    let params = CollaborationParams::default();

    c.bench_function("collaboration_metrics", |b| {
        b.iter(|| {
            black_box(CollaborationNetwork::new(&snapshot).compute(&params, &Deadline::none()))
        })
    });
}

criterion_group!(benches, bench_influence, bench_similarity, bench_collaboration);
criterion_main!(benches);
