use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use linear_rl::features::{DenseVector, SparseVector};
use linear_rl::projectors::{Projector, TileCoderConfig};
use linear_rl::traces::{ReplacingTrace, Trace};

const DIMENSION: usize = 10_000;

fn sparse(nnz: usize, offset: usize) -> SparseVector {
    SparseVector::from_entries(
        DIMENSION,
        (0..nnz).map(|i| ((i * 97 + offset) % DIMENSION, 1.0)),
    )
}

fn bench_sparse_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("sparse");
    for nnz in [10, 100, 1000] {
        group.throughput(Throughput::Elements(nnz as u64));
        let x = sparse(nnz, 0);
        let y = sparse(nnz, 3);
        let weights = DenseVector::zeros(DIMENSION);

        group.bench_with_input(BenchmarkId::new("dot_sparse", nnz), &nnz, |b, _| {
            b.iter(|| x.dot(&y))
        });
        group.bench_with_input(BenchmarkId::new("dot_dense", nnz), &nnz, |b, _| {
            b.iter(|| weights.dot(&x))
        });
        group.bench_with_input(BenchmarkId::new("add_scaled", nnz), &nnz, |b, _| {
            let mut z = x.clone();
            b.iter(|| z.add_scaled(0.5, &y))
        });
        group.bench_with_input(BenchmarkId::new("trace_update", nnz), &nnz, |b, _| {
            let mut trace = ReplacingTrace::new(DIMENSION);
            b.iter(|| trace.update(0.9, &x))
        });
    }
    group.finish();
}

fn bench_tile_coding(c: &mut Criterion) {
    let mut group = c.benchmark_group("tiles");
    let ranges = vec![(-1.2, 0.6), (-0.07, 0.07)];
    for (name, memory_size) in [("grid", None), ("hashed", Some(10_000))] {
        let coder = TileCoderConfig {
            num_tilings: 10,
            resolution: 10,
            memory_size,
            include_bias: true,
            num_tags: 3,
        }
        .build(ranges.clone())
        .unwrap();
        let mut features = SparseVector::new(coder.dimension());
        group.bench_function(BenchmarkId::new("project", name), |b| {
            b.iter(|| coder.project_tagged(Some(&[-0.5, 0.01]), 2, &mut features))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sparse_ops, bench_tile_coding);
criterion_main!(benches);
