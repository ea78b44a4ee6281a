#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use criterion::measurement::WallTime;
use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkGroup, BenchmarkId, Criterion, Throughput,
};
use hll_sketch::{HyperLogLogEstimator, NormalSketch, Sketch, SketchMerger, SketchTrait};
use pprof::criterion::{Output, PProfProfiler};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tabled::settings::{Settings, Style};
use tabled::{Table, Tabled};

/// Aggregate, merge and estimate operations are benchmarked against cardinalities ranging from 0 to
/// `DEFAULT_MAX_CARDINALITY` or environment variable `N` (if defined) with cardinality doubled
/// with every iteration as [0, 1, 2, ..., N].
const DEFAULT_MAX_CARDINALITY: usize = 65536;
/// Precisions of dense sketches under benchmark
const PRECISIONS: [u32; 3] = [10, 12, 14];

criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Protobuf));
    targets = benchmark
}
criterion_main!(benches);

fn benchmark(c: &mut Criterion) {
    let max_cardinality = std::env::var("N")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_CARDINALITY);

    let cardinalities: Vec<usize> = std::iter::once(0)
        .chain((0..).map(|c| 1 << c))
        .take_while(|&c| c <= max_cardinality)
        .collect();

    let mut group = c.benchmark_group("aggregate");
    for &cardinality in &cardinalities {
        group.throughput(Throughput::Elements(cardinality.max(1) as u64));
        bench_aggregate(&mut group, "sparse", cardinality, Sketch::new);
        for precision in PRECISIONS {
            bench_aggregate(&mut group, &format!("normal_p{precision}"), cardinality, || {
                NormalSketch::new(precision).unwrap().into()
            });
        }
    }
    group.finish();

    let mut group = c.benchmark_group("estimate");
    group.throughput(Throughput::Elements(1));
    for &cardinality in &cardinalities {
        for precision in PRECISIONS {
            bench_estimate(&mut group, precision, cardinality);
        }
    }
    group.finish();

    let mut group = c.benchmark_group("merge");
    group.throughput(Throughput::Elements(1));
    for &cardinality in &cardinalities {
        bench_merge(&mut group, cardinality);
    }
    group.finish();

    let mut group = c.benchmark_group("serialize");
    group.throughput(Throughput::Elements(1));
    for &cardinality in &cardinalities {
        bench_serialize(&mut group, cardinality);
    }
    group.finish();

    // optional reports next to criterion output
    if let Ok(bench_results_path) = std::env::var("BENCH_RESULTS_PATH") {
        let results: Vec<StatRecord> = cardinalities
            .iter()
            .map(|&cardinality| StatRecord {
                cardinality,
                normal_p10: measure_error(10, cardinality),
                normal_p12: measure_error(12, cardinality),
                normal_p14: measure_error(14, cardinality),
                allocations_p12: measure_allocations(12, cardinality),
            })
            .collect();

        let table_config = Settings::default().with(Style::markdown());
        std::fs::write(
            format!("{}/sketch_stats.md", bench_results_path),
            Table::new(results).with(table_config).to_string(),
        )
        .unwrap();
    }
}

fn filled(create: impl Fn() -> Sketch, cardinality: usize) -> Sketch {
    let mut sketch = create();
    for i in 0..cardinality {
        sketch.insert(&i);
    }
    sketch
}

fn bench_aggregate(
    group: &mut BenchmarkGroup<WallTime>,
    name: &str,
    cardinality: usize,
    create: impl Fn() -> Sketch,
) {
    group.bench_with_input(
        BenchmarkId::new(name, cardinality),
        &cardinality,
        |b, &cardinality| {
            b.iter(|| {
                let mut sketch = create();
                for i in 0..black_box(cardinality) {
                    sketch.insert(black_box(&i));
                }
                sketch
            });
        },
    );
}

fn bench_estimate(group: &mut BenchmarkGroup<WallTime>, precision: u32, cardinality: usize) {
    let estimator = HyperLogLogEstimator::new(precision).unwrap();
    let sketch = filled(|| NormalSketch::new(precision).unwrap().into(), cardinality);
    group.bench_with_input(
        BenchmarkId::new(format!("normal_p{precision}"), cardinality),
        &sketch,
        |b, sketch| b.iter(|| estimator.estimate_count(black_box(sketch)).unwrap()),
    );
}

fn bench_merge(group: &mut BenchmarkGroup<WallTime>, cardinality: usize) {
    let merger = SketchMerger::default();
    let sparse = filled(Sketch::new, cardinality.min(256));
    let normal = filled(|| NormalSketch::default().into(), cardinality);
    let inputs = [
        ("sparse_sparse", sparse.clone(), sparse.clone()),
        ("normal_sparse", normal.clone(), sparse.clone()),
        ("normal_normal", normal.clone(), normal),
    ];
    for (name, left, right) in inputs {
        group.bench_with_input(
            BenchmarkId::new(name, cardinality),
            &(left, right),
            |b, (left, right)| {
                b.iter(|| {
                    merger
                        .merge(black_box(left.clone()), black_box(right.clone()))
                        .unwrap()
                })
            },
        );
    }
}

fn bench_serialize(group: &mut BenchmarkGroup<WallTime>, cardinality: usize) {
    let sketch = filled(|| NormalSketch::new(12).unwrap().into(), cardinality);
    let mut buf = Vec::new();
    sketch.serialize(&mut buf);
    group.bench_with_input(
        BenchmarkId::new("serialize_p12", cardinality),
        &sketch,
        |b, sketch| {
            b.iter(|| {
                let mut buf = Vec::with_capacity(4096 + 16);
                sketch.serialize(&mut buf);
                buf
            })
        },
    );
    group.bench_with_input(
        BenchmarkId::new("deserialize_p12", cardinality),
        &buf,
        |b, buf| b.iter(|| Sketch::deserialize(&mut black_box(buf.as_slice())).unwrap()),
    );
}

fn measure_allocations(precision: u32, cardinality: usize) -> String {
    let _profiler = dhat::Profiler::builder().testing().build();
    let sketch = filled(|| NormalSketch::new(precision).unwrap().into(), cardinality);
    let stats = dhat::HeapStats::get();
    format!(
        "{} / {} / {}",
        std::mem::size_of_val(&sketch),
        stats.total_bytes,
        stats.total_blocks,
    )
}

fn measure_error(precision: u32, cardinality: usize) -> String {
    let n = 100;
    let estimator = HyperLogLogEstimator::new(precision).unwrap();
    let mut total_relative_error: f64 = 0.0;
    let mut rng = StdRng::seed_from_u64(12345);
    for _ in 0..n {
        let mut sketch = NormalSketch::new(precision).unwrap();
        for _ in 0..cardinality {
            sketch.aggregate(rng.gen());
        }
        let relative_error = if cardinality == 0 {
            0.0
        } else {
            let estimate = estimator.estimate_normal(&sketch).unwrap() as f64;
            (estimate - cardinality as f64).abs() / cardinality as f64
        };
        total_relative_error += relative_error;
    }
    let avg_relative_error = total_relative_error / (n as f64);

    if avg_relative_error < 1.0 {
        format!("{:.4}", avg_relative_error)
    } else {
        format!("{:.2e}", avg_relative_error)
    }
}

#[derive(Tabled)]
struct StatRecord {
    cardinality: usize,
    normal_p10: String,
    normal_p12: String,
    normal_p14: String,
    allocations_p12: String,
}
