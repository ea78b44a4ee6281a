mod common;

use common::{hashes, normal, sparse};
use hll_sketch::{
    HyperLogLogEstimator, NormalSketch, Sketch, SketchKind, SketchMerger, SketchTrait,
    SparseSketch,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use test_case::test_case;

/// Random sketch of either variant, dense sketches use the default precision
fn random_sketch(rng: &mut StdRng) -> Sketch {
    let n = rng.gen_range(0..400);
    let values: Vec<u32> = (0..n).map(|_| rng.gen()).collect();
    if rng.gen_bool(0.5) {
        values.into_iter().collect::<SparseSketch>().into()
    } else {
        let mut sketch = NormalSketch::default();
        sketch.extend(values);
        sketch.into()
    }
}

/// Reduce sparse results to the dense form they would take once promoted
fn densify(sketch: Sketch) -> Sketch {
    match sketch {
        Sketch::Sparse(sparse) => sparse.to_normal(10).unwrap().into(),
        normal => normal,
    }
}

#[test]
fn test_merge_is_commutative() {
    let mut rng = StdRng::seed_from_u64(12345);
    let merger = SketchMerger::default();
    for _ in 0..200 {
        let a = random_sketch(&mut rng);
        let b = random_sketch(&mut rng);
        let ab = merger.merge(a.clone(), b.clone()).unwrap();
        let ba = merger.merge(b, a).unwrap();
        assert_eq!(ab, ba);
    }
}

#[test]
fn test_merge_is_associative() {
    let mut rng = StdRng::seed_from_u64(54321);
    let merger = SketchMerger::default();
    for _ in 0..200 {
        let a = random_sketch(&mut rng);
        let b = random_sketch(&mut rng);
        let c = random_sketch(&mut rng);
        let left = merger
            .merge(merger.merge(a.clone(), b.clone()).unwrap(), c.clone())
            .unwrap();
        let right = merger.merge(a, merger.merge(b, c).unwrap()).unwrap();
        // grouping decides whether an intermediate union crossed the threshold
        assert_eq!(densify(left), densify(right));
    }
}

#[test]
fn test_merge_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(777);
    let merger = SketchMerger::default();
    for _ in 0..100 {
        let a = random_sketch(&mut rng);
        let merged = merger.merge(a.clone(), a.clone()).unwrap();
        if a.kind() == SketchKind::Normal || a.size() <= 256 {
            assert_eq!(merged, a);
        } else {
            // self union of a large sparse sketch is promoted
            assert_eq!(merged, densify(a));
        }
    }
}

#[test_case(0, 0 => (SketchKind::Sparse, 0); "both empty")]
#[test_case(10, 0 => (SketchKind::Sparse, 10); "empty rhs")]
#[test_case(0, 10 => (SketchKind::Sparse, 10); "empty lhs")]
#[test_case(128, 128 => (SketchKind::Sparse, 256); "union at threshold")]
#[test_case(128, 129 => (SketchKind::Normal, 1024); "union above threshold")]
#[test_case(256, 0 => (SketchKind::Sparse, 256); "one sided at threshold")]
#[test_case(0, 257 => (SketchKind::Normal, 1024); "one sided above threshold")]
#[test_case(1000, 1000 => (SketchKind::Normal, 1024); "large union")]
fn test_sparse_union_promotion(lhs_n: usize, rhs_n: usize) -> (SketchKind, usize) {
    // disjoint parts of one stream
    let all: Vec<u32> = hashes(3, lhs_n + rhs_n).collect();
    let lhs: Sketch = all[..lhs_n].iter().copied().collect::<SparseSketch>().into();
    let rhs: Sketch = all[lhs_n..].iter().copied().collect::<SparseSketch>().into();

    let merged = lhs.merge(rhs).unwrap();
    let union: SparseSketch = all.into_iter().collect();
    match &merged {
        Sketch::Sparse(sparse) => assert_eq!(sparse, &union),
        Sketch::Normal(normal) => assert_eq!(normal, &union.to_normal(10).unwrap()),
    }
    (merged.kind(), merged.size())
}

#[test]
fn test_sparse_union_estimate_is_exact() {
    let estimator = HyperLogLogEstimator::default();
    let merged = sparse(1, 200).merge(sparse(1, 250)).unwrap();
    assert_eq!(estimator.estimate_count(&merged).unwrap(), 250);
}

#[test]
fn test_mixed_merge_matches_dense_union() {
    let estimator = HyperLogLogEstimator::new(12).unwrap();
    let dense = normal(12, 5, 20_000);
    let extra = sparse(6, 200);

    let merged = dense.clone().merge(extra.clone()).unwrap();
    let expected = {
        let mut sketch = NormalSketch::new(12).unwrap();
        sketch.extend(hashes(5, 20_000).chain(hashes(6, 200)));
        Sketch::from(sketch)
    };
    assert_eq!(merged, expected);
    assert_eq!(extra.merge(dense).unwrap(), expected);

    let estimate = estimator.estimate_count(&merged).unwrap() as f64;
    assert!((estimate - 20_200.0).abs() / 20_200.0 < 0.1, "{estimate}");
}

#[test]
fn test_normal_merge_size_mismatch() {
    let err = normal(10, 1, 10).merge(normal(11, 1, 10)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "sketch size mismatch: expected 1024 buckets, got 2048"
    );
}
