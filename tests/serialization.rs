mod common;

use common::{normal, sparse};
use hll_sketch::{HyperLogLogEstimator, NormalSketch, Sketch, SketchError, SparseSketch};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use test_case::test_case;

fn roundtrip(sketch: &Sketch) -> (Sketch, usize) {
    let mut buf = Vec::new();
    sketch.serialize(&mut buf);
    let mut input = buf.as_slice();
    let restored = Sketch::deserialize(&mut input).unwrap();
    assert!(input.is_empty(), "{} trailing bytes", input.len());
    (restored, buf.len())
}

#[test_case(sparse(1, 0) => 5; "empty sparse")]
#[test_case(sparse(1, 1) => 9; "single hash")]
#[test_case(sparse(1, 256) => 1029; "sparse at threshold")]
fn test_tagged_roundtrip(sketch: Sketch) -> usize {
    let (restored, len) = roundtrip(&sketch);
    assert_eq!(restored, sketch);
    len
}

#[test_case(10, 0; "all zero")]
#[test_case(4, 1000; "saturated small")]
#[test_case(14, 100_000; "large")]
fn test_tagged_roundtrip_normal(precision: u32, n: usize) {
    let sketch = normal(precision, 1, n);
    let (restored, len) = roundtrip(&sketch);
    assert_eq!(restored, sketch);
    // type id, precision, two length fields, at most the raw buckets
    assert!(len <= 2 + 8 + (1 << precision));
    if n == 0 {
        assert!(len < 2 + 8 + (1 << precision));
    }
}

#[test]
fn test_sparse_duplicate_input_roundtrip() {
    let sketch: SparseSketch = [5, 5, 6, 6, 6, 7].into_iter().collect();
    let mut buf = Vec::new();
    sketch.serialize(&mut buf);
    assert_eq!(buf.len(), 4 + 3 * 4);
    assert_eq!(SparseSketch::deserialize(&mut buf.as_slice()).unwrap(), sketch);
}

#[test]
fn test_random_normal_roundtrip() {
    let mut rng = StdRng::seed_from_u64(2024);
    for precision in [4, 8, 10, 14, 18] {
        let data: Vec<u8> = (0..1usize << precision)
            .map(|_| rng.gen_range(0..=23))
            .collect();
        let sketch = NormalSketch::from_data(data).unwrap();

        let mut buf = Vec::new();
        sketch.serialize(&mut buf);
        let restored = NormalSketch::deserialize(precision, &mut buf.as_slice()).unwrap();
        assert_eq!(restored, sketch, "p = {precision}");
    }
}

#[test]
fn test_estimate_survives_roundtrip() {
    let estimator = HyperLogLogEstimator::new(14).unwrap();
    let sketch = normal(14, 9, 50_000);
    let (restored, _) = roundtrip(&sketch);
    assert_eq!(
        estimator.estimate_count(&restored).unwrap(),
        estimator.estimate_count(&sketch).unwrap()
    );
}

#[test_case(sparse(1, 20); "sparse")]
#[test_case(normal(10, 1, 0); "compressed normal")]
#[test_case(normal(10, 1, 5000); "dense normal")]
fn test_truncated_input_is_rejected(sketch: Sketch) {
    let mut buf = Vec::new();
    sketch.serialize(&mut buf);
    for len in 0..buf.len() {
        assert!(
            Sketch::deserialize(&mut &buf[..len]).is_err(),
            "prefix of {len} bytes accepted"
        );
    }
}

#[test]
fn test_deserialize_into_wrong_precision() {
    let mut buf = Vec::new();
    NormalSketch::new(12).unwrap().serialize(&mut buf);
    assert!(matches!(
        NormalSketch::deserialize(10, &mut buf.as_slice()),
        Err(SketchError::SizeMismatch {
            expected: 1024,
            actual: 4096
        })
    ));
}

#[test]
fn test_deserialize_invalid_precision() {
    let mut buf: &[u8] = &[2, 40, 0, 0, 0, 0];
    assert!(matches!(
        Sketch::deserialize(&mut buf),
        Err(SketchError::InvalidPrecision { actual: 40, .. })
    ));
}
