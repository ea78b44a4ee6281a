//! HyperLogLog++ cardinality estimator for `Sketch` values, parameterized with precision `P`
//! in [4..18] range which defines the number of buckets `M = 2^P` it accepts.
//!
//! # Estimation
//! - Sparse sketches are counted exactly, their size is the number of unique hashes.
//! - Normal sketches use the raw HyperLogLog estimate `alpha(M) * M^2 / sum(2^-bucket)`,
//!   corrected with empirical bias for raw estimates up to `5 * M`
//!   (see `BiasEstimator`) and replaced by linear counting `M * ln(M / zeros)`
//!   while it stays below the per-precision threshold.
//!
//! Original HyperLogLog++ paper:
//! https://static.googleusercontent.com/media/research.google.com/en//pubs/archive/40671.pdf
//!
//! Expected error:
//!   P = 10: 1.04 / sqrt(2^10) = 3.25%
//!   P = 12: 1.04 / sqrt(2^12) = 1.62%
//!   P = 14: 1.04 / sqrt(2^14) = 0.81%
//!   P = 18: 1.04 / sqrt(2^18) = 0.20%

use crate::bias::BiasEstimator;
use crate::error::{Result, SketchError};
use crate::normal::NormalSketch;
use crate::sketch::{Sketch, SketchTrait};
use crate::{DEFAULT_PRECISION, MIN_PRECISION};

/// Linear counting thresholds for precisions in [4..18] range
const LINEAR_COUNTING_THRESHOLDS: [f64; 15] = [
    10.0, 20.0, 40.0, 80.0, 220.0, 400.0, 900.0, 1800.0, 3100.0, 6500.0, 11500.0, 20000.0,
    50000.0, 120000.0, 350000.0,
];

#[derive(Debug, Clone, Copy)]
pub struct HyperLogLogEstimator {
    precision: u32,
    /// Number of buckets as `f64` since it only takes part in estimate math
    n_buckets: f64,
    alpha: f64,
    linear_counting_threshold: f64,
    bias_estimator: BiasEstimator,
}

impl HyperLogLogEstimator {
    /// Creates new instance of `HyperLogLogEstimator` for `precision` in [4..18] range
    pub fn new(precision: u32) -> Result<Self> {
        let bias_estimator = BiasEstimator::new(precision)?;
        Ok(Self::with_bias_estimator(precision, bias_estimator))
    }

    #[inline]
    fn with_bias_estimator(precision: u32, bias_estimator: BiasEstimator) -> Self {
        let m = 1usize << precision;
        Self {
            precision,
            n_buckets: m as f64,
            alpha: alpha(m),
            linear_counting_threshold: LINEAR_COUNTING_THRESHOLDS
                [(precision - MIN_PRECISION) as usize],
            bias_estimator,
        }
    }

    #[inline]
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Return cardinality estimate of any sketch variant
    pub fn estimate_count(&self, sketch: &Sketch) -> Result<usize> {
        match sketch {
            Sketch::Sparse(sparse) => Ok(sparse.size()),
            Sketch::Normal(normal) => self.estimate_normal(normal),
        }
    }

    /// Return cardinality estimate of `NormalSketch` with `2^precision` buckets
    pub fn estimate_normal(&self, sketch: &NormalSketch) -> Result<usize> {
        let n_buckets = 1usize << self.precision;
        if sketch.size() != n_buckets {
            return Err(SketchError::size_mismatch(n_buckets, sketch.size()));
        }

        let mut sum = 0.0;
        let mut zeros = 0usize;
        for &bucket in sketch.data() {
            sum += 2f64.powi(-i32::from(bucket));
            zeros += usize::from(bucket == 0);
        }

        let m = self.n_buckets;
        let mut estimate = self.alpha * m * m * (1.0 / sum);
        if estimate <= 5.0 * m {
            estimate -= self.bias_estimator.estimate_bias(estimate);
        }

        if zeros > 0 {
            let linear_count = m * (m / zeros as f64).ln();
            if linear_count <= self.linear_counting_threshold {
                estimate = linear_count;
            }
        }

        // negative estimates saturate to zero
        Ok((estimate + 0.5) as usize)
    }
}

impl Default for HyperLogLogEstimator {
    fn default() -> Self {
        Self::with_bias_estimator(
            DEFAULT_PRECISION,
            BiasEstimator::with_valid_precision(DEFAULT_PRECISION),
        )
    }
}

/// Parameter for bias correction
#[inline]
fn alpha(m: usize) -> f64 {
    match m {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / (m as f64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::SparseSketch;
    use test_case::test_case;

    /// Deterministic hash stream: high half of splitmix64 outputs
    fn hashes(seed: u64, n: usize) -> impl Iterator<Item = u32> {
        let mut state = seed;
        (0..n).map(move |_| {
            state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
            let mut z = state;
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            z ^= z >> 31;
            (z >> 32) as u32
        })
    }

    #[test_case(4, 1 => "{ kind: Normal, precision: 4, size: 16, non_zero: 1 } estimate = 1")]
    #[test_case(4, 10 => "{ kind: Normal, precision: 4, size: 16, non_zero: 8 } estimate = 11")]
    #[test_case(4, 50 => "{ kind: Normal, precision: 4, size: 16, non_zero: 16 } estimate = 53")]
    #[test_case(4, 100 => "{ kind: Normal, precision: 4, size: 16, non_zero: 16 } estimate = 97")]
    #[test_case(4, 1000 => "{ kind: Normal, precision: 4, size: 16, non_zero: 16 } estimate = 1099")]
    #[test_case(10, 0 => "{ kind: Normal, precision: 10, size: 1024, non_zero: 0 } estimate = 0")]
    #[test_case(10, 1 => "{ kind: Normal, precision: 10, size: 1024, non_zero: 1 } estimate = 1")]
    #[test_case(10, 10 => "{ kind: Normal, precision: 10, size: 1024, non_zero: 10 } estimate = 10")]
    #[test_case(10, 100 => "{ kind: Normal, precision: 10, size: 1024, non_zero: 93 } estimate = 97")]
    #[test_case(10, 500 => "{ kind: Normal, precision: 10, size: 1024, non_zero: 396 } estimate = 501")]
    #[test_case(10, 1000 => "{ kind: Normal, precision: 10, size: 1024, non_zero: 635 } estimate = 1034")]
    #[test_case(10, 3000 => "{ kind: Normal, precision: 10, size: 1024, non_zero: 970 } estimate = 3045")]
    #[test_case(10, 5000 => "{ kind: Normal, precision: 10, size: 1024, non_zero: 1018 } estimate = 5294")]
    #[test_case(10, 10_000 => "{ kind: Normal, precision: 10, size: 1024, non_zero: 1024 } estimate = 9984")]
    #[test_case(10, 100_000 => "{ kind: Normal, precision: 10, size: 1024, non_zero: 1024 } estimate = 99204")]
    #[test_case(14, 100 => "{ kind: Normal, precision: 14, size: 16384, non_zero: 100 } estimate = 100")]
    #[test_case(14, 10_000 => "{ kind: Normal, precision: 14, size: 16384, non_zero: 7520 } estimate = 10065")]
    #[test_case(14, 50_000 => "{ kind: Normal, precision: 14, size: 16384, non_zero: 15593 } estimate = 50110")]
    #[test_case(14, 100_000 => "{ kind: Normal, precision: 14, size: 16384, non_zero: 16340 } estimate = 100878")]
    #[test_case(18, 1000 => "{ kind: Normal, precision: 18, size: 262144, non_zero: 999 } estimate = 1001")]
    #[test_case(18, 100_000 => "{ kind: Normal, precision: 18, size: 262144, non_zero: 83086 } estimate = 99925")]
    fn test_estimate_normal(precision: u32, n: usize) -> String {
        let mut sketch = NormalSketch::new(precision).unwrap();
        sketch.extend(hashes(42, n));
        let estimator = HyperLogLogEstimator::new(precision).unwrap();
        let estimate = estimator.estimate_normal(&sketch).unwrap();
        format!("{:?} estimate = {}", sketch, estimate)
    }

    #[test]
    fn test_estimate_sparse_is_exact() {
        let estimator = HyperLogLogEstimator::default();
        let mut sketch = Sketch::new();
        assert_eq!(estimator.estimate_count(&sketch).unwrap(), 0);
        for (i, h) in hashes(7, 256).enumerate() {
            sketch.aggregate(h);
            // re-inserting keeps the count
            sketch.aggregate(h);
            assert_eq!(estimator.estimate_count(&sketch).unwrap(), i + 1);
        }
    }

    #[test]
    fn test_estimate_count_dispatches_to_normal() {
        let estimator = HyperLogLogEstimator::new(14).unwrap();
        let mut normal = NormalSketch::new(14).unwrap();
        normal.extend(hashes(42, 10_000));
        let expected = estimator.estimate_normal(&normal).unwrap();
        assert_eq!(estimator.estimate_count(&Sketch::from(normal)).unwrap(), expected);
        assert_eq!(expected, 10065);
    }

    #[test]
    fn test_estimate_empty_normal() {
        for precision in MIN_PRECISION..=crate::MAX_PRECISION {
            let estimator = HyperLogLogEstimator::new(precision).unwrap();
            let sketch = NormalSketch::new(precision).unwrap();
            assert_eq!(estimator.estimate_normal(&sketch).unwrap(), 0, "p = {precision}");
        }
    }

    #[test]
    fn test_estimate_saturated() {
        let sketch = NormalSketch::from_data(vec![23; 1024]).unwrap();
        let estimate = HyperLogLogEstimator::default()
            .estimate_normal(&sketch)
            .unwrap();
        assert!(estimate > 6_000_000_000);
        assert_eq!(estimate, 6_189_397_985);
    }

    #[test]
    fn test_estimate_size_mismatch() {
        let estimator = HyperLogLogEstimator::new(12).unwrap();
        let err = estimator
            .estimate_normal(&NormalSketch::new(10).unwrap())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "sketch size mismatch: expected 4096 buckets, got 1024"
        );

        let sparse = Sketch::from(SparseSketch::from_iter([1, 2, 3]));
        assert_eq!(estimator.estimate_count(&sparse).unwrap(), 3);
    }

    #[test_case(3 => matches Err(SketchError::InvalidPrecision { min: 4, max: 18, actual: 3 }))]
    #[test_case(19 => matches Err(SketchError::InvalidPrecision { min: 4, max: 18, actual: 19 }))]
    #[test_case(4 => matches Ok(HyperLogLogEstimator { precision: 4, .. }))]
    #[test_case(18 => matches Ok(HyperLogLogEstimator { precision: 18, .. }))]
    fn test_new(precision: u32) -> Result<HyperLogLogEstimator> {
        HyperLogLogEstimator::new(precision)
    }

    #[test]
    fn test_default() {
        let estimator = HyperLogLogEstimator::default();
        assert_eq!(estimator.precision(), 10);
        assert_eq!(estimator.n_buckets, 1024.0);
        assert_eq!(estimator.linear_counting_threshold, 900.0);
    }

    #[test_case(16 => 0.673)]
    #[test_case(32 => 0.697)]
    #[test_case(64 => 0.709)]
    #[test_case(128 => 0.7213 / (1.0 + 1.079 / 128.0))]
    #[test_case(1024 => 0.7213 / (1.0 + 1.079 / 1024.0))]
    fn test_alpha(m: usize) -> f64 {
        alpha(m)
    }
}
