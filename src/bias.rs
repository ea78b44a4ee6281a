//! Empirical bias correction of raw HyperLogLog estimates, see `bias_data` for the tables.

use crate::bias_data::{BIASES, RAW_ESTIMATES};
use crate::error::{Result, SketchError};
use crate::{MAX_PRECISION, MIN_PRECISION};

/// Interpolates bias of a raw estimate from calibration tables of a single precision
#[derive(Debug, Clone, Copy)]
pub struct BiasEstimator {
    raw_estimates: &'static [f64],
    biases: &'static [f64],
}

impl BiasEstimator {
    /// Create new instance of `BiasEstimator` for `precision` in [4..18] range
    pub fn new(precision: u32) -> Result<Self> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
            return Err(SketchError::invalid_precision(
                MIN_PRECISION,
                MAX_PRECISION,
                precision,
            ));
        }
        Ok(Self::with_valid_precision(precision))
    }

    #[inline]
    pub(crate) fn with_valid_precision(precision: u32) -> Self {
        let idx = (precision - MIN_PRECISION) as usize;
        Self {
            raw_estimates: RAW_ESTIMATES[idx],
            biases: BIASES[idx],
        }
    }

    /// Return bias of `raw_estimate`, clamped to the first and the last table entries
    pub fn estimate_bias(&self, raw_estimate: f64) -> f64 {
        let last = self.raw_estimates.len() - 1;
        if raw_estimate <= self.raw_estimates[0] {
            return self.biases[0];
        }
        if raw_estimate >= self.raw_estimates[last] {
            return self.biases[last];
        }

        // first breakpoint not below `raw_estimate`, always in [1..last] range here
        let hi = self.raw_estimates.partition_point(|&x| x < raw_estimate);
        let x1 = self.raw_estimates[hi];
        if x1 == raw_estimate {
            return self.biases[hi];
        }
        let x0 = self.raw_estimates[hi - 1];
        let (b0, b1) = (self.biases[hi - 1], self.biases[hi]);
        b0 + (b1 - b0) * (raw_estimate - x0) / (x1 - x0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(3 => matches Err(SketchError::InvalidPrecision { min: 4, max: 18, actual: 3 }))]
    #[test_case(4 => matches Ok(_))]
    #[test_case(18 => matches Ok(_))]
    #[test_case(19 => matches Err(SketchError::InvalidPrecision { min: 4, max: 18, actual: 19 }))]
    fn test_new(precision: u32) -> Result<BiasEstimator> {
        BiasEstimator::new(precision)
    }

    #[test]
    fn test_tables_are_parallel() {
        for precision in MIN_PRECISION..=MAX_PRECISION {
            let idx = (precision - MIN_PRECISION) as usize;
            assert_eq!(RAW_ESTIMATES[idx].len(), BIASES[idx].len(), "p = {precision}");
            // first breakpoint sits one above its bias, as published
            assert_eq!(RAW_ESTIMATES[idx][0] - BIASES[idx][0], 1.0, "p = {precision}");
        }
    }

    #[test]
    fn test_first_breakpoint_is_exact() {
        let estimator = BiasEstimator::new(10).unwrap();
        assert_eq!(estimator.estimate_bias(738.1256), 737.1256);
    }

    #[test_case(0.0 => 737.1256; "zero")]
    #[test_case(700.0 => 737.1256; "below first breakpoint")]
    #[test_case(5084.1828 => -9.8172; "last breakpoint")]
    #[test_case(6000.0 => -9.8172; "above last breakpoint")]
    #[test_case(1e12 => -9.8172; "far above last breakpoint")]
    fn test_clamp(raw_estimate: f64) -> f64 {
        let bias = BiasEstimator::new(10).unwrap().estimate_bias(raw_estimate);
        (bias * 1e4).round() / 1e4
    }

    #[test]
    fn test_inner_breakpoints_are_exact() {
        let estimator = BiasEstimator::new(12).unwrap();
        let idx = (12 - MIN_PRECISION) as usize;
        for (&raw, &bias) in RAW_ESTIMATES[idx].iter().zip(BIASES[idx]) {
            assert_eq!(estimator.estimate_bias(raw), bias);
        }
    }

    #[test]
    fn test_interpolation() {
        let estimator = BiasEstimator::new(10).unwrap();
        // midway between (738.1256, 737.1256) and (750.4234, 724.4234)
        let bias = estimator.estimate_bias((738.1256 + 750.4234) / 2.0);
        assert!((bias - (737.1256 + 724.4234) / 2.0).abs() < 1e-9);

        // quarter way
        let raw = 738.1256 + (750.4234 - 738.1256) / 4.0;
        let bias = estimator.estimate_bias(raw);
        assert!((bias - (737.1256 + (724.4234 - 737.1256) / 4.0)).abs() < 1e-9);
    }

    #[test]
    fn test_interpolation_stays_between_neighbours() {
        let estimator = BiasEstimator::new(14).unwrap();
        let idx = (14 - MIN_PRECISION) as usize;
        let (raw, biases) = (RAW_ESTIMATES[idx], BIASES[idx]);
        for i in 1..raw.len() {
            let x = (raw[i - 1] + raw[i]) / 2.0;
            let bias = estimator.estimate_bias(x);
            let (lo, hi) = if biases[i - 1] < biases[i] {
                (biases[i - 1], biases[i])
            } else {
                (biases[i], biases[i - 1])
            };
            assert!(lo - 1e-9 <= bias && bias <= hi + 1e-9, "i = {i}");
        }
    }
}
