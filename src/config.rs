//! Sketch configuration shared by estimators, mergers and dense sketch construction.

#[cfg(feature = "with_serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SketchError};
use crate::estimator::HyperLogLogEstimator;
use crate::merger::SketchMerger;
use crate::normal::NormalSketch;
use crate::{DEFAULT_PRECISION, MAX_PRECISION, MIN_PRECISION, SPARSE_SKETCH_CONVERSION_THRESHOLD};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "with_serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with_serde", serde(default))]
pub struct SketchConfig {
    /// Number of index bits of dense sketches, in [4..18] range
    pub precision: u32,
    /// Sparse unions larger than this are promoted to dense sketches
    pub sparse_conversion_threshold: usize,
}

impl SketchConfig {
    /// Create default config with given `precision`
    pub fn with_precision(precision: u32) -> Result<Self> {
        let config = Self {
            precision,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Check precision range, e.g. after loading config from external source
    pub fn validate(&self) -> Result<()> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&self.precision) {
            return Err(SketchError::invalid_precision(
                MIN_PRECISION,
                MAX_PRECISION,
                self.precision,
            ));
        }
        Ok(())
    }

    pub fn estimator(&self) -> Result<HyperLogLogEstimator> {
        HyperLogLogEstimator::new(self.precision)
    }

    pub fn merger(&self) -> Result<SketchMerger> {
        SketchMerger::new(*self)
    }

    /// Create empty `NormalSketch` with configured precision
    pub fn normal_sketch(&self) -> Result<NormalSketch> {
        self.validate()?;
        NormalSketch::new(self.precision)
    }
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            sparse_conversion_threshold: SPARSE_SKETCH_CONVERSION_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sketch::SketchTrait;
    use test_case::test_case;

    #[test]
    fn test_default() {
        let config = SketchConfig::default();
        assert_eq!(config.precision, 10);
        assert_eq!(config.sparse_conversion_threshold, 256);
        assert!(config.validate().is_ok());
    }

    #[test_case(3 => matches Err(SketchError::InvalidPrecision { actual: 3, .. }))]
    #[test_case(4 => matches Ok(SketchConfig { precision: 4, sparse_conversion_threshold: 256 }))]
    #[test_case(18 => matches Ok(SketchConfig { precision: 18, .. }))]
    #[test_case(19 => matches Err(SketchError::InvalidPrecision { actual: 19, .. }))]
    fn test_with_precision(precision: u32) -> Result<SketchConfig> {
        SketchConfig::with_precision(precision)
    }

    #[test]
    fn test_builders() {
        let config = SketchConfig::with_precision(12).unwrap();
        assert_eq!(config.estimator().unwrap().precision(), 12);
        assert_eq!(config.merger().unwrap().config(), &config);
        assert_eq!(config.normal_sketch().unwrap().size(), 4096);
    }

    #[test]
    fn test_builders_reject_invalid_precision() {
        let config = SketchConfig {
            precision: 24,
            ..SketchConfig::default()
        };
        assert!(config.estimator().is_err());
        assert!(config.merger().is_err());
        // dense sketches alone accept up to 31 bits, config keeps the estimator range
        assert!(config.normal_sketch().is_err());
    }

    #[cfg(feature = "with_serde")]
    #[test]
    fn test_serde_partial_config() {
        let config: SketchConfig = serde_json::from_str(r#"{"precision": 14}"#).unwrap();
        assert_eq!(config, SketchConfig::with_precision(14).unwrap());

        let json = serde_json::to_string(&SketchConfig::default()).unwrap();
        assert_eq!(json, r#"{"precision":10,"sparse_conversion_threshold":256}"#);
    }
}
