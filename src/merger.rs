//! Merging of sketches of any variant pair.
//!
//! | left   | right  | result                                                         |
//! |--------|--------|----------------------------------------------------------------|
//! | Normal | Normal | `left` with `right` merged in by bucket-wise maximum           |
//! | Normal | Sparse | `left` with every `right` hash aggregated in                   |
//! | Sparse | Normal | `right` with every `left` hash aggregated in                   |
//! | Sparse | Sparse | union, promoted to `NormalSketch` once it exceeds the threshold |

use tracing::debug;

use crate::config::SketchConfig;
use crate::error::Result;
use crate::normal::NormalSketch;
use crate::sketch::{Sketch, SketchTrait};

/// Merges two sketches into one, taking ownership of both
#[derive(Debug, Clone, Copy, Default)]
pub struct SketchMerger {
    config: SketchConfig,
}

impl SketchMerger {
    /// Create new instance of `SketchMerger` promoting sparse unions to `config.precision` buckets
    pub fn new(config: SketchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &SketchConfig {
        &self.config
    }

    /// Merge `left` and `right` sketches, reusing storage of one of them for the result
    pub fn merge(&self, left: Sketch, right: Sketch) -> Result<Sketch> {
        match (left, right) {
            (Sketch::Normal(mut lhs), Sketch::Normal(rhs)) => {
                lhs.merge(&rhs)?;
                Ok(lhs.into())
            }
            (Sketch::Normal(mut lhs), Sketch::Sparse(rhs)) => {
                lhs.extend(rhs.values());
                Ok(lhs.into())
            }
            (Sketch::Sparse(lhs), Sketch::Normal(mut rhs)) => {
                rhs.extend(lhs.values());
                Ok(rhs.into())
            }
            (Sketch::Sparse(mut lhs), Sketch::Sparse(rhs)) => {
                lhs.merge(&rhs);
                if lhs.size() <= self.config.sparse_conversion_threshold {
                    return Ok(lhs.into());
                }
                debug!(
                    size = lhs.size(),
                    threshold = self.config.sparse_conversion_threshold,
                    precision = self.config.precision,
                    "promoting sparse union to normal sketch"
                );
                let mut normal = NormalSketch::new(self.config.precision)?;
                normal.extend(lhs.values());
                Ok(normal.into())
            }
        }
    }
}
