//! `hll-sketch` is a Rust crate implementing HyperLogLog++ sketches to estimate the number of distinct elements
//! in a stream or dataset, with mergeable sparse and dense representations and a compact wire format.
//!
//! A `Sketch` starts sparse (exact set of 32-bit hashes), is promoted to a dense `NormalSketch`
//! by `SketchMerger` once a union grows past `SPARSE_SKETCH_CONVERSION_THRESHOLD`, and is turned into
//! a cardinality estimate by `HyperLogLogEstimator`.
pub mod bias;
mod bias_data;
mod codec;
pub mod config;
pub mod error;
pub mod estimator;
pub mod merger;
pub mod normal;
#[cfg(feature = "with_serde")]
mod serde;
pub mod sketch;
pub mod sparse;

pub use bias::BiasEstimator;
pub use config::SketchConfig;
pub use error::{Result, SketchError};
pub use estimator::HyperLogLogEstimator;
pub use merger::SketchMerger;
pub use normal::NormalSketch;
pub use sketch::{hash_item, Sketch, SketchKind, SketchTrait};
pub use sparse::SparseSketch;

/// Precision used when none is configured
pub const DEFAULT_PRECISION: u32 = 10;
/// Smallest precision supported by `HyperLogLogEstimator`
pub const MIN_PRECISION: u32 = 4;
/// Largest precision supported by `HyperLogLogEstimator`
pub const MAX_PRECISION: u32 = 18;
/// Sparse unions larger than this are promoted to `NormalSketch`
pub const SPARSE_SKETCH_CONVERSION_THRESHOLD: usize = 256;
