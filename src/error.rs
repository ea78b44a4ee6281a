use thiserror::Error;

/// Errors returned by sketch construction, merging, estimation and deserialization.
#[derive(Debug, Error)]
pub enum SketchError {
    #[error("precision must be in [{min}, {max}] range, got {actual}")]
    InvalidPrecision { min: u32, max: u32, actual: u32 },

    #[error("sketch size mismatch: expected {expected} buckets, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("bucket count {0} is not a power of two in [2, 2^31] range")]
    InvalidBucketCount(usize),

    #[error("insufficient data for {tag}: needed {needed} bytes, {remaining} remaining")]
    InsufficientData {
        tag: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("invalid {tag}: {length}")]
    InvalidLength { tag: &'static str, length: i64 },

    #[error("failed to decompress bucket data: {0}")]
    Decompress(#[from] lz4_flex::block::DecompressError),

    #[error("unknown sketch type identifier {0}")]
    UnknownSketchType(u8),
}

pub type Result<T, E = SketchError> = std::result::Result<T, E>;

impl SketchError {
    pub(crate) fn invalid_precision(min: u32, max: u32, actual: u32) -> Self {
        SketchError::InvalidPrecision { min, max, actual }
    }

    pub(crate) fn size_mismatch(expected: usize, actual: usize) -> Self {
        SketchError::SizeMismatch { expected, actual }
    }
}
