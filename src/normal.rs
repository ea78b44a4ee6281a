//! ## Normal (dense) representation
//! Allows to estimate large cardinality with `M = 2^P` one-byte buckets.
//!
//! [Original HyperLogLog++ paper](https://static.googleusercontent.com/media/research.google.com/en//pubs/archive/40671.pdf)
//!
//! Hash decoding:
//! - bits 0..P     - bucket index
//! - bits P..32    - rank source, rank is `leading_zeros(hash | (M - 1)) + 1`
//!
//! Wire format:
//! - i32           - original (uncompressed) bucket array length
//! - i32           - stored length
//! - bytes         - bucket array, LZ4 block-compressed when stored length < original length

use std::fmt::{Debug, Formatter};

use bytes::{Buf, BufMut};
use tracing::trace;

use crate::codec::{ensure_remaining, read_len};
use crate::error::{Result, SketchError};
use crate::sketch::{SketchKind, SketchTrait};
use crate::DEFAULT_PRECISION;

#[derive(Clone, PartialEq, Eq)]
pub struct NormalSketch {
    precision: u32,
    /// Mask of the low `precision` bits, also used to bound the rank
    bucket_mask: u32,
    data: Vec<u8>,
}

impl NormalSketch {
    pub const MIN_PRECISION: u32 = 1;
    /// At least one hash bit must be left for the rank
    pub const MAX_PRECISION: u32 = 31;

    /// Create new instance of `NormalSketch` with `2^precision` zero buckets
    pub fn new(precision: u32) -> Result<Self> {
        Self::check_precision(precision)?;
        Ok(Self::with_valid_precision(precision))
    }

    fn check_precision(precision: u32) -> Result<()> {
        if !(Self::MIN_PRECISION..=Self::MAX_PRECISION).contains(&precision) {
            return Err(SketchError::invalid_precision(
                Self::MIN_PRECISION,
                Self::MAX_PRECISION,
                precision,
            ));
        }
        Ok(())
    }

    #[inline]
    fn with_valid_precision(precision: u32) -> Self {
        let buckets = 1usize << precision;
        Self {
            precision,
            bucket_mask: (buckets - 1) as u32,
            data: vec![0; buckets],
        }
    }

    /// Create new instance of `NormalSketch` from existing bucket array
    pub fn from_data(data: Vec<u8>) -> Result<Self> {
        let len = data.len();
        if len < 2 || !len.is_power_of_two() || len > 1 << Self::MAX_PRECISION {
            return Err(SketchError::InvalidBucketCount(len));
        }
        let precision = len.trailing_zeros();
        Ok(Self {
            precision,
            bucket_mask: (len - 1) as u32,
            data,
        })
    }

    #[inline]
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Return bucket array
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Return mutable bucket array
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Merge two `NormalSketch` instances by taking bucket-wise maximum.
    pub fn merge(&mut self, rhs: &NormalSketch) -> Result<()> {
        if self.data.len() != rhs.data.len() {
            return Err(SketchError::size_mismatch(self.data.len(), rhs.data.len()));
        }
        // plain zip over equal-length slices lets the compiler vectorize the max
        for (l, &r) in self.data.iter_mut().zip(rhs.data.iter()) {
            *l = (*l).max(r);
        }
        Ok(())
    }

    pub fn serialize<B: BufMut>(&self, buf: &mut B) {
        let original_len = self.data.len() as i32;
        let compressed = lz4_flex::block::compress(&self.data);
        if compressed.len() < self.data.len() {
            buf.put_i32(original_len);
            buf.put_i32(compressed.len() as i32);
            buf.put_slice(&compressed);
        } else {
            trace!(
                original = self.data.len(),
                compressed = compressed.len(),
                "bucket data is incompressible, storing raw"
            );
            buf.put_i32(original_len);
            buf.put_i32(original_len);
            buf.put_slice(&self.data);
        }
    }

    /// Deserialize bucket data into this sketch.
    /// The serialized sketch must have the same number of buckets.
    pub fn deserialize_into<B: Buf>(&mut self, buf: &mut B) -> Result<()> {
        let original_len = read_len(buf, "original length")?;
        if original_len != self.data.len() {
            return Err(SketchError::size_mismatch(self.data.len(), original_len));
        }
        self.read_buckets(buf)
    }

    /// Create new `NormalSketch` of given precision from serialized data
    pub fn deserialize<B: Buf>(precision: u32, buf: &mut B) -> Result<Self> {
        Self::check_precision(precision)?;
        // validate the header before allocating buckets
        let original_len = read_len(buf, "original length")?;
        let expected_len = 1usize << precision;
        if original_len != expected_len {
            return Err(SketchError::size_mismatch(expected_len, original_len));
        }
        let mut sketch = Self::with_valid_precision(precision);
        sketch.read_buckets(buf)?;
        Ok(sketch)
    }

    /// Read stored length and bucket bytes following the original length field
    fn read_buckets<B: Buf>(&mut self, buf: &mut B) -> Result<()> {
        let original_len = self.data.len();
        let stored_len = read_len(buf, "compressed length")?;
        if stored_len > original_len {
            return Err(SketchError::InvalidLength {
                tag: "compressed length",
                length: stored_len as i64,
            });
        }
        ensure_remaining(buf, stored_len, "bucket data")?;

        if stored_len == original_len {
            buf.copy_to_slice(&mut self.data);
            return Ok(());
        }

        let compressed = buf.copy_to_bytes(stored_len);
        let mut data = vec![0u8; original_len];
        let decompressed_len = lz4_flex::block::decompress_into(&compressed, &mut data)?;
        if decompressed_len != original_len {
            return Err(SketchError::size_mismatch(original_len, decompressed_len));
        }
        trace!(original_len, stored_len, "decompressed bucket data");
        self.data = data;
        Ok(())
    }
}

impl SketchTrait for NormalSketch {
    /// Route hash to its bucket and keep the maximum rank seen there
    #[inline]
    fn aggregate(&mut self, hash: u32) {
        let idx = (hash & self.bucket_mask) as usize;
        let rank = ((hash | self.bucket_mask).leading_zeros() + 1) as u8;
        let bucket = &mut self.data[idx];
        if rank > *bucket {
            *bucket = rank;
        }
    }

    #[inline]
    fn size(&self) -> usize {
        self.data.len()
    }

    fn kind(&self) -> SketchKind {
        SketchKind::Normal
    }
}

impl Default for NormalSketch {
    fn default() -> Self {
        Self::with_valid_precision(DEFAULT_PRECISION)
    }
}

impl Extend<u32> for NormalSketch {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, hashes: I) {
        for h in hashes {
            self.aggregate(h);
        }
    }
}

impl Debug for NormalSketch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.data.iter().filter(|&&b| b != 0).count();
        write!(
            f,
            "{{ kind: Normal, precision: {}, size: {}, non_zero: {} }}",
            self.precision,
            self.size(),
            non_zero
        )
    }
}
