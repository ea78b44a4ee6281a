//! ## Sparse representation
//! Stores the exact set of unique hashes and therefore reports exact cardinality.
//! Used while cardinality is low; merges promote it to a `NormalSketch` once the union
//! exceeds `SPARSE_SKETCH_CONVERSION_THRESHOLD` hashes.
//!
//! Wire format:
//! - i32           - number of hashes `N`
//! - N x i32       - hashes in set iteration order

use std::fmt::{Debug, Formatter};

use bytes::{Buf, BufMut};
use hashbrown::HashSet;

use crate::codec::{ensure_remaining, read_len};
use crate::error::Result;
use crate::normal::NormalSketch;
use crate::sketch::{SketchKind, SketchTrait};

/// Sparse representation container
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SparseSketch {
    values: HashSet<u32>,
}

impl SparseSketch {
    /// Create new empty `SparseSketch`
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Return hashes stored within `SparseSketch` in arbitrary order
    #[inline]
    pub fn values(&self) -> impl Iterator<Item = u32> + '_ {
        self.values.iter().copied()
    }

    /// Union `other` into this sketch. `other` is left untouched.
    #[inline]
    pub fn merge(&mut self, other: &SparseSketch) {
        self.values.extend(other.values());
    }

    /// Aggregate all stored hashes into a new `NormalSketch` of given `precision`
    pub fn to_normal(&self, precision: u32) -> Result<NormalSketch> {
        let mut normal = NormalSketch::new(precision)?;
        normal.extend(self.values());
        Ok(normal)
    }

    pub fn serialize<B: BufMut>(&self, buf: &mut B) {
        buf.put_i32(self.values.len() as i32);
        for &h in self.values.iter() {
            buf.put_i32(h as i32);
        }
    }

    pub fn deserialize<B: Buf>(buf: &mut B) -> Result<Self> {
        let len = read_len(buf, "element count")?;
        ensure_remaining(buf, len.saturating_mul(4), "sparse sketch values")?;
        let mut values = HashSet::with_capacity(len);
        for _ in 0..len {
            values.insert(buf.get_i32() as u32);
        }
        Ok(Self { values })
    }
}

impl SketchTrait for SparseSketch {
    /// Insert hash into `SparseSketch`, no-op if already present
    #[inline]
    fn aggregate(&mut self, hash: u32) {
        self.values.insert(hash);
    }

    #[inline]
    fn size(&self) -> usize {
        self.values.len()
    }

    fn kind(&self) -> SketchKind {
        SketchKind::Sparse
    }
}

impl Extend<u32> for SparseSketch {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, hashes: I) {
        self.values.extend(hashes);
    }
}

impl FromIterator<u32> for SparseSketch {
    fn from_iter<I: IntoIterator<Item = u32>>(hashes: I) -> Self {
        Self {
            values: hashes.into_iter().collect(),
        }
    }
}

impl Debug for SparseSketch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ kind: Sparse, size: {} }}", self.size())
    }
}
