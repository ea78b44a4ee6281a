//! Sketch representations and the capability set shared by them.
//!
//! A `Sketch` starts as an exact `SparseSketch` and is promoted to a dense `NormalSketch`
//! when a merge grows it beyond `SPARSE_SKETCH_CONVERSION_THRESHOLD` unique hashes.
//!
//! The tagged wire envelope written by `Sketch::serialize`:
//! - byte 0        - sketch type identifier (`1` for sparse, `2` for normal)
//! - byte 1        - precision (normal sketches only)
//! - bytes 1.. / 2.. - the variant's own wire body

use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasher, BuildHasherDefault, Hash};

use bytes::{Buf, BufMut};
use enum_dispatch::enum_dispatch;
use wyhash::WyHash;

use crate::codec::read_u8;
use crate::error::{Result, SketchError};
use crate::merger::SketchMerger;
use crate::normal::NormalSketch;
use crate::sparse::SparseSketch;

/// Stable numeric type identifiers of sketch variants, used by type registries
/// to map a serialized tag back to a concrete sketch.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SketchKind {
    Sparse = 1,
    Normal = 2,
}

impl SketchKind {
    /// Return the wire identifier of this sketch kind
    #[inline]
    pub const fn type_id(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for SketchKind {
    type Error = SketchError;

    fn try_from(type_id: u8) -> Result<Self> {
        match type_id {
            1 => Ok(SketchKind::Sparse),
            2 => Ok(SketchKind::Normal),
            _ => Err(SketchError::UnknownSketchType(type_id)),
        }
    }
}

/// Sketch variants supported by the estimator and the merger
#[derive(Clone, PartialEq, Eq)]
#[enum_dispatch]
pub enum Sketch {
    Sparse(SparseSketch),
    Normal(NormalSketch),
}

/// Capability set which must be implemented by all sketch variants.
#[enum_dispatch(Sketch)]
pub trait SketchTrait {
    /// Aggregate a single 32-bit hash value into the sketch.
    fn aggregate(&mut self, hash: u32);
    /// Number of unique hashes for sparse sketches, number of buckets for normal ones.
    fn size(&self) -> usize;
    fn kind(&self) -> SketchKind;
}

impl Sketch {
    /// Create an empty sparse sketch
    #[inline]
    pub fn new() -> Self {
        Sketch::Sparse(SparseSketch::new())
    }

    /// Hash a hashable item and aggregate the hash
    #[inline]
    pub fn insert<T: Hash + ?Sized>(&mut self, item: &T) {
        self.aggregate(hash_item(item));
    }

    /// Merge `other` into this sketch using the default merger configuration.
    pub fn merge(self, other: Sketch) -> Result<Sketch> {
        SketchMerger::default().merge(self, other)
    }

    pub fn as_sparse(&self) -> Option<&SparseSketch> {
        match self {
            Sketch::Sparse(sparse) => Some(sparse),
            Sketch::Normal(_) => None,
        }
    }

    pub fn as_normal(&self) -> Option<&NormalSketch> {
        match self {
            Sketch::Sparse(_) => None,
            Sketch::Normal(normal) => Some(normal),
        }
    }

    /// Write the tagged envelope followed by the variant's wire body
    pub fn serialize<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.kind().type_id());
        match self {
            Sketch::Sparse(sparse) => sparse.serialize(buf),
            Sketch::Normal(normal) => {
                // precision never exceeds `NormalSketch::MAX_PRECISION`
                buf.put_u8(normal.precision() as u8);
                normal.serialize(buf);
            }
        }
    }

    /// Read a sketch written by `Sketch::serialize`
    pub fn deserialize<B: Buf>(buf: &mut B) -> Result<Sketch> {
        let kind = SketchKind::try_from(read_u8(buf, "sketch type")?)?;
        match kind {
            SketchKind::Sparse => Ok(SparseSketch::deserialize(buf)?.into()),
            SketchKind::Normal => {
                let precision = u32::from(read_u8(buf, "precision")?);
                Ok(NormalSketch::deserialize(precision, buf)?.into())
            }
        }
    }
}

impl Default for Sketch {
    fn default() -> Self {
        Self::new()
    }
}

impl Extend<u32> for Sketch {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, hashes: I) {
        match self {
            Sketch::Sparse(sparse) => sparse.extend(hashes),
            Sketch::Normal(normal) => normal.extend(hashes),
        }
    }
}

impl Debug for Sketch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Sketch::Sparse(sparse) => Debug::fmt(sparse, f),
            Sketch::Normal(normal) => Debug::fmt(normal, f),
        }
    }
}

/// Hash an item with `WyHash` and keep the low 32 bits.
#[inline]
pub fn hash_item<T: Hash + ?Sized>(item: &T) -> u32 {
    BuildHasherDefault::<WyHash>::default().hash_one(item) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(SketchKind::Sparse => 1)]
    #[test_case(SketchKind::Normal => 2)]
    fn test_type_id(kind: SketchKind) -> u8 {
        kind.type_id()
    }

    #[test_case(0 => matches Err(SketchError::UnknownSketchType(0)))]
    #[test_case(1 => matches Ok(SketchKind::Sparse))]
    #[test_case(2 => matches Ok(SketchKind::Normal))]
    #[test_case(3 => matches Err(SketchError::UnknownSketchType(3)))]
    fn test_kind_from_type_id(type_id: u8) -> Result<SketchKind> {
        SketchKind::try_from(type_id)
    }

    #[test]
    fn test_insert() {
        let mut sketch = Sketch::new();
        assert_eq!(sketch.size(), 0);

        sketch.insert("test item 1");
        assert_eq!(sketch.size(), 1);

        // re-inserting the same item keeps the size
        sketch.insert("test item 1");
        assert_eq!(sketch.size(), 1);

        sketch.insert("test item 2");
        assert_eq!(sketch.size(), 2);
        assert_eq!(sketch.kind(), SketchKind::Sparse);
    }

    #[test]
    fn test_hash_item_is_deterministic() {
        assert_eq!(hash_item("item"), hash_item("item"));
        assert_eq!(hash_item(&42u64), hash_item(&42u64));
        assert_ne!(hash_item("item1"), hash_item("item2"));
    }

    #[test]
    fn test_extend_dispatch() {
        let mut sparse = Sketch::new();
        sparse.extend([1, 2, 2, 3]);
        assert_eq!(sparse.size(), 3);

        let mut normal = Sketch::from(NormalSketch::new(4).unwrap());
        normal.extend([1, 2, 2, 3]);
        assert_eq!(normal.size(), 16);
        assert_eq!(normal.as_normal().unwrap().data()[1..4], [29, 29, 29]);
    }

    #[test]
    fn test_tagged_roundtrip_sparse() {
        let mut sketch = Sketch::new();
        sketch.extend([7, 11, 13]);

        let mut buf = Vec::new();
        sketch.serialize(&mut buf);
        assert_eq!(buf[0], 1);
        assert_eq!(buf.len(), 1 + 4 + 3 * 4);

        let restored = Sketch::deserialize(&mut buf.as_slice()).unwrap();
        assert_eq!(restored, sketch);
    }

    #[test]
    fn test_tagged_roundtrip_normal() {
        let mut normal = NormalSketch::new(6).unwrap();
        normal.extend((0..100u32).map(|i| i.wrapping_mul(0x9E37_79B9)));
        let sketch = Sketch::from(normal);

        let mut buf = Vec::new();
        sketch.serialize(&mut buf);
        assert_eq!(buf[..2], [2, 6]);

        let restored = Sketch::deserialize(&mut buf.as_slice()).unwrap();
        assert_eq!(restored, sketch);
    }

    #[test]
    fn test_tagged_unknown_type() {
        let mut buf: &[u8] = &[9, 0, 0, 0, 0];
        assert!(matches!(
            Sketch::deserialize(&mut buf),
            Err(SketchError::UnknownSketchType(9))
        ));
    }

    #[test]
    fn test_tagged_precision_mismatch() {
        let mut buf = vec![2u8, 5];
        NormalSketch::new(4).unwrap().serialize(&mut buf);
        assert!(matches!(
            Sketch::deserialize(&mut buf.as_slice()),
            Err(SketchError::SizeMismatch {
                expected: 32,
                actual: 16
            })
        ));
    }

    #[test]
    fn test_debug() {
        let mut sketch = Sketch::new();
        sketch.extend([1, 2]);
        assert_eq!(format!("{:?}", sketch), "{ kind: Sparse, size: 2 }");

        let mut sketch = Sketch::from(NormalSketch::new(4).unwrap());
        sketch.extend([1, 2]);
        assert_eq!(
            format!("{:?}", sketch),
            "{ kind: Normal, precision: 4, size: 16, non_zero: 2 }"
        );
    }
}
