//! # Serde module for sketches
//!
//! This module provides serde-based (serialization and deserialization) features for
//! `SparseSketch`, `NormalSketch` and `Sketch`, enabled by the `with_serde` feature.
//!
//! Representations:
//! - `SparseSketch` is a sequence of hashes, sorted so that equal sketches serialize equally.
//! - `NormalSketch` is a tuple `(precision, buckets)`.
//! - `Sketch` is a tuple `(type_id, sketch)` with `type_id` from `SketchKind::type_id`.
//!
//! Deserialization validates bucket count against precision and rejects unknown type ids.
//!
//! Refer to the serde documentation for more details on custom serialization and deserialization:
//! - [Serialization](https://serde.rs/impl-serialize.html)
//! - [Deserialization](https://serde.rs/impl-deserialize.html)
use std::fmt::Formatter;

use serde::de::{Error, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::normal::NormalSketch;
use crate::sketch::{Sketch, SketchKind, SketchTrait};
use crate::sparse::SparseSketch;

impl Serialize for SparseSketch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut values: Vec<u32> = self.values().collect();
        values.sort_unstable();
        values.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SparseSketch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values: Vec<u32> = Deserialize::deserialize(deserializer)?;
        Ok(values.into_iter().collect())
    }
}

impl Serialize for NormalSketch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tup = serializer.serialize_tuple(2)?;
        tup.serialize_element(&self.precision())?;
        tup.serialize_element(self.data())?;
        tup.end()
    }
}

impl<'de> Deserialize<'de> for NormalSketch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (precision, data): (u32, Vec<u8>) = Deserialize::deserialize(deserializer)?;
        let sketch = NormalSketch::from_data(data).map_err(D::Error::custom)?;
        if sketch.precision() != precision {
            return Err(Error::custom(format!(
                "bucket count {} does not match precision {}",
                sketch.size(),
                precision
            )));
        }
        Ok(sketch)
    }
}

impl Serialize for Sketch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tup = serializer.serialize_tuple(2)?;
        tup.serialize_element(&self.kind().type_id())?;
        match self {
            Sketch::Sparse(sparse) => tup.serialize_element(sparse)?,
            Sketch::Normal(normal) => tup.serialize_element(normal)?,
        }
        tup.end()
    }
}

/// Reads the type id first to pick the type of the second tuple element
struct SketchVisitor;

impl<'de> Visitor<'de> for SketchVisitor {
    type Value = Sketch;

    fn expecting(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str("a (type_id, sketch) tuple")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Sketch, A::Error> {
        let type_id: u8 = seq
            .next_element()?
            .ok_or_else(|| A::Error::invalid_length(0, &self))?;
        let kind = SketchKind::try_from(type_id).map_err(A::Error::custom)?;
        let sketch = match kind {
            SketchKind::Sparse => seq.next_element::<SparseSketch>()?.map(Sketch::from),
            SketchKind::Normal => seq.next_element::<NormalSketch>()?.map(Sketch::from),
        };
        sketch.ok_or_else(|| A::Error::invalid_length(1, &self))
    }
}

impl<'de> Deserialize<'de> for Sketch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_tuple(2, SketchVisitor)
    }
}
