//! Bounds-checked primitives on top of `bytes::Buf`, whose getters panic on short input.

use bytes::Buf;

use crate::error::{Result, SketchError};

#[inline]
pub(crate) fn ensure_remaining<B: Buf>(buf: &B, needed: usize, tag: &'static str) -> Result<()> {
    let remaining = buf.remaining();
    if remaining < needed {
        return Err(SketchError::InsufficientData {
            tag,
            needed,
            remaining,
        });
    }
    Ok(())
}

#[inline]
pub(crate) fn read_i32<B: Buf>(buf: &mut B, tag: &'static str) -> Result<i32> {
    ensure_remaining(buf, 4, tag)?;
    Ok(buf.get_i32())
}

#[inline]
pub(crate) fn read_u8<B: Buf>(buf: &mut B, tag: &'static str) -> Result<u8> {
    ensure_remaining(buf, 1, tag)?;
    Ok(buf.get_u8())
}

/// Read a signed length field and reject negative values.
#[inline]
pub(crate) fn read_len<B: Buf>(buf: &mut B, tag: &'static str) -> Result<usize> {
    let length = read_i32(buf, tag)?;
    usize::try_from(length).map_err(|_| SketchError::InvalidLength {
        tag,
        length: i64::from(length),
    })
}
