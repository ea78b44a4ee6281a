#![allow(dead_code)]

use hll_sketch::{NormalSketch, Sketch, SparseSketch};

/// Deterministic hash stream: high half of splitmix64 outputs started at `seed`
pub fn hashes(seed: u64, n: usize) -> impl Iterator<Item = u32> {
    let mut state = seed;
    (0..n).map(move |_| {
        state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        (z >> 32) as u32
    })
}

pub fn sparse(seed: u64, n: usize) -> Sketch {
    hashes(seed, n).collect::<SparseSketch>().into()
}

pub fn normal(precision: u32, seed: u64, n: usize) -> Sketch {
    let mut sketch = NormalSketch::new(precision).unwrap();
    sketch.extend(hashes(seed, n));
    sketch.into()
}
