#![no_main]

use hll_sketch::{NormalSketch, Sketch, SketchMerger, SketchTrait};
use libfuzzer_sys::fuzz_target;
use wyhash::wyhash;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let split_index = wyhash(data, 0) as usize % data.len();
    let (first_half, second_half) = data.split_at(split_index);

    let mut sketch1 = Sketch::new();
    for chunk in first_half.chunks(4) {
        sketch1.insert(&chunk);
    }

    // odd first byte selects a dense right operand
    let mut sketch2 = if data[0] & 1 == 1 {
        Sketch::from(NormalSketch::default())
    } else {
        Sketch::new()
    };
    for chunk in second_half.chunks(4) {
        sketch2.insert(&chunk);
    }

    let merger = SketchMerger::default();
    let merged = merger.merge(sketch1.clone(), sketch2.clone()).unwrap();
    assert_eq!(merged, merger.merge(sketch2, sketch1).unwrap());
});
