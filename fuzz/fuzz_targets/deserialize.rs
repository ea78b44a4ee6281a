#![no_main]

use hll_sketch::{HyperLogLogEstimator, Sketch, SketchTrait};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut input = data;
    if let Ok(sketch) = Sketch::deserialize(&mut input) {
        if let Ok(estimator) = HyperLogLogEstimator::new(sketch.as_normal().map_or(10, |n| n.precision())) {
            estimator.estimate_count(&sketch).unwrap();
        }

        // accepted input must survive a round trip
        let mut buf = Vec::new();
        sketch.serialize(&mut buf);
        let restored = Sketch::deserialize(&mut buf.as_slice()).unwrap();
        assert_eq!(restored, sketch);
        assert_eq!(restored.size(), sketch.size());
    }
});
