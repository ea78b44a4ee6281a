#![no_main]

use hll_sketch::{HyperLogLogEstimator, Sketch};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut sketch) = serde_json::from_slice::<Sketch>(data) {
        sketch.insert(&1);
        if let Ok(estimator) = HyperLogLogEstimator::new(sketch.as_normal().map_or(10, |n| n.precision())) {
            estimator.estimate_count(&sketch).unwrap();
        }
    }
});
