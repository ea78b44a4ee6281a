use hll_sketch::{Sketch, SketchConfig};

fn main() -> hll_sketch::Result<()> {
    let config = SketchConfig::default();
    let estimator = config.estimator()?;
    let merger = config.merger()?;

    let mut sketch1 = Sketch::new();
    for i in 0..200 {
        sketch1.insert(&i);
    }
    println!("sketch1 = {:?} estimate = {}", sketch1, estimator.estimate_count(&sketch1)?);

    let mut sketch2 = Sketch::new();
    for i in 150..400 {
        sketch2.insert(&i);
    }
    println!("sketch2 = {:?} estimate = {}", sketch2, estimator.estimate_count(&sketch2)?);

    // union of 400 items is promoted to a normal sketch
    let merged = merger.merge(sketch1, sketch2)?;
    println!("merged = {:?} estimate = {}", merged, estimator.estimate_count(&merged)?);

    let mut buf = Vec::new();
    merged.serialize(&mut buf);
    let restored = Sketch::deserialize(&mut buf.as_slice())?;
    println!(
        "restored from {} bytes = {:?} estimate = {}",
        buf.len(),
        restored,
        estimator.estimate_count(&restored)?
    );
    Ok(())
}
