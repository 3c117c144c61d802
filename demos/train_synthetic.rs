use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rust_linmodels::{Batch, Dataset, Model, Sample, TrainConfig, Verbosity};

fn blobs(rng: &mut StdRng, n_per_class: usize, batches: usize) -> rust_linmodels::Result<Vec<Batch>> {
    // Three noisy blobs in the unit square, one per class.
    let centers = [[0.2, 0.2], [0.8, 0.2], [0.5, 0.8]];
    let mut out = Vec::with_capacity(batches);
    for _ in 0..batches {
        let mut samples = Vec::with_capacity(centers.len() * n_per_class);
        for _ in 0..n_per_class {
            for (class, c) in centers.iter().enumerate() {
                let x0: f64 = (c[0] + rng.gen_range(-0.1..0.1_f64)).clamp(0.0, 1.0);
                let x1: f64 = (c[1] + rng.gen_range(-0.1..0.1_f64)).clamp(0.0, 1.0);
                samples.push(Sample::new(class, vec![x0, x1]));
            }
        }
        out.push(Batch::new(samples)?);
    }
    Ok(out)
}

fn main() -> rust_linmodels::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut rng = StdRng::seed_from_u64(0);
    let train = blobs(&mut rng, 64, 4)?;
    let test = blobs(&mut rng, 32, 1)?;
    let names = ["bottom-left", "bottom-right", "top"]
        .iter()
        .map(|s| (*s).to_owned())
        .collect();
    let data = Dataset::new(train, test, 3, names)?;

    let mut model = Model::new_with_seed(2, 3, 0.1, 0)?;
    let cfg = TrainConfig::new(30).with_verbosity(Verbosity::Samples { limit: 3 });
    let report = model.train(&data, &cfg)?;
    info!("final train loss: {:?}", report.final_loss());

    let eval = model.test(&data)?;
    info!("confusion matrix (rows = true label):\n{}", eval.confusion);

    let pred = model.predict(&[0.5, 0.9])?;
    info!(
        "(0.5, 0.9) -> {} ({:.3})",
        pred.class_name(&data).unwrap_or("?"),
        pred.confidence()
    );

    let path = std::env::temp_dir().join("rust_linmodels_synthetic.bin");
    model.save(&path)?;
    let loaded = Model::load(&path)?;
    info!("reloaded model from {} (identical: {})", path.display(), loaded == model);
    Ok(())
}
