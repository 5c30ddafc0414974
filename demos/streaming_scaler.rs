//! Stream batches with missing values through a private scaler and compare the
//! learned statistics against the noise-free ones.
//!
//! Run with `cargo run --example streaming_scaler`.

use dp_scaler::preprocessing::SamplesSeen;
use dp_scaler::{
    ExactStatistics, FeatureRange, FittedTransformer, IncrementalTransformer, LaplaceStatistics,
    PreprocessingError, PrivateStandardScaler, ScalerConfig,
};
use ndarray::{s, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;

const N_FEATURES: usize = 3;

fn make_data(n_samples: usize, rng: &mut StdRng) -> Result<Array2<f64>, PreprocessingError> {
    let features = [(20.0, 2.0), (50.0, 10.0), (80.0, 5.0)]
        .iter()
        .map(|&(centre, spread)| Normal::new(centre, spread))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| PreprocessingError::InvalidParameter(e.to_string()))?;
    Ok(Array2::from_shape_fn((n_samples, N_FEATURES), |(_, j)| {
        if rng.gen_bool(0.05) {
            f64::NAN
        } else {
            rng.sample(features[j])
        }
    }))
}

fn main() -> Result<(), PreprocessingError> {
    let mut rng = StdRng::seed_from_u64(2024);
    let data = make_data(10_000, &mut rng)?;

    let config = ScalerConfig::new(1.0).with_range(FeatureRange::uniform(0.0, 100.0, N_FEATURES)?);
    let mut private = PrivateStandardScaler::with_source(config.clone(), LaplaceStatistics::seeded(7))?;
    let mut exact = PrivateStandardScaler::with_source(config, ExactStatistics)?;

    for start in (0..data.nrows()).step_by(1_000) {
        let batch = data.slice(s![start..start + 1_000, ..]).to_owned();
        private.partial_fit(&batch)?;
        exact.partial_fit(&batch)?;
    }

    println!("epsilon spent: {}", private.epsilon_spent());
    match private.n_samples_seen() {
        Some(SamplesSeen::Uniform(n)) => println!("samples per feature: {n}"),
        Some(SamplesSeen::PerFeature(counts)) => println!("samples per feature: {counts:?}"),
        None => println!("no samples"),
    }
    if let (Some(pm), Some(em)) = (private.mean(), exact.mean()) {
        println!("mean    private={pm:.3} exact={em:.3}");
    }
    if let (Some(ps), Some(es)) = (private.scale(), exact.scale()) {
        println!("scale   private={ps:.3} exact={es:.3}");
    }

    let fitted = private.fitted()?;
    let scaled = fitted.transform(&data.slice(s![..5, ..]).to_owned())?;
    println!("first rows scaled:\n{scaled:.3}");
    Ok(())
}
