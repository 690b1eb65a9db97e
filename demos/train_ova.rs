// One-vs-all ASGD on three Gaussian blobs, with a held-out validation split
// and automatic step-size calibration.
use asgd::metrics::multiclass_stats;
use asgd::preprocessing::{split_center_normalize, SplitConfig};
use asgd::{AsgdConfig, AsgdError, OnlineClassifier, OvaAsgd};
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_xoshiro::Xoshiro256PlusPlus;

const CENTERS: [[f64; 2]; 3] = [[4.0, 0.0], [-4.0, 0.0], [0.0, 4.0]];

fn main() -> asgd::Result<()> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
    let noise =
        Normal::new(0.0, 1.5).map_err(|e| AsgdError::InvalidParameter(e.to_string()))?;

    let n_points = 1500;
    let y = Array1::from_shape_fn(n_points, |i| (i * 7) % CENTERS.len());
    let x = Array2::from_shape_fn((n_points, 2), |(i, j)| {
        CENTERS[y[i]][j] + noise.sample(&mut rng)
    });

    let split = split_center_normalize(x.view(), y.view(), &SplitConfig::default())?;
    println!(
        "train: {} rows, valid: {} rows",
        split.train_x.nrows(),
        split.valid_x.nrows()
    );

    let mut clf = OvaAsgd::<f64>::new(CENTERS.len(), 2, AsgdConfig::default())?;
    clf.fit(split.train_x.view(), split.train_y.view(), None)?;
    println!("calibrated sgd_step_size0: {:?}", clf.sgd_step_size0());

    let labels: Vec<usize> = (0..CENTERS.len()).collect();
    let predictions = clf.predict(split.valid_x.view())?;
    let stats = multiclass_stats(split.valid_y.view(), predictions.view(), &labels)?;
    println!("validation accuracy: {:.1}%", stats.accuracy);
    println!("mean AP: {:.3}, mean AUC: {:.3}", stats.average_precision, stats.area_under_curve);
    Ok(())
}
