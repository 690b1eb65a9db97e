// Binary ASGD on synthetic single-precision data: 1000 points, 100 features
// uniform in [0, 1), positive examples shifted by +0.1 in every feature.
use asgd::metrics::accuracy;
use asgd::{AsgdConfig, BinaryAsgd, OnlineClassifier};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

fn make_split(rng: &mut Xoshiro256PlusPlus, n_points: usize, n_features: usize) -> (Array2<f32>, Array1<f32>) {
    let y: Array1<f32> = (0..n_points)
        .map(|_| if rng.gen::<bool>() { 1.0 } else { -1.0 })
        .collect();
    let x = Array2::from_shape_fn((n_points, n_features), |(i, _)| {
        let v: f32 = rng.gen();
        if y[i] == 1.0 {
            v + 0.1
        } else {
            v
        }
    });
    (x, y)
}

fn main() -> asgd::Result<()> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(2024);
    let (x, y) = make_split(&mut rng, 1000, 100);
    let (x_test, y_test) = make_split(&mut rng, 1000, 100);

    let config = AsgdConfig::default()
        .sgd_step_size0(1e-3)
        .l2_regularization(1e-6)
        .n_iterations(4);
    let mut clf = BinaryAsgd::<f32>::new(100, config)?;
    clf.fit(x.view(), y.view(), None)?;

    println!("observations: {}", clf.n_observations());
    println!("train means: {:?}", clf.train_means());

    let train_acc = accuracy(y.view(), clf.predict(x.view())?.view())?;
    let test_acc = accuracy(y_test.view(), clf.predict(x_test.view())?.view())?;
    println!("train accuracy: {:.3}", train_acc);
    println!("test accuracy:  {:.3}", test_acc);
    Ok(())
}
