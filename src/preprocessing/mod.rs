//! Feature centering and scaling ahead of training.
//!
//! Hinge-loss SGD is sensitive to feature scale, so inputs are usually
//! standardized with statistics taken from the training set:
//! ```text
//! z = (x - mean) / std
//! ```
//! optionally followed by *trace normalization*, which divides everything by
//! the mean Euclidean row norm of the standardized training set.

use crate::backend::ScalarOps;
use crate::error::{AsgdError, Result};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};

/// Floor applied to per-feature standard deviations and the trace in [`normalize`].
pub const STD_FLOOR: f64 = 1e-8;

/// Statistics produced by [`normalize`]; pass them back in to transform
/// validation or test features the same way as the training set.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationStats<F> {
    pub mean: Array1<F>,
    pub std: Array1<F>,
    /// Mean row norm after standardization, when trace normalization is on.
    pub trace: Option<F>,
}

/// Standardizes every feature matrix in `features`.
///
/// Without `stats`, the statistics are computed from `features[0]` (the
/// training set) with a population standard deviation floored at
/// [`STD_FLOOR`]. With `stats`, those are reused as-is.
///
/// # Errors
/// - [`AsgdError::EmptyData`] if `features` is empty or the training set has no rows.
/// - [`AsgdError::FeatureMismatch`] if the matrices disagree on the number of columns.
/// - [`AsgdError::InvalidParameter`] if trace normalization is requested with
///   stats that carry no trace.
pub fn normalize<F: ScalarOps>(
    features: &[ArrayView2<'_, F>],
    trace_normalize: bool,
    stats: Option<&NormalizationStats<F>>,
) -> Result<(Vec<Array2<F>>, NormalizationStats<F>)> {
    let train = features
        .first()
        .ok_or_else(|| AsgdError::EmptyData("no feature matrices to normalize".to_string()))?;

    let (mean, std) = match stats {
        Some(stats) => (stats.mean.clone(), stats.std.clone()),
        None => {
            if train.nrows() == 0 {
                return Err(AsgdError::EmptyData(
                    "training features have no rows".to_string(),
                ));
            }
            column_mean_and_std(train, F::from_f64(STD_FLOOR))
        }
    };

    for f in features {
        if f.ncols() != mean.len() {
            return Err(AsgdError::FeatureMismatch {
                expected_features: mean.len(),
                got_features: f.ncols(),
            });
        }
    }

    let mut scaled: Vec<Array2<F>> = features.iter().map(|f| (f - &mean) / &std).collect();

    let trace = if trace_normalize {
        let trace = match stats {
            Some(stats) => stats.trace.ok_or_else(|| {
                AsgdError::InvalidParameter(
                    "trace normalization requested but stats carry no trace".to_string(),
                )
            })?,
            None => mean_row_norm(&scaled[0].view()).max(F::from_f64(STD_FLOOR)),
        };
        for f in scaled.iter_mut() {
            f.mapv_inplace(|v| v / trace);
        }
        Some(trace)
    } else {
        None
    };

    Ok((scaled, NormalizationStats { mean, std, trace }))
}

fn column_mean_and_std<F: ScalarOps>(x: &ArrayView2<'_, F>, floor: F) -> (Array1<F>, Array1<F>) {
    let n = F::from_usize(x.nrows());
    let mean = x.sum_axis(Axis(0)) / n;
    let centered = x - &mean;
    let var = centered.mapv(|v| v * v).sum_axis(Axis(0)) / n;
    let std = var.mapv(|v| ScalarOps::sqrt(v).max(floor));
    (mean, std)
}

fn mean_row_norm<F: ScalarOps>(x: &ArrayView2<'_, F>) -> F {
    if x.nrows() == 0 {
        return F::zero();
    }
    let total = x
        .outer_iter()
        .fold(F::zero(), |acc, row| acc + ScalarOps::sqrt(row.dot(&row)));
    total / F::from_usize(x.nrows())
}

/// Single-pass running estimate of per-feature mean and standard deviation.
///
/// The variance `E[x^2] - E[x]^2` is floored at `min_std^2`. Memory use is
/// constant in the number of rows, at some cost in accuracy when means are
/// large compared to the spread.
pub fn mean_and_std<F: ScalarOps>(
    x: ArrayView2<'_, F>,
    min_std: F,
) -> Result<(Array1<F>, Array1<F>)> {
    if x.nrows() == 0 {
        return Err(AsgdError::EmptyData(
            "cannot estimate statistics of zero rows".to_string(),
        ));
    }

    let mut mean = Array1::<F>::zeros(x.ncols());
    let mut mean_sq = Array1::<F>::zeros(x.ncols());
    for (i, row) in x.outer_iter().enumerate() {
        let alpha = F::one() / F::from_usize(i + 1);
        let keep = F::one() - alpha;
        Zip::from(&mut mean)
            .and(&mut mean_sq)
            .and(&row)
            .for_each(|m, msq, &v| {
                *m = alpha * v + keep * *m;
                *msq = alpha * v * v + keep * *msq;
            });
    }

    let floor = min_std * min_std;
    let std = Zip::from(&mean)
        .and(&mean_sq)
        .map_collect(|&m, &msq| ScalarOps::sqrt((msq - m * m).max(floor)));
    Ok((mean, std))
}

/// Options of [`split_center_normalize`].
///
/// Defaults:
/// - `validset_fraction`: 0.2
/// - `validset_max_examples`: 5000
/// - `min_std`: 1e-4
/// - `batchsize`: 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitConfig {
    pub validset_fraction: f64,
    pub validset_max_examples: usize,
    pub min_std: f64,
    pub batchsize: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            validset_fraction: 0.2,
            validset_max_examples: 5000,
            min_std: 1e-4,
            batchsize: 1,
        }
    }
}

impl SplitConfig {
    pub fn validset_fraction(mut self, fraction: f64) -> Self {
        self.validset_fraction = fraction;
        self
    }

    pub fn validset_max_examples(mut self, max_examples: usize) -> Self {
        self.validset_max_examples = max_examples;
        self
    }

    pub fn min_std(mut self, min_std: f64) -> Self {
        self.min_std = min_std;
        self
    }

    pub fn batchsize(mut self, batchsize: usize) -> Self {
        self.batchsize = batchsize;
        self
    }
}

/// Output of [`split_center_normalize`].
#[derive(Debug, Clone)]
pub struct TrainValidSplit<F, L> {
    pub train_x: Array2<F>,
    pub train_y: Array1<L>,
    pub valid_x: Array2<F>,
    pub valid_y: Array1<L>,
    pub mean: Array1<F>,
    pub std: Array1<F>,
}

/// Splits off a trailing validation set and standardizes both parts.
///
/// The validation size is `floor(min(max_examples, fraction * n))`, rounded
/// up to a multiple of `batchsize`; the training size is what remains,
/// rounded down to a multiple of `batchsize`. Rows that fit in neither are
/// dropped. The statistics come from [`mean_and_std`] over all of `x`.
pub fn split_center_normalize<F: ScalarOps, L: Clone>(
    x: ArrayView2<'_, F>,
    y: ArrayView1<'_, L>,
    config: &SplitConfig,
) -> Result<TrainValidSplit<F, L>> {
    if config.batchsize == 0 {
        return Err(AsgdError::InvalidParameter(
            "batchsize must be positive".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&config.validset_fraction) {
        return Err(AsgdError::InvalidParameter(format!(
            "validset_fraction must lie in [0, 1], got {}",
            config.validset_fraction
        )));
    }
    if y.len() != x.nrows() {
        return Err(AsgdError::ShapeMismatch {
            expected: format!("{} labels", x.nrows()),
            got: format!("{} labels", y.len()),
        });
    }

    let n = x.nrows();
    let by_fraction = (config.validset_fraction * n as f64).floor() as usize;
    let n_valid = round_up(by_fraction.min(config.validset_max_examples), config.batchsize);
    if n_valid > n {
        return Err(AsgdError::InvalidParameter(format!(
            "validation set of {} rows does not fit in {} examples",
            n_valid, n
        )));
    }
    let n_train = round_down(n - n_valid, config.batchsize);

    let (mean, std) = mean_and_std(x, F::from_f64(config.min_std))?;
    let scaled = (&x - &mean) / &std;

    Ok(TrainValidSplit {
        train_x: scaled.slice(s![..n_train, ..]).to_owned(),
        train_y: y.slice(s![..n_train]).to_owned(),
        valid_x: scaled.slice(s![n_train..n_train + n_valid, ..]).to_owned(),
        valid_y: y.slice(s![n_train..n_train + n_valid]).to_owned(),
        mean,
        std,
    })
}

fn round_up(n: usize, multiple: usize) -> usize {
    (n + multiple - 1) / multiple * multiple
}

fn round_down(n: usize, multiple: usize) -> usize {
    n / multiple * multiple
}
