//! Epoch loop around an [`OnlineClassifier`].
//!
//! [`EpochDriver`] moves an estimator through
//! `uncalibrated -> calibrating -> training -> converged | exhausted`:
//! it calibrates the step size when none is set, then for every epoch draws
//! a permutation, reorders the batch, runs one `partial_fit` pass and checks
//! whether training has plateaued.

use crate::backend::ScalarOps;
use crate::calibration::StepSizeCalibrator;
use crate::dataset::{check_batch, reorder, PermutationSource};
use crate::error::{AsgdError, Result};
use crate::model::OnlineClassifier;
use log::{debug, info};
use ndarray::{Array1, ArrayView1, ArrayView2};

/// Relative improvement below which the convergence check stops training.
pub const CONVERGENCE_RATIO: f64 = 0.99;

/// How the epoch loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingOutcome {
    /// The cost plateaued before the epoch budget ran out.
    Converged,
    /// Every epoch of the budget was run.
    Exhausted,
}

/// Summary of one [`EpochDriver::fit`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitReport<F> {
    pub outcome: TrainingOutcome,
    /// Epochs actually run.
    pub epochs: usize,
    /// Base step size used for training.
    pub sgd_step_size0: F,
    /// Whether `sgd_step_size0` was found by calibration during this call.
    pub calibrated: bool,
}

/// Plateau test on the per-epoch training cost history.
///
/// Once at least `min_n_iterations` entries exist, training has converged when
/// the latest cost exceeds 99% of the cost at the midpoint index `len / 2`,
/// i.e. the second half of training improved by less than 1%.
///
/// ```
/// use asgd::trainer::fit_converged;
///
/// assert!(!fit_converged(&[1.0, 0.9, 0.85, 0.84, 0.839], 5));
/// assert!(fit_converged(&[1.0, 0.9, 0.85, 0.849, 0.848], 5));
/// ```
pub fn fit_converged<F: ScalarOps>(train_means: &[F], min_n_iterations: usize) -> bool {
    match train_means.last() {
        Some(&latest) if train_means.len() >= min_n_iterations => {
            latest > F::from_f64(CONVERGENCE_RATIO) * train_means[train_means.len() / 2]
        }
        _ => false,
    }
}

/// Drives calibration and the shuffled epoch loop for any [`OnlineClassifier`].
///
/// The permutation source is injected, so the shuffling order is fully
/// determined by the caller.
///
/// # Example
/// ```
/// use asgd::dataset::SeededPermutation;
/// use asgd::trainer::{EpochDriver, TrainingOutcome};
/// use asgd::{AsgdConfig, BinaryAsgd};
/// use ndarray::array;
///
/// let x = array![[1.0, 0.5], [-1.0, -0.5], [0.8, 1.0], [-0.7, -1.2]];
/// let y = array![1.0, -1.0, 1.0, -1.0];
/// let mut clf = BinaryAsgd::<f64>::new(2, AsgdConfig::default().n_iterations(3)).unwrap();
///
/// let report = EpochDriver::new(SeededPermutation::new(0))
///     .fit(&mut clf, x.view(), y.view(), None)
///     .unwrap();
/// assert!(report.calibrated);
/// assert!(report.epochs <= 3);
/// ```
#[derive(Debug, Clone)]
pub struct EpochDriver<P> {
    permutation: P,
    calibrator: StepSizeCalibrator,
}

impl<P: PermutationSource> EpochDriver<P> {
    pub fn new(permutation: P) -> Self {
        Self {
            permutation,
            calibrator: StepSizeCalibrator::default(),
        }
    }

    /// Replaces the default step-size calibrator.
    pub fn calibrator(mut self, calibrator: StepSizeCalibrator) -> Self {
        self.calibrator = calibrator;
        self
    }

    /// Trains `model` for at most `config().n_iterations` epochs.
    ///
    /// Missing margin biases default to zero. Feedback of the averaged weights
    /// is never performed: estimators reject `feedback = true` on
    /// construction.
    pub fn fit<F, M>(
        &mut self,
        model: &mut M,
        x: ArrayView2<'_, F>,
        y: ArrayView1<'_, M::Label>,
        margin_biases: Option<ArrayView1<'_, F>>,
    ) -> Result<FitReport<F>>
    where
        F: ScalarOps,
        M: OnlineClassifier<F>,
    {
        check_batch(&x, &y, margin_biases.as_ref(), model.n_features())?;

        let calibrated = model.sgd_step_size0().is_none();
        if calibrated {
            let step_size0 = self.calibrator.determine_sgd_step_size0(model, x, y)?;
            model.set_sgd_step_size0(step_size0);
        }
        let sgd_step_size0 = model.sgd_step_size0().ok_or(AsgdError::MissingStepSize)?;

        let margin_biases = match margin_biases {
            Some(mb) => mb.to_owned(),
            None => Array1::zeros(x.nrows()),
        };
        let n_iterations = model.config().n_iterations;

        for epoch in 1..=n_iterations {
            let indices = self.permutation.permutation(x.nrows());
            let batch = reorder(&x, &y, &margin_biases.view(), &indices);
            model.partial_fit(
                batch.x.view(),
                batch.y.view(),
                Some(batch.margin_biases.view()),
            )?;

            match model.train_means().last() {
                Some(mean) => debug!("epoch {}/{}: train mean = {}", epoch, n_iterations, mean),
                None => debug!("epoch {}/{} done", epoch, n_iterations),
            }

            if model.has_converged() {
                info!("converged after {} of {} epochs", epoch, n_iterations);
                return Ok(FitReport {
                    outcome: TrainingOutcome::Converged,
                    epochs: epoch,
                    sgd_step_size0,
                    calibrated,
                });
            }
        }

        info!("epoch budget of {} exhausted", n_iterations);
        Ok(FitReport {
            outcome: TrainingOutcome::Exhausted,
            epochs: n_iterations,
            sgd_step_size0,
            calibrated,
        })
    }
}
