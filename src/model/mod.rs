//! Online linear classifiers trained by averaged stochastic gradient descent.
//!
//! Both estimators keep two copies of their parameters:
//! - the **SGD** weights, updated by one hinge subgradient step per example;
//! - the **ASGD** weights, the running Polyak-Ruppert average of the SGD
//!   iterates. Predictions always use the averaged weights.
//!
//! [`OnlineClassifier`] is the seam shared by [`BinaryAsgd`] and [`OvaAsgd`].
//! The step-size calibrator and the epoch driver only talk to this trait.

pub mod binary;
pub mod ova;

pub use binary::BinaryAsgd;
pub use ova::OvaAsgd;

use crate::backend::ScalarOps;
use crate::config::AsgdConfig;
use crate::error::Result;
use ndarray::{ArrayView1, ArrayView2};

/// An estimator that can consume labelled batches one pass at a time.
///
/// Implementors are `Clone` so that a trial copy can be trained and thrown
/// away without touching the live model.
pub trait OnlineClassifier<F: ScalarOps>: Clone {
    /// Label type of a training example: `F` holding `±1` for the binary
    /// classifier, a class index for one-vs-all.
    type Label: Copy;
    /// Output of [`OnlineClassifier::decision_function`].
    type Decision;
    /// Output of [`OnlineClassifier::predict`].
    type Prediction;

    fn n_features(&self) -> usize;

    fn config(&self) -> &AsgdConfig;

    /// Base SGD step size, `None` until configured or calibrated.
    fn sgd_step_size0(&self) -> Option<F>;

    /// Installs `step_size0` as both the base and the live SGD step size.
    fn set_sgd_step_size0(&mut self, step_size0: F);

    /// One ordered pass over the batch, no shuffling.
    ///
    /// Fails without touching the model when shapes or labels are invalid, or
    /// when no SGD step size is set.
    fn partial_fit(
        &mut self,
        x: ArrayView2<'_, F>,
        y: ArrayView1<'_, Self::Label>,
        margin_biases: Option<ArrayView1<'_, F>>,
    ) -> Result<&mut Self>;

    /// Regularized hinge risk of the 50/50 blend of averaged and SGD weights,
    /// averaged over the examples of `x`.
    fn calibration_cost(&self, x: ArrayView2<'_, F>, y: ArrayView1<'_, Self::Label>)
        -> Result<F>;

    /// Per-pass regularized training cost, oldest first.
    ///
    /// Estimators that do not track it return an empty slice.
    fn train_means(&self) -> &[F] {
        &[]
    }

    /// Whether training has plateaued. Estimators without a cost history
    /// never report convergence.
    fn has_converged(&self) -> bool {
        false
    }

    fn decision_function(&self, x: ArrayView2<'_, F>) -> Result<Self::Decision>;

    fn predict(&self, x: ArrayView2<'_, F>) -> Result<Self::Prediction>;

    /// Zeroes all parameters and restores the configured step sizes.
    fn reset(&mut self);
}
