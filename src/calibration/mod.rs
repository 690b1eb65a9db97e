//! Automatic choice of the initial SGD step size.
//!
//! The search follows Bottou's recipe: score two candidate step sizes a
//! factor apart on a small sample, then keep walking in the direction that
//! lowered the cost until it stops improving by more than a tolerance. Each
//! candidate is scored on a throwaway clone of the model, so the live model
//! is never modified.

use crate::backend::ScalarOps;
use crate::dataset::check_batch;
use crate::error::{AsgdError, Result};
use crate::model::OnlineClassifier;
use log::{debug, info, warn};
use ndarray::{s, ArrayView1, ArrayView2};

pub const DEFAULT_BASE: f64 = 1.0;
pub const DEFAULT_FACTOR: f64 = 2.0;
pub const DEFAULT_TOLERANCE: f64 = 1e-4;
pub const DEFAULT_N_EXAMPLES: usize = 1000;
pub const DEFAULT_MAX_TRIALS: usize = 50;

/// Geometric bracketing search for `sgd_step_size0`.
///
/// Defaults:
/// - `base`: 1.0
/// - `factor`: 2.0
/// - `tolerance`: 1e-4
/// - `n_examples`: 1000 (only the leading examples are used)
/// - `max_trials`: 50 cost evaluations before giving up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSizeCalibrator {
    base: f64,
    factor: f64,
    tolerance: f64,
    n_examples: usize,
    max_trials: usize,
}

impl Default for StepSizeCalibrator {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE,
            factor: DEFAULT_FACTOR,
            tolerance: DEFAULT_TOLERANCE,
            n_examples: DEFAULT_N_EXAMPLES,
            max_trials: DEFAULT_MAX_TRIALS,
        }
    }
}

impl StepSizeCalibrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base(mut self, base: f64) -> Self {
        self.base = base;
        self
    }

    pub fn factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn n_examples(mut self, n_examples: usize) -> Self {
        self.n_examples = n_examples;
        self
    }

    pub fn max_trials(mut self, max_trials: usize) -> Self {
        self.max_trials = max_trials;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.base.is_finite() || self.base <= 0.0 {
            return Err(AsgdError::InvalidParameter(format!(
                "calibration base must be finite and positive, got {}",
                self.base
            )));
        }
        if !self.factor.is_finite() || self.factor <= 1.0 {
            return Err(AsgdError::InvalidParameter(format!(
                "calibration factor must be finite and greater than 1, got {}",
                self.factor
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(AsgdError::InvalidParameter(format!(
                "calibration tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        if self.n_examples == 0 {
            return Err(AsgdError::InvalidParameter(
                "calibration needs at least one example".to_string(),
            ));
        }
        if self.max_trials < 2 {
            return Err(AsgdError::InvalidParameter(
                "calibration needs at least two trials".to_string(),
            ));
        }
        Ok(())
    }

    /// Searches for a good initial SGD step size for `model` on the leading
    /// `n_examples` rows of `x`.
    ///
    /// `model` is only cloned, never modified; installing the result is up to
    /// the caller. Running the search twice on the same model and data gives
    /// the same answer.
    ///
    /// # Errors
    /// - [`AsgdError::CalibrationFailed`] when the walk needs more than
    ///   `max_trials` cost evaluations.
    /// - Shape and label errors of the model's `partial_fit`.
    pub fn determine_sgd_step_size0<F, M>(
        &self,
        model: &M,
        x: ArrayView2<'_, F>,
        y: ArrayView1<'_, M::Label>,
    ) -> Result<F>
    where
        F: ScalarOps,
        M: OnlineClassifier<F>,
    {
        self.validate()?;
        check_batch(&x, &y, None, model.n_features())?;

        let n = x.nrows().min(self.n_examples);
        let x = x.slice_move(s![..n, ..]);
        let y = y.slice_move(s![..n]);

        let factor = F::from_f64(self.factor);
        let tolerance = F::from_f64(self.tolerance);

        let mut trials = 0;
        let mut evaluate = |step_size: F| -> Result<F> {
            if trials == self.max_trials {
                return Err(AsgdError::CalibrationFailed {
                    trials,
                    step_size: step_size.to_f64(),
                });
            }
            trials += 1;
            let cost = self.evaluate_step_size(model, x, y, step_size)?;
            debug!(
                "calibration trial {}: step_size = {}, cost = {}",
                trials, step_size, cost
            );
            if !cost.is_finite() {
                warn!("calibration cost is not finite at step_size = {}", step_size);
            }
            Ok(cost)
        };

        let mut lo_step_size = F::from_f64(self.base);
        let mut lo_cost = evaluate(lo_step_size)?;
        let mut hi_step_size = lo_step_size * factor;
        let mut hi_cost = evaluate(hi_step_size)?;

        if lo_cost < hi_cost {
            // walk toward zero
            while lo_cost + tolerance < hi_cost {
                hi_step_size = lo_step_size;
                hi_cost = lo_cost;
                lo_step_size = hi_step_size / factor;
                lo_cost = evaluate(lo_step_size)?;
            }
        } else if hi_cost < lo_cost {
            while hi_cost + tolerance < lo_cost {
                lo_step_size = hi_step_size;
                lo_cost = hi_cost;
                hi_step_size = lo_step_size * factor;
                hi_cost = evaluate(hi_step_size)?;
            }
        }

        info!(
            "calibrated sgd_step_size0 = {} (cost {}) after {} trials on {} examples",
            lo_step_size, lo_cost, trials, n
        );
        Ok(lo_step_size)
    }

    /// Cost of one pass at `step_size` on a clone of `model`.
    pub fn evaluate_step_size<F, M>(
        &self,
        model: &M,
        x: ArrayView2<'_, F>,
        y: ArrayView1<'_, M::Label>,
        step_size: F,
    ) -> Result<F>
    where
        F: ScalarOps,
        M: OnlineClassifier<F>,
    {
        let mut trial = model.clone();
        trial.set_sgd_step_size0(step_size);
        trial.partial_fit(x, y, None)?;
        trial.calibration_cost(x, y)
    }
}
