//! Step-size scheduling for averaged SGD.
//!
//! Two step sizes evolve with the number of observations `n` seen so far:
//!
//! ```text
//! sgd_step_size  = step0 / (1 + step0 * n * multiplier)^exponent
//! asgd_step_size = 1 / n
//! ```
//!
//! The SGD rate is Bottou's decaying schedule (exponent `2/3`, multiplier equal
//! to the L2 strength by default). The averaging rate `1/n` turns the averaged
//! weights into the uniform running mean of every SGD iterate.
//!
//! [`StepSizeSchedule`] is the pure mapping; [`StepSizeState`] is the mutable
//! counter-plus-rates record each estimator owns.

use crate::backend::ScalarOps;
use crate::config::AsgdConfig;
use crate::error::{AsgdError, Result};

/// Pure step-size schedule parametrized by exponent and multiplier.
///
/// # Example
/// ```
/// use asgd::optimizer::StepSizeSchedule;
///
/// let schedule = StepSizeSchedule::<f64>::new(1.0, 1.0);
/// // 1 / (1 + 1 * 1 * 1)^1
/// assert_eq!(schedule.sgd_step_size(1.0, 1), 0.5);
/// assert_eq!(StepSizeSchedule::<f64>::asgd_step_size(4), 0.25);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSizeSchedule<F> {
    exponent: F,
    multiplier: F,
}

impl<F: ScalarOps> StepSizeSchedule<F> {
    pub fn new(exponent: F, multiplier: F) -> Self {
        Self {
            exponent,
            multiplier,
        }
    }

    /// Schedule described by a configuration, with the L2 multiplier shortcut resolved.
    pub fn from_config(config: &AsgdConfig) -> Self {
        Self::new(
            F::from_f64(config.sgd_step_size_scheduling_exponent),
            F::from_f64(config.resolved_multiplier()),
        )
    }

    pub fn exponent(&self) -> F {
        self.exponent
    }

    pub fn multiplier(&self) -> F {
        self.multiplier
    }

    /// SGD step size after `n_observations` updates starting from `sgd_step_size0`.
    pub fn sgd_step_size(&self, sgd_step_size0: F, n_observations: usize) -> F {
        let scaling = F::one() + sgd_step_size0 * F::from_usize(n_observations) * self.multiplier;
        sgd_step_size0 / scaling.powf(self.exponent)
    }

    /// Averaging step size after `n_observations` updates.
    ///
    /// `n_observations` must be at least 1; the observation counter is always
    /// advanced before this is evaluated.
    pub fn asgd_step_size(n_observations: usize) -> F {
        debug_assert!(n_observations > 0, "asgd step size needs at least one observation");
        F::one() / F::from_usize(n_observations)
    }
}

/// Observation counter and the two current step sizes of an estimator.
///
/// `n_observations` only ever grows (until an explicit reset) and determines
/// both rates. Before the first update the averaging rate is `1`, so the first
/// averaged iterate equals the first SGD iterate.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSizeState<F> {
    sgd_step_size0: Option<F>,
    sgd_step_size: Option<F>,
    asgd_step_size: F,
    n_observations: usize,
}

impl<F: ScalarOps> StepSizeState<F> {
    /// Fresh state; `None` leaves the SGD rate to be calibrated.
    pub fn new(sgd_step_size0: Option<F>) -> Self {
        Self {
            sgd_step_size0,
            sgd_step_size: sgd_step_size0,
            asgd_step_size: F::one(),
            n_observations: 0,
        }
    }

    pub fn sgd_step_size0(&self) -> Option<F> {
        self.sgd_step_size0
    }

    pub fn sgd_step_size(&self) -> Option<F> {
        self.sgd_step_size
    }

    pub fn asgd_step_size(&self) -> F {
        self.asgd_step_size
    }

    pub fn n_observations(&self) -> usize {
        self.n_observations
    }

    /// Installs a new base step size and makes it the live SGD rate.
    ///
    /// The observation counter is left alone, so the schedule resumes from the
    /// current `n` at the next [`StepSizeState::advance`].
    pub fn set_sgd_step_size0(&mut self, sgd_step_size0: F) {
        self.sgd_step_size0 = Some(sgd_step_size0);
        self.sgd_step_size = Some(sgd_step_size0);
    }

    /// Current SGD rate, or [`AsgdError::MissingStepSize`] when uncalibrated.
    pub fn current_sgd_step_size(&self) -> Result<F> {
        self.sgd_step_size.ok_or(AsgdError::MissingStepSize)
    }

    /// Counts one observation and recomputes both rates.
    pub fn advance(&mut self, schedule: &StepSizeSchedule<F>) -> Result<()> {
        let sgd_step_size0 = self.sgd_step_size0.ok_or(AsgdError::MissingStepSize)?;
        self.n_observations += 1;
        self.sgd_step_size = Some(schedule.sgd_step_size(sgd_step_size0, self.n_observations));
        self.asgd_step_size = StepSizeSchedule::<F>::asgd_step_size(self.n_observations);
        Ok(())
    }

    /// Back to the construction-time state.
    pub fn reset(&mut self, sgd_step_size0: Option<F>) {
        *self = Self::new(sgd_step_size0);
    }
}
