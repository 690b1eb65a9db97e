//! Hyperparameters shared by the binary and one-vs-all estimators.
//!
//! [`AsgdConfig`] is immutable once an estimator is built from it. It can be
//! assembled with fluent setters or read from a JSON file:
//!
//! ```json
//! {
//!   "sgd_step_size0": null,
//!   "l2_regularization": 0.001,
//!   "n_iterations": 10,
//!   "random_seed": 42,
//!   "sgd_step_size_scheduling_exponent": 0.6666666666666666,
//!   "sgd_step_size_scheduling_multiplier": "l2_regularization"
//! }
//! ```
//!
//! Missing keys fall back to [`AsgdConfig::default`]. A fixed multiplier is
//! written as `{"fixed": 0.5}`.

use crate::error::{AsgdError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_L2_REGULARIZATION: f64 = 1e-3;
pub const DEFAULT_N_ITERATIONS: usize = 10;
pub const DEFAULT_RANDOM_SEED: u64 = 42;
pub const DEFAULT_SGD_EXPONENT: f64 = 2.0 / 3.0;
pub const DEFAULT_MIN_N_ITERATIONS: usize = 5;

/// Multiplier `m` of the SGD step-size schedule `step0 / (1 + step0 * n * m)^exponent`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepSizeMultiplier {
    /// Reuse the L2 regularization strength (Bottou's heuristic).
    #[default]
    L2Regularization,
    /// Explicit multiplier.
    Fixed(f64),
}

/// Hyperparameters of an ASGD estimator.
///
/// Defaults:
/// - `sgd_step_size0`: `None` (calibrated automatically on the first `fit`)
/// - `l2_regularization`: `1e-3`
/// - `n_iterations`: `10`
/// - `feedback`: `false`
/// - `random_seed`: `42`
/// - `sgd_step_size_scheduling_exponent`: `2/3`
/// - `sgd_step_size_scheduling_multiplier`: [`StepSizeMultiplier::L2Regularization`]
/// - `min_n_iterations`: `5`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsgdConfig {
    /// Initial SGD step size. `None` triggers step-size calibration in `fit`.
    pub sgd_step_size0: Option<f64>,
    /// L2 penalty strength, applied as multiplicative shrinkage every step.
    pub l2_regularization: f64,
    /// Epoch budget of `fit`.
    pub n_iterations: usize,
    /// Fold the averaged weights back into the SGD weights after each epoch.
    /// Not supported: validation rejects `true`.
    pub feedback: bool,
    /// Seed of the permutation source used to shuffle examples between epochs.
    pub random_seed: u64,
    /// Exponent of the SGD step-size decay.
    pub sgd_step_size_scheduling_exponent: f64,
    /// Multiplier of the SGD step-size decay.
    pub sgd_step_size_scheduling_multiplier: StepSizeMultiplier,
    /// Epochs that must complete before the convergence check may stop training
    /// (capped by `n_iterations`).
    pub min_n_iterations: usize,
}

impl Default for AsgdConfig {
    fn default() -> Self {
        Self {
            sgd_step_size0: None,
            l2_regularization: DEFAULT_L2_REGULARIZATION,
            n_iterations: DEFAULT_N_ITERATIONS,
            feedback: false,
            random_seed: DEFAULT_RANDOM_SEED,
            sgd_step_size_scheduling_exponent: DEFAULT_SGD_EXPONENT,
            sgd_step_size_scheduling_multiplier: StepSizeMultiplier::L2Regularization,
            min_n_iterations: DEFAULT_MIN_N_ITERATIONS,
        }
    }
}

impl AsgdConfig {
    pub fn sgd_step_size0(mut self, step_size0: f64) -> Self {
        self.sgd_step_size0 = Some(step_size0);
        self
    }

    pub fn l2_regularization(mut self, l2_regularization: f64) -> Self {
        self.l2_regularization = l2_regularization;
        self
    }

    pub fn n_iterations(mut self, n_iterations: usize) -> Self {
        self.n_iterations = n_iterations;
        self
    }

    /// Requests feedback of the averaged weights into the SGD weights.
    ///
    /// Kept so that configurations written for it can be parsed; estimators
    /// built from a config with feedback enabled fail with
    /// [`AsgdError::Unsupported`].
    pub fn feedback(mut self, feedback: bool) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn sgd_step_size_scheduling_exponent(mut self, exponent: f64) -> Self {
        self.sgd_step_size_scheduling_exponent = exponent;
        self
    }

    pub fn sgd_step_size_scheduling_multiplier(mut self, multiplier: StepSizeMultiplier) -> Self {
        self.sgd_step_size_scheduling_multiplier = multiplier;
        self
    }

    pub fn min_n_iterations(mut self, min_n_iterations: usize) -> Self {
        self.min_n_iterations = min_n_iterations;
        self
    }

    /// Multiplier of the step-size schedule with the L2 shortcut resolved.
    pub fn resolved_multiplier(&self) -> f64 {
        match self.sgd_step_size_scheduling_multiplier {
            StepSizeMultiplier::L2Regularization => self.l2_regularization,
            StepSizeMultiplier::Fixed(m) => m,
        }
    }

    /// Number of epochs after which the convergence check becomes active.
    pub fn effective_min_n_iterations(&self) -> usize {
        self.min_n_iterations.min(self.n_iterations)
    }

    /// Checks every hyperparameter; estimators call this on construction.
    pub fn validate(&self) -> Result<()> {
        if self.feedback {
            return Err(AsgdError::Unsupported(
                "feedback of averaged weights into SGD weights is known to be unstable".to_string(),
            ));
        }
        if self.n_iterations == 0 {
            return Err(AsgdError::InvalidParameter(
                "n_iterations must be positive".to_string(),
            ));
        }
        if self.min_n_iterations == 0 {
            return Err(AsgdError::InvalidParameter(
                "min_n_iterations must be positive".to_string(),
            ));
        }
        if !self.l2_regularization.is_finite() || self.l2_regularization < 0.0 {
            return Err(AsgdError::InvalidParameter(format!(
                "l2_regularization must be finite and non-negative, got {}",
                self.l2_regularization
            )));
        }
        if let Some(step) = self.sgd_step_size0 {
            if !step.is_finite() || step <= 0.0 {
                return Err(AsgdError::InvalidParameter(format!(
                    "sgd_step_size0 must be finite and positive, got {}",
                    step
                )));
            }
        }
        if !self.sgd_step_size_scheduling_exponent.is_finite() {
            return Err(AsgdError::InvalidParameter(
                "sgd_step_size_scheduling_exponent must be finite".to_string(),
            ));
        }
        if let StepSizeMultiplier::Fixed(m) = self.sgd_step_size_scheduling_multiplier {
            if !m.is_finite() || m < 0.0 {
                return Err(AsgdError::InvalidParameter(format!(
                    "sgd_step_size_scheduling_multiplier must be finite and non-negative, got {}",
                    m
                )));
            }
        }
        Ok(())
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let config: AsgdConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a JSON configuration file.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use asgd::config::AsgdConfig;
    ///
    /// let cfg = AsgdConfig::from_json_file("config/asgd.json").unwrap();
    /// assert!(cfg.n_iterations > 0);
    /// ```
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}
