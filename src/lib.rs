//! # asgd
//!
//! Linear classifiers trained with averaged stochastic gradient descent
//! (ASGD): a hinge-loss SGD learner whose iterates are averaged
//! (Polyak-Ruppert) to give a low-variance predictor, plus an automatic
//! search for the initial step size.
//!
//! ## Core Design Principles
//!
//! - **Online first**: every estimator is a live object. `partial_fit` makes
//!   one ordered pass over a batch and can be called any number of times;
//!   `fit` adds calibration, shuffling and early stopping on top.
//! - **Explicit configuration**: hyperparameters live in an immutable
//!   [`AsgdConfig`], and the shuffling order comes from a seeded permutation
//!   source. There is no process-wide state.
//! - **Precision as a type parameter**: estimators are generic over
//!   [`ScalarOps`], implemented for `f64` (default) and `f32`.
//!
//! ## Quick Start
//!
//! ```rust
//! use asgd::{AsgdConfig, BinaryAsgd, OnlineClassifier};
//! use ndarray::array;
//!
//! let x = array![[1.0, 2.0], [2.0, 1.0], [-1.0, -2.0], [-2.0, -1.0]];
//! let y = array![1.0, 1.0, -1.0, -1.0];
//!
//! let config = AsgdConfig::default().l2_regularization(1e-4).n_iterations(20);
//! let mut clf = BinaryAsgd::<f64>::new(2, config)?;
//! clf.fit(x.view(), y.view(), None)?;
//!
//! assert_eq!(clf.predict(x.view())?, y);
//! # Ok::<(), asgd::AsgdError>(())
//! ```
//!
//! ## Module Structure
//!
//! - `backend`: element type abstraction (`f32`/`f64`)
//! - `config`: hyperparameters and JSON loading
//! - `optimizer`: step-size schedules
//! - `loss`: hinge loss and regularized risk
//! - `model`: [`BinaryAsgd`], [`OvaAsgd`] and the [`OnlineClassifier`] trait
//! - `calibration`: initial step-size search
//! - `trainer`: epoch loop and convergence check
//! - `dataset`: batch validation and permutation sources
//! - `metrics`: accuracy, precision/recall, AP, AUC, R²
//! - `preprocessing`: centering and scaling utilities

pub mod backend;
pub mod calibration;
pub mod config;
pub mod dataset;
pub mod error;
pub mod loss;
pub mod metrics;
pub mod model;
pub mod optimizer;
pub mod preprocessing;
pub mod trainer;

pub use backend::ScalarOps;
pub use calibration::StepSizeCalibrator;
pub use config::{AsgdConfig, StepSizeMultiplier};
pub use dataset::{PermutationSource, SeededPermutation};
pub use error::{AsgdError, Result};
pub use model::{BinaryAsgd, OnlineClassifier, OvaAsgd};
pub use trainer::{EpochDriver, FitReport, TrainingOutcome};
