//! Binary linear classifier with labels in `{-1, +1}`.

use super::OnlineClassifier;
use crate::backend::ScalarOps;
use crate::config::AsgdConfig;
use crate::dataset::{check_batch, check_features, SeededPermutation};
use crate::error::{AsgdError, Result};
use crate::loss::{regularized_risk, squared_norm, Hinge};
use crate::optimizer::{StepSizeSchedule, StepSizeState};
use crate::trainer::{fit_converged, EpochDriver};
use ndarray::{Array1, ArrayView1, ArrayView2};

/// Averaged-SGD hinge classifier for two classes.
///
/// Decision values are `X · asgd_weights + asgd_bias`; [`BinaryAsgd::fit`]
/// runs up to `n_iterations` shuffled passes and stops early once the
/// per-pass training cost plateaus.
///
/// # Example
/// ```
/// use asgd::{AsgdConfig, BinaryAsgd, OnlineClassifier};
/// use ndarray::array;
///
/// let x = array![[1.0, 1.0], [2.0, 1.5], [-1.0, -1.0], [-2.0, -1.0]];
/// let y = array![1.0, 1.0, -1.0, -1.0];
///
/// let mut clf = BinaryAsgd::<f64>::new(2, AsgdConfig::default()).unwrap();
/// clf.fit(x.view(), y.view(), None).unwrap();
/// assert_eq!(clf.predict(x.view()).unwrap(), y);
/// ```
#[derive(Debug, Clone)]
pub struct BinaryAsgd<F: ScalarOps = f64> {
    n_features: usize,
    config: AsgdConfig,
    schedule: StepSizeSchedule<F>,
    steps: StepSizeState<F>,
    sgd_weights: Array1<F>,
    sgd_bias: F,
    asgd_weights: Array1<F>,
    asgd_bias: F,
    train_means: Vec<F>,
    permutation: SeededPermutation,
}

impl<F: ScalarOps> BinaryAsgd<F> {
    /// Zero-initialized classifier over `n_features` inputs.
    pub fn new(n_features: usize, config: AsgdConfig) -> Result<Self> {
        if n_features == 0 {
            return Err(AsgdError::InvalidParameter(
                "n_features must be positive".to_string(),
            ));
        }
        config.validate()?;

        Ok(Self {
            n_features,
            schedule: StepSizeSchedule::from_config(&config),
            steps: StepSizeState::new(config.sgd_step_size0.map(F::from_f64)),
            sgd_weights: Array1::zeros(n_features),
            sgd_bias: F::zero(),
            asgd_weights: Array1::zeros(n_features),
            asgd_bias: F::zero(),
            train_means: Vec::new(),
            permutation: SeededPermutation::new(config.random_seed),
            config,
        })
    }

    /// Calibrates the step size if needed, then trains on shuffled passes over
    /// the data until convergence or the epoch budget runs out.
    pub fn fit(
        &mut self,
        x: ArrayView2<'_, F>,
        y: ArrayView1<'_, F>,
        margin_biases: Option<ArrayView1<'_, F>>,
    ) -> Result<&mut Self> {
        let mut permutation = self.permutation.clone();
        EpochDriver::new(&mut permutation).fit(self, x, y, margin_biases)?;
        self.permutation = permutation;
        Ok(self)
    }

    pub fn sgd_weights(&self) -> &Array1<F> {
        &self.sgd_weights
    }

    pub fn sgd_bias(&self) -> F {
        self.sgd_bias
    }

    pub fn asgd_weights(&self) -> &Array1<F> {
        &self.asgd_weights
    }

    pub fn asgd_bias(&self) -> F {
        self.asgd_bias
    }

    /// Live SGD step size, `None` before calibration.
    pub fn sgd_step_size(&self) -> Option<F> {
        self.steps.sgd_step_size()
    }

    pub fn asgd_step_size(&self) -> F {
        self.steps.asgd_step_size()
    }

    pub fn n_observations(&self) -> usize {
        self.steps.n_observations()
    }
}

fn check_labels<F: ScalarOps>(y: &ArrayView1<'_, F>) -> Result<()> {
    match y.iter().find(|&&label| label != F::one() && label != -F::one()) {
        Some(bad) => Err(AsgdError::InvalidLabel(format!(
            "binary labels must be -1 or +1, got {}",
            bad
        ))),
        None => Ok(()),
    }
}

impl<F: ScalarOps> OnlineClassifier<F> for BinaryAsgd<F> {
    type Label = F;
    type Decision = Array1<F>;
    type Prediction = Array1<F>;

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn config(&self) -> &AsgdConfig {
        &self.config
    }

    fn sgd_step_size0(&self) -> Option<F> {
        self.steps.sgd_step_size0()
    }

    fn set_sgd_step_size0(&mut self, step_size0: F) {
        self.steps.set_sgd_step_size0(step_size0);
    }

    fn partial_fit(
        &mut self,
        x: ArrayView2<'_, F>,
        y: ArrayView1<'_, F>,
        margin_biases: Option<ArrayView1<'_, F>>,
    ) -> Result<&mut Self> {
        check_batch(&x, &y, margin_biases.as_ref(), self.n_features)?;
        check_labels(&y)?;
        let mut sgd_step_size = self.steps.current_sgd_step_size()?;

        let l2 = F::from_f64(self.config.l2_regularization);
        let hinge = Hinge;
        let mut costs = Vec::with_capacity(x.nrows());

        for (i, (obs, &label)) in x.outer_iter().zip(y.iter()).enumerate() {
            let margin_bias = margin_biases.as_ref().map_or_else(F::zero, |mb| mb[i]);
            let margin = label * (obs.dot(&self.sgd_weights) + self.sgd_bias);

            if l2 > F::zero() {
                self.sgd_weights *= F::one() - l2 * sgd_step_size;
            }

            if hinge.is_violated(margin, margin_bias) {
                self.sgd_weights.scaled_add(sgd_step_size * label, &obs);
                self.sgd_bias += sgd_step_size * label;
                costs.push(F::one() - margin);
            } else {
                costs.push(F::zero());
            }

            let asgd_step_size = self.steps.asgd_step_size();
            self.asgd_weights *= F::one() - asgd_step_size;
            self.asgd_weights.scaled_add(asgd_step_size, &self.sgd_weights);
            self.asgd_bias =
                (F::one() - asgd_step_size) * self.asgd_bias + asgd_step_size * self.sgd_bias;

            self.steps.advance(&self.schedule)?;
            sgd_step_size = self.steps.current_sgd_step_size()?;
        }

        self.train_means
            .push(regularized_risk(&costs, squared_norm(&self.asgd_weights), l2));
        Ok(self)
    }

    fn calibration_cost(&self, x: ArrayView2<'_, F>, y: ArrayView1<'_, F>) -> Result<F> {
        check_batch(&x, &y, None, self.n_features)?;

        let half = F::from_f64(0.5);
        let weights = &self.asgd_weights * half + &self.sgd_weights * half;
        let bias = half * self.asgd_bias + half * self.sgd_bias;

        let hinge = Hinge;
        let scores = x.dot(&weights);
        let costs: Vec<F> = scores
            .iter()
            .zip(y.iter())
            .map(|(&score, &label)| hinge.loss(label * (score + bias)))
            .collect();

        Ok(regularized_risk(
            &costs,
            squared_norm(&weights),
            F::from_f64(self.config.l2_regularization),
        ))
    }

    fn train_means(&self) -> &[F] {
        &self.train_means
    }

    fn has_converged(&self) -> bool {
        fit_converged(&self.train_means, self.config.effective_min_n_iterations())
    }

    fn decision_function(&self, x: ArrayView2<'_, F>) -> Result<Array1<F>> {
        check_features(&x, self.n_features)?;
        Ok(x.dot(&self.asgd_weights) + self.asgd_bias)
    }

    /// Sign of the decision value; exact zeros stay `0`.
    fn predict(&self, x: ArrayView2<'_, F>) -> Result<Array1<F>> {
        let decision = self.decision_function(x)?;
        Ok(decision.mapv(|d| {
            if d > F::zero() {
                F::one()
            } else if d < F::zero() {
                -F::one()
            } else {
                F::zero()
            }
        }))
    }

    fn reset(&mut self) {
        self.steps
            .reset(self.config.sgd_step_size0.map(F::from_f64));
        self.sgd_weights.fill(F::zero());
        self.sgd_bias = F::zero();
        self.asgd_weights.fill(F::zero());
        self.asgd_bias = F::zero();
        self.train_means.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StepSizeMultiplier;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn fixed_step_config(step0: f64, l2: f64) -> AsgdConfig {
        AsgdConfig::default()
            .sgd_step_size0(step0)
            .l2_regularization(l2)
            .sgd_step_size_scheduling_multiplier(StepSizeMultiplier::Fixed(0.0))
    }

    #[test]
    fn test_new_rejects_zero_features() {
        let err = BinaryAsgd::<f64>::new(0, AsgdConfig::default()).unwrap_err();
        assert!(matches!(err, AsgdError::InvalidParameter(_)));
    }

    #[test]
    fn test_new_rejects_feedback() {
        let err = BinaryAsgd::<f64>::new(3, AsgdConfig::default().feedback(true)).unwrap_err();
        assert!(matches!(err, AsgdError::Unsupported(_)));
    }

    #[test]
    fn test_new_is_zero_initialized() {
        let clf = BinaryAsgd::<f64>::new(3, AsgdConfig::default()).unwrap();
        assert_eq!(clf.sgd_weights(), &Array1::<f64>::zeros(3));
        assert_eq!(clf.asgd_weights(), &Array1::<f64>::zeros(3));
        assert_eq!(clf.sgd_bias(), 0.0);
        assert_eq!(clf.asgd_bias(), 0.0);
        assert_eq!(clf.asgd_step_size(), 1.0);
        assert_eq!(clf.n_observations(), 0);
        assert_eq!(clf.sgd_step_size0(), None);
        assert!(clf.train_means().is_empty());
    }

    #[test]
    fn test_first_update_from_zero_weights() {
        let mut clf = BinaryAsgd::<f64>::new(3, fixed_step_config(0.5, 1e-3)).unwrap();
        let x = array![[1.0, -2.0, 4.0]];
        let y = array![-1.0];
        clf.partial_fit(x.view(), y.view(), None).unwrap();

        assert_eq!(clf.sgd_weights(), &array![-0.5, 1.0, -2.0]);
        assert_eq!(clf.sgd_bias(), -0.5);
        // averaging rate starts at 1, so the first average is the first iterate
        assert_eq!(clf.asgd_weights(), &array![-0.5, 1.0, -2.0]);
        assert_eq!(clf.asgd_bias(), -0.5);
    }

    #[test]
    fn test_three_step_trace() {
        let mut clf = BinaryAsgd::<f64>::new(2, fixed_step_config(1.0, 0.1)).unwrap();
        let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let y = array![1.0, -1.0, 1.0];
        clf.partial_fit(x.view(), y.view(), None).unwrap();

        assert_abs_diff_eq!(clf.sgd_weights()[0], 1.81, epsilon = 1e-12);
        assert_abs_diff_eq!(clf.sgd_weights()[1], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(clf.sgd_bias(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(clf.asgd_weights()[0], 1.355, epsilon = 1e-12);
        assert_abs_diff_eq!(clf.asgd_weights()[1], -0.45, epsilon = 1e-12);
        assert_abs_diff_eq!(clf.asgd_bias(), 0.5, epsilon = 1e-12);

        let expected_mean = 4.1 / 3.0 + 0.1 * (1.355f64.powi(2) + 0.45f64.powi(2));
        assert_eq!(clf.train_means().len(), 1);
        assert_abs_diff_eq!(clf.train_means()[0], expected_mean, epsilon = 1e-12);
    }

    #[test]
    fn test_asgd_step_size_is_inverse_count() {
        let mut clf = BinaryAsgd::<f64>::new(2, AsgdConfig::default().sgd_step_size0(0.1)).unwrap();
        let x = array![[1.0, 0.5], [0.2, -1.0], [0.3, 0.3], [-1.0, 2.0]];
        let y = array![1.0, -1.0, 1.0, -1.0];
        clf.partial_fit(x.view(), y.view(), None).unwrap();
        assert_eq!(clf.n_observations(), 4);
        assert_eq!(clf.asgd_step_size(), 0.25);
        clf.partial_fit(x.view(), y.view(), None).unwrap();
        assert_eq!(clf.n_observations(), 8);
        assert_eq!(clf.asgd_step_size(), 0.125);
    }

    #[test]
    fn test_margin_bias_suppresses_update() {
        let mut clf = BinaryAsgd::<f64>::new(2, fixed_step_config(1.0, 0.0)).unwrap();
        let x = array![[1.0, 0.0]];
        let y = array![1.0];
        let mb = array![1.0];
        clf.partial_fit(x.view(), y.view(), Some(mb.view())).unwrap();

        assert_eq!(clf.sgd_weights(), &array![0.0, 0.0]);
        assert_eq!(clf.sgd_bias(), 0.0);
        assert_eq!(clf.train_means(), &[0.0]);
        assert_eq!(clf.n_observations(), 1);
    }

    #[test]
    fn test_invalid_label_leaves_model_untouched() {
        let mut clf = BinaryAsgd::<f64>::new(2, AsgdConfig::default().sgd_step_size0(0.1)).unwrap();
        let x = array![[1.0, 0.0], [0.0, 1.0]];
        let y = array![1.0, 0.0];
        let err = clf.partial_fit(x.view(), y.view(), None).unwrap_err();

        assert!(matches!(err, AsgdError::InvalidLabel(_)));
        assert_eq!(clf.n_observations(), 0);
        assert_eq!(clf.sgd_weights(), &array![0.0, 0.0]);
        assert!(clf.train_means().is_empty());
    }

    #[test]
    fn test_partial_fit_requires_step_size() {
        let mut clf = BinaryAsgd::<f64>::new(2, AsgdConfig::default()).unwrap();
        let x = array![[1.0, 0.0]];
        let y = array![1.0];
        let err = clf.partial_fit(x.view(), y.view(), None).unwrap_err();
        assert!(matches!(err, AsgdError::MissingStepSize));
    }

    #[test]
    fn test_partial_fit_shape_errors() {
        let mut clf = BinaryAsgd::<f64>::new(2, AsgdConfig::default().sgd_step_size0(0.1)).unwrap();
        let x = array![[1.0, 0.0, 3.0]];
        let y = array![1.0];
        assert!(matches!(
            clf.partial_fit(x.view(), y.view(), None).unwrap_err(),
            AsgdError::FeatureMismatch { .. }
        ));

        let x = array![[1.0, 0.0]];
        let y = array![1.0, -1.0];
        assert!(matches!(
            clf.partial_fit(x.view(), y.view(), None).unwrap_err(),
            AsgdError::ShapeMismatch { .. }
        ));
    }

    #[test]
    fn test_predict_sign_and_zero() {
        let clf = BinaryAsgd::<f64>::new(2, AsgdConfig::default()).unwrap();
        let x = array![[1.0, 2.0], [-3.0, 0.5]];
        assert_eq!(clf.predict(x.view()).unwrap(), array![0.0, 0.0]);

        let mut clf = BinaryAsgd::<f64>::new(2, fixed_step_config(1.0, 0.0)).unwrap();
        let train_x = array![[1.0, 0.0]];
        let train_y = array![1.0];
        clf.partial_fit(train_x.view(), train_y.view(), None).unwrap();
        // w = [1, 0], b = 1
        let x = array![[1.0, 5.0], [-3.0, 0.0], [-1.0, 0.0]];
        assert_eq!(clf.decision_function(x.view()).unwrap(), array![2.0, -2.0, 0.0]);
        assert_eq!(clf.predict(x.view()).unwrap(), array![1.0, -1.0, 0.0]);
    }

    #[test]
    fn test_decision_function_feature_mismatch() {
        let clf = BinaryAsgd::<f64>::new(2, AsgdConfig::default()).unwrap();
        let x = array![[1.0, 2.0, 3.0]];
        assert!(matches!(
            clf.decision_function(x.view()).unwrap_err(),
            AsgdError::FeatureMismatch {
                expected_features: 2,
                got_features: 3
            }
        ));
    }

    #[test]
    fn test_calibration_cost_of_fresh_model() {
        let clf = BinaryAsgd::<f64>::new(2, AsgdConfig::default()).unwrap();
        let x = array![[1.0, 2.0], [-3.0, 0.5]];
        let y = array![1.0, -1.0];
        assert_eq!(clf.calibration_cost(x.view(), y.view()).unwrap(), 1.0);
    }

    #[test]
    fn test_calibration_cost_blends_weights() {
        let mut clf = BinaryAsgd::<f64>::new(2, fixed_step_config(1.0, 0.0)).unwrap();
        let x = array![[1.0, 0.0], [0.0, 1.0]];
        let y = array![1.0, -1.0];
        clf.partial_fit(x.view(), y.view(), None).unwrap();
        // sgd: w = [1, -1], b = 0; asgd after two steps at rate 1: the same
        let cost = clf.calibration_cost(x.view(), y.view()).unwrap();
        // margins are 1 and 1, hinge is zero everywhere
        assert_abs_diff_eq!(cost, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut clf = BinaryAsgd::<f64>::new(2, AsgdConfig::default().sgd_step_size0(0.3)).unwrap();
        let x = array![[1.0, 0.0], [0.0, 1.0]];
        let y = array![1.0, -1.0];
        clf.partial_fit(x.view(), y.view(), None).unwrap();
        clf.reset();

        assert_eq!(clf.sgd_weights(), &array![0.0, 0.0]);
        assert_eq!(clf.asgd_weights(), &array![0.0, 0.0]);
        assert_eq!(clf.sgd_bias(), 0.0);
        assert_eq!(clf.asgd_bias(), 0.0);
        assert_eq!(clf.n_observations(), 0);
        assert_eq!(clf.asgd_step_size(), 1.0);
        assert_eq!(clf.sgd_step_size(), Some(0.3));
        assert!(clf.train_means().is_empty());
    }

    #[test]
    fn test_reset_forgets_calibrated_step_size() {
        let mut clf = BinaryAsgd::<f64>::new(2, AsgdConfig::default()).unwrap();
        clf.set_sgd_step_size0(0.25);
        clf.reset();
        assert_eq!(clf.sgd_step_size0(), None);
        assert_eq!(clf.sgd_step_size(), None);
    }

    #[test]
    fn test_fit_calibrates_then_trains() {
        let x = array![[1.0, 1.0], [2.0, 1.5], [-1.0, -1.0], [-2.0, -1.0]];
        let y = array![1.0, 1.0, -1.0, -1.0];
        let mut clf = BinaryAsgd::<f64>::new(2, AsgdConfig::default()).unwrap();
        clf.fit(x.view(), y.view(), None).unwrap();

        assert!(clf.sgd_step_size0().is_some());
        assert!(clf.n_observations() >= 4);
        assert_eq!(clf.predict(x.view()).unwrap(), y);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let x = array![[0.5, 1.0], [1.5, 0.2], [-0.3, -1.0], [-2.0, 0.1], [0.1, 0.9]];
        let y = array![1.0, 1.0, -1.0, -1.0, 1.0];
        let config = AsgdConfig::default().random_seed(11);

        let mut a = BinaryAsgd::<f64>::new(2, config.clone()).unwrap();
        let mut b = BinaryAsgd::<f64>::new(2, config).unwrap();
        a.fit(x.view(), y.view(), None).unwrap();
        b.fit(x.view(), y.view(), None).unwrap();

        assert_eq!(a.asgd_weights(), b.asgd_weights());
        assert_eq!(a.asgd_bias(), b.asgd_bias());
        assert_eq!(a.train_means(), b.train_means());
    }

    #[test]
    fn test_fit_stops_at_epoch_budget() {
        let x = array![[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0]];
        let y = array![1.0, 1.0, -1.0];
        let config = AsgdConfig::default().sgd_step_size0(0.1).n_iterations(3);
        let mut clf = BinaryAsgd::<f64>::new(2, config).unwrap();
        clf.fit(x.view(), y.view(), None).unwrap();
        assert!(clf.train_means().len() <= 3);
        assert_eq!(clf.n_observations(), 3 * clf.train_means().len());
    }

    #[test]
    fn test_single_precision() {
        let mut clf = BinaryAsgd::<f32>::new(2, fixed_step_config(0.5, 0.0)).unwrap();
        let x = array![[2.0f32, 1.0]];
        let y = array![1.0f32];
        clf.partial_fit(x.view(), y.view(), None).unwrap();
        assert_eq!(clf.sgd_weights(), &array![1.0f32, 0.5]);
        assert_eq!(clf.sgd_bias(), 0.5f32);
    }
}
