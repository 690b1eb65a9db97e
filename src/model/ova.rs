//! One-vs-all multiclass classifier: one hinge classifier per class column.

use super::OnlineClassifier;
use crate::backend::ScalarOps;
use crate::config::AsgdConfig;
use crate::dataset::{check_batch, check_features, SeededPermutation};
use crate::error::{AsgdError, Result};
use crate::loss::{regularized_risk, squared_norm, Hinge};
use crate::optimizer::{StepSizeSchedule, StepSizeState};
use crate::trainer::EpochDriver;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Averaged-SGD one-vs-all classifier over `n_classes` classes.
///
/// Weights are stored as an `(n_features, n_classes)` matrix, so that
/// `X · W + b` yields one score per class. Every example updates each class
/// column as a binary problem where the true class is `+1` and all others
/// are `-1`.
#[derive(Debug, Clone)]
pub struct OvaAsgd<F: ScalarOps = f64> {
    n_classes: usize,
    n_features: usize,
    config: AsgdConfig,
    schedule: StepSizeSchedule<F>,
    steps: StepSizeState<F>,
    sgd_weights: Array2<F>,
    sgd_bias: Array1<F>,
    asgd_weights: Array2<F>,
    asgd_bias: Array1<F>,
    permutation: SeededPermutation,
}

impl<F: ScalarOps> OvaAsgd<F> {
    pub fn new(n_classes: usize, n_features: usize, config: AsgdConfig) -> Result<Self> {
        if n_classes < 2 {
            return Err(AsgdError::InvalidParameter(format!(
                "n_classes must be at least 2, got {}",
                n_classes
            )));
        }
        if n_features == 0 {
            return Err(AsgdError::InvalidParameter(
                "n_features must be positive".to_string(),
            ));
        }
        config.validate()?;

        Ok(Self {
            n_classes,
            n_features,
            schedule: StepSizeSchedule::from_config(&config),
            steps: StepSizeState::new(config.sgd_step_size0.map(F::from_f64)),
            sgd_weights: Array2::zeros((n_features, n_classes)),
            sgd_bias: Array1::zeros(n_classes),
            asgd_weights: Array2::zeros((n_features, n_classes)),
            asgd_bias: Array1::zeros(n_classes),
            permutation: SeededPermutation::new(config.random_seed),
            config,
        })
    }

    /// Calibrates the step size if needed, then runs `n_iterations` shuffled
    /// passes over the data.
    pub fn fit(
        &mut self,
        x: ArrayView2<'_, F>,
        y: ArrayView1<'_, usize>,
        margin_biases: Option<ArrayView1<'_, F>>,
    ) -> Result<&mut Self> {
        let mut permutation = self.permutation.clone();
        EpochDriver::new(&mut permutation).fit(self, x, y, margin_biases)?;
        self.permutation = permutation;
        Ok(self)
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn sgd_weights(&self) -> &Array2<F> {
        &self.sgd_weights
    }

    pub fn sgd_bias(&self) -> &Array1<F> {
        &self.sgd_bias
    }

    pub fn asgd_weights(&self) -> &Array2<F> {
        &self.asgd_weights
    }

    pub fn asgd_bias(&self) -> &Array1<F> {
        &self.asgd_bias
    }

    pub fn sgd_step_size(&self) -> Option<F> {
        self.steps.sgd_step_size()
    }

    pub fn asgd_step_size(&self) -> F {
        self.steps.asgd_step_size()
    }

    pub fn n_observations(&self) -> usize {
        self.steps.n_observations()
    }

    fn check_labels(&self, y: &ArrayView1<'_, usize>) -> Result<()> {
        match y.iter().find(|&&class| class >= self.n_classes) {
            Some(bad) => Err(AsgdError::InvalidLabel(format!(
                "class index {} is outside [0, {})",
                bad, self.n_classes
            ))),
            None => Ok(()),
        }
    }

    /// `+1` for the true class, `-1` for every other column.
    fn signed_label(class: usize, column: usize) -> F {
        if class == column {
            F::one()
        } else {
            -F::one()
        }
    }
}

impl<F: ScalarOps> OnlineClassifier<F> for OvaAsgd<F> {
    type Label = usize;
    type Decision = Array2<F>;
    type Prediction = Array1<usize>;

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
        y: ArrayView1<'_, usize>,
        margin_biases: Option<ArrayView1<'_, F>>,
    ) -> Result<&mut Self> {
        check_batch(&x, &y, margin_biases.as_ref(), self.n_features)?;
        self.check_labels(&y)?;
        let mut sgd_step_size = self.steps.current_sgd_step_size()?;

        let l2 = F::from_f64(self.config.l2_regularization);
        let hinge = Hinge;

        for (i, (obs, &class)) in x.outer_iter().zip(y.iter()).enumerate() {
            let margin_bias = margin_biases.as_ref().map_or_else(F::zero, |mb| mb[i]);
            let scores = obs.dot(&self.sgd_weights) + &self.sgd_bias;
            let violated: Vec<(usize, F)> = scores
                .iter()
                .enumerate()
                .filter_map(|(c, &score)| {
                    let label = Self::signed_label(class, c);
                    hinge
                        .is_violated(label * score, margin_bias)
                        .then_some((c, label))
                })
                .collect();

            if l2 > F::zero() {
                self.sgd_weights *= F::one() - l2 * sgd_step_size;
            }

            for (c, label) in violated {
                self.sgd_weights
                    .column_mut(c)
                    .scaled_add(sgd_step_size * label, &obs);
                self.sgd_bias[c] += sgd_step_size * label;
            }

            let asgd_step_size = self.steps.asgd_step_size();
            let keep = F::one() - asgd_step_size;
            self.asgd_weights *= keep;
            self.asgd_weights.scaled_add(asgd_step_size, &self.sgd_weights);
            self.asgd_bias *= keep;
            self.asgd_bias.scaled_add(asgd_step_size, &self.sgd_bias);

            self.steps.advance(&self.schedule)?;
            sgd_step_size = self.steps.current_sgd_step_size()?;
        }

        Ok(self)
    }

    /// Per example, the hinge losses of all class columns are summed.
    fn calibration_cost(&self, x: ArrayView2<'_, F>, y: ArrayView1<'_, usize>) -> Result<F> {
        check_batch(&x, &y, None, self.n_features)?;
        self.check_labels(&y)?;

        let half = F::from_f64(0.5);
        let weights = &self.asgd_weights * half + &self.sgd_weights * half;
        let bias = &self.asgd_bias * half + &self.sgd_bias * half;

        let hinge = Hinge;
        let scores = x.dot(&weights) + &bias;
        let costs: Vec<F> = scores
            .outer_iter()
            .zip(y.iter())
            .map(|(row, &class)| {
                row.iter().enumerate().fold(F::zero(), |acc, (c, &score)| {
                    acc + hinge.loss(Self::signed_label(class, c) * score)
                })
            })
            .collect();

        Ok(regularized_risk(
            &costs,
            squared_norm(&weights),
            F::from_f64(self.config.l2_regularization),
        ))
    }

    fn decision_function(&self, x: ArrayView2<'_, F>) -> Result<Array2<F>> {
        check_features(&x, self.n_features)?;
        Ok(x.dot(&self.asgd_weights) + &self.asgd_bias)
    }

    /// Index of the highest score per row; ties go to the lowest class index.
    fn predict(&self, x: ArrayView2<'_, F>) -> Result<Array1<usize>> {
        let decision = self.decision_function(x)?;
        Ok(decision
            .outer_iter()
            .map(|row| {
                let mut best = 0;
                for (c, &score) in row.iter().enumerate().skip(1) {
                    if score > row[best] {
                        best = c;
                    }
                }
                best
            })
            .collect())
    }

    fn reset(&mut self) {
        self.steps
            .reset(self.config.sgd_step_size0.map(F::from_f64));
        self.sgd_weights.fill(F::zero());
        self.sgd_bias.fill(F::zero());
        self.asgd_weights.fill(F::zero());
        self.asgd_bias.fill(F::zero());
    }
}
