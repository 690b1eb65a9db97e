//! Hinge loss and the L2-regularized empirical risk built on it.
//!
//! Margins here are always *signed* margins `label * (w·x + b)`, so a correct
//! prediction with room to spare has a margin of at least 1.

use crate::backend::ScalarOps;
use ndarray::{ArrayBase, Data, Dimension};

/// Hinge loss `max(0, 1 - margin)`, with a per-example shift of the threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hinge;

impl Hinge {
    /// `max(0, 1 - margin)`.
    pub fn loss<F: ScalarOps>(&self, margin: F) -> F {
        (F::one() - margin).max(F::zero())
    }

    /// Whether an example with this margin receives a subgradient step.
    ///
    /// A positive `margin_bias` lowers the threshold (the example is satisfied
    /// earlier), a negative one demands a wider margin.
    pub fn is_violated<F: ScalarOps>(&self, margin: F, margin_bias: F) -> bool {
        margin < F::one() - margin_bias
    }
}

/// Sum of squares of every entry of a weight vector or matrix.
pub fn squared_norm<F, S, D>(weights: &ArrayBase<S, D>) -> F
where
    F: ScalarOps,
    S: Data<Elem = F>,
    D: Dimension,
{
    weights.fold(F::zero(), |acc, &w| acc + w * w)
}

/// Mean of recorded per-example costs plus `l2_regularization * squared_norm`.
///
/// An empty cost slice contributes nothing to the mean.
pub fn regularized_risk<F: ScalarOps>(costs: &[F], squared_norm: F, l2_regularization: F) -> F {
    let mean = if costs.is_empty() {
        F::zero()
    } else {
        costs.iter().fold(F::zero(), |acc, &c| acc + c) / F::from_usize(costs.len())
    };
    mean + l2_regularization * squared_norm
}
