//! Batch contracts and the shuffling source used between epochs.
//!
//! # Core Concepts
//!
//! - **Batch**: a feature matrix `X` of shape `(n_samples, n_features)`, a label
//!   vector of length `n_samples` and an optional vector of per-example margin
//!   biases of the same length.
//! - **Permutation source**: anything that can hand out a uniform random
//!   permutation of `0..n`. [`SeededPermutation`] is the deterministic default;
//!   tests and callers may inject their own.

use crate::error::{AsgdError, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Source of uniform random permutations of example indices.
pub trait PermutationSource {
    /// Returns a permutation of `0..n`.
    fn permutation(&mut self, n: usize) -> Vec<usize>;
}

impl<P: PermutationSource + ?Sized> PermutationSource for &mut P {
    fn permutation(&mut self, n: usize) -> Vec<usize> {
        (**self).permutation(n)
    }
}

/// Seeded Fisher-Yates shuffler on top of xoshiro256++.
///
/// Two sources built from the same seed produce the same sequence of
/// permutations; cloning one snapshots its position in that sequence.
///
/// # Example
/// ```
/// use asgd::dataset::{PermutationSource, SeededPermutation};
///
/// let mut a = SeededPermutation::new(42);
/// let mut b = SeededPermutation::new(42);
/// assert_eq!(a.permutation(10), b.permutation(10));
/// ```
#[derive(Debug, Clone)]
pub struct SeededPermutation {
    rng: Xoshiro256PlusPlus,
}

impl SeededPermutation {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }
}

impl PermutationSource for SeededPermutation {
    fn permutation(&mut self, n: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut self.rng);
        indices
    }
}

/// Checks that `x` has `n_features` columns.
pub fn check_features<F>(x: &ArrayView2<'_, F>, n_features: usize) -> Result<()> {
    if x.ncols() != n_features {
        return Err(AsgdError::FeatureMismatch {
            expected_features: n_features,
            got_features: x.ncols(),
        });
    }
    Ok(())
}

/// Checks the shape contract of a training batch.
pub fn check_batch<F, L>(
    x: &ArrayView2<'_, F>,
    y: &ArrayView1<'_, L>,
    margin_biases: Option<&ArrayView1<'_, F>>,
    n_features: usize,
) -> Result<()> {
    check_features(x, n_features)?;
    let n_samples = x.nrows();
    if n_samples == 0 {
        return Err(AsgdError::EmptyData(
            "training batch has no examples".to_string(),
        ));
    }
    if y.len() != n_samples {
        return Err(AsgdError::ShapeMismatch {
            expected: format!("{} labels", n_samples),
            got: format!("{} labels", y.len()),
        });
    }
    if let Some(biases) = margin_biases {
        if biases.len() != n_samples {
            return Err(AsgdError::ShapeMismatch {
                expected: format!("{} margin biases", n_samples),
                got: format!("{} margin biases", biases.len()),
            });
        }
    }
    Ok(())
}

/// Rows of a batch gathered in the order of `indices`.
#[derive(Debug, Clone)]
pub struct ReorderedBatch<F, L> {
    pub x: Array2<F>,
    pub y: Array1<L>,
    pub margin_biases: Array1<F>,
}

/// Applies one permutation to features, labels and margin biases alike.
pub fn reorder<F: Clone, L: Clone>(
    x: &ArrayView2<'_, F>,
    y: &ArrayView1<'_, L>,
    margin_biases: &ArrayView1<'_, F>,
    indices: &[usize],
) -> ReorderedBatch<F, L> {
    ReorderedBatch {
        x: x.select(Axis(0), indices),
        y: y.select(Axis(0), indices),
        margin_biases: margin_biases.select(Axis(0), indices),
    }
}
