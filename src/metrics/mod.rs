//! Scoring helpers for classifier outputs.
//!
//! The precision/recall curve here is computed from *hard* predictions: the
//! examples whose true label is the class of interest are ranked first, and
//! precision and recall are accumulated along that ranking. Recall is
//! normalized by the number of examples *predicted* as the class.

use crate::backend::ScalarOps;
use crate::error::{AsgdError, Result};
use ndarray::ArrayView1;

/// Number of recall thresholds (0.0, 0.1, ..., 1.0) of [`ap_from_prec_and_rec`].
pub const AP_RECALL_THRESHOLDS: usize = 11;

fn check_pair<A, B>(actual: &ArrayView1<'_, A>, predicted: &ArrayView1<'_, B>) -> Result<()> {
    if actual.len() != predicted.len() {
        return Err(AsgdError::ShapeMismatch {
            expected: format!("{} predictions", actual.len()),
            got: format!("{} predictions", predicted.len()),
        });
    }
    if actual.is_empty() {
        return Err(AsgdError::EmptyData("no predictions to score".to_string()));
    }
    Ok(())
}

/// Fraction of predictions equal to the actual label, in `[0, 1]`.
pub fn accuracy<L: PartialEq>(
    actual: ArrayView1<'_, L>,
    predicted: ArrayView1<'_, L>,
) -> Result<f64> {
    check_pair(&actual, &predicted)?;
    let correct = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(a, p)| a == p)
        .count();
    Ok(correct as f64 / actual.len() as f64)
}

/// Precision and recall curves for class `class`.
///
/// When nothing is predicted as `class` the recall curve is all zeros.
pub fn precision_and_recall<L: PartialEq>(
    actual: ArrayView1<'_, L>,
    predicted: ArrayView1<'_, L>,
    class: &L,
) -> Result<(Vec<f64>, Vec<f64>)> {
    check_pair(&actual, &predicted)?;

    // stable: positives first, each group in input order
    let (positives, negatives): (Vec<usize>, Vec<usize>) =
        (0..actual.len()).partition(|&i| actual[i] == *class);
    let n_predicted = predicted.iter().filter(|p| *p == class).count();

    let mut precision = Vec::with_capacity(actual.len());
    let mut recall = Vec::with_capacity(actual.len());
    let mut tp = 0usize;
    let mut fp = 0usize;
    for i in positives.into_iter().chain(negatives) {
        if predicted[i] == *class {
            tp += 1;
        } else {
            fp += 1;
        }
        precision.push(tp as f64 / (tp + fp) as f64);
        recall.push(if n_predicted == 0 {
            0.0
        } else {
            tp as f64 / n_predicted as f64
        });
    }
    Ok((precision, recall))
}

/// 11-point interpolated average precision.
///
/// For each recall threshold `t` in `0.0, 0.1, ..., 1.0`, takes the best
/// precision among points with recall at least `t` (0 if there are none).
pub fn ap_from_prec_and_rec(precision: &[f64], recall: &[f64]) -> f64 {
    (0..AP_RECALL_THRESHOLDS)
        .map(|k| {
            let threshold = k as f64 * 0.1;
            precision
                .iter()
                .zip(recall)
                .filter(|(_, r)| **r >= threshold)
                .map(|(&p, _)| p)
                .fold(0.0, f64::max)
        })
        .sum::<f64>()
        / AP_RECALL_THRESHOLDS as f64
}

/// Trapezoidal area under the precision/recall curve.
pub fn auc_from_prec_and_rec(precision: &[f64], recall: &[f64]) -> f64 {
    let n = precision.len().min(recall.len());
    (1..n)
        .map(|i| (recall[i] - recall[i - 1]) * (precision[i] + precision[i - 1]))
        .sum::<f64>()
        / 2.0
}

/// Binary problems are scored on their second label only.
fn scored_labels<L>(labels: &[L]) -> &[L] {
    if labels.len() == 2 {
        &labels[1..]
    } else {
        labels
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn per_label<L, S>(
    actual: ArrayView1<'_, L>,
    predicted: ArrayView1<'_, L>,
    labels: &[L],
    score: S,
) -> Result<Vec<f64>>
where
    L: PartialEq,
    S: Fn(&[f64], &[f64]) -> f64,
{
    scored_labels(labels)
        .iter()
        .map(|label| -> Result<f64> {
            let (precision, recall) = precision_and_recall(actual, predicted, label)?;
            Ok(score(&precision, &recall))
        })
        .collect()
}

/// Mean 11-point average precision over `labels`.
pub fn average_precision<L: PartialEq>(
    actual: ArrayView1<'_, L>,
    predicted: ArrayView1<'_, L>,
    labels: &[L],
) -> Result<f64> {
    Ok(mean(&per_label(
        actual,
        predicted,
        labels,
        ap_from_prec_and_rec,
    )?))
}

/// Mean area under the precision/recall curve over `labels`.
pub fn area_under_curve<L: PartialEq>(
    actual: ArrayView1<'_, L>,
    predicted: ArrayView1<'_, L>,
    labels: &[L],
) -> Result<f64> {
    Ok(mean(&per_label(
        actual,
        predicted,
        labels,
        auc_from_prec_and_rec,
    )?))
}

/// Summary returned by [`multiclass_stats`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MulticlassStats {
    /// Accuracy in percent.
    pub accuracy: f64,
    pub average_precision: f64,
    pub area_under_curve: f64,
}

/// Accuracy (percent), mean AP and mean AUC in one call.
pub fn multiclass_stats<L: PartialEq>(
    actual: ArrayView1<'_, L>,
    predicted: ArrayView1<'_, L>,
    labels: &[L],
) -> Result<MulticlassStats> {
    Ok(MulticlassStats {
        accuracy: 100.0 * accuracy(actual, predicted)?,
        average_precision: average_precision(actual, predicted, labels)?,
        area_under_curve: area_under_curve(actual, predicted, labels)?,
    })
}

/// Coefficient of determination `1 - |actual - predicted|^2 / |actual - mean|^2`.
///
/// # Errors
/// [`AsgdError::InvalidParameter`] when `actual` is constant.
pub fn r_squared<F: ScalarOps>(actual: ArrayView1<'_, F>, predicted: ArrayView1<'_, F>) -> Result<F> {
    check_pair(&actual, &predicted)?;
    let mean = actual.sum() / F::from_usize(actual.len());
    let (residual, total) = actual.iter().zip(predicted.iter()).fold(
        (F::zero(), F::zero()),
        |(residual, total), (&a, &p)| {
            (residual + (a - p) * (a - p), total + (a - mean) * (a - mean))
        },
    );
    if total == F::zero() {
        return Err(AsgdError::InvalidParameter(
            "r_squared is undefined for constant targets".to_string(),
        ));
    }
    Ok(F::one() - residual / total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_accuracy() {
        let actual = array![1, 0, 2, 2];
        let predicted = array![1, 1, 2, 0];
        assert_eq!(accuracy(actual.view(), predicted.view()).unwrap(), 0.5);
    }

    #[test]
    fn test_accuracy_errors() {
        let actual = array![1.0, -1.0];
        let predicted = array![1.0];
        assert!(matches!(
            accuracy(actual.view(), predicted.view()),
            Err(AsgdError::ShapeMismatch { .. })
        ));
        let empty = ndarray::Array1::<f64>::zeros(0);
        assert!(matches!(
            accuracy(empty.view(), empty.view()),
            Err(AsgdError::EmptyData(_))
        ));
    }

    #[test]
    fn test_precision_and_recall_curve() {
        let actual = array![1, 0, 1, 0];
        let predicted = array![1, 1, 0, 0];
        let (prec, rec) = precision_and_recall(actual.view(), predicted.view(), &1).unwrap();
        // ranking: indices 0, 2 (positives), then 1, 3
        assert_eq!(prec, vec![1.0, 0.5, 2.0 / 3.0, 0.5]);
        assert_eq!(rec, vec![0.5, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_precision_and_recall_nothing_predicted() {
        let actual = array![1, 0];
        let predicted = array![0, 0];
        let (prec, rec) = precision_and_recall(actual.view(), predicted.view(), &1).unwrap();
        assert_eq!(prec, vec![0.0, 0.0]);
        assert_eq!(rec, vec![0.0, 0.0]);
    }

    #[test]
    fn test_ap_perfect_and_empty() {
        assert_abs_diff_eq!(ap_from_prec_and_rec(&[1.0, 1.0], &[0.5, 1.0]), 1.0, epsilon = 1e-12);
        assert_eq!(ap_from_prec_and_rec(&[], &[]), 0.0);
    }

    #[test]
    fn test_ap_interpolation() {
        // recall reaches 0.5 with precision 1, full recall only at precision 0.5
        let ap = ap_from_prec_and_rec(&[1.0, 0.5], &[0.5, 1.0]);
        // thresholds 0.0..=0.5 -> 1.0 (6 points), 0.6..=1.0 -> 0.5 (5 points)
        assert_abs_diff_eq!(ap, (6.0 + 2.5) / 11.0, epsilon = 1e-12);
    }

    #[test]
    fn test_auc_trapezoid() {
        let auc = auc_from_prec_and_rec(&[1.0, 0.5, 2.0 / 3.0, 0.5], &[0.5, 0.5, 1.0, 1.0]);
        assert_abs_diff_eq!(auc, 0.5 * (0.5 + 2.0 / 3.0) / 2.0, epsilon = 1e-12);
        assert_eq!(auc_from_prec_and_rec(&[1.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_binary_labels_score_second_only() {
        let actual = array![-1, 1, 1, -1];
        let predicted = array![-1, 1, 1, -1];
        let ap = average_precision(actual.view(), predicted.view(), &[-1, 1]).unwrap();
        let (prec, rec) = precision_and_recall(actual.view(), predicted.view(), &1).unwrap();
        assert_eq!(ap, ap_from_prec_and_rec(&prec, &rec));
    }

    #[test]
    fn test_multiclass_stats() {
        let actual = array![0, 1, 2, 1];
        let predicted = array![0, 1, 2, 1];
        let stats = multiclass_stats(actual.view(), predicted.view(), &[0, 1, 2]).unwrap();
        assert_eq!(stats.accuracy, 100.0);
        assert_abs_diff_eq!(stats.average_precision, 1.0, epsilon = 1e-12);
        assert!(stats.area_under_curve >= 0.0);
    }

    #[test]
    fn test_r_squared() {
        let actual = array![1.0, 2.0, 3.0];
        assert_eq!(r_squared(actual.view(), actual.view()).unwrap(), 1.0);
        let predicted = array![2.0, 2.0, 2.0];
        assert_abs_diff_eq!(
            r_squared(actual.view(), predicted.view()).unwrap(),
            0.0,
            epsilon = 1e-12
        );
        let constant = array![2.0, 2.0];
        assert!(r_squared(constant.view(), constant.view()).is_err());
    }
}
