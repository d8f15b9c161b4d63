//! ROC curve and ROC-AUC over paired (label, score) observations.

use crate::error::{MeterError, Result};
use serde::{Deserialize, Serialize};

/// Points of a ROC curve, ordered by decreasing threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    /// Score threshold of each point. The first point is `+inf` (nothing predicted positive).
    pub thresholds: Vec<f64>,
}

impl RocCurve {
    pub fn len(&self) -> usize {
        self.fpr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fpr.is_empty()
    }

    /// `(fpr, tpr)` pairs in curve order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.fpr.iter().copied().zip(self.tpr.iter().copied())
    }

    /// Area under this curve.
    pub fn area(&self) -> Result<f64> {
        auc(&self.fpr, &self.tpr)
    }
}

fn check_inputs(labels: &[u8], scores: &[f64]) -> Result<()> {
    if labels.len() != scores.len() {
        return Err(MeterError::LengthMismatch {
            targets: labels.len(),
            outputs: scores.len(),
        });
    }
    if labels.is_empty() {
        return Err(MeterError::Empty);
    }
    if let Some(&bad) = labels.iter().find(|&&l| l > 1) {
        return Err(MeterError::InvalidLabel(bad));
    }
    if let Some(idx) = scores.iter().position(|s| !s.is_finite()) {
        return Err(MeterError::NonFiniteScore(idx));
    }
    let positives = labels.iter().filter(|&&l| l == 1).count();
    if positives == 0 || positives == labels.len() {
        return Err(MeterError::SingleClass);
    }
    Ok(())
}

/// Cumulative (false positive, true positive) counts at each distinct score, descending.
fn binary_clf_curve(labels: &[u8], scores: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    // Stable sort keeps tie groups contiguous; scores were checked finite.
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut fps = Vec::new();
    let mut tps = Vec::new();
    let mut thresholds = Vec::new();
    let mut tp = 0.0;
    let mut fp = 0.0;

    for (pos, &idx) in order.iter().enumerate() {
        if labels[idx] == 1 {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        let last_of_group = order
            .get(pos + 1)
            .is_none_or(|&next| scores[next] != scores[idx]);
        if last_of_group {
            fps.push(fp);
            tps.push(tp);
            thresholds.push(scores[idx]);
        }
    }

    (fps, tps, thresholds)
}

/// Compute the ROC curve.
///
/// Intermediate points lying on a straight segment between their neighbours are
/// dropped; the area is unaffected.
pub fn roc_curve(labels: &[u8], scores: &[f64]) -> Result<RocCurve> {
    check_inputs(labels, scores)?;
    let (fps, tps, thresholds) = binary_clf_curve(labels, scores);

    let keep: Vec<usize> = if fps.len() > 2 {
        (0..fps.len())
            .filter(|&i| {
                if i == 0 || i == fps.len() - 1 {
                    return true;
                }
                let d2_fp = fps[i + 1] - 2.0 * fps[i] + fps[i - 1];
                let d2_tp = tps[i + 1] - 2.0 * tps[i] + tps[i - 1];
                d2_fp != 0.0 || d2_tp != 0.0
            })
            .collect()
    } else {
        (0..fps.len()).collect()
    };

    let total_fp = fps[fps.len() - 1];
    let total_tp = tps[tps.len() - 1];

    let mut curve = RocCurve {
        fpr: Vec::with_capacity(keep.len() + 1),
        tpr: Vec::with_capacity(keep.len() + 1),
        thresholds: Vec::with_capacity(keep.len() + 1),
    };
    curve.fpr.push(0.0);
    curve.tpr.push(0.0);
    curve.thresholds.push(f64::INFINITY);
    for i in keep {
        curve.fpr.push(fps[i] / total_fp);
        curve.tpr.push(tps[i] / total_tp);
        curve.thresholds.push(thresholds[i]);
    }

    Ok(curve)
}

/// Area under the ROC curve of the given observations.
pub fn roc_auc_score(labels: &[u8], scores: &[f64]) -> Result<f64> {
    roc_curve(labels, scores)?.area()
}

/// Trapezoidal area under a curve whose `x` is monotone (either direction).
pub fn auc(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        return Err(MeterError::LengthMismatch {
            targets: x.len(),
            outputs: y.len(),
        });
    }
    if x.len() < 2 {
        return Err(MeterError::Empty);
    }

    let increasing = x.windows(2).all(|w| w[1] >= w[0]);
    let decreasing = x.windows(2).all(|w| w[1] <= w[0]);
    if !increasing && !decreasing {
        return Err(MeterError::invalid_input(
            "x must be monotonic to compute an area",
        ));
    }

    let area: f64 = x
        .windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum();

    Ok(if increasing { area } else { -area })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_separation() {
        let labels = [0, 0, 1, 1];
        let scores = [0.1, 0.2, 0.8, 0.9];
        assert_eq!(roc_auc_score(&labels, &scores).unwrap(), 1.0);
    }

    #[test]
    fn test_inverted_separation() {
        let labels = [1, 1, 0, 0];
        let scores = [0.1, 0.2, 0.8, 0.9];
        assert_eq!(roc_auc_score(&labels, &scores).unwrap(), 0.0);
    }

    #[test]
    fn test_known_auc() {
        // Classic example: 3 of 4 positive/negative pairs ordered correctly.
        let labels = [0, 0, 1, 1];
        let scores = [0.1, 0.4, 0.35, 0.8];
        let auc = roc_auc_score(&labels, &scores).unwrap();
        assert!((auc - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_known_curve() {
        let labels = [0, 0, 1, 1];
        let scores = [0.1, 0.4, 0.35, 0.8];
        let curve = roc_curve(&labels, &scores).unwrap();
        assert_eq!(curve.fpr, vec![0.0, 0.0, 0.5, 0.5, 1.0]);
        assert_eq!(curve.tpr, vec![0.0, 0.5, 0.5, 1.0, 1.0]);
        assert_eq!(curve.thresholds[0], f64::INFINITY);
        assert_eq!(&curve.thresholds[1..], &[0.8, 0.4, 0.35, 0.1]);
    }

    #[test]
    fn test_ties_get_half_credit() {
        let labels = [0, 1];
        let scores = [0.5, 0.5];
        assert_eq!(roc_auc_score(&labels, &scores).unwrap(), 0.5);
    }

    #[test]
    fn test_collinear_points_dropped() {
        let labels = [1, 1, 1, 0];
        let scores = [0.9, 0.8, 0.7, 0.1];
        let curve = roc_curve(&labels, &scores).unwrap();
        // 0.8 lies between 0.9 and 0.7 on the tpr axis at fpr = 0.
        assert_eq!(curve.fpr, vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(curve.tpr, vec![0.0, 1.0 / 3.0, 1.0, 1.0]);
    }

    #[test]
    fn test_single_class_rejected() {
        assert!(matches!(
            roc_auc_score(&[1, 1, 1], &[0.2, 0.5, 0.9]),
            Err(MeterError::SingleClass)
        ));
    }

    #[test]
    fn test_bad_inputs() {
        assert!(matches!(
            roc_curve(&[0, 1], &[0.1]),
            Err(MeterError::LengthMismatch { .. })
        ));
        assert!(matches!(roc_curve(&[], &[]), Err(MeterError::Empty)));
        assert!(matches!(
            roc_curve(&[0, 2], &[0.1, 0.2]),
            Err(MeterError::InvalidLabel(2))
        ));
        assert!(matches!(
            roc_curve(&[0, 1], &[0.1, f64::NAN]),
            Err(MeterError::NonFiniteScore(1))
        ));
    }

    #[test]
    fn test_auc_decreasing_x() {
        let area = auc(&[1.0, 0.5, 0.0], &[1.0, 1.0, 1.0]).unwrap();
        assert!((area - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_auc_non_monotonic() {
        assert!(auc(&[0.0, 1.0, 0.5], &[0.0, 1.0, 1.0]).is_err());
    }
}
