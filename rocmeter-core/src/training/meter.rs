//! Per-phase, per-epoch confusion-matrix meter with derived binary metrics.

use crate::config::PlotConfig;
use crate::error::{MeterError, Result};
use crate::training::plot::plot_roc;
use crate::training::roc::roc_auc_score;
use crate::training::tracking::Tracker;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Dataset split a meter accumulates over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Train,
    Val,
    Other(String),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Train => f.write_str("train"),
            Phase::Val => f.write_str("val"),
            Phase::Other(name) => f.write_str(name),
        }
    }
}

impl FromStr for Phase {
    type Err = MeterError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(MeterError::invalid_input("phase name is empty"));
        }
        Ok(match trimmed.to_ascii_lowercase().as_str() {
            "train" | "training" => Phase::Train,
            "val" | "valid" | "validation" => Phase::Val,
            _ => Phase::Other(trimmed.to_string()),
        })
    }
}

/// 2x2 confusion matrix. Rows are the actual class, columns the predicted class, class 0 first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tn: u64,
    pub fp: u64,
    pub fn_: u64,
    pub tp: u64,
}

impl ConfusionMatrix {
    pub fn add(&mut self, actual: bool, predicted: bool) {
        match (actual, predicted) {
            (false, false) => self.tn += 1,
            (false, true) => self.fp += 1,
            (true, false) => self.fn_ += 1,
            (true, true) => self.tp += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.tn + self.fp + self.fn_ + self.tp
    }

    pub fn counts(&self) -> [[u64; 2]; 2] {
        [[self.tn, self.fp], [self.fn_, self.tp]]
    }

    /// Each row divided by its sum. Rows with no observations stay zero.
    pub fn normalized(&self) -> [[f64; 2]; 2] {
        let row = |a: u64, b: u64| {
            let sum = (a + b) as f64;
            if sum == 0.0 {
                [0.0, 0.0]
            } else {
                [a as f64 / sum, b as f64 / sum]
            }
        };
        [row(self.tn, self.fp), row(self.fn_, self.tp)]
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Print formatted confusion matrix
    pub fn display(&self) -> String {
        format!(
            "Predicted:    0       1\n\
             Actual 0:   {:>5}   {:>5}  (TN/FP)\n\
             Actual 1:   {:>5}   {:>5}  (FN/TP)",
            self.tn, self.fp, self.fn_, self.tp
        )
    }
}

/// Binary metrics derived at the end of a phase.
///
/// A rate whose denominator is zero is `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub tpr: f64,
    pub fpr: f64,
    pub tnr: f64,
    pub fnr: f64,
    pub roc_auc: f64,
}

fn ratio(num: u64, denom: u64) -> f64 {
    if denom == 0 {
        f64::NAN
    } else {
        num as f64 / denom as f64
    }
}

/// Running accumulator for one phase of one epoch.
#[derive(Debug, Clone)]
pub struct Meter {
    phase: Phase,
    epoch: usize,
    save_folder: PathBuf,
    threshold: f64,
    normalized: bool,
    targets: Vec<u8>,
    predictions: Vec<f64>,
    confusion: ConfusionMatrix,
}

impl Meter {
    pub fn new(phase: Phase, epoch: usize, save_folder: impl Into<PathBuf>) -> Self {
        Self {
            phase,
            epoch,
            save_folder: save_folder.into(),
            threshold: 0.5,
            normalized: false,
            targets: Vec::new(),
            predictions: Vec::new(),
            confusion: ConfusionMatrix::default(),
        }
    }

    /// Scores strictly above `threshold` count as positive predictions.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn save_folder(&self) -> &Path {
        &self.save_folder
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn targets(&self) -> &[u8] {
        &self.targets
    }

    pub fn predictions(&self) -> &[f64] {
        &self.predictions
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Record a batch of labels and raw scores.
    ///
    /// The whole batch is validated before anything is recorded.
    pub fn update(&mut self, targets: &[u8], outputs: &[f64]) -> Result<()> {
        if targets.len() != outputs.len() {
            return Err(MeterError::LengthMismatch {
                targets: targets.len(),
                outputs: outputs.len(),
            });
        }
        if let Some(&bad) = targets.iter().find(|&&t| t > 1) {
            return Err(MeterError::InvalidLabel(bad));
        }
        if let Some(idx) = outputs.iter().position(|o| !o.is_finite()) {
            return Err(MeterError::NonFiniteScore(self.predictions.len() + idx));
        }

        for (&target, &output) in targets.iter().zip(outputs) {
            self.confusion.add(target == 1, output > self.threshold);
        }
        self.targets.extend_from_slice(targets);
        self.predictions.extend_from_slice(outputs);
        Ok(())
    }

    /// Raw confusion counts.
    pub fn value(&self) -> &ConfusionMatrix {
        &self.confusion
    }

    /// Row-normalized matrix when this meter was built normalized, `None` otherwise.
    pub fn normalized_value(&self) -> Option<[[f64; 2]; 2]> {
        self.normalized.then(|| self.confusion.normalized())
    }

    /// Derive the epoch metrics without touching the filesystem.
    pub fn metrics(&self) -> Result<EpochMetrics> {
        if self.is_empty() {
            return Err(MeterError::Empty);
        }
        let ConfusionMatrix { tn, fp, fn_, tp } = self.confusion;
        let roc_auc = roc_auc_score(&self.targets, &self.predictions)?;

        Ok(EpochMetrics {
            accuracy: ratio(tp + tn, self.confusion.total()),
            precision: ratio(tp, tp + fp),
            tpr: ratio(tp, fn_ + tp),
            fpr: ratio(fp, tn + fp),
            tnr: ratio(tn, tn + fp),
            fnr: ratio(fn_, tp + fn_),
            roc_auc,
        })
    }

    /// Derive the epoch metrics, write the ROC plot and log it to the tracker.
    pub fn get_metrics(
        &self,
        plot: &PlotConfig,
        tracker: &mut dyn Tracker,
    ) -> Result<EpochMetrics> {
        let metrics = self.metrics()?;

        if plot.enabled {
            let rendered = plot_roc(
                metrics.roc_auc,
                &self.targets,
                &self.predictions,
                &self.phase,
                self.epoch,
                &self.save_folder,
                plot,
            )?;
            tracker.log_image(&rendered.name, &rendered.path, self.epoch)?;
        }

        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::tracking::NullTracker;
    use tempfile::TempDir;

    fn filled_meter() -> Meter {
        let mut meter = Meter::new(Phase::Val, 3, "unused");
        // TN, FP, FN, TP, TP, TN
        meter
            .update(&[0, 0, 1, 1, 1, 0], &[0.1, 0.7, 0.4, 0.9, 0.6, 0.5])
            .unwrap();
        meter
    }

    #[test]
    fn test_threshold_is_strict() {
        let meter = filled_meter();
        // 0.5 is not above the 0.5 threshold.
        assert_eq!(
            meter.value(),
            &ConfusionMatrix {
                tn: 2,
                fp: 1,
                fn_: 1,
                tp: 2
            }
        );
    }

    #[test]
    fn test_metrics() {
        let m = filled_meter().metrics().unwrap();
        assert!((m.accuracy - 4.0 / 6.0).abs() < 1e-12);
        assert!((m.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.tpr - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.fpr - 1.0 / 3.0).abs() < 1e-12);
        assert!((m.tnr - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.fnr - 1.0 / 3.0).abs() < 1e-12);
        // Positives 0.4, 0.9, 0.6 vs negatives 0.1, 0.7, 0.5: 6 of 9 pairs ordered.
        assert!((m.roc_auc - 6.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_denominator_is_nan() {
        let mut meter = Meter::new(Phase::Train, 0, "unused");
        meter.update(&[0, 1], &[0.1, 0.2]).unwrap();
        let m = meter.metrics().unwrap();
        assert!(m.precision.is_nan());
        assert_eq!(m.tpr, 0.0);
        assert_eq!(m.roc_auc, 1.0);
    }

    #[test]
    fn test_rejected_batch_keeps_lists_parallel() {
        let mut meter = filled_meter();
        assert!(matches!(
            meter.update(&[0, 1], &[0.3]),
            Err(MeterError::LengthMismatch { .. })
        ));
        assert!(matches!(
            meter.update(&[0, 3], &[0.3, 0.2]),
            Err(MeterError::InvalidLabel(3))
        ));
        assert!(matches!(
            meter.update(&[0, 1], &[0.3, f64::INFINITY]),
            Err(MeterError::NonFiniteScore(7))
        ));
        assert_eq!(meter.targets().len(), 6);
        assert_eq!(meter.predictions().len(), 6);
        assert_eq!(meter.value().total(), 6);
    }

    #[test]
    fn test_empty_and_single_class() {
        let meter = Meter::new(Phase::Train, 0, "unused");
        assert!(matches!(meter.metrics(), Err(MeterError::Empty)));

        let mut meter = Meter::new(Phase::Train, 0, "unused");
        meter.update(&[1, 1], &[0.9, 0.8]).unwrap();
        assert!(matches!(meter.metrics(), Err(MeterError::SingleClass)));
    }

    #[test]
    fn test_custom_threshold() {
        let mut meter = Meter::new(Phase::Train, 0, "unused").with_threshold(0.8);
        meter.update(&[1, 1, 0], &[0.9, 0.7, 0.85]).unwrap();
        assert_eq!(meter.value().counts(), [[0, 1], [1, 1]]);
    }

    #[test]
    fn test_normalized_value() {
        let meter = filled_meter();
        assert!(meter.normalized_value().is_none());

        let mut meter = Meter::new(Phase::Val, 0, "unused").normalized(true);
        meter.update(&[0, 0, 0, 0], &[0.1, 0.2, 0.3, 0.9]).unwrap();
        assert_eq!(
            meter.normalized_value(),
            Some([[0.75, 0.25], [0.0, 0.0]])
        );
    }

    #[test]
    fn test_get_metrics_without_plot() {
        let dir = TempDir::new().unwrap();
        let mut meter = Meter::new(Phase::Train, 1, dir.path());
        meter.update(&[0, 1, 0, 1], &[0.2, 0.8, 0.3, 0.6]).unwrap();
        let plot = PlotConfig {
            enabled: false,
            ..PlotConfig::default()
        };
        let m = meter.get_metrics(&plot, &mut NullTracker).unwrap();
        assert_eq!(m.roc_auc, 1.0);
        assert!(!dir.path().join("ROC_plots").exists());
    }

    #[test]
    fn test_phase_parse_and_display() {
        assert_eq!("train".parse::<Phase>().unwrap(), Phase::Train);
        assert_eq!("Validation".parse::<Phase>().unwrap(), Phase::Val);
        assert_eq!(
            "test".parse::<Phase>().unwrap(),
            Phase::Other("test".to_string())
        );
        assert!("  ".parse::<Phase>().is_err());
        assert_eq!(Phase::Val.to_string(), "val");
    }

    #[test]
    fn test_confusion_display() {
        let text = filled_meter().value().display();
        assert!(text.contains("(TN/FP)"));
        assert!(text.contains("(FN/TP)"));
    }
}
