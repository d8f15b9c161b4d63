//! Elapsed-time formatting and the per-iteration / per-epoch log lines.

use crate::config::PlotConfig;
use crate::error::Result;
use crate::training::meter::{EpochMetrics, Meter, Phase};
use crate::training::tracking::Tracker;
use std::time::{Duration, Instant};

/// `MM:SS`. Minutes keep counting past 59.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Log `"<label>: MM:SS"` for the time since `start`.
pub fn print_time(start: Instant, label: &str) -> String {
    let line = format!("{label}: {}", format_elapsed(start.elapsed()));
    tracing::info!("{line}");
    line
}

pub fn iter_line(
    phase: &Phase,
    epoch: usize,
    iteration: usize,
    epoch_size: usize,
    loss: f64,
    elapsed: Duration,
) -> String {
    format!(
        "{phase} epoch: {epoch} ({iteration}/{epoch_size}) loss: {loss:.4} || {}",
        format_elapsed(elapsed)
    )
}

/// Log progress within an epoch.
pub fn iter_log(
    phase: &Phase,
    epoch: usize,
    iteration: usize,
    epoch_size: usize,
    loss: f64,
    start: Instant,
) -> String {
    let line = iter_line(phase, epoch, iteration, epoch_size, loss, start.elapsed());
    tracing::info!("{line}");
    line
}

/// End-of-phase summary lines, in logging order.
pub fn epoch_lines(
    phase: &Phase,
    epoch: usize,
    epoch_loss: f64,
    m: &EpochMetrics,
    elapsed: Duration,
) -> Vec<String> {
    vec![
        format!("{phase} epoch: {epoch} finished"),
        format!(
            "{phase} Epoch: {epoch}, loss: {epoch_loss:.4}, roc: {:.4}",
            m.roc_auc
        ),
        format!("Acc: {:.4} | Precision: {:.4}", m.accuracy, m.precision),
        format!("tnr: {:.4} | fpr: {:.4}", m.tnr, m.fpr),
        format!("fnr: {:.4} | tpr: {:.4}", m.fnr, m.tpr),
        format!(
            "Time taken for {phase} phase: {}",
            format_elapsed(elapsed)
        ),
    ]
}

/// Close out a phase: compute metrics (writing the ROC plot), log the summary
/// and record every scalar at `step = epoch`.
pub fn epoch_log(
    meter: &Meter,
    epoch_loss: f64,
    start: Instant,
    plot: &PlotConfig,
    tracker: &mut dyn Tracker,
) -> Result<EpochMetrics> {
    let elapsed = start.elapsed();
    let phase = meter.phase();
    let epoch = meter.epoch();
    let m = meter.get_metrics(plot, tracker)?;

    for line in epoch_lines(phase, epoch, epoch_loss, &m, elapsed) {
        tracing::info!("{line}");
    }

    let scalars = [
        ("loss", epoch_loss),
        ("roc", m.roc_auc),
        ("acc", m.accuracy),
        ("precision", m.precision),
        ("tnr", m.tnr),
        ("fpr", m.fpr),
        ("fnr", m.fnr),
        ("tpr", m.tpr),
    ];
    for (name, value) in scalars {
        tracker.log_value(&format!("{phase} {name}"), value, epoch)?;
    }

    Ok(m)
}
