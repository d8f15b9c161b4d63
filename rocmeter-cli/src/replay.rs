//! Replay recorded per-sample outputs as if a training loop were running.
//!
//! Rows are grouped into phase-epochs (consecutive rows sharing `phase` and
//! `epoch`) and, inside those, into batches (consecutive rows sharing `iteration`).

use anyhow::Context;
use rocmeter_core::config::RocMeterConfig;
use rocmeter_core::training::{EpochMetrics, Meter, Phase, Tracker, epoch_log, iter_log};
use serde::Deserialize;
use std::path::Path;
use std::time::Instant;

/// One sample of a recorded run. `loss` is the loss of the batch the sample belongs to
/// and must be the same on every row of that batch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredictionRow {
    pub phase: String,
    pub epoch: usize,
    pub iteration: usize,
    pub target: u8,
    pub score: f64,
    pub loss: f64,
}

/// Outcome of one replayed phase-epoch.
#[derive(Debug, Clone)]
pub struct PhaseSummary {
    pub phase: Phase,
    pub epoch: usize,
    pub loss: f64,
    pub metrics: EpochMetrics,
}

pub fn read_rows(path: &Path) -> anyhow::Result<Vec<PredictionRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut rows = Vec::new();
    for (line, record) in reader.deserialize().enumerate() {
        let row: PredictionRow =
            record.with_context(|| format!("Bad row {} in {}", line + 1, path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Split `items` into maximal runs whose `key` is equal.
fn runs<T, K: PartialEq>(items: &[T], key: impl Fn(&T) -> K) -> Vec<&[T]> {
    let mut out = Vec::new();
    let mut start = 0;
    for i in 1..=items.len() {
        if i == items.len() || key(&items[i]) != key(&items[start]) {
            out.push(&items[start..i]);
            start = i;
        }
    }
    out
}

/// Loss shared by every row of a batch. Rows that disagree are rejected.
fn batch_loss(batch: &[(Phase, &PredictionRow)]) -> anyhow::Result<f64> {
    let loss = batch[0].1.loss;
    if let Some((_, row)) = batch.iter().find(|(_, r)| r.loss != loss) {
        anyhow::bail!("batch loss differs within the batch: {} vs {loss}", row.loss);
    }
    Ok(loss)
}

pub fn replay(
    rows: &[PredictionRow],
    config: &RocMeterConfig,
    tracker: &mut dyn Tracker,
) -> anyhow::Result<Vec<PhaseSummary>> {
    let mut keyed = Vec::with_capacity(rows.len());
    for row in rows {
        let phase: Phase = row
            .phase
            .parse()
            .with_context(|| format!("epoch {} iteration {}", row.epoch, row.iteration))?;
        keyed.push((phase, row));
    }

    let mut summaries = Vec::new();
    for segment in runs(&keyed, |(phase, r)| (phase.clone(), r.epoch)) {
        let phase = segment[0].0.clone();
        let epoch = segment[0].1.epoch;
        let batches = runs(segment, |(_, r)| r.iteration);
        let epoch_size = batches.len();

        let start = Instant::now();
        let mut meter = Meter::new(phase.clone(), epoch, &config.save_folder)
            .with_threshold(config.threshold)
            .normalized(config.normalized);
        let mut running_loss = 0.0;

        for (i, batch) in batches.iter().enumerate() {
            let location = || format!("{phase} epoch {epoch} iteration {}", batch[0].1.iteration);
            let targets: Vec<u8> = batch.iter().map(|(_, r)| r.target).collect();
            let outputs: Vec<f64> = batch.iter().map(|(_, r)| r.score).collect();
            meter.update(&targets, &outputs).with_context(location)?;

            let loss = batch_loss(batch).with_context(location)?;
            running_loss += loss;
            let iteration = i + 1;
            if iteration % config.replay.log_every == 0 {
                iter_log(&phase, epoch, iteration, epoch_size, loss, start);
            }
        }

        let epoch_loss = running_loss / epoch_size as f64;
        if let Some(matrix) = meter.normalized_value() {
            tracing::debug!(?matrix, "{phase} normalized confusion matrix");
        }
        tracing::debug!("{phase} confusion matrix\n{}", meter.value().display());

        let metrics = epoch_log(&meter, epoch_loss, start, &config.plot, tracker)
            .with_context(|| format!("{phase} epoch {epoch} metrics"))?;
        summaries.push(PhaseSummary {
            phase,
            epoch,
            loss: epoch_loss,
            metrics,
        });
    }

    Ok(summaries)
}
