//! # rocmeter-core — binary-classification training instrumentation
//!
//! Helpers a training loop calls once per batch and once per phase:
//! a confusion-matrix [`Meter`] with accuracy/precision/rates/ROC-AUC, ROC
//! plots written under the save folder, a scalar/image event log, log file
//! setup and the per-iteration and per-epoch log lines.

pub mod config;
pub mod error;
pub mod logging;
pub mod training;

pub use config::{RocMeterConfig, load_config};
pub use error::MeterError;
pub use logging::{LogGuard, init_logging, mkdir};
pub use training::{EpochMetrics, Meter, Phase, Tracker};
