//! Training-loop instrumentation — meters, ROC math, plots, tracking, log lines.

pub mod meter;
pub mod plot;
pub mod roc;
pub mod schedule;
pub mod timing;
pub mod tracking;

pub use meter::{ConfusionMatrix, EpochMetrics, Meter, Phase};
pub use plot::{RenderedPlot, plot_roc, roc_plot_name};
pub use roc::{RocCurve, auc, roc_auc_score, roc_curve};
pub use schedule::{ParamGroup, ParamGroups, adjust_lr};
pub use timing::{epoch_log, format_elapsed, iter_log, print_time};
pub use tracking::{EventLogTracker, NullTracker, Tracker, tracker_from_config};
