//! Configuration for meters, plots, tracking and logging.
//!
//! Uses `figment` for layered configuration: defaults -> `rocmeter.toml` -> environment -> overrides.

use crate::error::{MeterError, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the workspace-local config file.
pub const CONFIG_FILE_NAME: &str = "rocmeter.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocMeterConfig {
    /// Folder receiving the log file, ROC plots and tracking events.
    #[serde(default = "default_save_folder")]
    pub save_folder: PathBuf,
    /// Decision threshold for the confusion matrix.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Report the confusion matrix row-normalized.
    #[serde(default)]
    pub normalized: bool,
    #[serde(default)]
    pub plot: PlotConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
}

impl Default for RocMeterConfig {
    fn default() -> Self {
        Self {
            save_folder: default_save_folder(),
            threshold: default_threshold(),
            normalized: false,
            plot: PlotConfig::default(),
            tracking: TrackingConfig::default(),
            logging: LoggingConfig::default(),
            replay: ReplayConfig::default(),
        }
    }
}

impl RocMeterConfig {
    /// Reject values the meter and plotter cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(MeterError::config(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        if self.plot.width == 0 || self.plot.height == 0 {
            return Err(MeterError::config("plot dimensions must be non-zero"));
        }
        if self.replay.log_every == 0 {
            return Err(MeterError::config("replay.log_every must be positive"));
        }
        Ok(())
    }
}

fn default_save_folder() -> PathBuf {
    PathBuf::from("runs")
}

fn default_threshold() -> f64 {
    0.5
}

/// ROC plot output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Write a ROC plot whenever epoch metrics are computed.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Image width in pixels.
    #[serde(default = "default_plot_width")]
    pub width: u32,
    /// Image height in pixels.
    #[serde(default = "default_plot_height")]
    pub height: u32,
    /// Sub-folder of the save folder holding the plots.
    #[serde(default = "default_plot_dir")]
    pub dir_name: String,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: default_plot_width(),
            height: default_plot_height(),
            dir_name: default_plot_dir(),
        }
    }
}

fn default_plot_width() -> u32 {
    1000
}

fn default_plot_height() -> u32 {
    500
}

fn default_plot_dir() -> String {
    "ROC_plots".to_string()
}

/// Experiment tracking (scalar/image event log).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Sub-folder of the save folder holding the event log.
    #[serde(default = "default_tracking_dir")]
    pub dir_name: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir_name: default_tracking_dir(),
        }
    }
}

fn default_tracking_dir() -> String {
    "tracking".to_string()
}

/// Log file and console output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log file name inside the save folder. Opened in append mode.
    #[serde(default = "default_log_file")]
    pub file_name: String,
    /// Filter directive for the log file.
    #[serde(default = "default_file_level")]
    pub file_level: String,
    /// Filter directive for the console.
    #[serde(default = "default_console_level")]
    pub console_level: String,
    /// `strftime` format for the timestamp prefix.
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_name: default_log_file(),
            file_level: default_file_level(),
            console_level: default_console_level(),
            time_format: default_time_format(),
        }
    }
}

fn default_log_file() -> String {
    "log.txt".to_string()
}

fn default_file_level() -> String {
    "debug".to_string()
}

fn default_console_level() -> String {
    "info".to_string()
}

fn default_time_format() -> String {
    "%H:%M:%S".to_string()
}

/// Replay of recorded predictions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Iterations between per-iteration log lines.
    #[serde(default = "default_log_every")]
    pub log_every: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            log_every: default_log_every(),
        }
    }
}

fn default_log_every() -> usize {
    10
}

fn default_true() -> bool {
    true
}

/// `~/.config/rocmeter/rocmeter.toml` (platform equivalent), if a home directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "rocmeter", "rocmeter")
        .map(|d| d.config_dir().join(CONFIG_FILE_NAME))
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `ROCMETER_`)
/// 3. Workspace-local config (`rocmeter.toml`)
/// 4. User config (`~/.config/rocmeter/rocmeter.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&RocMeterConfig>,
) -> Result<RocMeterConfig> {
    let mut figment = Figment::from(Serialized::defaults(RocMeterConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(CONFIG_FILE_NAME);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // ROCMETER_THRESHOLD, ROCMETER_PLOT__WIDTH, etc.
    figment = figment.merge(Env::prefixed("ROCMETER_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let config: RocMeterConfig = figment.extract()?;
    config.validate()?;
    Ok(config)
}
