//! Log file initialization for a training run.
//!
//! Lines go to `<save_folder>/log.txt` (appended across runs, `HH:MM:SS message`)
//! and to stderr.

use crate::config::LoggingConfig;
use crate::error::{MeterError, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Create `folder` (and missing parents) if it does not exist yet.
pub fn mkdir(folder: &Path) -> Result<()> {
    if !folder.exists() {
        std::fs::create_dir_all(folder)?;
    }
    Ok(())
}

/// Keeps the background log writer alive. Dropping it flushes pending lines.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    path: PathBuf,
    installed: bool,
    _worker: WorkerGuard,
}

impl LogGuard {
    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this call installed the global subscriber. `false` when one was already set.
    pub fn installed(&self) -> bool {
        self.installed
    }
}

fn filter(directive: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directive)
        .map_err(|e| MeterError::Logging(format!("invalid filter '{directive}': {e}")))
}

/// Install the file + console subscriber for a run saving into `save_folder`.
pub fn init_logging(save_folder: &Path, config: &LoggingConfig) -> Result<LogGuard> {
    mkdir(save_folder)?;
    let path = save_folder.join(&config.file_name);

    let file_appender = tracing_appender::rolling::never(save_folder, &config.file_name);
    let (non_blocking, worker) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .with_level(false)
        .with_timer(ChronoLocal::new(config.time_format.clone()))
        .with_filter(filter(&config.file_level)?);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(filter(&config.console_level)?);

    let installed = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(path = %path.display(), "Logging initialized");
    } else {
        tracing::warn!("A global subscriber is already installed; keeping it");
    }

    Ok(LogGuard {
        path,
        installed,
        _worker: worker,
    })
}
