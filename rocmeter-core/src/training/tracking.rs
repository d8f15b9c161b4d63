//! Experiment tracking: scalar and image events keyed by step.

use crate::config::TrackingConfig;
use crate::error::{MeterError, Result};
use crate::logging::mkdir;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

const SCALARS_FILE: &str = "scalars.jsonl";
const IMAGES_FILE: &str = "images.jsonl";
const IMAGES_DIR: &str = "images";

/// Sink for per-step scalars and images.
pub trait Tracker: Send {
    fn log_value(&mut self, name: &str, value: f64, step: usize) -> Result<()>;

    fn log_image(&mut self, name: &str, image: &Path, step: usize) -> Result<()>;
}

/// One scalar sample. Non-finite values are stored as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarEvent {
    pub ts: DateTime<Utc>,
    pub name: String,
    pub value: Option<f64>,
    pub step: usize,
}

/// One logged image, pointing at the copy kept under `images/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEvent {
    pub ts: DateTime<Utc>,
    pub name: String,
    pub step: usize,
    pub path: PathBuf,
}

/// Append-only JSON-lines event log in a tracking directory.
#[derive(Debug, Clone)]
pub struct EventLogTracker {
    dir: PathBuf,
}

impl EventLogTracker {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        mkdir(&dir)?;
        mkdir(&dir.join(IMAGES_DIR))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn append<T: Serialize>(&self, file: &str, event: &T) -> Result<()> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(file))?;
        f.write_all(line.as_bytes())?;
        Ok(())
    }

    fn read_events<T: serde::de::DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(std::fs::File::open(path)?);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(&line)?);
        }
        Ok(events)
    }

    /// `(step, value)` series recorded under `name`, in logging order.
    pub fn scalars(&self, name: &str) -> Result<Vec<(usize, f64)>> {
        Ok(self
            .read_events::<ScalarEvent>(SCALARS_FILE)?
            .into_iter()
            .filter(|e| e.name == name)
            .map(|e| (e.step, e.value.unwrap_or(f64::NAN)))
            .collect())
    }

    pub fn images(&self) -> Result<Vec<ImageEvent>> {
        self.read_events(IMAGES_FILE)
    }
}

/// Keep file names portable: anything outside `[A-Za-z0-9._-]` becomes `_`.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl Tracker for EventLogTracker {
    fn log_value(&mut self, name: &str, value: f64, step: usize) -> Result<()> {
        let event = ScalarEvent {
            ts: Utc::now(),
            name: name.to_string(),
            value: value.is_finite().then_some(value),
            step,
        };
        self.append(SCALARS_FILE, &event)
    }

    fn log_image(&mut self, name: &str, image: &Path, step: usize) -> Result<()> {
        if !image.is_file() {
            return Err(MeterError::tracking(format!(
                "image not found: {}",
                image.display()
            )));
        }
        let ext = image
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("img");
        let target = self
            .dir
            .join(IMAGES_DIR)
            .join(format!("{}_{step}.{ext}", sanitize(name)));
        std::fs::copy(image, &target)?;

        let event = ImageEvent {
            ts: Utc::now(),
            name: name.to_string(),
            step,
            path: target,
        };
        self.append(IMAGES_FILE, &event)
    }
}

/// Discards everything. Used when tracking is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTracker;

impl Tracker for NullTracker {
    fn log_value(&mut self, _name: &str, _value: f64, _step: usize) -> Result<()> {
        Ok(())
    }

    fn log_image(&mut self, _name: &str, _image: &Path, _step: usize) -> Result<()> {
        Ok(())
    }
}

/// Tracker for a save folder as configured.
pub fn tracker_from_config(
    save_folder: &Path,
    config: &TrackingConfig,
) -> Result<Box<dyn Tracker>> {
    if config.enabled {
        Ok(Box::new(EventLogTracker::new(
            save_folder.join(&config.dir_name),
        )?))
    } else {
        Ok(Box::new(NullTracker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_scalars_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut tracker = EventLogTracker::new(dir.path().join("tracking")).unwrap();
        tracker.log_value("train loss", 0.5, 0).unwrap();
        tracker.log_value("train roc", 0.7, 0).unwrap();
        tracker.log_value("train loss", 0.25, 1).unwrap();

        assert_eq!(
            tracker.scalars("train loss").unwrap(),
            vec![(0, 0.5), (1, 0.25)]
        );
        assert!(tracker.scalars("val loss").unwrap().is_empty());
    }

    #[test]
    fn test_nan_scalar_stored_as_null() {
        let dir = TempDir::new().unwrap();
        let mut tracker = EventLogTracker::new(dir.path()).unwrap();
        tracker.log_value("val precision", f64::NAN, 3).unwrap();

        let raw = std::fs::read_to_string(dir.path().join(SCALARS_FILE)).unwrap();
        assert!(raw.contains("\"value\":null"));
        let series = tracker.scalars("val precision").unwrap();
        assert_eq!(series.len(), 1);
        assert!(series[0].1.is_nan());
    }

    #[test]
    fn test_image_copied() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("plot.jpg");
        std::fs::write(&src, b"fake").unwrap();

        let mut tracker = EventLogTracker::new(dir.path().join("tracking")).unwrap();
        tracker.log_image("ROC_val_1_0.9000", &src, 1).unwrap();

        let images = tracker.images().unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].step, 1);
        assert!(images[0].path.ends_with("images/ROC_val_1_0.9000_1.jpg"));
        assert_eq!(std::fs::read(&images[0].path).unwrap(), b"fake");
    }

    #[test]
    fn test_missing_image_rejected() {
        let dir = TempDir::new().unwrap();
        let mut tracker = EventLogTracker::new(dir.path()).unwrap();
        let result = tracker.log_image("x", &dir.path().join("nope.jpg"), 0);
        assert!(matches!(result, Err(MeterError::Tracking(_))));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("train loss/avg"), "train_loss_avg");
    }

    #[test]
    fn test_disabled_tracking_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let config = TrackingConfig {
            enabled: false,
            ..TrackingConfig::default()
        };
        let mut tracker = tracker_from_config(dir.path(), &config).unwrap();
        tracker.log_value("train loss", 1.0, 0).unwrap();
        assert!(!dir.path().join("tracking").exists());
    }
}
