//! Log file setup. Kept in its own test binary: the global subscriber is process-wide.

use rocmeter_core::config::LoggingConfig;
use rocmeter_core::init_logging;
use rocmeter_core::training::{Phase, iter_log};
use std::time::Instant;
use tempfile::TempDir;

#[test]
fn log_file_receives_timestamped_lines() {
    let dir = TempDir::new().unwrap();
    let save_folder = dir.path().join("run-1");
    let config = LoggingConfig::default();

    let guard = init_logging(&save_folder, &config).unwrap();
    assert!(guard.installed());
    let path = guard.path().to_path_buf();
    assert_eq!(path, save_folder.join("log.txt"));

    iter_log(&Phase::Train, 1, 10, 100, 0.25, Instant::now());

    // A second init keeps the first subscriber.
    let second = init_logging(&save_folder, &config).unwrap();
    assert!(!second.installed());
    drop(second);
    drop(guard);

    let content = std::fs::read_to_string(&path).unwrap();
    let line = content
        .lines()
        .find(|l| l.contains("train epoch: 1 (10/100) loss: 0.2500 || 00:00"))
        .expect("iteration line in log file");

    // HH:MM:SS prefix, no level or target.
    let (stamp, rest) = line.split_at(8);
    assert_eq!(stamp.len(), 8);
    assert_eq!(stamp.as_bytes()[2], b':');
    assert_eq!(stamp.as_bytes()[5], b':');
    assert!(!rest.contains("INFO"));
}
