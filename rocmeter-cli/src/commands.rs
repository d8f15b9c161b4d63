//! CLI subcommand handlers.

use crate::Commands;
use crate::ConfigAction;
use crate::replay;
use rocmeter_core::config::{CONFIG_FILE_NAME, RocMeterConfig, load_config};
use rocmeter_core::training::{print_time, tracker_from_config};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Handle a CLI subcommand.
pub fn handle_command(
    command: Commands,
    workspace: &Path,
    console_level: Option<&str>,
) -> anyhow::Result<()> {
    match command {
        Commands::Replay {
            input,
            save_folder,
            threshold,
            no_plot,
        } => {
            let config = replay_config(workspace, save_folder, threshold, no_plot, console_level)?;
            handle_replay(&input, &config)
        }
        Commands::Config { action } => handle_config(action, workspace),
    }
}

/// Workspace configuration with the replay flags applied on top.
fn replay_config(
    workspace: &Path,
    save_folder: Option<PathBuf>,
    threshold: Option<f64>,
    no_plot: bool,
    console_level: Option<&str>,
) -> anyhow::Result<RocMeterConfig> {
    let mut config = load_config(Some(workspace), None)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    // Apply CLI overrides
    if let Some(folder) = save_folder {
        config.save_folder = folder;
    }
    if let Some(threshold) = threshold {
        config.threshold = threshold;
    }
    if no_plot {
        config.plot.enabled = false;
    }
    if let Some(level) = console_level {
        config.logging.console_level = level.to_string();
    }
    config.validate()?;
    Ok(config)
}

fn handle_replay(input: &Path, config: &RocMeterConfig) -> anyhow::Result<()> {
    let _guard = rocmeter_core::init_logging(&config.save_folder, &config.logging)?;
    let start = Instant::now();
    tracing::info!(input = %input.display(), "Replaying predictions");

    let rows = replay::read_rows(input)?;
    let mut tracker = tracker_from_config(&config.save_folder, &config.tracking)?;
    let summaries = replay::replay(&rows, config, tracker.as_mut())?;

    if let Some(best) = summaries
        .iter()
        .filter(|s| s.phase == rocmeter_core::Phase::Val)
        .max_by(|a, b| a.metrics.roc_auc.total_cmp(&b.metrics.roc_auc))
    {
        tracing::info!(
            "Best val roc: {:.4} at epoch {}",
            best.metrics.roc_auc,
            best.epoch
        );
    }
    print_time(start, "Total time");
    Ok(())
}

fn handle_config(action: ConfigAction, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = workspace.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = toml::to_string_pretty(&RocMeterConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            println!("{}", show_config(workspace)?);
            Ok(())
        }
    }
}

fn show_config(workspace: &Path) -> anyhow::Result<String> {
    let config = load_config(Some(workspace), None)
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    Ok(toml::to_string_pretty(&config)?)
}
