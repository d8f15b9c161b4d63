//! rocmeter CLI — replay recorded classifier outputs through the training-loop meters.

mod commands;
mod replay;

use clap::Parser;
use std::path::PathBuf;

/// rocmeter: confusion-matrix metrics, ROC plots and scalar logs for binary classifiers
#[derive(Parser, Debug)]
#[command(name = "rocmeter", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (holds rocmeter.toml)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Replay a predictions CSV (phase,epoch,iteration,target,score,loss) epoch by epoch
    Replay {
        /// Predictions file
        input: PathBuf,

        /// Folder for log.txt, ROC plots and tracking events
        #[arg(short, long)]
        save_folder: Option<PathBuf>,

        /// Decision threshold for the confusion matrix
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Skip writing ROC plots
        #[arg(long)]
        no_plot: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Write a default rocmeter.toml into the workspace
    Init,
    /// Show the effective configuration
    Show,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // None keeps the configured `logging.console_level`
    let console_level = match cli.verbose {
        0 if cli.quiet => Some("error"),
        0 => None,
        1 => Some("debug"),
        _ => Some("trace"),
    };

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    commands::handle_command(cli.command, &workspace, console_level)
}
