//! Pollwatch CLI - pollwatch command

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use pollwatch::SchedulingMode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

/// Pollwatch - polling file watcher for container and network filesystems
#[derive(Parser)]
#[command(name = "pollwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch directories and print changes until Ctrl-C
    Watch {
        /// Directories to watch (in addition to the config file)
        #[arg(env = "FOLDER_TO_WATCH")]
        paths: Vec<PathBuf>,

        /// Polling interval in milliseconds for the given paths (default: 500)
        #[arg(short, long, env = "POLLING_INTERVAL")]
        interval_ms: Option<u64>,

        /// Configuration file (default: <config dir>/pollwatch/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Disable engine logging; only events are printed
        #[arg(short, long)]
        quiet: bool,

        /// Scheduling strategy
        #[arg(long, value_enum)]
        mode: Option<Mode>,
    },
    /// Show configuration
    Config {
        /// Print an example configuration file
        #[arg(long)]
        example: bool,

        /// Print the default config file path
        #[arg(long)]
        path: bool,

        /// Configuration file to show instead of the default one
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Lockstep,
    Independent,
}

impl From<Mode> for SchedulingMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Lockstep => SchedulingMode::Lockstep,
            Mode::Independent => SchedulingMode::Independent,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch { paths, interval_ms, config, quiet, mode } => {
            cmd::watch::run(paths, interval_ms, config, quiet, mode.map(Into::into)).await
        }
        Commands::Config { example, path, config } => {
            cmd::config::run(example, path, config.as_deref()).await
        }
    }
}
