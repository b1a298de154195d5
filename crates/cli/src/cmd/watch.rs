//! Watch directories until interrupted

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use pollwatch::{PollingWatcher, SchedulingMode};
use pollwatch_cli::output;
use pollwatch_cli::system_config::{self, Overrides};
use std::path::PathBuf;
use std::time::Duration;

pub async fn run(
    paths: Vec<PathBuf>,
    interval_ms: Option<u64>,
    config_path: Option<PathBuf>,
    quiet: bool,
    mode: Option<SchedulingMode>,
) -> Result<()> {
    let config = system_config::load(config_path.as_deref())?;
    let config = system_config::apply(
        config,
        Overrides {
            paths,
            interval: interval_ms.map(Duration::from_millis),
            quiet,
            mode,
        },
    )?;

    let watched: Vec<_> = config.watches.clone();
    let watcher = PollingWatcher::with_local_provider(config)
        .context("Failed to start watcher")?;

    watcher.subscribe(|event| {
        println!("{}", output::render_event(event, chrono::Local::now()));
    });
    watcher.on_error(|failure| {
        eprintln!("{}", output::render_failure(failure));
    });

    for watch in &watched {
        println!(
            "Watching {} for changes {}",
            watch.path.display().to_string().cyan(),
            format!("(every {} ms)", watch.interval_ms).dimmed()
        );
    }
    println!("{}", "Press Ctrl-C to stop.".dimmed());
    println!();

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    println!();
    println!("Stopping...");
    watcher.shutdown().await;
    Ok(())
}
