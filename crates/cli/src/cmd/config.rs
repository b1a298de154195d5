//! Configuration command
//!
//! Shows the effective configuration, an example file, or the default path.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use pollwatch_cli::system_config;
use std::path::Path;

pub async fn run(example: bool, path: bool, explicit: Option<&Path>) -> Result<()> {
    if example {
        println!("{}", system_config::example_config());
        return Ok(());
    }

    let default_path = system_config::config_file_path();

    if path {
        let config_path = default_path.context("Could not determine config file path")?;
        println!("{}", config_path.display());
        if !config_path.exists() {
            println!(
                "{}",
                "File does not exist. Use 'pollwatch config --example' for a template.".yellow()
            );
        }
        return Ok(());
    }

    let config = system_config::load(explicit)?;
    let location = explicit
        .map(Path::to_path_buf)
        .or(default_path.filter(|p| p.exists()));

    println!("{}", "Effective Configuration".bold());
    match location {
        Some(location) => println!("{}: {}\n", "Location".dimmed(), location.display().dimmed()),
        None => println!("{}\n", "(built-in defaults)".dimmed()),
    }

    println!("  {} = {}", "enable_logging".cyan(), config.enable_logging);
    println!("  {} = {}", "scheduling".cyan(), config.scheduling);
    println!("  {} = {} ms", "idle_tick_ms".cyan(), config.idle_tick_ms);
    println!("  {} = {} ms", "shutdown_timeout_ms".cyan(), config.shutdown_timeout_ms);
    println!("  {} = {}", "baseline_on_add".cyan(), config.baseline_on_add);

    if config.watches.is_empty() {
        println!("\n{}", "No watches configured.".dimmed());
    } else {
        println!("\n{}", "[[watches]]".yellow());
        for watch in &config.watches {
            println!("  {} ({} ms)", watch.path.display(), watch.interval_ms);
        }
    }

    Ok(())
}
