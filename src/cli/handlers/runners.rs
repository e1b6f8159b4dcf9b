// src/cli/handlers/runners.rs

use crate::{CancellationToken, cli::handlers::commons::Session};
use anyhow::Result;
use colored::Colorize;

pub fn handle(
    session: &Session,
    config_name: Option<&str>,
    cancellation_token: &CancellationToken,
) -> Result<()> {
    let config = session.select_config(config_name)?;
    println!(
        "Probing flash runners for configuration '{}'...",
        config.name.cyan()
    );
    let report = session.west().discover_runners(config, cancellation_token)?;

    if !report.candidates.is_empty() {
        println!("\n{}", "Runners supporting flash:".bold());
        for runner in &report.candidates {
            println!("  {runner}");
        }
    }
    if !report.available.is_empty() {
        println!("\n{}", "Available in this build:".bold());
        for runner in &report.available {
            println!("  {runner}");
        }
    }
    if let Some(default) = &report.default {
        println!("\nDefault runner: {}", default.cyan());
    }
    Ok(())
}
