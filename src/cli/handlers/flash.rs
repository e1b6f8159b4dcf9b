// src/cli/handlers/flash.rs

use crate::{CancellationToken, cli::handlers::commons::Session};
use anyhow::Result;
use colored::Colorize;

pub fn handle(
    session: &Session,
    config_name: Option<&str>,
    runner: Option<&str>,
    cancellation_token: &CancellationToken,
) -> Result<()> {
    let config = session.select_config(config_name)?;
    match runner.or(config.default_runner.as_deref()) {
        Some(runner) => println!(
            "Flashing '{}' with runner '{}'...",
            config.name.cyan(),
            runner.cyan()
        ),
        None => println!("Flashing '{}'...", config.name.cyan()),
    }
    session.west().flash(config, runner, cancellation_token)?;
    println!("{}", "Flash finished.".green());
    Ok(())
}
