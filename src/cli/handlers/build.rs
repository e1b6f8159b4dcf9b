// src/cli/handlers/build.rs

use crate::{CancellationToken, cli::handlers::commons::Session};
use anyhow::Result;
use colored::Colorize;

pub fn handle(
    session: &Session,
    config_name: Option<&str>,
    pristine: bool,
    extra: &[String],
    cancellation_token: &CancellationToken,
) -> Result<()> {
    let config = session.select_config(config_name)?;
    println!(
        "Building configuration '{}' for board '{}'...",
        config.name.cyan(),
        config.board.cyan()
    );
    session
        .west()
        .build(config, pristine, extra, cancellation_token)?;
    println!("{}", "Build finished.".green());
    Ok(())
}
