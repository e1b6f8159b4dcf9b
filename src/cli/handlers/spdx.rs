// src/cli/handlers/spdx.rs

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
        "Generating SPDX bill of materials for '{}' (full rebuild)...",
        config.name.cyan()
    );
    session.west().spdx(config, cancellation_token)?;
    let build_dir = config.build_dir(&session.project.root);
    println!(
        "{} SPDX documents are in '{}'.",
        "Done.".green(),
        build_dir.join("spdx").display()
    );
    Ok(())
}
