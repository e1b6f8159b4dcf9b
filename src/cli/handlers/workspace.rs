// src/cli/handlers/workspace.rs

use crate::{
    CancellationToken,
    cli::handlers::commons::Session,
    core::west,
};
use anyhow::Result;
use colored::Colorize;

pub fn init(
    session: &Session,
    manifest: Option<&str>,
    cancellation_token: &CancellationToken,
) -> Result<()> {
    println!(
        "Initializing workspace at '{}'...",
        session.workspace.root.display().to_string().cyan()
    );
    west::init_workspace(
        &session.renv,
        &session.workspace,
        manifest,
        cancellation_token,
    )?;
    println!("{}", "Workspace initialized. Run 'update' to fetch modules.".green());
    Ok(())
}

pub fn update(session: &Session, cancellation_token: &CancellationToken) -> Result<()> {
    println!("Updating workspace modules...");
    session.west().update(cancellation_token)?;
    println!("{}", "Workspace up to date.".green());
    Ok(())
}
