// src/cli/handlers/listings.rs

use crate::{CancellationToken, cli::handlers::commons::Session};
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

pub fn boards(session: &Session, cancellation_token: &CancellationToken) -> Result<()> {
    let dirs = session.west().boards(cancellation_token)?;
    if dirs.is_empty() {
        println!("{}", "No boards found.".yellow());
        return Ok(());
    }
    for dir in &dirs {
        let name = Path::new(dir)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.clone());
        println!("{}  {}", name.cyan(), dir.dimmed());
    }
    Ok(())
}

pub fn shields(session: &Session, cancellation_token: &CancellationToken) -> Result<()> {
    print_names(&session.west().shields(cancellation_token)?, "No shields found.");
    Ok(())
}

pub fn snippets(session: &Session, cancellation_token: &CancellationToken) -> Result<()> {
    print_names(
        &session.west().snippets(cancellation_token)?,
        "No snippets found.",
    );
    Ok(())
}

fn print_names(names: &[String], empty_message: &str) {
    if names.is_empty() {
        println!("{}", empty_message.yellow());
        return;
    }
    for name in names {
        println!("{name}");
    }
}
