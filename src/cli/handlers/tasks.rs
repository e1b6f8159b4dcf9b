// src/cli/handlers/tasks.rs

use crate::{
    CancellationToken,
    cli::handlers::commons::Session,
    constants::WATCHER_SETTLE_DELAY_MS,
    core::tasks_file::{self, TasksFile},
};
use anyhow::{Result, anyhow};
use colored::Colorize;
use std::time::Duration;

pub fn sync(session: &Session) -> Result<()> {
    let active = session.select_config(None)?;
    let mut file = TasksFile::load(&session.project.root)?;
    file.ensure_managed_entries(&active.name);
    file.ensure_runner_input();
    commit(&mut file)
}

pub fn rebind(session: &Session, config_name: &str) -> Result<()> {
    let index = session
        .project
        .config_index(config_name)
        .ok_or_else(|| anyhow!("No build configuration named '{}' exists.", config_name))?;
    let mut file = TasksFile::load(&session.project.root)?;
    file.ensure_managed_entries(config_name);
    file.ensure_runner_input();
    file.rebind(config_name, index);
    commit(&mut file)
}

pub fn run(
    session: &Session,
    label: &str,
    config_name: Option<&str>,
    cancellation_token: &CancellationToken,
) -> Result<()> {
    let descriptor = tasks_file::descriptor(label)
        .ok_or_else(|| anyhow!("No managed task is labelled '{}'.", label))?;
    let config = session.select_config(config_name)?;
    println!(
        "Running task '{}' against configuration '{}'...",
        descriptor.label.cyan(),
        config.name.cyan()
    );
    session
        .west()
        .run_bound_task(descriptor, config, cancellation_token)
}

fn commit(file: &mut TasksFile) -> Result<()> {
    if file.commit()? {
        println!("Updated '{}'.", file.path().display().to_string().cyan());
        // Give file watchers a moment to observe the write before any
        // dependent command runs.
        std::thread::sleep(Duration::from_millis(WATCHER_SETTLE_DELAY_MS));
    } else {
        println!("{}", "Task file already up to date.".green());
    }
    Ok(())
}
