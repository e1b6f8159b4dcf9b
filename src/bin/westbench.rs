// src/bin/westbench.rs

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use westbench::{
    CancellationToken,
    cli::{Cli, Command, TasksCommand, handlers},
    system::executor,
};

fn main() {
    let cancellation_token: CancellationToken = Arc::new(AtomicBool::new(false));
    let handler_token = cancellation_token.clone();

    // Runs on a separate thread when Ctrl+C is pressed; the executor's
    // wait loops observe the flag and stop the child process.
    ctrlc::set_handler(move || {
        handler_token.store(true, Ordering::SeqCst);
        eprintln!("\nCancelling, waiting for the running command to stop...");
    })
    .expect("Error setting the Ctrl-C handler");

    env_logger::init();

    if let Err(e) = run_cli(Cli::parse(), &cancellation_token) {
        // A user interruption exits silently with the shell convention for
        // SIGINT; everything else gets one formatted line.
        if let Some(exec_err) = e.downcast_ref::<executor::ExecutionError>()
            && matches!(exec_err, executor::ExecutionError::Interrupted)
        {
            std::process::exit(130);
        }
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli, cancellation_token: &CancellationToken) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);
    let session = handlers::commons::Session::load(cli.project_dir.as_deref())?;

    match &cli.command {
        Command::Build { config, extra } => handlers::build::handle(
            &session,
            config.as_deref(),
            false,
            extra,
            cancellation_token,
        ),
        Command::Rebuild { config, extra } => handlers::build::handle(
            &session,
            config.as_deref(),
            true,
            extra,
            cancellation_token,
        ),
        Command::Flash { config, runner } => handlers::flash::handle(
            &session,
            config.as_deref(),
            runner.as_deref(),
            cancellation_token,
        ),
        Command::Menuconfig { config } => {
            handlers::target::handle(&session, config.as_deref(), "menuconfig", cancellation_token)
        }
        Command::Guiconfig { config } => {
            handlers::target::handle(&session, config.as_deref(), "guiconfig", cancellation_token)
        }
        Command::Hardenconfig { config } => handlers::target::handle(
            &session,
            config.as_deref(),
            "hardenconfig",
            cancellation_token,
        ),
        Command::RamReport { config } => {
            handlers::target::handle(&session, config.as_deref(), "ram_report", cancellation_token)
        }
        Command::RomReport { config } => {
            handlers::target::handle(&session, config.as_deref(), "rom_report", cancellation_token)
        }
        Command::Puncover { config } => {
            handlers::target::handle(&session, config.as_deref(), "puncover", cancellation_token)
        }
        Command::Boards => handlers::listings::boards(&session, cancellation_token),
        Command::Shields => handlers::listings::shields(&session, cancellation_token),
        Command::Snippets => handlers::listings::snippets(&session, cancellation_token),
        Command::Runners { config } => {
            handlers::runners::handle(&session, config.as_deref(), cancellation_token)
        }
        Command::Spdx { config } => {
            handlers::spdx::handle(&session, config.as_deref(), cancellation_token)
        }
        Command::Tasks(TasksCommand::Sync) => handlers::tasks::sync(&session),
        Command::Tasks(TasksCommand::Rebind { config }) => {
            handlers::tasks::rebind(&session, config)
        }
        Command::Tasks(TasksCommand::Run { label, config }) => {
            handlers::tasks::run(&session, label, config.as_deref(), cancellation_token)
        }
        Command::Init { manifest } => handlers::workspace::init(
            &session,
            manifest.as_deref(),
            cancellation_token,
        ),
        Command::Update => handlers::workspace::update(&session, cancellation_token),
    }
}
