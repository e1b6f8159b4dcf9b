// src/cli/args.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// westbench: shell-aware orchestration for west-style embedded workspaces.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Project directory holding westbench.toml. Defaults to the current
    /// directory.
    #[arg(long, global = true, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a configuration.
    Build {
        /// Configuration name; defaults to the active configuration.
        #[arg(long, short)]
        config: Option<String>,
        /// Extra arguments passed through to the build system.
        #[arg(last = true)]
        extra: Vec<String>,
    },
    /// Build a configuration from a pristine build directory.
    Rebuild {
        #[arg(long, short)]
        config: Option<String>,
        #[arg(last = true)]
        extra: Vec<String>,
    },
    /// Flash the built firmware to the board.
    Flash {
        #[arg(long, short)]
        config: Option<String>,
        /// Flash runner backend; defaults to the configuration's runner.
        #[arg(long)]
        runner: Option<String>,
    },
    /// Open the interactive kernel configuration UI.
    Menuconfig {
        #[arg(long, short)]
        config: Option<String>,
    },
    /// Open the graphical kernel configuration UI.
    Guiconfig {
        #[arg(long, short)]
        config: Option<String>,
    },
    /// Check the configuration against hardening guidelines.
    Hardenconfig {
        #[arg(long, short)]
        config: Option<String>,
    },
    /// Print the RAM usage report.
    RamReport {
        #[arg(long, short)]
        config: Option<String>,
    },
    /// Print the ROM usage report.
    RomReport {
        #[arg(long, short)]
        config: Option<String>,
    },
    /// Launch the puncover code-size analyzer.
    Puncover {
        #[arg(long, short)]
        config: Option<String>,
    },
    /// List board definition directories across the configured board roots.
    Boards,
    /// List available shields.
    Shields,
    /// List available snippets.
    Snippets,
    /// Discover the flash runners usable with a configuration.
    Runners {
        #[arg(long, short)]
        config: Option<String>,
    },
    /// Produce an SPDX software bill of materials for a configuration.
    Spdx {
        #[arg(long, short)]
        config: Option<String>,
    },
    /// Manage the persisted task file.
    #[command(subcommand)]
    Tasks(TasksCommand),
    /// Initialize the workspace (`west init`).
    Init {
        /// Manifest repository URL for the remote form.
        #[arg(long, short)]
        manifest: Option<String>,
    },
    /// Update the workspace modules (`west update`).
    Update,
}

#[derive(Subcommand, Debug)]
pub enum TasksCommand {
    /// Ensure the managed task entries and the runner prompt exist.
    Sync,
    /// Point the managed tasks at another configuration.
    Rebind {
        /// Configuration name to bind to.
        config: String,
    },
    /// Run a managed task by label, bound to a configuration on the fly.
    Run {
        /// Task label, e.g. "Menuconfig" or "West Flash".
        label: String,
        #[arg(long, short)]
        config: Option<String>,
    },
}
