// src/cli/handlers/target.rs

use crate::{CancellationToken, cli::handlers::commons::Session};
use anyhow::Result;

/// Shared handler for the `west build -t <target>` family (menuconfig,
/// guiconfig, hardenconfig, ram_report, rom_report, puncover).
pub fn handle(
    session: &Session,
    config_name: Option<&str>,
    target: &str,
    cancellation_token: &CancellationToken,
) -> Result<()> {
    let config = session.select_config(config_name)?;
    session.west().run_target(config, target, cancellation_token)
}
