// src/cli/handlers/commons.rs

// Shared functions used by multiple handlers.

use crate::{
    CancellationToken,
    constants::SETTINGS_FILENAME,
    core::{settings::Settings, west::West},
    models::{BuildConfiguration, Project, ResolvedEnvironment, Sdk, Workspace},
};
use anyhow::{Result, anyhow};
use std::path::Path;
use std::sync::atomic::Ordering;

pub fn check_for_cancellation(cancellation_token: &CancellationToken) -> Result<()> {
    if cancellation_token.load(Ordering::SeqCst) {
        Err(anyhow!("Operation was cancelled by the user."))
    } else {
        Ok(())
    }
}

/// Everything one invocation needs, loaded once at dispatch time: the
/// parsed settings turned into the domain model plus the resolved shell
/// environment.
#[derive(Debug)]
pub struct Session {
    pub sdk: Option<Sdk>,
    pub workspace: Workspace,
    pub project: Project,
    pub renv: ResolvedEnvironment,
}

impl Session {
    pub fn load(project_dir: Option<&Path>) -> Result<Self> {
        let root = match project_dir {
            Some(dir) => dunce::simplified(dir).to_path_buf(),
            None => std::env::current_dir()?,
        };
        let settings = Settings::load(&root)?;
        Ok(Self {
            sdk: settings.sdk(),
            workspace: settings.workspace()?,
            project: settings.project(&root),
            renv: settings.resolved_environment(),
        })
    }

    pub fn west(&self) -> West<'_> {
        West::new(
            &self.renv,
            self.sdk.as_ref(),
            &self.workspace,
            &self.project,
        )
    }

    /// Resolves the configuration a command runs against: an explicit name
    /// must exist, no name means the active configuration.
    pub fn select_config(&self, name: Option<&str>) -> Result<&BuildConfiguration> {
        match name {
            Some(name) => self.project.config(name).ok_or_else(|| {
                anyhow!(
                    "No build configuration named '{}' exists in '{}'.",
                    name,
                    SETTINGS_FILENAME
                )
            }),
            None => self.project.active_config().ok_or_else(|| {
                anyhow!(
                    "No build configurations are defined in '{}'.",
                    SETTINGS_FILENAME
                )
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn cancellation_check_reflects_the_token() {
        let token: CancellationToken = Arc::new(AtomicBool::new(false));
        assert!(check_for_cancellation(&token).is_ok());
        token.store(true, Ordering::SeqCst);
        assert!(check_for_cancellation(&token).is_err());
    }
}
