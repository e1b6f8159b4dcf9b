// src/core/settings.rs
//
// Loads the per-project `westbench.toml` settings file and turns it into
// the domain model (SDK, workspace, project, build configurations) plus the
// resolved shell environment. All user-facing paths accept `~` expansion.

use crate::{
    constants::SETTINGS_FILENAME,
    models::{BuildConfiguration, Project, ResolvedEnvironment, Sdk, Workspace},
    system::shell,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error parsing TOML in '{path}': {source}")]
    TomlParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Settings file not found at '{path}'. Run from a project directory containing '{filename}'.")]
    NotFound { path: String, filename: String },
    #[error("Workspace root is not configured; set [workspace].root in '{filename}'.")]
    MissingWorkspace { filename: String },
}

type SettingsResult<T> = Result<T, SettingsError>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub settings: GeneralSection,
    #[serde(default)]
    pub sdk: Option<SdkSection>,
    #[serde(default)]
    pub workspace: Option<WorkspaceSection>,
    #[serde(default)]
    pub project: Option<ProjectSection>,
    #[serde(default, rename = "configuration")]
    pub configurations: Vec<ConfigurationSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralSection {
    /// Shell executable used for every command. Defaults to the host shell.
    pub shell: Option<String>,
    /// Activation script sourced at the start of every command.
    pub path_to_env_script: Option<String>,
    /// Python virtual-environment activation script.
    pub venv_activate_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SdkSection {
    pub root: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceSection {
    pub root: String,
    /// Kernel tree relative to the workspace root.
    #[serde(default = "default_kernel_dir")]
    pub kernel_dir: String,
    #[serde(default)]
    pub arch_roots: Vec<String>,
    #[serde(default)]
    pub soc_roots: Vec<String>,
    #[serde(default)]
    pub board_roots: Vec<String>,
    #[serde(default)]
    pub dts_roots: Vec<String>,
}

fn default_kernel_dir() -> String {
    crate::constants::ZEPHYR_DIRNAME.to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    #[serde(default)]
    pub extra_conf_files: Vec<String>,
    #[serde(default)]
    pub extra_overlay_files: Vec<String>,
    #[serde(default)]
    pub extra_modules: Vec<String>,
    #[serde(default)]
    pub shields: Vec<String>,
    #[serde(default)]
    pub snippets: Vec<String>,
    #[serde(default)]
    pub west_args: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigurationSection {
    pub name: String,
    pub board: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub conf_file: String,
    #[serde(default)]
    pub extra_conf_files: Vec<String>,
    #[serde(default)]
    pub extra_overlay_files: Vec<String>,
    #[serde(default)]
    pub extra_modules: Vec<String>,
    #[serde(default)]
    pub shields: Vec<String>,
    #[serde(default)]
    pub snippets: Vec<String>,
    #[serde(default)]
    pub west_args: String,
    #[serde(default)]
    pub sysbuild: bool,
    #[serde(default)]
    pub default_runner: Option<String>,
}

impl Settings {
    /// Loads the effective settings for a project: the optional user-level
    /// file (machine-wide facts like the activation script path) overlaid
    /// by the required per-project `westbench.toml`.
    pub fn load(project_root: &Path) -> SettingsResult<Self> {
        let path = project_root.join(SETTINGS_FILENAME);
        if !path.is_file() {
            return Err(SettingsError::NotFound {
                path: path.display().to_string(),
                filename: SETTINGS_FILENAME.to_string(),
            });
        }
        let project_file = Self::parse_file(&path)?;
        match Self::user_settings_path().filter(|p| p.is_file()) {
            Some(user_path) => Ok(Self::parse_file(&user_path)?.overlay(project_file)),
            None => Ok(project_file),
        }
    }

    fn user_settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("westbench").join(SETTINGS_FILENAME))
    }

    fn parse_file(path: &Path) -> SettingsResult<Self> {
        log::debug!("Loading settings from '{}'", path.display());
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| SettingsError::TomlParse {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Merges another settings file on top of this one. Scalar fields from
    /// `over` win when set; the configuration list is replaced wholesale
    /// when `over` declares any.
    pub fn overlay(self, over: Self) -> Self {
        Self {
            settings: GeneralSection {
                shell: over.settings.shell.or(self.settings.shell),
                path_to_env_script: over
                    .settings
                    .path_to_env_script
                    .or(self.settings.path_to_env_script),
                venv_activate_path: over
                    .settings
                    .venv_activate_path
                    .or(self.settings.venv_activate_path),
            },
            sdk: over.sdk.or(self.sdk),
            workspace: over.workspace.or(self.workspace),
            project: over.project.or(self.project),
            configurations: if over.configurations.is_empty() {
                self.configurations
            } else {
                over.configurations
            },
        }
    }

    pub fn sdk(&self) -> Option<Sdk> {
        self.sdk.as_ref().map(|s| Sdk {
            root: expand_path(&s.root),
        })
    }

    pub fn workspace(&self) -> SettingsResult<Workspace> {
        let section = self
            .workspace
            .as_ref()
            .ok_or_else(|| SettingsError::MissingWorkspace {
                filename: SETTINGS_FILENAME.to_string(),
            })?;
        let root = expand_path(&section.root);
        let kernel_dir = root.join(&section.kernel_dir);
        Ok(Workspace {
            root,
            kernel_dir,
            arch_roots: section.arch_roots.clone(),
            soc_roots: section.soc_roots.clone(),
            board_roots: section.board_roots.clone(),
            dts_roots: section.dts_roots.clone(),
        })
    }

    pub fn project(&self, project_root: &Path) -> Project {
        let section = self.project.clone().unwrap_or_default();
        Project {
            root: project_root.to_path_buf(),
            extra_conf_files: section.extra_conf_files,
            extra_overlay_files: section.extra_overlay_files,
            extra_modules: section.extra_modules,
            shields: section.shields,
            snippets: section.snippets,
            west_args: section.west_args,
            configs: self.configurations.iter().map(Into::into).collect(),
        }
    }

    /// Resolves the shell and activation facts once, at the call boundary.
    pub fn resolved_environment(&self) -> ResolvedEnvironment {
        let shell_exe = self
            .settings
            .shell
            .clone()
            .unwrap_or_else(|| shell::default_shell_exe().to_string());
        ResolvedEnvironment::new(
            shell_exe,
            self.settings
                .path_to_env_script
                .as_deref()
                .map(expand_str),
            self.settings
                .venv_activate_path
                .as_deref()
                .map(expand_str),
        )
    }
}

impl From<&ConfigurationSection> for BuildConfiguration {
    fn from(s: &ConfigurationSection) -> Self {
        Self {
            name: s.name.clone(),
            active: s.active,
            board: s.board.clone(),
            conf_file: s.conf_file.clone(),
            extra_conf_files: s.extra_conf_files.clone(),
            extra_overlay_files: s.extra_overlay_files.clone(),
            extra_modules: s.extra_modules.clone(),
            shields: s.shields.clone(),
            snippets: s.snippets.clone(),
            west_args: s.west_args.clone(),
            sysbuild: s.sysbuild,
            default_runner: s.default_runner.clone(),
        }
    }
}

fn expand_str(path: &str) -> String {
    shellexpand::tilde(path).into_owned()
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(expand_str(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[settings]
path_to_env_script = "/opt/zephyr/env.sh"

[sdk]
root = "/opt/zephyr-sdk"

[workspace]
root = "/home/dev/zephyrproject"
board_roots = ["/home/dev/boards"]

[project]
shields = ["x_nucleo_iks01a3"]

[[configuration]]
name = "debug"
board = "nucleo_f401re"
active = true
conf_file = "prj.conf"

[[configuration]]
name = "release"
board = "nucleo_f401re"
sysbuild = true
"#;

    fn write_settings(dir: &TempDir, content: &str) {
        let mut f = std::fs::File::create(dir.path().join(SETTINGS_FILENAME)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn loads_full_settings_file() {
        let dir = TempDir::new().unwrap();
        write_settings(&dir, SAMPLE);
        let settings = Settings::load(dir.path()).unwrap();

        let workspace = settings.workspace().unwrap();
        assert_eq!(
            workspace.kernel_dir,
            PathBuf::from("/home/dev/zephyrproject/zephyr")
        );
        assert_eq!(workspace.board_roots, vec!["/home/dev/boards".to_string()]);

        let project = settings.project(dir.path());
        assert_eq!(project.configs.len(), 2);
        assert_eq!(project.active_config().map(|c| c.name.as_str()), Some("debug"));
        assert!(project.config("release").is_some_and(|c| c.sysbuild));

        let env = settings.resolved_environment();
        assert_eq!(env.env_script.as_deref(), Some("/opt/zephyr/env.sh"));
    }

    #[test]
    fn project_file_overrides_user_level_settings() {
        let user: Settings = toml::from_str(
            "[settings]\nshell = \"bash\"\npath_to_env_script = \"/opt/env.sh\"\n\n[sdk]\nroot = \"/opt/sdk\"\n",
        )
        .unwrap();
        let project: Settings = toml::from_str(
            "[settings]\nshell = \"zsh\"\n\n[[configuration]]\nname = \"debug\"\nboard = \"b\"\n",
        )
        .unwrap();

        let merged = user.overlay(project);
        assert_eq!(merged.settings.shell.as_deref(), Some("zsh"));
        assert_eq!(
            merged.settings.path_to_env_script.as_deref(),
            Some("/opt/env.sh")
        );
        assert_eq!(merged.sdk.unwrap().root, "/opt/sdk");
        assert_eq!(merged.configurations.len(), 1);
    }

    #[test]
    fn missing_file_is_a_distinct_error() {
        let dir = TempDir::new().unwrap();
        let err = Settings::load(dir.path()).unwrap_err();
        assert!(matches!(err, SettingsError::NotFound { .. }));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        write_settings(&dir, "[settings]\nshel = \"bash\"\n");
        let err = Settings::load(dir.path()).unwrap_err();
        assert!(matches!(err, SettingsError::TomlParse { .. }));
    }

    #[test]
    fn missing_workspace_section_is_reported() {
        let dir = TempDir::new().unwrap();
        write_settings(&dir, "[project]\n");
        let settings = Settings::load(dir.path()).unwrap();
        assert!(matches!(
            settings.workspace().unwrap_err(),
            SettingsError::MissingWorkspace { .. }
        ));
    }
}
