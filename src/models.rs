// src/models.rs

use crate::{
    constants::BUILD_DIRNAME,
    core::env::EnvironmentLayer,
    system::shell::{self, ShellKind},
};
use std::path::{Path, PathBuf};

/// Toolchain/SDK installation: lowest-precedence environment layer.
#[derive(Debug, Clone)]
pub struct Sdk {
    pub root: PathBuf,
}

impl Sdk {
    pub fn layer(&self) -> EnvironmentLayer {
        let mut layer = EnvironmentLayer::new("sdk");
        layer.set("ZEPHYR_SDK_INSTALL_DIR", self.root.display().to_string());
        layer
    }
}

/// A west-style workspace: the checked-out kernel tree plus the base
/// directory roots (arch/soc/board/DTS) the build tool searches.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    /// Kernel tree inside the workspace (the `ZEPHYR_BASE` directory).
    pub kernel_dir: PathBuf,
    pub arch_roots: Vec<String>,
    pub soc_roots: Vec<String>,
    pub board_roots: Vec<String>,
    pub dts_roots: Vec<String>,
}

impl Workspace {
    pub fn layer(&self) -> EnvironmentLayer {
        let mut layer = EnvironmentLayer::new("workspace");
        layer.set("ZEPHYR_BASE", self.kernel_dir.display().to_string());
        layer.set(
            "ZEPHYR_PROJECT_DIRECTORY",
            self.root.display().to_string(),
        );
        layer.set_list_if_any("ARCH_ROOT", &self.arch_roots);
        layer.set_list_if_any("SOC_ROOT", &self.soc_roots);
        layer.set_list_if_any("BOARD_ROOT", &self.board_roots);
        layer.set_list_if_any("DTS_ROOT", &self.dts_roots);
        layer
    }

    pub fn snippets_dir(&self) -> PathBuf {
        self.kernel_dir.join(crate::constants::SNIPPETS_DIRNAME)
    }
}

/// An application project: extension-point variables plus its named build
/// configurations.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub extra_conf_files: Vec<String>,
    pub extra_overlay_files: Vec<String>,
    pub extra_modules: Vec<String>,
    pub shields: Vec<String>,
    pub snippets: Vec<String>,
    pub west_args: String,
    pub configs: Vec<BuildConfiguration>,
}

impl Project {
    pub fn layer(&self) -> EnvironmentLayer {
        let mut layer = EnvironmentLayer::new("project");
        layer.set_list_if_any("EXTRA_CONF_FILE", &self.extra_conf_files);
        layer.set_list_if_any("EXTRA_DTC_OVERLAY_FILE", &self.extra_overlay_files);
        layer.set_list_if_any("EXTRA_ZEPHYR_MODULES", &self.extra_modules);
        layer.set_list_if_any("SHIELD", &self.shields);
        layer.set_list_if_any("SNIPPETS", &self.snippets);
        layer
    }

    pub fn folder_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The active configuration: first marked active, else the first one.
    pub fn active_config(&self) -> Option<&BuildConfiguration> {
        self.configs
            .iter()
            .find(|c| c.active)
            .or_else(|| self.configs.first())
    }

    pub fn config(&self, name: &str) -> Option<&BuildConfiguration> {
        self.configs.iter().find(|c| c.name == name)
    }

    /// Index of a configuration by name, used for task rebinding.
    pub fn config_index(&self, name: &str) -> Option<usize> {
        self.configs.iter().position(|c| c.name == name)
    }
}

/// A named, board-bound build variant of a project with its own build
/// directory and per-configuration environment overrides.
#[derive(Debug, Clone)]
pub struct BuildConfiguration {
    pub name: String,
    pub active: bool,
    pub board: String,
    pub conf_file: String,
    pub extra_conf_files: Vec<String>,
    pub extra_overlay_files: Vec<String>,
    pub extra_modules: Vec<String>,
    pub shields: Vec<String>,
    pub snippets: Vec<String>,
    pub west_args: String,
    pub sysbuild: bool,
    pub default_runner: Option<String>,
}

impl BuildConfiguration {
    pub fn build_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(BUILD_DIRNAME).join(&self.name)
    }

    /// The build-configuration environment layer.
    ///
    /// When sysbuild is active, `CONF_FILE` and `EXTRA_CONF_FILE` are
    /// deleted from this layer rather than merged: sysbuild manages them
    /// itself and passing them through would double-apply configuration.
    pub fn layer(&self, project_root: &Path) -> EnvironmentLayer {
        let mut layer = EnvironmentLayer::new("build-config");
        layer.set("BOARD", self.board.clone());
        layer.set(
            "BUILD_DIR",
            self.build_dir(project_root).display().to_string(),
        );
        layer.set_if_nonempty("WEST_ARGS", &self.west_args);

        if self.sysbuild {
            layer.delete("CONF_FILE");
            layer.delete("EXTRA_CONF_FILE");
        } else {
            layer.set_if_nonempty("CONF_FILE", &self.conf_file);
            layer.set_list_if_any("EXTRA_CONF_FILE", &self.extra_conf_files);
        }
        layer.set_list_if_any("EXTRA_DTC_OVERLAY_FILE", &self.extra_overlay_files);
        layer.set_list_if_any("EXTRA_ZEPHYR_MODULES", &self.extra_modules);
        layer.set_list_if_any("SHIELD", &self.shields);
        layer.set_list_if_any("SNIPPETS", &self.snippets);
        layer
    }
}

/// Where a command runs: against a project (full layer stack, project cwd)
/// or against a bare workspace (workspace layer only, workspace cwd).
/// Selected once at the call boundary.
#[derive(Debug, Clone, Copy)]
pub enum ExecutionContext<'a> {
    Project {
        sdk: Option<&'a Sdk>,
        workspace: &'a Workspace,
        project: &'a Project,
        config: Option<&'a BuildConfiguration>,
    },
    Workspace { workspace: &'a Workspace },
}

impl<'a> ExecutionContext<'a> {
    pub fn cwd(&self) -> &'a Path {
        match self {
            Self::Project { project, .. } => &project.root,
            Self::Workspace { workspace } => &workspace.root,
        }
    }

    /// Environment layers in ascending precedence for this context.
    pub fn layers(&self) -> Vec<EnvironmentLayer> {
        match self {
            Self::Project {
                sdk,
                workspace,
                project,
                config,
            } => {
                let mut layers = Vec::new();
                if let Some(sdk) = sdk {
                    layers.push(sdk.layer());
                }
                layers.push(workspace.layer());
                layers.push(project.layer());
                if let Some(cfg) = config {
                    layers.push(cfg.layer(&project.root));
                }
                layers
            }
            Self::Workspace { workspace } => vec![workspace.layer()],
        }
    }
}

/// Shell and activation facts resolved once per invocation and passed down.
/// Nothing below the CLI boundary performs ambient settings lookups.
#[derive(Debug, Clone)]
pub struct ResolvedEnvironment {
    pub shell_exe: String,
    pub kind: ShellKind,
    pub cygwin: bool,
    /// Activation script that sets up the toolchain environment; sourced at
    /// the start of every command.
    pub env_script: Option<String>,
    /// Optional Python virtual-environment activation marker.
    pub venv_activate: Option<String>,
}

impl ResolvedEnvironment {
    pub fn new(shell_exe: String, env_script: Option<String>, venv_activate: Option<String>) -> Self {
        let kind = shell::classify(&shell_exe);
        let cygwin = shell::is_cygwin(&shell_exe);
        Self {
            shell_exe,
            kind,
            cygwin,
            env_script,
            venv_activate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::env::compose;
    use std::path::PathBuf;

    fn config(sysbuild: bool) -> BuildConfiguration {
        BuildConfiguration {
            name: "debug".to_string(),
            active: true,
            board: "nucleo_f401re".to_string(),
            conf_file: "prj.conf".to_string(),
            extra_conf_files: vec!["extra.conf".to_string()],
            extra_overlay_files: vec![],
            extra_modules: vec![],
            shields: vec![],
            snippets: vec![],
            west_args: String::new(),
            sysbuild,
            default_runner: None,
        }
    }

    #[test]
    fn build_dir_is_under_project_build_root() {
        let cfg = config(false);
        assert_eq!(
            cfg.build_dir(Path::new("/proj")),
            PathBuf::from("/proj/build/debug")
        );
    }

    #[test]
    fn sysbuild_deletes_conf_keys_from_layer() {
        let root = Path::new("/proj");
        let plain = config(false).layer(root);
        assert!(plain.contains("CONF_FILE"));
        assert!(plain.contains("EXTRA_CONF_FILE"));

        let sys = config(true).layer(root);
        assert!(!sys.contains("CONF_FILE"));
        assert!(!sys.contains("EXTRA_CONF_FILE"));
        assert!(sys.contains("BOARD"));

        // A lower layer carrying the keys must not survive composition.
        let mut lower = crate::core::env::EnvironmentLayer::new("project");
        lower.set("EXTRA_CONF_FILE", "from-project.conf");
        let composed = compose(&[lower, sys]);
        assert!(!composed.contains_key("CONF_FILE"));
        assert!(!composed.contains_key("EXTRA_CONF_FILE"));
    }

    #[test]
    fn active_config_prefers_flagged_entry() {
        let mut a = config(false);
        a.name = "a".to_string();
        a.active = false;
        let mut b = config(false);
        b.name = "b".to_string();
        let project = Project {
            root: PathBuf::from("/proj"),
            extra_conf_files: vec![],
            extra_overlay_files: vec![],
            extra_modules: vec![],
            shields: vec![],
            snippets: vec![],
            west_args: String::new(),
            configs: vec![a, b],
        };
        assert_eq!(project.active_config().map(|c| c.name.as_str()), Some("b"));
        assert_eq!(project.config_index("b"), Some(1));
    }
}
