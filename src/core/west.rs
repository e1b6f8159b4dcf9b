// src/core/west.rs
//
// The operations layer: turns domain objects into `west` command lines and
// runs them through the executor. Command text is assembled with the
// resolved shell's path conventions so the same code serves posix shells,
// cmd and PowerShell.

use crate::{
    CancellationToken,
    constants::TMP_DIRNAME,
    core::{
        env::compose,
        parsers::{dir_list, name_list, runners},
        tasks_file::TaskDescriptor,
    },
    models::{
        BuildConfiguration, ExecutionContext, Project, ResolvedEnvironment, Sdk, Workspace,
    },
    system::{
        executor::{self, CommandSpec},
        shell::{self, ShellKind},
    },
};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

// --- COMMAND TEXT BUILDERS ---

fn quoted(kind: ShellKind, path: &Path) -> String {
    shell::normalize_path(kind, &path.display().to_string())
}

pub fn build_command(
    kind: ShellKind,
    project_dir: &Path,
    config: &BuildConfiguration,
    pristine: bool,
    extra_args: &[String],
) -> String {
    let mut parts = vec![
        "west build".to_string(),
        format!("-p {}", if pristine { "always" } else { "auto" }),
        format!("--board {}", config.board),
        format!("--build-dir {}", quoted(kind, &config.build_dir(project_dir))),
    ];
    if config.sysbuild {
        parts.push("--sysbuild".to_string());
    }
    for snippet in &config.snippets {
        parts.push(format!("-S {snippet}"));
    }
    if !config.west_args.is_empty() {
        parts.push(config.west_args.clone());
    }
    parts.push(quoted(kind, project_dir));
    if !extra_args.is_empty() {
        parts.push("--".to_string());
        parts.push(join_extra_args(kind, extra_args));
    }
    parts.join(" ")
}

// Passthrough args are re-quoted for posix-family shells; cmd and
// PowerShell get the verbatim join since posix quoting would corrupt them.
fn join_extra_args(kind: ShellKind, extra_args: &[String]) -> String {
    if kind.is_posix_family() {
        shlex::try_join(extra_args.iter().map(String::as_str))
            .unwrap_or_else(|_| extra_args.join(" "))
    } else {
        extra_args.join(" ")
    }
}

pub fn flash_command(kind: ShellKind, build_dir: &Path, runner: Option<&str>) -> String {
    let mut command = format!("west flash --build-dir {}", quoted(kind, build_dir));
    if let Some(runner) = runner {
        command.push_str(&format!(" --runner {runner}"));
    }
    command
}

/// A `west build -t <target>` invocation. Some targets (hardenconfig) fail
/// when the project source path is passed, so it is optional.
pub fn target_command(
    kind: ShellKind,
    build_dir: &Path,
    project_dir: Option<&Path>,
    target: &str,
) -> String {
    let mut command = format!(
        "west build --build-dir {} -t {target}",
        quoted(kind, build_dir)
    );
    if let Some(dir) = project_dir {
        command.push_str(&format!(" {}", quoted(kind, dir)));
    }
    command
}

pub fn boards_command(kind: ShellKind, board_roots: &[String]) -> String {
    let mut command = "west boards -f \"{dir}\"".to_string();
    for root in board_roots {
        command.push_str(&format!(
            " --board-root {}",
            shell::normalize_path(kind, root)
        ));
    }
    command
}

/// The command line for a managed task descriptor bound to a concrete
/// configuration. The binding resolves the descriptor's placeholders, so
/// the same labels that live in the task file can run against any
/// configuration without touching the file.
pub fn bound_task_payload(
    descriptor: &TaskDescriptor,
    project: &Project,
    config: &BuildConfiguration,
) -> String {
    let mut parts = vec![descriptor.command.to_string()];
    parts.extend(descriptor.bind(project, config));
    parts.join(" ")
}

// --- OPERATIONS ---

/// One invocation's view of the tool: resolved shell facts plus the domain
/// objects every operation needs. Owns no mutable state.
#[derive(Debug, Clone, Copy)]
pub struct West<'a> {
    renv: &'a ResolvedEnvironment,
    sdk: Option<&'a Sdk>,
    workspace: &'a Workspace,
    project: &'a Project,
}

impl<'a> West<'a> {
    pub fn new(
        renv: &'a ResolvedEnvironment,
        sdk: Option<&'a Sdk>,
        workspace: &'a Workspace,
        project: &'a Project,
    ) -> Self {
        Self {
            renv,
            sdk,
            workspace,
            project,
        }
    }

    fn context(&self, config: Option<&'a BuildConfiguration>) -> ExecutionContext<'a> {
        ExecutionContext::Project {
            sdk: self.sdk,
            workspace: self.workspace,
            project: self.project,
            config,
        }
    }

    fn env_for(&self, config: Option<&BuildConfiguration>) -> HashMap<String, String> {
        let ctx = ExecutionContext::Project {
            sdk: self.sdk,
            workspace: self.workspace,
            project: self.project,
            config,
        };
        compose(&ctx.layers())
    }

    fn spec(
        &self,
        payload: String,
        config: Option<&'a BuildConfiguration>,
        silent: bool,
    ) -> CommandSpec<'a> {
        let ctx = self.context(config);
        CommandSpec {
            payload,
            cwd: ctx.cwd(),
            env: self.env_for(config),
            silent,
        }
    }

    fn run(
        &self,
        payload: String,
        config: Option<&'a BuildConfiguration>,
        token: &CancellationToken,
    ) -> Result<(), executor::ExecutionError> {
        let spec = self.spec(payload, config, false);
        executor::run_and_wait(self.renv, &spec, token)
    }

    fn capture(
        &self,
        payload: String,
        config: Option<&'a BuildConfiguration>,
        token: &CancellationToken,
    ) -> Result<String, executor::ExecutionError> {
        let spec = self.spec(payload, config, true);
        executor::run_captured(self.renv, &spec, token)
    }

    pub fn build(
        &self,
        config: &'a BuildConfiguration,
        pristine: bool,
        extra_args: &[String],
        token: &CancellationToken,
    ) -> Result<()> {
        let payload = build_command(
            self.renv.kind,
            &self.project.root,
            config,
            pristine,
            extra_args,
        );
        self.run(payload, Some(config), token)
            .with_context(|| format!("Build of configuration '{}' failed", config.name))
    }

    pub fn flash(
        &self,
        config: &'a BuildConfiguration,
        runner: Option<&str>,
        token: &CancellationToken,
    ) -> Result<()> {
        let runner = runner.or(config.default_runner.as_deref());
        let payload = flash_command(
            self.renv.kind,
            &config.build_dir(&self.project.root),
            runner,
        );
        self.run(payload, Some(config), token)
            .with_context(|| format!("Flash of configuration '{}' failed", config.name))
    }

    /// Runs an interactive or report build target (menuconfig, guiconfig,
    /// hardenconfig, ram_report, rom_report, puncover).
    pub fn run_target(
        &self,
        config: &'a BuildConfiguration,
        target: &str,
        token: &CancellationToken,
    ) -> Result<()> {
        // hardenconfig rejects a positional source path.
        let project_dir = (target != "hardenconfig").then_some(self.project.root.as_path());
        let payload = target_command(
            self.renv.kind,
            &config.build_dir(&self.project.root),
            project_dir,
            target,
        );
        self.run(payload, Some(config), token)
            .with_context(|| format!("Target '{target}' failed for configuration '{}'", config.name))
    }

    /// Runs a managed task by label, bound against the given configuration.
    pub fn run_bound_task(
        &self,
        descriptor: &TaskDescriptor,
        config: &'a BuildConfiguration,
        token: &CancellationToken,
    ) -> Result<()> {
        let payload = bound_task_payload(descriptor, self.project, config);
        self.run(payload, Some(config), token)
            .with_context(|| format!("Task '{}' failed", descriptor.label))
    }

    /// Lists board definition directories across the workspace's board
    /// roots, keeping only paths that exist locally.
    pub fn boards(&self, token: &CancellationToken) -> Result<Vec<String>> {
        let payload = boards_command(self.renv.kind, &self.workspace.board_roots);
        let stdout = self
            .capture(payload, None, token)
            .context("Could not list boards")?;
        Ok(dir_list::parse_existing(&stdout))
    }

    pub fn shields(&self, token: &CancellationToken) -> Result<Vec<String>> {
        let stdout = self
            .capture("west shields".to_string(), None, token)
            .context("Could not list shields")?;
        Ok(name_list::parse(&stdout))
    }

    /// Lists snippets via the tool, falling back to the workspace snippets
    /// directory when the subcommand is unavailable in the checked-out tree.
    pub fn snippets(&self, token: &CancellationToken) -> Result<Vec<String>> {
        match self.capture("west snippets list".to_string(), None, token) {
            Ok(stdout) => Ok(name_list::parse(&stdout)),
            Err(e) => {
                log::debug!("Snippet listing failed ({e}), falling back to directory scan.");
                self.snippets_from_dir()
            }
        }
    }

    fn snippets_from_dir(&self) -> Result<Vec<String>> {
        let dir = self.workspace.snippets_dir();
        let mut names = Vec::new();
        let entries = fs::read_dir(&dir)
            .with_context(|| format!("Could not read snippets directory '{}'", dir.display()))?;
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Discovers the flash runners usable with a configuration by probing a
    /// throwaway build: generates the runner properties target in a
    /// temporary build directory, asks the flash subcommand for its report
    /// and parses it. The temporary directory is removed even when the
    /// probe fails or is cancelled.
    pub fn discover_runners(
        &self,
        config: &'a BuildConfiguration,
        token: &CancellationToken,
    ) -> Result<runners::RunnerReport> {
        let tmp_dir = self
            .project
            .root
            .join(TMP_DIRNAME)
            .join("flash-runners")
            .join(&config.name);
        fs::create_dir_all(&tmp_dir)
            .with_context(|| format!("Could not create '{}'", tmp_dir.display()))?;
        let cleanup_dir = tmp_dir.clone();
        scopeguard::defer! {
            if let Err(e) = fs::remove_dir_all(&cleanup_dir) {
                log::warn!("Could not remove '{}': {}", cleanup_dir.display(), e);
            }
        }

        let probe = format!(
            "west build --board {} --build-dir {} -t runners_yaml_props_target {}",
            config.board,
            quoted(self.renv.kind, &tmp_dir),
            quoted(self.renv.kind, &self.project.root),
        );
        self.capture(probe, Some(config), token)
            .context("Runner probe build failed")?;

        let report_cmd = format!(
            "west flash --build-dir {} -H",
            quoted(self.renv.kind, &tmp_dir)
        );
        let stdout = self
            .capture(report_cmd, Some(config), token)
            .context("Could not read the flash runner report")?;
        Ok(runners::parse(&stdout)?)
    }

    /// Produces an SPDX software bill of materials: the build directory is
    /// recreated from scratch because SPDX initialization must observe the
    /// whole build.
    pub fn spdx(&self, config: &'a BuildConfiguration, token: &CancellationToken) -> Result<()> {
        let build_dir = config.build_dir(&self.project.root);
        if build_dir.exists() {
            fs::remove_dir_all(&build_dir)
                .with_context(|| format!("Could not remove '{}'", build_dir.display()))?;
        }
        let quoted_dir = quoted(self.renv.kind, &build_dir);

        self.run(
            format!("west spdx --init -d {quoted_dir}"),
            Some(config),
            token,
        )
        .context("SPDX initialization failed")?;
        self.build(config, false, &[], token)?;
        self.run(format!("west spdx -d {quoted_dir}"), Some(config), token)
            .context("SPDX generation failed")
    }

    /// `west update` against the workspace.
    pub fn update(&self, token: &CancellationToken) -> Result<()> {
        let spec = CommandSpec {
            payload: "west update".to_string(),
            cwd: &self.workspace.root,
            env: self.env_for(None),
            silent: false,
        };
        executor::run_and_wait(self.renv, &spec, token).context("Workspace update failed")
    }
}

/// `west init` for a fresh workspace; runs before any project exists.
pub fn init_workspace(
    renv: &ResolvedEnvironment,
    workspace: &Workspace,
    manifest_url: Option<&str>,
    token: &CancellationToken,
) -> Result<()> {
    let mut payload = "west init".to_string();
    if let Some(url) = manifest_url {
        payload.push_str(&format!(" -m {url}"));
    }
    payload.push_str(&format!(
        " {}",
        quoted(renv.kind, &workspace.root)
    ));
    let ctx = ExecutionContext::Workspace { workspace };
    let spec = CommandSpec {
        payload,
        cwd: ctx.cwd(),
        env: compose(&ctx.layers()),
        silent: false,
    };
    executor::run_and_wait(renv, &spec, token).context("Workspace initialization failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config() -> BuildConfiguration {
        BuildConfiguration {
            name: "debug".to_string(),
            active: true,
            board: "nucleo_f401re".to_string(),
            conf_file: String::new(),
            extra_conf_files: vec![],
            extra_overlay_files: vec![],
            extra_modules: vec![],
            shields: vec![],
            snippets: vec![],
            west_args: String::new(),
            sysbuild: false,
            default_runner: None,
        }
    }

    #[test]
    fn build_command_has_fixed_flag_order() {
        let cmd = build_command(ShellKind::Posix, Path::new("/proj"), &config(), true, &[]);
        assert_eq!(
            cmd,
            "west build -p always --board nucleo_f401re --build-dir /proj/build/debug /proj"
        );
    }

    #[test]
    fn build_command_appends_sysbuild_snippets_and_passthrough() {
        let mut cfg = config();
        cfg.sysbuild = true;
        cfg.snippets = vec!["rtt-console".to_string()];
        let cmd = build_command(
            ShellKind::Posix,
            Path::new("/proj"),
            &cfg,
            false,
            &["-DDEBUG".to_string()],
        );
        assert_eq!(
            cmd,
            "west build -p auto --board nucleo_f401re --build-dir /proj/build/debug \
             --sysbuild -S rtt-console /proj -- -DDEBUG"
        );
    }

    #[test]
    fn passthrough_args_with_spaces_are_requoted() {
        let cmd = build_command(
            ShellKind::Posix,
            Path::new("/proj"),
            &config(),
            false,
            &["two words".to_string()],
        );
        assert!(cmd.ends_with("-- 'two words'"), "got: {cmd}");
    }

    #[test]
    fn paths_with_spaces_are_quoted() {
        let cmd = build_command(
            ShellKind::Posix,
            Path::new("/my projects/app"),
            &config(),
            false,
            &[],
        );
        assert!(cmd.contains("\"/my projects/app/build/debug\""));
        assert!(cmd.ends_with("\"/my projects/app\""));
    }

    #[test]
    fn flash_command_includes_runner_only_when_given() {
        let dir = PathBuf::from("/proj/build/debug");
        assert_eq!(
            flash_command(ShellKind::Posix, &dir, None),
            "west flash --build-dir /proj/build/debug"
        );
        assert_eq!(
            flash_command(ShellKind::Posix, &dir, Some("jlink")),
            "west flash --build-dir /proj/build/debug --runner jlink"
        );
    }

    #[test]
    fn hardenconfig_omits_the_source_path() {
        let dir = PathBuf::from("/proj/build/debug");
        let with_src = target_command(
            ShellKind::Posix,
            &dir,
            Some(Path::new("/proj")),
            "menuconfig",
        );
        assert!(with_src.ends_with("-t menuconfig /proj"));
        let without = target_command(ShellKind::Posix, &dir, None, "hardenconfig");
        assert!(without.ends_with("-t hardenconfig"));
    }

    #[test]
    fn boards_command_lists_every_board_root() {
        let cmd = boards_command(
            ShellKind::Posix,
            &["/roots/a".to_string(), "/roots/b".to_string()],
        );
        assert_eq!(
            cmd,
            "west boards -f \"{dir}\" --board-root /roots/a --board-root /roots/b"
        );
    }

    #[test]
    fn bound_task_payload_resolves_descriptor_placeholders() {
        let project = Project {
            root: PathBuf::from("/proj"),
            extra_conf_files: vec![],
            extra_overlay_files: vec![],
            extra_modules: vec![],
            shields: vec![],
            snippets: vec![],
            west_args: String::new(),
            configs: vec![],
        };
        let mut cfg = config();
        let Some(menuconfig) = crate::core::tasks_file::descriptor("Menuconfig") else {
            unreachable!("Menuconfig is a managed task");
        };
        assert_eq!(
            bound_task_payload(menuconfig, &project, &cfg),
            "west build --build-dir \"/proj/build/debug\" -t menuconfig"
        );

        let Some(flash) = crate::core::tasks_file::descriptor("West Flash") else {
            unreachable!("West Flash is a managed task");
        };
        assert_eq!(
            bound_task_payload(flash, &project, &cfg),
            "west flash --build-dir \"/proj/build/debug\""
        );
        cfg.default_runner = Some("jlink".to_string());
        assert_eq!(
            bound_task_payload(flash, &project, &cfg),
            "west flash --build-dir \"/proj/build/debug\" --runner jlink"
        );
    }
}
