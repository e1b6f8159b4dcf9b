// src/system/executor.rs

use crate::{
    CancellationToken,
    cli::handlers::commons,
    constants::{SETTING_ENV_SCRIPT, SETTING_VENV_ACTIVATE},
    models::ResolvedEnvironment,
    system::shell,
};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command as StdCommand, Stdio};
use std::thread;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("No environment activation script is configured, or it does not exist: '{path}'.")]
    MissingEnvScript { path: String },
    #[error("The configured virtual environment activation script does not exist: '{path}'.")]
    MissingVenv { path: String },
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Command '{command}' could not be executed: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Command '{command}' exited with status {code}.")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },
    #[error("Command '{command}' produced output that was not valid UTF-8")]
    InvalidUtf8Output {
        command: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
    #[error("Operation was cancelled by the user.")]
    Interrupted,
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecutionError {
    /// Stable cause tag for precondition failures, used by callers that map
    /// errors to remediation hints.
    pub fn cause(&self) -> Option<&'static str> {
        match self {
            Self::MissingEnvScript { .. } => Some(SETTING_ENV_SCRIPT),
            Self::MissingVenv { .. } => Some(SETTING_VENV_ACTIVATE),
            Self::EmptyCommand => Some(crate::constants::CAUSE_MISSING_COMMAND),
            _ => None,
        }
    }
}

/// One executable unit: payload text, working directory and composed
/// environment. Constructed per invocation and never reused.
#[derive(Debug, Clone)]
pub struct CommandSpec<'a> {
    pub payload: String,
    pub cwd: &'a Path,
    pub env: HashMap<String, String>,
    /// Suppress activation-script chatter with a shell null redirect.
    pub silent: bool,
}

/// Prefixes the payload with the activation chain for the resolved shell.
///
/// Preconditions are enforced here rather than at spawn time so that a
/// misconfiguration surfaces as a distinct error before any process starts:
/// the activation script must exist, the virtual environment (when
/// configured) must exist, and the payload must be non-empty.
pub fn compose_payload(
    renv: &ResolvedEnvironment,
    payload: &str,
    silent: bool,
) -> Result<String, ExecutionError> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(ExecutionError::EmptyCommand);
    }

    let script = renv
        .env_script
        .as_deref()
        .ok_or_else(|| ExecutionError::MissingEnvScript {
            path: "<unset>".to_string(),
        })?;
    if !Path::new(script).is_file() {
        return Err(ExecutionError::MissingEnvScript {
            path: script.to_string(),
        });
    }

    // The venv path is a marker consumed by the activation script, not a
    // command of its own; only its existence is checked here.
    if let Some(venv) = renv.venv_activate.as_deref()
        && !Path::new(venv).is_file()
    {
        return Err(ExecutionError::MissingVenv {
            path: venv.to_string(),
        });
    }

    let activation = activation_part(renv, script, silent);
    Ok(shell::concat(renv.kind, &[&activation, payload]))
}

fn activation_part(renv: &ResolvedEnvironment, script: &str, silent: bool) -> String {
    let normalized = shell::normalize_path(renv.kind, script);
    let source = shell::source_command(renv.kind, &normalized);
    if silent {
        format!("{} {}", source, shell::null_redirect(renv.kind))
    } else {
        source
    }
}

fn shell_command(renv: &ResolvedEnvironment, spec: &CommandSpec<'_>, composed: &str) -> StdCommand {
    let mut command = StdCommand::new(&renv.shell_exe);
    if renv.cygwin {
        command.args(shell::cygwin_login_args());
    }
    command.args(shell::shell_args(renv.kind));
    command.arg(composed);
    command.current_dir(dunce::simplified(spec.cwd));
    command.envs(&spec.env);
    command.envs(shell::session_env(renv.cygwin));
    if let Some(venv) = renv.venv_activate.as_deref() {
        command.env(
            crate::constants::PYTHON_VENV_ACTIVATE_PATH,
            shell::normalize_path(renv.kind, venv),
        );
    }
    command
}

/// Spawns the command with inherited stdio and hands the child back to the
/// caller, which owns waiting and teardown.
pub fn run_task(
    renv: &ResolvedEnvironment,
    spec: &CommandSpec<'_>,
) -> Result<Child, ExecutionError> {
    let composed = compose_payload(renv, &spec.payload, spec.silent)?;
    log::debug!("Spawning in '{}': {}", spec.cwd.display(), composed);
    shell_command(renv, spec, &composed)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| ExecutionError::Spawn {
            command: spec.payload.clone(),
            source: e,
        })
}

/// Runs the command with inherited stdio until it exits, polling for
/// cancellation. On cancellation the child is killed and reaped.
pub fn run_and_wait(
    renv: &ResolvedEnvironment,
    spec: &CommandSpec<'_>,
    cancellation_token: &CancellationToken,
) -> Result<(), ExecutionError> {
    let mut child = run_task(renv, spec)?;
    let status = wait_with_cancellation(&mut child, cancellation_token)?;
    if status != 0 {
        return Err(ExecutionError::NonZeroExit {
            command: spec.payload.clone(),
            code: status,
            stderr: String::new(),
        });
    }
    Ok(())
}

/// Runs the command with piped stdout/stderr, polling for cancellation, and
/// returns the captured stdout. On a non-zero exit the captured stderr is
/// carried in the error for display.
pub fn run_captured(
    renv: &ResolvedEnvironment,
    spec: &CommandSpec<'_>,
    cancellation_token: &CancellationToken,
) -> Result<String, ExecutionError> {
    commons::check_for_cancellation(cancellation_token)
        .map_err(|_| ExecutionError::Interrupted)?;

    let composed = compose_payload(renv, &spec.payload, spec.silent)?;
    log::debug!("Capturing in '{}': {}", spec.cwd.display(), composed);
    let mut child = shell_command(renv, spec, &composed)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ExecutionError::Spawn {
            command: spec.payload.clone(),
            source: e,
        })?;

    // Drain the pipes on background threads so a chatty child cannot
    // deadlock against a full pipe buffer while we poll try_wait.
    let stdout_reader = child.stdout.take().map(spawn_reader);
    let stderr_reader = child.stderr.take().map(spawn_reader);

    let status = wait_with_cancellation(&mut child, cancellation_token)?;

    let stdout_bytes = join_reader(stdout_reader);
    let stderr_bytes = join_reader(stderr_reader);

    if status != 0 {
        return Err(ExecutionError::NonZeroExit {
            command: spec.payload.clone(),
            code: status,
            stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
        });
    }

    String::from_utf8(stdout_bytes).map_err(|e| ExecutionError::InvalidUtf8Output {
        command: spec.payload.clone(),
        source: e,
    })
}

fn spawn_reader<R: Read + Send + 'static>(mut source: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        source.read_to_end(&mut buf).ok();
        buf
    })
}

fn join_reader(handle: Option<thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Non-blocking wait loop; kills and reaps the child when cancellation is
/// requested. Returns the exit code, with killed-by-signal mapped to 130.
fn wait_with_cancellation(
    child: &mut Child,
    cancellation_token: &CancellationToken,
) -> Result<i32, ExecutionError> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                return Ok(status.code().unwrap_or(130));
            }
            Ok(None) => {
                if commons::check_for_cancellation(cancellation_token).is_err() {
                    log::debug!(
                        "Cancellation requested, killing child process (PID: {})...",
                        child.id()
                    );
                    if let Err(e) = child.kill() {
                        log::warn!("Failed to kill child process {}: {}", child.id(), e);
                    }
                    child.wait().ok();
                    return Err(ExecutionError::Interrupted);
                }
                thread::sleep(Duration::from_millis(100));
            }
            Err(e) => return Err(ExecutionError::Io(e)),
        }
    }
}
