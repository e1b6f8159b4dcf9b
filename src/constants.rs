// src/constants.rs

/// The name of the settings file at a project or workspace root.
pub const SETTINGS_FILENAME: &str = "westbench.toml";

/// Directory holding the persisted task file, relative to the project root.
pub const TASKS_DIRNAME: &str = ".vscode";

/// The persisted task description file inside [`TASKS_DIRNAME`].
pub const TASKS_FILENAME: &str = "tasks.json";

/// Schema version written into a freshly created task file.
pub const TASKS_FILE_VERSION: &str = "2.0.0";

/// `type` value marking a task entry as owned by this engine.
pub const MANAGED_TASK_TYPE: &str = "westbench";

/// Identifier of the shared runner-selection prompt in the task file.
pub const RUNNER_INPUT_ID: &str = "west.runner";

/// Root of per-configuration build output, relative to the project root.
pub const BUILD_DIRNAME: &str = "build";

/// Scratch directory for throwaway probe builds, relative to the project root.
pub const TMP_DIRNAME: &str = ".tmp";

/// Default kernel tree directory inside a workspace.
pub const ZEPHYR_DIRNAME: &str = "zephyr";

/// Directory under the workspace kernel tree listing snippets.
pub const SNIPPETS_DIRNAME: &str = "snippets";

/// Delay after writing the task file so a host file watcher can observe the
/// change before dependent commands run.
pub const WATCHER_SETTLE_DELAY_MS: u64 = 500;

// Settings keys surfaced as machine-readable cause tags on configuration
// errors, so a front end can jump straight to the offending setting.
pub const SETTING_ENV_SCRIPT: &str = "westbench.pathToEnvScript";
pub const SETTING_VENV_ACTIVATE: &str = "westbench.venv.activatePath";
pub const CAUSE_MISSING_COMMAND: &str = "missing.command";

/// Environment variable the activation script reads to locate the venv.
pub const PYTHON_VENV_ACTIVATE_PATH: &str = "PYTHON_VENV_ACTIVATE_PATH";
