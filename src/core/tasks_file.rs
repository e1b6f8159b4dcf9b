// src/core/tasks_file.rs
//
// Persistence of the shared task file (`.vscode/tasks.json`). The file is
// co-owned with the user: managed entries are identified by a fixed `type`
// constant and are only ever appended or edited in place. User-authored
// entries pass through every read-modify-write cycle untouched, and the
// file is rewritten only when the serialization actually changed.

use crate::{
    constants::{
        MANAGED_TASK_TYPE, RUNNER_INPUT_ID, TASKS_DIRNAME, TASKS_FILENAME, TASKS_FILE_VERSION,
    },
    models::{BuildConfiguration, Project},
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

lazy_static! {
    static ref CONFIG_INDEX_RE: Regex =
        Regex::new(r"\$\{config:westbench\.build\.configurations\.(\d+)\.").unwrap();
}

#[derive(Error, Debug)]
pub enum TasksError {
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error serializing task file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Placeholder tokens resolved by the host at task-run time. The
/// configuration index embedded in them is what `rebind` rewrites when the
/// active configuration changes.
pub const PLACEHOLDER_PRISTINE: &str = "${config:westbench.build.pristine}";
pub const PLACEHOLDER_BOARD: &str = "${config:westbench.build.configurations.0.board}";
pub const PLACEHOLDER_BUILD_DIR: &str =
    "\"${workspaceFolder}/build/${config:westbench.build.configurations.0.name}\"";
pub const PLACEHOLDER_RUNNER: &str = "${input:west.runner}";

/// Every runner backend the build tool ships, offered as the options of the
/// flash-time runner prompt.
pub const RUNNER_CATALOGUE: &[&str] = &[
    "arc-nsim",
    "blackmagicprobe",
    "bossac",
    "canopen_program",
    "dediprog",
    "dfu-util",
    "ecpprog",
    "esp32",
    "ezflashcli",
    "gd32isp",
    "hifive1",
    "intel_adsp",
    "intel_cyclonev",
    "jlink",
    "linkserver",
    "mdb-hw",
    "mdb-nsim",
    "minichlink",
    "misc-flasher",
    "native",
    "nios2",
    "nrfjprog",
    "nrfutil",
    "nsim",
    "nxp_s32dbg",
    "openocd",
    "probe_rs",
    "pyocd",
    "qemu",
    "renode",
    "renode-robot",
    "silabs_commander",
    "spi_burn",
    "stm32cubeprogrammer",
    "stm32flash",
    "teensy",
    "trace32",
    "uf2",
    "xsdb",
    "xtensa",
];

/// A managed task template. Persisted descriptors land in the task file;
/// the rest are executed directly through a dynamic binding and never
/// written to disk.
#[derive(Debug, Clone, Copy)]
pub struct TaskDescriptor {
    pub label: &'static str,
    pub command: &'static str,
    pub args: &'static [&'static str],
    pub persisted: bool,
}

pub const DESCRIPTORS: &[TaskDescriptor] = &[
    TaskDescriptor {
        label: "West Build",
        command: "west",
        args: &[
            "build",
            "-p",
            PLACEHOLDER_PRISTINE,
            "--board",
            PLACEHOLDER_BOARD,
            "--build-dir",
            PLACEHOLDER_BUILD_DIR,
        ],
        persisted: true,
    },
    TaskDescriptor {
        label: "West Rebuild",
        command: "west",
        args: &[
            "build",
            "-p",
            "always",
            "--board",
            PLACEHOLDER_BOARD,
            "--build-dir",
            PLACEHOLDER_BUILD_DIR,
        ],
        persisted: true,
    },
    TaskDescriptor {
        label: "West Flash",
        command: "west",
        args: &["flash", "--build-dir", PLACEHOLDER_BUILD_DIR, PLACEHOLDER_RUNNER],
        persisted: true,
    },
    TaskDescriptor {
        label: "SPDX Init",
        command: "west",
        args: &["spdx", "--init", "-d", PLACEHOLDER_BUILD_DIR],
        persisted: true,
    },
    TaskDescriptor {
        label: "Generate SPDX",
        command: "west",
        args: &["spdx", "-d", PLACEHOLDER_BUILD_DIR],
        persisted: true,
    },
    TaskDescriptor {
        label: "Menuconfig",
        command: "west",
        args: &["build", "--build-dir", PLACEHOLDER_BUILD_DIR, "-t", "menuconfig"],
        persisted: false,
    },
    TaskDescriptor {
        label: "Gui config",
        command: "west",
        args: &["build", "--build-dir", PLACEHOLDER_BUILD_DIR, "-t", "guiconfig"],
        persisted: false,
    },
    TaskDescriptor {
        label: "Harden Config",
        command: "west",
        args: &["build", "--build-dir", PLACEHOLDER_BUILD_DIR, "-t", "hardenconfig"],
        persisted: false,
    },
    TaskDescriptor {
        label: "West RAM Report",
        command: "west",
        args: &["build", "--build-dir", PLACEHOLDER_BUILD_DIR, "-t", "ram_report"],
        persisted: false,
    },
    TaskDescriptor {
        label: "West ROM Report",
        command: "west",
        args: &["build", "--build-dir", PLACEHOLDER_BUILD_DIR, "-t", "rom_report"],
        persisted: false,
    },
    TaskDescriptor {
        label: "Puncover",
        command: "west",
        args: &["build", "--build-dir", PLACEHOLDER_BUILD_DIR, "-t", "puncover"],
        persisted: false,
    },
];

pub fn descriptor(label: &str) -> Option<&'static TaskDescriptor> {
    DESCRIPTORS.iter().find(|d| d.label == label)
}

pub fn persisted_descriptors() -> impl Iterator<Item = &'static TaskDescriptor> {
    DESCRIPTORS.iter().filter(|d| d.persisted)
}

impl TaskDescriptor {
    /// The persisted JSON entry for this descriptor, bound to a named
    /// configuration through the index placeholders.
    pub fn to_entry(&self, config_name: &str) -> Value {
        json!({
            "label": self.label,
            "type": MANAGED_TASK_TYPE,
            "command": self.command,
            "args": self.args,
            "config": config_name,
        })
    }

    /// A temporary, unpersisted binding against a concrete configuration:
    /// placeholders are replaced with the real board and build directory so
    /// the task can run against a non-default configuration without adding
    /// an entry per configuration to the persisted file.
    pub fn bind(&self, project: &Project, config: &BuildConfiguration) -> Vec<String> {
        let build_dir = config.build_dir(&project.root).display().to_string();
        self.args
            .iter()
            .map(|arg| match *arg {
                PLACEHOLDER_PRISTINE => "auto".to_string(),
                PLACEHOLDER_BOARD => config.board.clone(),
                PLACEHOLDER_BUILD_DIR => format!("\"{build_dir}\""),
                // The runner option carries its own flag; without a default
                // runner it collapses to nothing and the tool decides.
                PLACEHOLDER_RUNNER => config
                    .default_runner
                    .as_deref()
                    .map(|r| format!("--runner {r}"))
                    .unwrap_or_default(),
                other => other.to_string(),
            })
            .filter(|arg| !arg.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TasksDocument {
    version: String,
    #[serde(default)]
    tasks: Vec<Value>,
    #[serde(default)]
    inputs: Vec<Value>,
    #[serde(flatten)]
    extra: serde_json::Map<String, Value>,
}

impl Default for TasksDocument {
    fn default() -> Self {
        Self {
            version: TASKS_FILE_VERSION.to_string(),
            tasks: Vec::new(),
            inputs: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }
}

/// The task file for one project: absent, loaded, possibly merged, then
/// committed. A corrupt file falls back to the default document in memory
/// but is never deleted from disk.
#[derive(Debug)]
pub struct TasksFile {
    path: PathBuf,
    doc: TasksDocument,
    /// Raw text read from disk, kept for the no-op-write check.
    prior: Option<String>,
}

impl TasksFile {
    pub fn path_for(project_root: &Path) -> PathBuf {
        project_root.join(TASKS_DIRNAME).join(TASKS_FILENAME)
    }

    pub fn load(project_root: &Path) -> Result<Self, TasksError> {
        let path = Self::path_for(project_root);
        if !path.is_file() {
            return Ok(Self {
                path,
                doc: TasksDocument::default(),
                prior: None,
            });
        }
        let raw = fs::read_to_string(&path)?;
        let doc = match serde_json::from_str(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!(
                    "Could not parse '{}' ({}), starting from an empty task list.",
                    path.display(),
                    e
                );
                TasksDocument::default()
            }
        };
        Ok(Self {
            path,
            doc,
            prior: Some(raw),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn has_task(&self, label: &str) -> bool {
        self.doc.tasks.iter().any(|task| {
            task.get("label").and_then(Value::as_str) == Some(label)
                && task.get("type").and_then(Value::as_str) == Some(MANAGED_TASK_TYPE)
        })
    }

    /// Appends any missing managed entry, keyed by (label, type). Existing
    /// entries, managed or user-authored, are left exactly as found.
    pub fn ensure_managed_entries(&mut self, config_name: &str) {
        for descriptor in persisted_descriptors() {
            if !self.has_task(descriptor.label) {
                log::debug!("Adding managed task '{}'", descriptor.label);
                self.doc.tasks.push(descriptor.to_entry(config_name));
            }
        }
    }

    /// Declares the shared runner-selection prompt if absent.
    pub fn ensure_runner_input(&mut self) {
        let present = self.doc.inputs.iter().any(|input| {
            input.get("id").and_then(Value::as_str) == Some(RUNNER_INPUT_ID)
        });
        if !present {
            // The empty option lets the tool pick its own default runner.
            let options: Vec<String> = std::iter::once(String::new())
                .chain(RUNNER_CATALOGUE.iter().map(|r| format!("--runner {r}")))
                .collect();
            self.doc.inputs.push(json!({
                "id": RUNNER_INPUT_ID,
                "type": "pickString",
                "description": "Runner used to flash the board.",
                "options": options,
                "default": "",
            }));
        }
    }

    /// Points every managed task at the active configuration: rewrites the
    /// bound configuration name and substitutes the configuration index in
    /// placeholder strings. Returns whether anything changed.
    pub fn rebind(&mut self, active_name: &str, active_index: usize) -> bool {
        let replacement = format!(
            "${{config:westbench.build.configurations.{active_index}."
        );
        let mut changed = false;
        for task in &mut self.doc.tasks {
            if task.get("type").and_then(Value::as_str) != Some(MANAGED_TASK_TYPE) {
                continue;
            }
            if task.get("config").and_then(Value::as_str) != Some(active_name) {
                if let Some(obj) = task.as_object_mut() {
                    obj.insert("config".to_string(), json!(active_name));
                    changed = true;
                }
            }
            if let Some(args) = task.get_mut("args").and_then(Value::as_array_mut) {
                for arg in args {
                    if let Some(text) = arg.as_str() {
                        // NoExpand: the replacement's own `${...}` must not
                        // be read as a capture-group reference.
                        let rebound = CONFIG_INDEX_RE
                            .replace_all(text, regex::NoExpand(replacement.as_str()))
                            .into_owned();
                        if rebound != text {
                            *arg = json!(rebound);
                            changed = true;
                        }
                    }
                }
            }
        }
        changed
    }

    /// Serializes and writes only when the result differs byte-for-byte
    /// from what was read. Returns whether a write happened; callers that
    /// get `true` should wait briefly before dependent commands so file
    /// watchers observe the change first.
    pub fn commit(&mut self) -> Result<bool, TasksError> {
        let serialized = serde_json::to_string_pretty(&self.doc)?;
        if self.prior.as_deref() == Some(serialized.as_str()) {
            log::debug!("Task file unchanged, skipping write.");
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, &serialized)?;
        log::debug!("Wrote task file '{}'", self.path.display());
        self.prior = Some(serialized);
        Ok(true)
    }
}
