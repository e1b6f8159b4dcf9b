// src/system/shell.rs

use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

lazy_static! {
    static ref CYGWIN_RE: Regex = Regex::new(r"(?i)\\cygwin[^\\]*\\bin\\bash\.exe$").unwrap();
    static ref DRIVE_RE: Regex = Regex::new(r"^([A-Za-z]):").unwrap();
    static ref CMD_VAR_RE: Regex = Regex::new(r"%(\w+)%").unwrap();
    static ref POSIX_VAR_RE: Regex = Regex::new(r"\$\{(\w+)\}").unwrap();
    static ref BAT_PS1_EXT_RE: Regex = Regex::new(r"(?i)\.(bat|ps1)$").unwrap();
    static ref BAT_SH_EXT_RE: Regex = Regex::new(r"(?i)\.(bat|sh)$").unwrap();
}

/// The shell family resolved once per invocation from the shell executable
/// path. Classification never fails; unknown executables degrade to the host
/// default rather than aborting the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    /// bash/zsh/dash/fish on a POSIX host.
    Posix,
    /// A POSIX shell (Git-Bash, Cygwin, MSYS) running on a Windows host.
    /// Same syntax as `Posix`, but paths arrive in Windows-native form and
    /// need drive-letter conversion.
    WinPosix,
    Cmd,
    PowerShell,
}

impl ShellKind {
    pub fn is_posix_family(self) -> bool {
        matches!(self, Self::Posix | Self::WinPosix)
    }
}

fn host_default() -> ShellKind {
    if cfg!(target_os = "windows") {
        ShellKind::Cmd
    } else {
        ShellKind::Posix
    }
}

/// Default shell executable when nothing is configured.
pub fn default_shell_exe() -> &'static str {
    if cfg!(target_os = "windows") {
        r"C:\Windows\System32\cmd.exe"
    } else {
        "/bin/bash"
    }
}

fn looks_windows_native(path: &str) -> bool {
    path.contains('\\') || DRIVE_RE.is_match(path)
}

/// Classifies a shell executable path into a [`ShellKind`].
///
/// Matching is on the lowercased base name, extension-insensitive. A
/// posix-family shell addressed by a Windows-native path (or running on a
/// Windows host) classifies as [`ShellKind::WinPosix`] because its path and
/// line-ending conventions differ from a native POSIX shell.
pub fn classify(shell_exe: &str) -> ShellKind {
    let base = Path::new(shell_exe)
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let exe = base.trim_end_matches(".exe");

    if exe.contains("pwsh") || exe.contains("powershell") {
        return ShellKind::PowerShell;
    }
    if exe.contains("cmd") {
        return ShellKind::Cmd;
    }

    let posix = exe.contains("zsh")
        || exe.contains("fish")
        || exe.contains("dash")
        || exe.contains("bash")
        || exe == "sh";
    if posix {
        if cfg!(target_os = "windows") || looks_windows_native(shell_exe) {
            return ShellKind::WinPosix;
        }
        return ShellKind::Posix;
    }

    log::debug!("Unknown shell executable '{shell_exe}', using host default");
    host_default()
}

/// Whether the shell executable is a Cygwin bash. Cygwin needs `--login -i`
/// spawn args plus `CHERE_INVOKING=1` so the shell opens in the invoking
/// working directory instead of the user's home.
pub fn is_cygwin(shell_exe: &str) -> bool {
    CYGWIN_RE.is_match(shell_exe)
}

/// Extra args prepended when spawning a Cygwin shell.
pub fn cygwin_login_args() -> &'static [&'static str] {
    &["--login", "-i"]
}

/// Session environment a win-posix shell needs to start in the right cwd.
pub fn session_env(cygwin: bool) -> Vec<(String, String)> {
    if cygwin {
        vec![("CHERE_INVOKING".to_string(), "1".to_string())]
    } else {
        Vec::new()
    }
}

/// Minimal argv flags to make the shell execute one command string and exit.
pub fn shell_args(kind: ShellKind) -> &'static [&'static str] {
    match kind {
        ShellKind::Posix | ShellKind::WinPosix => &["-c"],
        ShellKind::Cmd => &["/d", "/c"],
        ShellKind::PowerShell => &["-Command"],
    }
}

/// The shell-idiomatic way to execute a script inside the current shell
/// process, so it can mutate the environment for subsequent commands in the
/// same invocation.
pub fn source_command(kind: ShellKind, script: &str) -> String {
    match kind {
        ShellKind::Posix | ShellKind::WinPosix | ShellKind::PowerShell => format!(". {script}"),
        ShellKind::Cmd => format!("call {script}"),
    }
}

/// The shell's "discard stdout and stderr" suffix.
pub fn null_redirect(kind: ShellKind) -> &'static str {
    match kind {
        ShellKind::Posix | ShellKind::WinPosix => "> /dev/null 2>&1",
        ShellKind::Cmd => "> NUL 2>&1",
        ShellKind::PowerShell => "> $null 2>&1",
    }
}

/// Joins non-empty command fragments with the shell's statement separator,
/// skipping blank fragments entirely.
pub fn concat(kind: ShellKind, parts: &[&str]) -> String {
    let sep = match kind {
        ShellKind::PowerShell => "; ",
        _ => " && ",
    };
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Renders a reference to an environment variable in the target shell's
/// expansion syntax.
pub fn env_var_ref(kind: ShellKind, name: &str) -> String {
    match kind {
        ShellKind::Posix | ShellKind::WinPosix => format!("${{{name}}}"),
        ShellKind::Cmd => format!("%{name}%"),
        ShellKind::PowerShell => format!("$env:{name}"),
    }
}

/// Converts a host-native path into the form the target shell expects.
///
/// Posix-family output swaps backslashes for slashes, rewrites `.bat`/`.ps1`
/// script extensions to `.sh`, converts `%VAR%` references, and (for a POSIX
/// shell on Windows) maps `C:` to `/c`. Quoted when it contains whitespace.
/// Cmd paths pass through unchanged.
pub fn normalize_path(kind: ShellKind, path: &str) -> String {
    let mut out = path.to_string();

    match kind {
        ShellKind::Posix | ShellKind::WinPosix => {
            out = BAT_PS1_EXT_RE.replace(&out, ".sh").into_owned();
            // A literal "${$1}" replacement string would be read as an
            // (empty) braced group reference, so build the braces here.
            out = CMD_VAR_RE
                .replace_all(&out, |caps: &regex::Captures<'_>| {
                    format!("${{{}}}", &caps[1])
                })
                .into_owned();
            out = out.replace('\\', "/");
            if kind == ShellKind::WinPosix {
                out = DRIVE_RE
                    .replace(&out, |caps: &regex::Captures<'_>| {
                        format!("/{}", caps[1].to_lowercase())
                    })
                    .into_owned();
            }
            if out.chars().any(char::is_whitespace) {
                out = format!("\"{out}\"");
            }
        }
        ShellKind::PowerShell => {
            out = BAT_SH_EXT_RE.replace(&out, ".ps1").into_owned();
            out = CMD_VAR_RE.replace_all(&out, "$$env:$1").into_owned();
            out = POSIX_VAR_RE.replace_all(&out, "$$env:$1").into_owned();
        }
        ShellKind::Cmd => {}
    }
    out
}

/// Rewrites backslash path separators inside a free-form command string for
/// posix-family shells. Windows shells get the text back untouched.
pub fn normalize_paths_in(kind: ShellKind, text: &str) -> String {
    if kind.is_posix_family() {
        text.replace('\\', "/")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_known_basenames() {
        assert_eq!(classify("/bin/bash"), ShellKind::Posix);
        assert_eq!(classify("/usr/bin/zsh"), ShellKind::Posix);
        assert_eq!(classify("/usr/local/bin/fish"), ShellKind::Posix);
        assert_eq!(classify("/bin/dash"), ShellKind::Posix);
        assert_eq!(
            classify(r"C:\Windows\System32\cmd.exe"),
            ShellKind::Cmd
        );
        assert_eq!(
            classify(r"C:\Windows\System32\WindowsPowerShell\v1.0\powershell.exe"),
            ShellKind::PowerShell
        );
        assert_eq!(classify("/usr/bin/pwsh"), ShellKind::PowerShell);
    }

    #[test]
    fn classify_is_extension_and_case_insensitive() {
        assert_eq!(classify(r"C:\tools\CMD.EXE"), ShellKind::Cmd);
        assert_eq!(
            classify(r"C:\Program Files\Git\bin\bash.exe"),
            ShellKind::WinPosix
        );
    }

    #[test]
    fn classify_unknown_falls_back_to_host_default() {
        let kind = classify("/opt/weird/myshell");
        assert_eq!(kind, host_default());
        // Idempotent and deterministic.
        assert_eq!(classify("/opt/weird/myshell"), kind);
    }

    #[test]
    fn cygwin_detection() {
        assert!(is_cygwin(r"C:\cygwin64\bin\bash.exe"));
        assert!(is_cygwin(r"C:\cygwin\bin\bash.exe"));
        assert!(!is_cygwin(r"C:\Program Files\Git\bin\bash.exe"));
        assert!(!is_cygwin("/bin/bash"));
    }

    #[test]
    fn concat_skips_blank_fragments() {
        assert_eq!(
            concat(ShellKind::Posix, &[". env.sh", "", "  ", "west build"]),
            ". env.sh && west build"
        );
        assert_eq!(
            concat(ShellKind::PowerShell, &[". env.ps1", "west build"]),
            ". env.ps1; west build"
        );
    }

    #[test]
    fn source_and_redirect_per_kind() {
        assert_eq!(source_command(ShellKind::Posix, "env.sh"), ". env.sh");
        assert_eq!(source_command(ShellKind::Cmd, "env.bat"), "call env.bat");
        assert_eq!(source_command(ShellKind::PowerShell, "env.ps1"), ". env.ps1");
        assert_eq!(null_redirect(ShellKind::Cmd), "> NUL 2>&1");
        assert_eq!(null_redirect(ShellKind::Posix), "> /dev/null 2>&1");
    }

    #[test]
    fn env_var_ref_per_kind() {
        assert_eq!(env_var_ref(ShellKind::Posix, "BUILD_DIR"), "${BUILD_DIR}");
        assert_eq!(env_var_ref(ShellKind::Cmd, "BUILD_DIR"), "%BUILD_DIR%");
        assert_eq!(
            env_var_ref(ShellKind::PowerShell, "BUILD_DIR"),
            "$env:BUILD_DIR"
        );
    }

    #[test]
    fn normalize_path_posix_on_windows() {
        assert_eq!(
            normalize_path(ShellKind::WinPosix, r"C:\ws\env.bat"),
            "/c/ws/env.sh"
        );
        assert_eq!(
            normalize_path(ShellKind::WinPosix, r"C:\my ws\env.bat"),
            "\"/c/my ws/env.sh\""
        );
    }

    #[test]
    fn normalize_path_rewrites_variable_references() {
        assert_eq!(
            normalize_path(ShellKind::Posix, r"%HOME%\env.sh"),
            "${HOME}/env.sh"
        );
        assert_eq!(
            normalize_path(ShellKind::PowerShell, "${HOME}/env.sh"),
            "$env:HOME/env.ps1"
        );
    }

    #[test]
    fn normalize_path_cmd_is_identity() {
        let p = r"C:\ws\env.bat";
        assert_eq!(normalize_path(ShellKind::Cmd, p), p);
    }
}
