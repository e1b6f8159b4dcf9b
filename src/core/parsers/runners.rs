// src/core/parsers/runners.rs

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RunnersError {
    #[error(
        "No flash runner information found. The build may be incomplete or the board may not support flashing."
    )]
    NoRunnerInformation,
}

/// Flash-runner facts extracted from the tool's help/report text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerReport {
    /// Runners that support the flash command, deduplicated in first-seen
    /// order.
    pub candidates: Vec<String>,
    /// Runners declared available in the build's runners.yaml.
    pub available: Vec<String>,
    /// The build's declared default runner, when present.
    pub default: Option<String>,
}

const CANDIDATES_MARKER: &str = "runners which support";
const AVAILABLE_MARKER: &str = "available runners in runners.yaml";
const DEFAULT_MARKER: &str = "default runner in runners.yaml";

/// Parses the flash-runner report. Anchors on three independent header
/// phrases; each block is the contiguous run of non-blank, non-header lines
/// below its header, split on commas. An output with neither flash-capable
/// nor available runners is a hard failure so callers never proceed with an
/// empty choice.
pub fn parse(stdout: &str) -> Result<RunnerReport, RunnersError> {
    let lines: Vec<&str> = stdout.lines().map(str::trim).collect();
    let mut report = RunnerReport::default();

    for (idx, line) in lines.iter().enumerate() {
        let lowered = line.to_lowercase();
        if lowered.contains(CANDIDATES_MARKER) && lowered.contains("flash") {
            // Candidate listings may end with an advisory "note:" line that
            // is prose, not runner names.
            for name in block_tokens(&lines, idx + 1, true) {
                if !report.candidates.contains(&name) {
                    report.candidates.push(name);
                }
            }
        } else if lowered.contains(AVAILABLE_MARKER) {
            report.available = block_tokens(&lines, idx + 1, false);
        } else if lowered.contains(DEFAULT_MARKER) {
            report.default = block_tokens(&lines, idx + 1, false).into_iter().next();
        }
    }

    if report.candidates.is_empty() && report.available.is_empty() {
        return Err(RunnersError::NoRunnerInformation);
    }
    Ok(report)
}

fn is_header(line: &str) -> bool {
    let lowered = line.to_lowercase();
    lowered.contains(CANDIDATES_MARKER)
        || lowered.contains(AVAILABLE_MARKER)
        || lowered.contains(DEFAULT_MARKER)
        || line.ends_with(':')
}

fn block_tokens(lines: &[&str], start: usize, stop_at_note: bool) -> Vec<String> {
    let mut tokens = Vec::new();
    for line in lines.iter().skip(start) {
        if line.is_empty() || is_header(line) {
            break;
        }
        if stop_at_note && line.to_lowercase().starts_with("note:") {
            break;
        }
        tokens.extend(
            line.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        );
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_all_three_blocks() {
        let report = parse(
            "zephyr runners which support \"west flash\":\n  jlink, openocd, pyocd\n\n\
             Available runners in runners.yaml:\n  jlink, openocd\n\
             Default runner in runners.yaml:\n  openocd, --some-flag\n",
        )
        .unwrap();
        assert_eq!(report.candidates, vec!["jlink", "openocd", "pyocd"]);
        assert_eq!(report.available, vec!["jlink", "openocd"]);
        assert_eq!(report.default.as_deref(), Some("openocd"));
    }

    #[test]
    fn candidates_are_deduplicated_in_order() {
        let report = parse(
            "runners which support flash:\n  jlink, openocd, jlink\n\
             available runners in runners.yaml:\n  jlink\n",
        )
        .unwrap();
        assert_eq!(report.candidates, vec!["jlink", "openocd"]);
    }

    #[test]
    fn candidates_block_stops_at_note_line() {
        let report = parse(
            "runners which support flash:\n  jlink, openocd\n\
             Note: runners are tested on a best-effort basis\n\n\
             available runners in runners.yaml:\n  jlink\n",
        )
        .unwrap();
        assert_eq!(report.candidates, vec!["jlink", "openocd"]);
        assert_eq!(report.available, vec!["jlink"]);
    }

    #[test]
    fn block_stops_at_blank_line() {
        let report = parse(
            "available runners in runners.yaml:\n  jlink\n\n  stray, tokens\n",
        )
        .unwrap();
        assert_eq!(report.available, vec!["jlink"]);
    }

    #[test]
    fn empty_report_is_a_hard_failure() {
        assert_eq!(
            parse("some unrelated output\n").unwrap_err(),
            RunnersError::NoRunnerInformation
        );
        assert_eq!(
            parse("runners which support flash:\n").unwrap_err(),
            RunnersError::NoRunnerInformation
        );
    }

    #[test]
    fn default_only_report_still_fails() {
        assert_eq!(
            parse("Default runner in runners.yaml:\n  openocd\n").unwrap_err(),
            RunnersError::NoRunnerInformation
        );
    }
}
