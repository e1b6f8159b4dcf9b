// src/core/parsers/name_list.rs

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ENTRY_RE: Regex = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
}

// The anchor that tells a list entry apart from banner or diagnostic lines:
// identifier shape with at least one underscore.
fn is_anchor(line: &str) -> bool {
    ENTRY_RE.is_match(line) && line.contains('_')
}

/// Parses a flat name listing (shields, snippets) from stdout that may start
/// with banner lines. Scans forward to the first identifier-shaped line
/// containing an underscore, then takes every subsequent identifier-shaped
/// line; everything before the anchor is discarded.
pub fn parse(stdout: &str) -> Vec<String> {
    let lines: Vec<&str> = stdout.lines().map(str::trim).collect();
    let Some(anchor) = lines.iter().position(|line| is_anchor(line)) else {
        return Vec::new();
    };
    lines
        .iter()
        .skip(anchor)
        .filter(|line| ENTRY_RE.is_match(line))
        .map(|line| line.to_string())
        .collect()
}
