// src/core/parsers/dir_list.rs

use std::path::Path;

/// Parses a line-oriented directory listing: trims each line, strips one
/// pair of surrounding quotes, and drops blanks. Handles both `\n` and
/// `\r\n` endings.
pub fn parse(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(|line| strip_quotes(line.trim()).to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Like [`parse`], but keeps only entries that exist as directories on the
/// local filesystem. The underlying tool sometimes echoes diagnostic lines
/// to stdout, and a filesystem check is the only reliable filter for those.
pub fn parse_existing(stdout: &str) -> Vec<String> {
    parse(stdout)
        .into_iter()
        .filter(|candidate| Path::new(candidate).is_dir())
        .collect()
}

fn strip_quotes(line: &str) -> &str {
    line.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_quotes_and_drops_blanks() {
        let parsed = parse("/a/b\r\n\"/c/d\"\r\n\r\n");
        assert_eq!(parsed, vec!["/a/b".to_string(), "/c/d".to_string()]);
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(parse("  /x/y  \n"), vec!["/x/y".to_string()]);
    }

    #[test]
    fn unbalanced_quote_is_kept_verbatim() {
        assert_eq!(parse("\"/half/open\n"), vec!["\"/half/open".to_string()]);
    }

    #[test]
    fn existing_filter_discards_diagnostic_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let real = dir.path().display().to_string();
        let stdout = format!("-- warning: something\n{real}\n/no/such/dir\n");
        assert_eq!(parse_existing(&stdout), vec![real]);
    }
}
