//! Ignore list: known validation messages that must not fail a run.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::config::ConfigError;

/// One message per line. Blank lines are skipped and a trailing `\r` is
/// stripped so files edited on Windows still match.
pub fn parse_ignore_list(text: &str) -> BTreeSet<String> {
    text.lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Load an ignore list from disk.
///
/// With `required == false` a missing file yields an empty set.
pub fn load_ignore_list(path: &Path, required: bool) -> Result<BTreeSet<String>, ConfigError> {
    match fs::read_to_string(path) {
        Ok(text) => {
            let entries = parse_ignore_list(&text);
            tracing::debug!(path = %path.display(), entries = entries.len(), "loaded ignore list");
            Ok(entries)
        }
        Err(e) if e.kind() == ErrorKind::NotFound && !required => {
            tracing::debug!(path = %path.display(), "no ignore list");
            Ok(BTreeSet::new())
        }
        Err(e) => Err(ConfigError::IgnoreFile {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
    }
}
