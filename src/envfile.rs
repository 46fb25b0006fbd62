//! Persisting credentials: the local `.env` file and the user's shell profile.

use crate::error::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Set `key=value` in a `KEY=value` file.
///
/// An existing `key=` line is replaced in place; every other line is kept as-is,
/// line endings included.
/// The file is created when missing.
pub fn upsert(path: &Path, key: &str, value: &str) -> Result<()> {
    let prefix = format!("{key}=");
    let entry = format!("{key}={value}");
    let existing = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let newline = if existing.contains("\r\n") { "\r\n" } else { "\n" };
    let mut found = false;
    let mut content = String::with_capacity(existing.len() + entry.len() + 2);
    for line in existing.split_inclusive('\n') {
        if line.starts_with(&prefix) {
            found = true;
            let ending = if line.ends_with("\r\n") {
                "\r\n"
            } else if line.ends_with('\n') {
                "\n"
            } else {
                newline
            };
            content.push_str(&entry);
            content.push_str(ending);
        } else {
            content.push_str(line);
        }
    }
    if !content.is_empty() && !content.ends_with('\n') {
        content.push_str(newline);
    }
    if !found {
        content.push_str(&entry);
        content.push_str(newline);
    }

    std::fs::write(path, content)?;
    debug!(path = %path.display(), key, replaced = found, "env file updated");
    Ok(())
}

/// Shell startup file for `shell` (the `$SHELL` value).
pub fn shell_rc_path(shell: &str, home: &Path) -> PathBuf {
    if shell.contains("zsh") {
        home.join(".zshrc")
    } else if shell.contains("bash") {
        home.join(".bashrc")
    } else {
        home.join(".profile")
    }
}

/// Append `export key="value"` to an existing rc file.
///
/// Nothing is written when the file does not exist or already exports `key`.
/// Returns whether a line was appended.
pub fn append_export(rc: &Path, key: &str, value: &str) -> Result<bool> {
    let content = match std::fs::read_to_string(rc) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    if content.contains(&format!("export {key}=")) {
        return Ok(false);
    }

    let mut file = OpenOptions::new().append(true).open(rc)?;
    writeln!(file, "\nexport {key}=\"{value}\"")?;
    debug!(rc = %rc.display(), key, "export appended");
    Ok(true)
}
