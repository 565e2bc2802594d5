//! File output and small text helpers

use std::fs;
use std::path::Path;
use std::process::Command;

use tracing::{debug, warn};

/// Trim trailing whitespace from each line and drop trailing blank lines.
/// Always ensures the returned string ends with a single newline when not empty.
pub fn clean_generated_source(src: &str) -> String {
    let mut lines: Vec<String> = src.lines().map(|l| l.trim_end().to_string()).collect();

    while matches!(lines.last(), Some(line) if line.is_empty()) {
        lines.pop();
    }

    if lines.is_empty() {
        String::new()
    } else {
        format!("{}\n", lines.join("\n"))
    }
}

/// Formats a Rust source file in place with rustfmt.
///
/// Returns whether rustfmt ran and succeeded; a missing rustfmt is not an error.
pub fn format_with_rustfmt(path: &Path) -> bool {
    let mut cmd = Command::new("rustfmt");
    cmd.arg("--edition=2021").arg(path);
    match cmd.status() {
        Ok(status) if status.success() => true,
        Ok(status) => {
            warn!(path = %path.display(), %status, "rustfmt rejected generated file");
            false
        }
        Err(e) => {
            debug!(error = %e, "rustfmt unavailable");
            false
        }
    }
}

/// Persist generated files under `out_dir`, creating any necessary subdirectories.
pub fn write_generated<'a, P: AsRef<Path>>(
    out_dir: P,
    files: impl IntoIterator<Item = (&'a String, &'a String)>,
    rustfmt: bool,
) -> std::io::Result<usize> {
    fs::create_dir_all(&out_dir)?;
    let mut written = 0;
    for (name, src) in files {
        let path = out_dir.as_ref().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, clean_generated_source(src).as_bytes())?;
        if rustfmt && path.extension().is_some_and(|e| e == "rs") {
            format_with_rustfmt(&path);
        }
        written += 1;
    }
    Ok(written)
}

/// Rust string literal for `text`
pub fn string_literal(text: &str) -> String { format!("{:?}", text) }

/// `SCREAMING_SNAKE_CASE` form of a snake or Pascal case name
pub fn screaming_case(name: &str) -> String { types::naming::to_snake_case(name).to_uppercase() }
