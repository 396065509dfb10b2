//! Sketch discovery.
//!
//! Patterns are expanded once, at the start of a run. Matches keep pattern
//! order; within one pattern the `glob` crate walks each directory in
//! alphabetical order, so the set is the same on every filesystem. A file
//! matched by two patterns shows up twice.

use colored::*;
use std::path::{Path, PathBuf};

use crate::error::RunError;

/// Expand `patterns` relative to the current working directory.
pub fn resolve_sketches(patterns: &[String]) -> Result<Vec<PathBuf>, RunError> {
    resolve_sketches_in(Path::new(""), patterns)
}

/// Expand `patterns` relative to `root`.
///
/// Returned paths are relative to `root` so they read the same as the
/// pattern that produced them.
pub fn resolve_sketches_in(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, RunError> {
    let prefix = glob::Pattern::escape(&root.to_string_lossy());
    let mut sketches = Vec::new();

    for pattern in patterns {
        let full = if prefix.is_empty() || Path::new(pattern).is_absolute() {
            pattern.clone()
        } else {
            format!("{}/{}", prefix.trim_end_matches('/'), pattern)
        };

        let entries = glob::glob(&full).map_err(|e| RunError::BadPattern {
            pattern: pattern.clone(),
            reason: e.msg.to_string(),
        })?;

        for entry in entries {
            match entry {
                Ok(path) => {
                    let path = match path.strip_prefix(root) {
                        Ok(rel) if !root.as_os_str().is_empty() => rel.to_path_buf(),
                        _ => path,
                    };
                    sketches.push(path);
                }
                Err(e) => {
                    eprintln!(
                        "   {} Skipping unreadable match {}: {}",
                        "⚠".yellow(),
                        e.path().display(),
                        e.error()
                    );
                }
            }
        }
    }

    Ok(sketches)
}
