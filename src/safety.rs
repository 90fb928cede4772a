//! Safety checks for the output path.
//!
//! The driver overwrites its output file, so the output must never point at
//! one of the files it reads.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// Validates that an output path is safe to overwrite.
///
/// Checks:
/// - Output must have a `.json` extension
/// - Output cannot be the same file as any of the provided source paths
pub fn validate_output_path(output: &Path, source_paths: &[&Path]) -> Result<()> {
    let is_json = output
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if !is_json {
        bail!(
            "Safety check failed: output file '{}' must have a .json extension",
            output.display()
        );
    }

    let output_resolved = resolve(output);
    for source in source_paths {
        if output == *source || output_resolved == resolve(source) {
            bail!(
                "Safety check failed: output '{}' cannot be the same as source '{}'",
                output.display(),
                source.display()
            );
        }
    }

    Ok(())
}

/// Canonical path when the file exists, the path as given otherwise.
fn resolve(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
