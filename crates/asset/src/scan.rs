//! Model directory scanning for the model picker.

use std::{fs, path::Path};

use anyhow::{Context, Result};

/// File names (not paths) of `.obj` files directly inside `dir`, sorted.
pub fn list_obj_files(dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read model directory: {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_obj = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("obj"));
        if !is_obj {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            files.push(name.to_owned());
        }
    }
    files.sort();
    Ok(files)
}
