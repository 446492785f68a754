use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const SCRIPT_EXTENSION: &str = ".js";

/// Collect candidate scripts from the working directory. No recursion and no
/// sorting: candidates are tried in directory-iteration order.
pub fn discover_scripts() -> Result<Vec<PathBuf>> {
    discover_scripts_in(Path::new("."))
}

fn discover_scripts_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut scripts = Vec::new();
    for entry in fs::read_dir(dir).context("failed to read the script directory")? {
        let entry = entry?;
        let is_script = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(SCRIPT_EXTENSION));
        if is_script && entry.file_type()?.is_file() {
            scripts.push(entry.path());
        }
    }

    log::debug!("found {} candidate scripts in {}", scripts.len(), dir.display());
    Ok(scripts)
}
