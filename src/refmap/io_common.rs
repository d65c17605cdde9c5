use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::refmap::{MissingColumnsSnafu, RefmapResult};

pub fn path_string(path: &Path) -> String {
    path.display().to_string()
}

/// Resolves a path relative to a root directory. Absolute paths are returned unchanged.
pub fn resolve_path(root: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}

/// Checks that all the required columns are in the header of a table.
pub fn check_columns(path: &str, header: &StringRecord, required: &[&str]) -> RefmapResult<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|c| !header.iter().any(|h| h.trim() == **c))
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        MissingColumnsSnafu { path, missing }.fail()
    }
}
