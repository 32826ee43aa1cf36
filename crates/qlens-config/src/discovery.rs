//! Locating `.qlens.toml` files.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

/// Name of qlens configuration files.
pub const CONFIG_FILENAME: &str = ".qlens.toml";

/// Discovers configuration files from `cwd` up to the filesystem root.
///
/// Returns existing files closest-first: the first entry has the highest
/// merge precedence.
pub fn discover_config_files(cwd: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut dir = Some(cwd);
    while let Some(current) = dir {
        let candidate = current.join(CONFIG_FILENAME);
        if candidate.is_file() {
            files.push(candidate);
        }
        dir = current.parent();
    }
    files
}

/// Path of the global `~/.qlens.toml`, whether or not it exists.
pub fn global_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(CONFIG_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_file_comes_first() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "").unwrap();
        std::fs::write(nested.join(CONFIG_FILENAME), "").unwrap();

        let files = discover_config_files(&nested);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0], nested.join(CONFIG_FILENAME));
        assert_eq!(files[1], dir.path().join(CONFIG_FILENAME));
    }

    #[test]
    fn missing_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("x");
        std::fs::create_dir_all(&nested).unwrap();
        assert!(discover_config_files(&nested).is_empty());
    }
}
