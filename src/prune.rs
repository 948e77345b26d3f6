/// Removal of empty directories.
use crate::error::{DeclutterError, DeclutterResult, ensure_root};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use walkdir::WalkDir;

/// Outcome of a pruning pass.
#[derive(Debug, Default)]
pub struct PruneReport {
    /// Directories removed, deepest first.
    pub removed: Vec<PathBuf>,
    /// Directories that could not be inspected or removed.
    pub errors: Vec<(PathBuf, String)>,
}

/// Removes directories left empty under a root.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyDirPruner;

impl EmptyDirPruner {
    /// Removes every empty directory below `root`, bottom-up.
    ///
    /// Children are evaluated before their parent, so a directory that only
    /// contained empty directories is removed in the same pass. `root` itself
    /// is kept even when it ends up empty.
    pub fn remove_empty_folders(&self, root: &Path) -> DeclutterResult<PruneReport> {
        if let Err(e) = ensure_root(root) {
            error!("{}", e);
            return Err(e);
        }
        info!("Cleaning empty folders under {}", root.display());

        let mut report = PruneReport::default();
        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .contents_first(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.to_path_buf());
                    warn!("Error walking {}: {}", path.display(), e);
                    report.errors.push((path, e.to_string()));
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            let dir = entry.path();
            match is_empty_dir(dir) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) => {
                    error!("Error reading folder {}: {}", dir.display(), e);
                    report.errors.push((dir.to_path_buf(), e.to_string()));
                    continue;
                }
            }

            match fs::remove_dir(dir) {
                Ok(()) => {
                    info!("Removed empty folder: {}", dir.display());
                    report.removed.push(dir.to_path_buf());
                }
                Err(e) => {
                    let err = DeclutterError::RemoveFailed {
                        path: dir.to_path_buf(),
                        source: e,
                    };
                    error!("{}", err);
                    report.errors.push((dir.to_path_buf(), err.to_string()));
                }
            }
        }

        info!("Removed {} empty folders.", report.removed.len());
        Ok(report)
    }
}

fn is_empty_dir(dir: &Path) -> std::io::Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_nested_empty_folders_removed_deepest_first() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let empty1 = root.join("empty1");
        let empty2 = empty1.join("empty2");
        fs::create_dir_all(&empty2).expect("create dirs");

        let report = EmptyDirPruner.remove_empty_folders(root).expect("prune");

        assert_eq!(report.removed, vec![empty2, empty1.clone()]);
        assert!(!empty1.exists());
        assert!(root.exists());
    }

    #[test]
    fn test_non_empty_folders_are_kept() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("keep").join("empty")).expect("create dirs");
        fs::write(root.join("keep").join("file.txt"), "x").expect("write");

        let report = EmptyDirPruner.remove_empty_folders(root).expect("prune");

        assert_eq!(report.removed, vec![root.join("keep").join("empty")]);
        assert!(root.join("keep").join("file.txt").exists());
    }

    #[test]
    fn test_empty_root_is_kept() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let report = EmptyDirPruner
            .remove_empty_folders(temp_dir.path())
            .expect("prune");
        assert!(report.removed.is_empty());
        assert!(temp_dir.path().exists());
    }

    #[test]
    fn test_missing_root_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = EmptyDirPruner.remove_empty_folders(&temp_dir.path().join("missing"));
        assert!(matches!(result, Err(DeclutterError::PathNotFound { .. })));
    }
}
