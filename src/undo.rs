/// Undo of the most recent organization pass.
///
/// The journal is replayed in stored order, moving every file from where the
/// organizer put it back to where it came from. The journal is cleared
/// afterwards whatever happened to individual records, so an undo can never
/// be applied twice.
use crate::error::{DeclutterError, DeclutterResult};
use crate::journal::{JournalStore, MoveRecord};
use crate::organizer::move_file;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Represents the result of an undo operation.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Number of files restored to their original location.
    pub restored_files: usize,
    /// Records whose file could not be moved back.
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Records whose file was no longer at the recorded destination.
    pub skipped_files: Vec<(PathBuf, String)>,
}

impl UndoReport {
    /// Returns the total number of records processed.
    pub fn total_processed(&self) -> usize {
        self.restored_files + self.failed_restores.len() + self.skipped_files.len()
    }

    /// Number of records that were not restored.
    pub fn error_count(&self) -> usize {
        self.failed_restores.len() + self.skipped_files.len()
    }

    /// Returns true if every record was restored.
    pub fn is_complete_success(&self) -> bool {
        self.error_count() == 0
    }
}

/// Restores files recorded in the journal.
#[derive(Debug, Clone)]
pub struct UndoManager {
    journal: JournalStore,
}

impl UndoManager {
    pub fn new(journal: JournalStore) -> Self {
        Self { journal }
    }

    /// Undoes the most recent organization pass.
    ///
    /// Fails with `NothingToUndo` when no journal (or an empty or corrupt
    /// one) is stored. Otherwise every record is processed, the journal is
    /// deleted, and the report lists what could not be restored.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use declutter::journal::JournalStore;
    /// use declutter::undo::UndoManager;
    ///
    /// let manager = UndoManager::new(JournalStore::new("/tmp/declutter-journal.json"));
    /// match manager.undo() {
    ///     Ok(report) => println!("Restored {} files", report.restored_files),
    ///     Err(e) => eprintln!("Undo failed: {}", e),
    /// }
    /// ```
    pub fn undo(&self) -> DeclutterResult<UndoReport> {
        let records = self.journal.load();
        if records.is_empty() {
            warn!("No history available to undo.");
            return Err(DeclutterError::NothingToUndo);
        }

        info!("Starting undo operation ({} records)...", records.len());
        let mut report = UndoReport::default();
        for record in &records {
            match Self::restore_file(record) {
                Ok(()) => {
                    info!(
                        "Restored: {}",
                        record
                            .source
                            .file_name()
                            .map(|n| n.to_string_lossy().to_string())
                            .unwrap_or_else(|| record.source.display().to_string())
                    );
                    report.restored_files += 1;
                }
                Err(RestoreFailure::Missing(reason)) => {
                    warn!(
                        "Warning: File not found at destination: {}",
                        record.destination.display()
                    );
                    report
                        .skipped_files
                        .push((record.destination.clone(), reason));
                }
                Err(RestoreFailure::Failed(e)) => {
                    error!("Error restoring {}: {}", record.destination.display(), e);
                    report
                        .failed_restores
                        .push((record.destination.clone(), e.to_string()));
                }
            }
        }

        if let Err(e) = self.journal.clear() {
            error!("Could not delete history file: {}", e);
        }

        if report.is_complete_success() {
            info!(
                "Undo completed successfully. Restored {} files.",
                report.restored_files
            );
        } else {
            warn!(
                "Undo completed with {} errors. Restored {} files.",
                report.error_count(),
                report.restored_files
            );
        }
        Ok(report)
    }

    /// Moves one file back to its original location, recreating the
    /// original parent directory if it is gone.
    fn restore_file(record: &MoveRecord) -> Result<(), RestoreFailure> {
        if fs::symlink_metadata(&record.destination).is_err() {
            return Err(RestoreFailure::Missing(
                "File not found at expected location".to_string(),
            ));
        }

        if let Some(parent) = record.source.parent()
            && !parent.is_dir()
        {
            fs::create_dir_all(parent).map_err(|e| {
                RestoreFailure::Failed(DeclutterError::DirectoryCreationFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })
            })?;
        }

        move_file(&record.destination, &record.source).map_err(RestoreFailure::Failed)
    }
}

enum RestoreFailure {
    Missing(String),
    Failed(DeclutterError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organizer::move_to_category;
    use std::path::Path;
    use tempfile::TempDir;

    fn store(dir: &Path) -> JournalStore {
        JournalStore::new(dir.join("journal.json"))
    }

    #[test]
    fn test_undo_no_history() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = UndoManager::new(store(temp_dir.path())).undo();
        assert!(matches!(result, Err(DeclutterError::NothingToUndo)));
    }

    #[test]
    fn test_undo_single_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let file_path = root.join("test.txt");
        fs::write(&file_path, "test content").expect("Failed to write test file");

        let record = move_to_category(root, &file_path, "Documents").expect("move");
        let journal = store(root);
        journal.save(root, &[record]).expect("save");

        let report = UndoManager::new(journal.clone()).undo().expect("Undo failed");

        assert_eq!(report.restored_files, 1);
        assert!(report.is_complete_success());
        assert!(file_path.exists());
        assert!(!root.join("Documents").join("test.txt").exists());
        assert!(!journal.exists());
    }

    #[test]
    fn test_undo_missing_file_is_skipped_and_journal_cleared() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let present = root.join("present.txt");
        fs::write(&present, "here").expect("write");
        let moved = move_to_category(root, &present, "Documents").expect("move");

        let journal = store(root);
        journal
            .save(
                root,
                &[
                    MoveRecord {
                        source: root.join("gone.txt"),
                        destination: root.join("Documents").join("gone.txt"),
                    },
                    moved,
                ],
            )
            .expect("save");

        let report = UndoManager::new(journal.clone()).undo().expect("Undo failed");

        assert_eq!(report.restored_files, 1);
        assert_eq!(report.skipped_files.len(), 1);
        assert_eq!(report.total_processed(), 2);
        assert!(present.exists());
        assert!(!journal.exists());
    }

    #[test]
    fn test_undo_refuses_to_overwrite_original_location() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let file_path = root.join("test.txt");
        fs::write(&file_path, "original content").expect("write");
        let record = move_to_category(root, &file_path, "Documents").expect("move");
        let journal = store(root);
        journal.save(root, &[record]).expect("save");

        fs::write(&file_path, "new content").expect("create conflict");

        let report = UndoManager::new(journal.clone()).undo().expect("Undo failed");

        assert_eq!(report.restored_files, 0);
        assert_eq!(report.failed_restores.len(), 1);
        assert_eq!(
            fs::read_to_string(&file_path).expect("read"),
            "new content"
        );
        assert_eq!(
            fs::read_to_string(root.join("Documents").join("test.txt")).expect("read"),
            "original content"
        );
        assert!(!journal.exists());
    }

    #[test]
    fn test_undo_recreates_original_parent() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("Images")).expect("create dir");
        fs::write(root.join("Images").join("a.jpg"), "jpg").expect("write");

        let journal = store(root);
        journal
            .save(
                root,
                &[MoveRecord {
                    source: root.join("vanished").join("a.jpg"),
                    destination: root.join("Images").join("a.jpg"),
                }],
            )
            .expect("save");

        let report = UndoManager::new(journal).undo().expect("Undo failed");
        assert_eq!(report.restored_files, 1);
        assert!(root.join("vanished").join("a.jpg").exists());
    }

    #[test]
    fn test_corrupt_journal_means_nothing_to_undo() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let journal = store(temp_dir.path());
        fs::write(journal.path(), "[[[").expect("write corrupt journal");

        let result = UndoManager::new(journal.clone()).undo();
        assert!(matches!(result, Err(DeclutterError::NothingToUndo)));
        assert_eq!(fs::read_to_string(journal.path()).expect("read"), "[[[");
    }
}
