/// Organization passes: moving the files of a directory into category folders.
///
/// Only the direct children of the root that are regular files are touched.
/// Each successful move is recorded, and when the pass moved at least one
/// file the records replace the journal so the pass can be undone.
use crate::classifier::{Classifier, OrganizeMethod};
use crate::config::CompiledFilters;
use crate::error::{DeclutterError, DeclutterResult, ensure_root};
use crate::journal::{JournalStore, MoveRecord};
use std::collections::BTreeMap;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// A move the organizer would perform, computed without touching any file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub category: String,
    /// Something already occupies `destination`, so `organize` would fail
    /// this item with `DestinationExists`.
    pub blocked: bool,
}

/// Outcome of one organization pass.
#[derive(Debug, Default)]
pub struct OrganizeReport {
    /// Canonical form of the organized directory.
    pub root: PathBuf,
    /// Moves that happened, in processing order.
    pub moves: Vec<MoveRecord>,
    /// Files left alone because a filter rejected them.
    pub skipped: Vec<PathBuf>,
    /// Files that could not be organized, with the reason.
    pub failures: Vec<(PathBuf, String)>,
    /// Number of files moved into each category folder.
    pub category_counts: BTreeMap<String, usize>,
    /// Whether the journal was replaced by this pass.
    pub journal_saved: bool,
}

impl OrganizeReport {
    pub fn moved_count(&self) -> usize {
        self.moves.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Moves files into category subdirectories and journals the moves.
#[derive(Debug, Clone)]
pub struct Organizer {
    classifier: Classifier,
    filters: CompiledFilters,
    journal: JournalStore,
}

impl Organizer {
    pub fn new(classifier: Classifier, filters: CompiledFilters, journal: JournalStore) -> Self {
        Self {
            classifier,
            filters,
            journal,
        }
    }

    /// Organizes the direct files of `root` with the given method.
    ///
    /// Fails only when `root` is not an existing directory, in which case
    /// nothing is touched. Per-file problems are logged, recorded in the
    /// report and skipped.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use declutter::classifier::{Classifier, OrganizeMethod};
    /// use declutter::config::CompiledFilters;
    /// use declutter::journal::JournalStore;
    /// use declutter::organizer::Organizer;
    /// use std::path::Path;
    ///
    /// let organizer = Organizer::new(
    ///     Classifier::default(),
    ///     CompiledFilters::permissive(),
    ///     JournalStore::new("/tmp/declutter-journal.json"),
    /// );
    /// let report = organizer
    ///     .organize(Path::new("/home/me/Downloads"), OrganizeMethod::Type)
    ///     .expect("Downloads exists");
    /// println!("Moved {} files", report.moved_count());
    /// ```
    pub fn organize(&self, root: &Path, method: OrganizeMethod) -> DeclutterResult<OrganizeReport> {
        let root = resolve_root(root)?;
        info!(
            "Starting organization of {} (method: {})",
            root.display(),
            method
        );

        let mut report = OrganizeReport {
            root: root.clone(),
            ..Default::default()
        };
        for (path, metadata) in self.candidates(&root, &mut report) {
            let outcome = self
                .classifier
                .classify(method, &path, &metadata)
                .and_then(|category| {
                    move_to_category(&root, &path, &category).map(|record| (category, record))
                });

            match outcome {
                Ok((category, record)) => {
                    info!("Moved {} to {}", display_name(&path), category);
                    *report.category_counts.entry(category).or_insert(0) += 1;
                    report.moves.push(record);
                }
                Err(e) => {
                    error!("{}", e);
                    report.failures.push((path, e.to_string()));
                }
            }
        }

        if !report.moves.is_empty() {
            match self.journal.save(&root, &report.moves) {
                Ok(()) => report.journal_saved = true,
                Err(e) => error!("Error saving history: {}", e),
            }
        }

        if report.failures.is_empty() {
            info!(
                "Files organized successfully! Moved {} files.",
                report.moved_count()
            );
        } else {
            warn!(
                "Organization finished with {} errors. Moved {} files.",
                report.failures.len(),
                report.moved_count()
            );
        }
        Ok(report)
    }

    /// Computes the moves `organize` would make, without changing anything.
    ///
    /// Entries whose destination is already taken are returned with
    /// `blocked` set.
    pub fn plan(&self, root: &Path, method: OrganizeMethod) -> DeclutterResult<Vec<PlannedMove>> {
        let root = resolve_root(root)?;
        let mut report = OrganizeReport::default();

        let mut planned = Vec::new();
        for (path, metadata) in self.candidates(&root, &mut report) {
            match self.classifier.classify(method, &path, &metadata) {
                Ok(category) => {
                    let destination = match path.file_name() {
                        Some(name) => root.join(&category).join(name),
                        None => continue,
                    };
                    let blocked = fs::symlink_metadata(&destination).is_ok();
                    planned.push(PlannedMove {
                        source: path,
                        destination,
                        category,
                        blocked,
                    });
                }
                Err(e) => warn!("{}", e),
            }
        }
        Ok(planned)
    }

    /// Lists the regular files directly inside `root`, sorted by name.
    ///
    /// Filtered files and the journal itself are recorded as skipped.
    fn candidates(&self, root: &Path, report: &mut OrganizeReport) -> Vec<(PathBuf, Metadata)> {
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) => {
                error!("Error reading directory {}: {}", root.display(), e);
                report.failures.push((root.to_path_buf(), e.to_string()));
                return Vec::new();
            }
        };

        let journal_path = fs::canonicalize(self.journal.path()).ok();
        let mut files = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    error!("Error reading entry in {}: {}", root.display(), e);
                    continue;
                }
            };

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    let path = entry.path();
                    let err = DeclutterError::Metadata {
                        path: path.clone(),
                        source: e,
                    };
                    error!("{}", err);
                    report.failures.push((path, err.to_string()));
                    continue;
                }
            };
            if !metadata.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if journal_path.is_some() && fs::canonicalize(&path).ok() == journal_path {
                continue;
            }
            if !self.filters.should_include(Path::new(&entry.file_name())) {
                info!("Skipping {} (excluded by filters)", display_name(&path));
                report.skipped.push(path);
                continue;
            }
            files.push((path, metadata));
        }

        files.sort_by(|a, b| a.0.file_name().cmp(&b.0.file_name()));
        files
    }
}

/// Canonicalizes `root` so journal records hold absolute paths.
fn resolve_root(root: &Path) -> DeclutterResult<PathBuf> {
    if let Err(e) = ensure_root(root) {
        error!("{}", e);
        return Err(e);
    }
    fs::canonicalize(root).map_err(|_| DeclutterError::PathNotFound {
        path: root.to_path_buf(),
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Moves `file_path` into `root/<category>/`, creating the folder if needed.
///
/// An existing file at the destination is never overwritten; the move fails
/// with `DestinationExists` instead.
pub fn move_to_category(
    root: &Path,
    file_path: &Path,
    category: &str,
) -> DeclutterResult<MoveRecord> {
    let category_path = root.join(category);
    let file_name = file_path
        .file_name()
        .ok_or_else(|| DeclutterError::FileMoveFailure {
            source: file_path.to_path_buf(),
            destination: category_path.clone(),
            source_error: io::Error::new(
                io::ErrorKind::InvalidInput,
                "file has no name component",
            ),
        })?;
    let destination = category_path.join(file_name);

    if !category_path.is_dir() {
        fs::create_dir_all(&category_path).map_err(|e| {
            DeclutterError::DirectoryCreationFailed {
                path: category_path.clone(),
                source: e,
            }
        })?;
    }

    move_file(file_path, &destination)?;

    Ok(MoveRecord {
        source: file_path.to_path_buf(),
        destination,
    })
}

/// Moves a file, refusing to replace an existing destination.
///
/// Falls back to copy-and-delete when the rename crosses filesystems.
pub(crate) fn move_file(source: &Path, destination: &Path) -> DeclutterResult<()> {
    if fs::symlink_metadata(destination).is_ok() {
        return Err(DeclutterError::DestinationExists {
            path: destination.to_path_buf(),
        });
    }

    let failure = |e: io::Error| DeclutterError::FileMoveFailure {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        source_error: e,
    };

    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(source, destination).map_err(failure)?;
            fs::remove_file(source).map_err(failure)
        }
        Err(e) => Err(failure(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn organizer(journal_dir: &Path) -> Organizer {
        Organizer::new(
            Classifier::default(),
            CompiledFilters::permissive(),
            JournalStore::new(journal_dir.join("journal.json")),
        )
    }

    #[test]
    fn test_move_to_category_creates_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let file_path = root.join("test.txt");
        fs::write(&file_path, "test content").expect("Failed to write test file");

        let record = move_to_category(root, &file_path, "Documents").expect("move");

        assert!(root.join("Documents").is_dir());
        assert!(!file_path.exists());
        assert_eq!(record.source, file_path);
        assert_eq!(record.destination, root.join("Documents").join("test.txt"));
        assert!(record.destination.exists());
    }

    #[test]
    fn test_move_to_category_uses_existing_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("Images")).expect("create category");
        let file_path = root.join("test.png");
        fs::write(&file_path, "png").expect("write");

        move_to_category(root, &file_path, "Images").expect("move");
        assert!(root.join("Images").join("test.png").exists());
    }

    #[test]
    fn test_move_refuses_to_overwrite() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("Documents")).expect("create category");
        fs::write(root.join("Documents").join("a.txt"), "old").expect("write");
        fs::write(root.join("a.txt"), "new").expect("write");

        let result = move_to_category(root, &root.join("a.txt"), "Documents");
        assert!(matches!(
            result,
            Err(DeclutterError::DestinationExists { .. })
        ));
        assert_eq!(fs::read_to_string(root.join("a.txt")).expect("read"), "new");
        assert_eq!(
            fs::read_to_string(root.join("Documents").join("a.txt")).expect("read"),
            "old"
        );
    }

    #[test]
    fn test_organize_missing_root_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let organizer = organizer(temp_dir.path());
        let result = organizer.organize(&temp_dir.path().join("missing"), OrganizeMethod::Type);

        assert!(matches!(result, Err(DeclutterError::PathNotFound { .. })));
        assert!(!temp_dir.path().join("journal.json").exists());
    }

    #[test]
    fn test_organize_skips_subdirectories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let state = TempDir::new().expect("Failed to create state directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("nested")).expect("create dir");
        fs::write(root.join("nested").join("inner.jpg"), "x").expect("write");
        fs::write(root.join("outer.jpg"), "y").expect("write");

        let report = organizer(state.path())
            .organize(root, OrganizeMethod::Type)
            .expect("organize");

        assert_eq!(report.moved_count(), 1);
        assert!(root.join("nested").join("inner.jpg").exists());
        assert!(root.join("Images").join("outer.jpg").exists());
    }

    #[test]
    fn test_organize_with_nothing_to_move_keeps_previous_journal() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let state = TempDir::new().expect("Failed to create state directory");
        let organizer = organizer(state.path());
        let root = temp_dir.path();

        fs::write(root.join("a.jpg"), "a").expect("write");
        organizer
            .organize(root, OrganizeMethod::Type)
            .expect("first pass");
        let store = JournalStore::new(state.path().join("journal.json"));
        assert_eq!(store.load().len(), 1);

        let report = organizer
            .organize(root, OrganizeMethod::Type)
            .expect("second pass");
        assert_eq!(report.moved_count(), 0);
        assert!(!report.journal_saved);
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn test_plan_does_not_touch_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let state = TempDir::new().expect("Failed to create state directory");
        let root = temp_dir.path();
        fs::write(root.join("b.pdf"), "pdf").expect("write");
        fs::write(root.join("a.jpg"), "jpg").expect("write");

        let planned = organizer(state.path())
            .plan(root, OrganizeMethod::Type)
            .expect("plan");

        let categories: Vec<_> = planned.iter().map(|p| p.category.as_str()).collect();
        assert_eq!(categories, vec!["Images", "Documents"]);
        assert!(planned[0].destination.ends_with("Images/a.jpg"));
        assert!(root.join("a.jpg").exists());
        assert!(!root.join("Images").exists());
        assert!(!state.path().join("journal.json").exists());
    }

    #[test]
    fn test_plan_flags_occupied_destinations() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let state = TempDir::new().expect("Failed to create state directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("Images")).expect("create category");
        fs::write(root.join("Images").join("a.jpg"), "old").expect("write");
        fs::write(root.join("a.jpg"), "new").expect("write");
        fs::write(root.join("b.jpg"), "b").expect("write");
        let organizer = organizer(state.path());

        let planned = organizer.plan(root, OrganizeMethod::Type).expect("plan");
        let blocked: Vec<_> = planned
            .iter()
            .map(|p| (display_name(&p.source), p.blocked))
            .collect();
        assert_eq!(
            blocked,
            vec![("a.jpg".to_string(), true), ("b.jpg".to_string(), false)]
        );

        let report = organizer
            .organize(root, OrganizeMethod::Type)
            .expect("organize");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.moved_count(), 1);
    }

    #[test]
    fn test_report_carries_canonical_root() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let state = TempDir::new().expect("Failed to create state directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("inbox")).expect("create dir");
        fs::write(root.join("inbox").join("a.jpg"), "a").expect("write");

        let report = organizer(state.path())
            .organize(&root.join("inbox").join("..").join("inbox"), OrganizeMethod::Type)
            .expect("organize");

        let canonical = fs::canonicalize(root.join("inbox")).expect("canonicalize");
        assert_eq!(report.root, canonical);
        assert_eq!(
            report.moves[0].destination.strip_prefix(&report.root).ok(),
            Some(Path::new("Images/a.jpg"))
        );
    }

    #[test]
    fn test_journal_inside_root_is_not_organized() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let store = JournalStore::new(root.join("journal.json"));
        store
            .save(
                root,
                &[MoveRecord {
                    source: root.join("x"),
                    destination: root.join("y"),
                }],
            )
            .expect("seed journal");
        fs::write(root.join("a.jpg"), "a").expect("write");

        let report = organizer(root)
            .organize(root, OrganizeMethod::Type)
            .expect("organize");

        assert_eq!(report.moved_count(), 1);
        assert!(root.join("journal.json").exists());
        assert!(!root.join("Code").join("journal.json").exists());
    }
}
