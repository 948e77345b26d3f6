//! Duplicate detection by content fingerprint.
//!
//! Files are visited depth-first with every directory's entries sorted by
//! name, so the walk order is the same on every platform. The first file seen
//! with a given fingerprint is kept; every later file with the same content
//! is deleted. Deletions are not journaled and cannot be undone.

use crate::config::CompiledFilters;
use crate::error::{DeclutterError, DeclutterResult, ensure_root};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use walkdir::WalkDir;

/// Read buffer size used while hashing.
const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Content digest used to compare files.
pub type Fingerprint = blake3::Hash;

/// A file found to have the same content as an earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    /// The duplicate (deleted unless running dry).
    pub path: PathBuf,
    /// The first file seen with the same content, which is kept.
    pub original: PathBuf,
}

/// Outcome of a duplicate removal pass.
#[derive(Debug, Default)]
pub struct DedupReport {
    /// Number of files fingerprinted successfully.
    pub files_scanned: usize,
    /// Duplicates found, in walk order.
    pub duplicates: Vec<Duplicate>,
    /// Duplicates actually deleted.
    pub removed: usize,
    /// Files or directories that could not be read or deleted.
    pub errors: Vec<(PathBuf, String)>,
    pub dry_run: bool,
}

/// Finds and removes duplicate files under a root directory.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    filters: CompiledFilters,
    dry_run: bool,
}

impl Deduplicator {
    pub fn new(filters: CompiledFilters) -> Self {
        Self {
            filters,
            dry_run: false,
        }
    }

    /// Report duplicates without deleting them.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Removes every file whose content matches a file seen earlier in the walk.
    pub fn remove_duplicates(&self, root: &Path) -> DeclutterResult<DedupReport> {
        self.remove_duplicates_with(root, |_| {})
    }

    /// Like `remove_duplicates`, calling `on_file` before each file is hashed.
    pub fn remove_duplicates_with(
        &self,
        root: &Path,
        mut on_file: impl FnMut(&Path),
    ) -> DeclutterResult<DedupReport> {
        if let Err(e) = ensure_root(root) {
            error!("{}", e);
            return Err(e);
        }
        info!("Removing duplicates under {}", root.display());

        let mut report = DedupReport {
            dry_run: self.dry_run,
            ..Default::default()
        };
        let mut first_seen: HashMap<Fingerprint, PathBuf> = HashMap::new();

        for path in walk_files(root, &self.filters, &mut report.errors) {
            on_file(&path);

            let hash = match fingerprint(&path) {
                Ok(hash) => hash,
                Err(e) => {
                    error!("{}", e);
                    report.errors.push((path, e.to_string()));
                    continue;
                }
            };
            report.files_scanned += 1;

            let Some(original) = first_seen.get(&hash) else {
                first_seen.insert(hash, path);
                continue;
            };

            let duplicate = Duplicate {
                path,
                original: original.clone(),
            };
            if self.dry_run {
                info!(
                    "Duplicate: {} (Original: {})",
                    duplicate.path.display(),
                    duplicate.original.display()
                );
            } else {
                info!(
                    "Removing duplicate: {} (Original: {})",
                    duplicate.path.display(),
                    duplicate.original.display()
                );
                match fs::remove_file(&duplicate.path) {
                    Ok(()) => report.removed += 1,
                    Err(e) => {
                        let err = DeclutterError::RemoveFailed {
                            path: duplicate.path.clone(),
                            source: e,
                        };
                        error!("{}", err);
                        report.errors.push((duplicate.path.clone(), err.to_string()));
                        continue;
                    }
                }
            }
            report.duplicates.push(duplicate);
        }

        if self.dry_run {
            info!("Found {} duplicate files.", report.duplicates.len());
        } else {
            info!("Removed {} duplicate files.", report.removed);
        }
        Ok(report)
    }
}

/// Collects the regular files under `root` in walk order.
///
/// Symlinks are not followed. Unreadable directories are logged, recorded in
/// `errors` and skipped.
pub fn walk_files(
    root: &Path,
    filters: &CompiledFilters,
    errors: &mut Vec<(PathBuf, String)>,
) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                warn!("Error walking {}: {}", path.display(), e);
                errors.push((path, e.to_string()));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if filters.should_include(relative) {
            files.push(entry.into_path());
        }
    }
    files
}

/// Hashes a whole file, reading it in fixed-size chunks.
pub fn fingerprint(path: &Path) -> DeclutterResult<Fingerprint> {
    let hash_error = |e| DeclutterError::HashFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let file = File::open(path).map_err(hash_error)?;
    let mut reader = BufReader::new(file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0_u8; HASH_CHUNK_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(hash_error)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}
