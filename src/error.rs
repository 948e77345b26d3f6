//! Error types shared by the organizer, deduplicator, pruner and undo engine.
//!
//! Path-level failures (`PathNotFound`, `NothingToUndo`) are returned to the
//! caller. Every other variant describes a single item and ends up in an
//! operation report instead of aborting the pass.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors that can occur while organizing, deduplicating, pruning or undoing.
#[derive(Debug)]
pub enum DeclutterError {
    /// The root path is missing or is not a directory.
    PathNotFound { path: PathBuf },
    /// There is no journal (or an empty one) to undo.
    NothingToUndo,
    /// Failed to create a category directory or a restored parent directory.
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// Failed to move a file.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: io::Error,
    },
    /// The move target is already occupied. Files are never overwritten.
    DestinationExists { path: PathBuf },
    /// Failed to read a file's metadata.
    Metadata { path: PathBuf, source: io::Error },
    /// Failed to read a file while computing its fingerprint.
    HashFailed { path: PathBuf, source: io::Error },
    /// Failed to delete a file or directory.
    RemoveFailed { path: PathBuf, source: io::Error },
    /// Failed to write or delete the journal.
    JournalWriteFailed { path: PathBuf, source: io::Error },
    /// Failed to read the journal.
    JournalReadFailed { path: PathBuf, source: io::Error },
    /// The journal could not be parsed.
    InvalidJournalFormat { reason: String },
}

impl fmt::Display for DeclutterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PathNotFound { path } => {
                write!(f, "Path does not exist: {}", path.display())
            }
            Self::NothingToUndo => write!(f, "No history available to undo"),
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::DestinationExists { path } => {
                write!(f, "Destination already exists: {}", path.display())
            }
            Self::Metadata { path, source } => {
                write!(f, "Failed to read metadata of {}: {}", path.display(), source)
            }
            Self::HashFailed { path, source } => {
                write!(f, "Error reading file {}: {}", path.display(), source)
            }
            Self::RemoveFailed { path, source } => {
                write!(f, "Error removing {}: {}", path.display(), source)
            }
            Self::JournalWriteFailed { path, source } => {
                write!(f, "Failed to write journal {}: {}", path.display(), source)
            }
            Self::JournalReadFailed { path, source } => {
                write!(f, "Failed to read journal {}: {}", path.display(), source)
            }
            Self::InvalidJournalFormat { reason } => {
                write!(f, "Invalid journal format: {}", reason)
            }
        }
    }
}

impl std::error::Error for DeclutterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DirectoryCreationFailed { source, .. }
            | Self::Metadata { source, .. }
            | Self::HashFailed { source, .. }
            | Self::RemoveFailed { source, .. }
            | Self::JournalWriteFailed { source, .. }
            | Self::JournalReadFailed { source, .. } => Some(source),
            Self::FileMoveFailure { source_error, .. } => Some(source_error),
            _ => None,
        }
    }
}

/// Result type for declutter operations.
pub type DeclutterResult<T> = Result<T, DeclutterError>;

/// Fails with `PathNotFound` unless `root` is an existing directory.
pub(crate) fn ensure_root(root: &std::path::Path) -> DeclutterResult<()> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(DeclutterError::PathNotFound {
            path: root.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_ensure_root_rejects_missing_path() {
        let result = ensure_root(Path::new("/non/existent/declutter/root"));
        assert!(matches!(result, Err(DeclutterError::PathNotFound { .. })));
    }

    #[test]
    fn test_display_mentions_path() {
        let err = DeclutterError::DestinationExists {
            path: PathBuf::from("/tmp/Images/a.jpg"),
        };
        assert!(err.to_string().contains("/tmp/Images/a.jpg"));
    }
}
