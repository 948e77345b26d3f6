/// Persistent record of the most recent organization pass.
///
/// The journal is a single slot: saving replaces whatever was stored before
/// and undo clears it. It is stored as pretty-printed JSON so it can be
/// inspected by hand.
use crate::error::{DeclutterError, DeclutterResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One completed relocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Where the file was before organization.
    pub source: PathBuf,
    /// Where the organizer put it.
    pub destination: PathBuf,
}

/// All moves of one organization pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    /// When the pass finished, stored as RFC 3339.
    pub timestamp: DateTime<Utc>,
    /// The directory that was organized.
    pub root: PathBuf,
    pub moves: Vec<MoveRecord>,
}

impl Journal {
    pub fn new(root: PathBuf, moves: Vec<MoveRecord>) -> Self {
        Self {
            timestamp: Utc::now(),
            root,
            moves,
        }
    }
}

/// Location of the journal on disk.
#[derive(Debug, Clone)]
pub struct JournalStore {
    path: PathBuf,
}

impl JournalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if a journal file is present.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Replaces the stored journal with `records`.
    ///
    /// The JSON is written to a sibling temporary file first and renamed over
    /// the journal, so readers see either the old or the new journal.
    pub fn save(&self, root: &Path, records: &[MoveRecord]) -> DeclutterResult<()> {
        let journal = Journal::new(root.to_path_buf(), records.to_vec());
        let json = serde_json::to_string_pretty(&journal).map_err(|e| {
            DeclutterError::JournalWriteFailed {
                path: self.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            }
        })?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| DeclutterError::JournalWriteFailed {
                path: self.path.clone(),
                source: e,
            })?;
        }

        let temp_path = self.temp_path();
        fs::write(&temp_path, json).map_err(|e| DeclutterError::JournalWriteFailed {
            path: temp_path.clone(),
            source: e,
        })?;
        fs::rename(&temp_path, &self.path).map_err(|e| DeclutterError::JournalWriteFailed {
            path: self.path.clone(),
            source: e,
        })?;

        info!(
            "History saved for potential undo ({} moves): {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Reads the stored journal.
    ///
    /// Returns `Ok(None)` when no journal exists and an error when the file
    /// cannot be read or parsed.
    pub fn read(&self) -> DeclutterResult<Option<Journal>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content =
            fs::read_to_string(&self.path).map_err(|e| DeclutterError::JournalReadFailed {
                path: self.path.clone(),
                source: e,
            })?;

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| DeclutterError::InvalidJournalFormat {
                reason: e.to_string(),
            })
    }

    /// Loads the recorded moves.
    ///
    /// A missing, unreadable or corrupt journal yields an empty list.
    pub fn load(&self) -> Vec<MoveRecord> {
        match self.read() {
            Ok(Some(journal)) => journal.moves,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Error loading history: {}", e);
                Vec::new()
            }
        }
    }

    /// Deletes the stored journal, if any.
    pub fn clear(&self) -> DeclutterResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| DeclutterError::JournalWriteFailed {
                path: self.path.clone(),
                source: e,
            })?;
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "journal".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
