//! declutter - a directory organization and cleanup utility
//!
//! This library sorts the files of a directory into category or month
//! folders, records every move so the last organization can be undone,
//! removes duplicate files by content hash and prunes empty folders.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod journal;
pub mod logging;
pub mod organizer;
pub mod output;
pub mod prune;
pub mod undo;

pub use classifier::{CategoryTable, Classifier, OrganizeMethod};
pub use config::{CompiledFilters, Config, ConfigError};
pub use dedupe::{DedupReport, Deduplicator, Duplicate};
pub use error::{DeclutterError, DeclutterResult};
pub use journal::{Journal, JournalStore, MoveRecord};
pub use organizer::{OrganizeReport, Organizer, PlannedMove};
pub use prune::{EmptyDirPruner, PruneReport};
pub use undo::{UndoManager, UndoReport};

pub use cli::{Command, execute, run_cli_with_config};
