//! Command-line interface module for declutter.
//!
//! Turns a parsed `Command` into calls on the organizer, deduplicator, pruner
//! and undo manager, and renders their reports with `OutputFormatter`.

use crate::classifier::{Classifier, OrganizeMethod};
use crate::config::Config;
use crate::dedupe::Deduplicator;
use crate::error::DeclutterError;
use crate::journal::JournalStore;
use crate::organizer::Organizer;
use crate::output::OutputFormatter;
use crate::prune::EmptyDirPruner;
use crate::undo::UndoManager;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Represents a CLI command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Move the files of a directory into category folders.
    Organize {
        path: PathBuf,
        method: OrganizeMethod,
        /// If true, show what would be moved without moving anything.
        dry_run: bool,
    },
    /// Delete files whose content duplicates an earlier file.
    Dedupe { path: PathBuf, dry_run: bool },
    /// Remove empty folders.
    Prune { path: PathBuf },
    /// Undo the previous organization.
    Undo,
    /// Show the most recent activity log lines.
    Logs,
}

/// Loads configuration and runs a command.
///
/// # Examples
///
/// ```no_run
/// use declutter::cli::{run_cli_with_config, Command};
///
/// match run_cli_with_config(&Command::Undo, None) {
///     Ok(()) => println!("Operation completed successfully"),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli_with_config(command: &Command, config_path: Option<&Path>) -> Result<(), String> {
    let config =
        Config::load(config_path).map_err(|e| format!("Error loading configuration: {}", e))?;
    execute(command, &config)
}

/// Runs a command with an already loaded configuration.
pub fn execute(command: &Command, config: &Config) -> Result<(), String> {
    match command {
        Command::Organize {
            path,
            method,
            dry_run: true,
        } => organize_dry_run(path, *method, config),
        Command::Organize {
            path,
            method,
            dry_run: false,
        } => organize_directory(path, *method, config),
        Command::Dedupe { path, dry_run } => remove_duplicates(path, *dry_run, config),
        Command::Prune { path } => remove_empty_folders(path),
        Command::Undo => undo_organization(config),
        Command::Logs => show_logs(config),
    }
}

fn build_organizer(config: &Config) -> Result<Organizer, String> {
    let filters = config
        .compile_filters()
        .map_err(|e| format!("Error compiling filters: {}", e))?;
    Ok(Organizer::new(
        Classifier::new(config.category_table()),
        filters,
        JournalStore::new(config.journal_path()),
    ))
}

fn organize_directory(path: &Path, method: OrganizeMethod, config: &Config) -> Result<(), String> {
    OutputFormatter::info(&format!(
        "Organizing contents of: {} (by {})",
        path.display(),
        method
    ));

    let report = build_organizer(config)?
        .organize(path, method)
        .map_err(|e| e.to_string())?;

    if report.moves.is_empty() && report.failures.is_empty() {
        OutputFormatter::plain("No files found to organize.");
        return Ok(());
    }

    for record in &report.moves {
        let relative = record
            .destination
            .strip_prefix(&report.root)
            .unwrap_or(&record.destination);
        OutputFormatter::success(&format!(
            "{} → {}",
            file_name(&record.source),
            relative.display()
        ));
    }
    for (file, reason) in &report.failures {
        OutputFormatter::error(&format!("{}: {}", file_name(file), reason));
    }
    if !report.skipped.is_empty() {
        OutputFormatter::plain(&format!(
            "Skipped {} files excluded by filters.",
            report.skipped.len()
        ));
    }

    OutputFormatter::summary_table(&report.category_counts, report.moved_count());

    if report.journal_saved {
        OutputFormatter::success("History saved. Use 'declutter undo' to revert changes.");
    } else if !report.moves.is_empty() {
        OutputFormatter::warning("Could not save history. Undo will not be available.");
    }
    if !report.is_complete_success() {
        OutputFormatter::warning("Some files could not be organized. Please review errors above.");
    }
    Ok(())
}

fn organize_dry_run(path: &Path, method: OrganizeMethod, config: &Config) -> Result<(), String> {
    OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", path.display()));

    let planned = build_organizer(config)?
        .plan(path, method)
        .map_err(|e| e.to_string())?;

    if planned.is_empty() {
        OutputFormatter::plain("No files found to organize.");
        return Ok(());
    }

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut movable = 0;
    for item in &planned {
        if item.blocked {
            OutputFormatter::warning(&format!(
                "{} → would fail: {}/{} already exists",
                file_name(&item.source),
                item.category,
                file_name(&item.destination)
            ));
            continue;
        }
        OutputFormatter::plain(&format!(
            " - {} → would move to {}/",
            file_name(&item.source),
            item.category
        ));
        *counts.entry(item.category.clone()).or_insert(0) += 1;
        movable += 1;
    }
    OutputFormatter::summary_table(&counts, movable);
    OutputFormatter::dry_run_notice("No files were modified.");
    Ok(())
}

fn remove_duplicates(path: &Path, dry_run: bool, config: &Config) -> Result<(), String> {
    let filters = config
        .compile_filters()
        .map_err(|e| format!("Error compiling filters: {}", e))?;

    let spinner = OutputFormatter::spinner("Hashing files");
    let result = Deduplicator::new(filters)
        .dry_run(dry_run)
        .remove_duplicates_with(path, |_| spinner.inc(1));
    spinner.finish_and_clear();
    let report = result.map_err(|e| e.to_string())?;

    for duplicate in &report.duplicates {
        let line = format!(
            "{} (original: {})",
            duplicate.path.display(),
            duplicate.original.display()
        );
        if dry_run {
            OutputFormatter::dry_run_notice(&format!("Would remove {}", line));
        } else {
            OutputFormatter::success(&format!("Removed {}", line));
        }
    }
    for (file, reason) in &report.errors {
        OutputFormatter::error(&format!("{}: {}", file.display(), reason));
    }

    if dry_run {
        OutputFormatter::info(&format!(
            "Scanned {} files, found {} duplicates.",
            report.files_scanned,
            report.duplicates.len()
        ));
    } else {
        OutputFormatter::info(&format!(
            "Scanned {} files, removed {} duplicates.",
            report.files_scanned, report.removed
        ));
    }
    Ok(())
}

fn remove_empty_folders(path: &Path) -> Result<(), String> {
    let report = EmptyDirPruner
        .remove_empty_folders(path)
        .map_err(|e| e.to_string())?;

    for dir in &report.removed {
        OutputFormatter::success(&format!("Removed empty folder {}", dir.display()));
    }
    for (dir, reason) in &report.errors {
        OutputFormatter::error(&format!("{}: {}", dir.display(), reason));
    }
    OutputFormatter::info(&format!("Removed {} empty folders.", report.removed.len()));
    Ok(())
}

fn undo_organization(config: &Config) -> Result<(), String> {
    OutputFormatter::info("Undoing previous organization...");

    let report = match UndoManager::new(JournalStore::new(config.journal_path())).undo() {
        Ok(report) => report,
        Err(DeclutterError::NothingToUndo) => {
            OutputFormatter::warning("Nothing to undo.");
            return Err(DeclutterError::NothingToUndo.to_string());
        }
        Err(e) => return Err(e.to_string()),
    };

    OutputFormatter::success(&format!("Restored: {}", report.restored_files));
    if !report.skipped_files.is_empty() {
        OutputFormatter::warning(&format!("Skipped: {}", report.skipped_files.len()));
        for (path, reason) in &report.skipped_files {
            OutputFormatter::plain(&format!("    - {}: {}", path.display(), reason));
        }
    }
    if !report.failed_restores.is_empty() {
        OutputFormatter::warning(&format!("Failed: {}", report.failed_restores.len()));
        for (path, reason) in &report.failed_restores {
            OutputFormatter::error(&format!("    - {}: {}", path.display(), reason));
        }
    }
    Ok(())
}

fn show_logs(config: &Config) -> Result<(), String> {
    let log_file = config.log_file();
    let content = match fs::read_to_string(&log_file) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            OutputFormatter::plain("No activity recorded yet.");
            return Ok(());
        }
        Err(e) => return Err(format!("Error reading {}: {}", log_file.display(), e)),
    };

    for line in tail(&content, config.recent_log_capacity) {
        OutputFormatter::plain(line);
    }
    Ok(())
}

/// The last `count` lines of `content`.
fn tail(content: &str, count: usize) -> Vec<&str> {
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].to_vec()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
