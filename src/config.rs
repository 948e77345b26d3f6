//! Configuration loading and file filtering.
//!
//! Configuration is read once at start-up from a TOML file and controls where
//! the journal and the log file live, which extensions map to which category
//! folders, and which files the organizer and the deduplicator must leave
//! alone.
//!
//! # Configuration File Format
//!
//! ```toml
//! journal_path = "/home/me/.local/state/declutter/journal.json"
//! log_file = "/home/me/.local/state/declutter/declutter.log"
//! recent_log_capacity = 100
//!
//! [categories]
//! Images = ["jpg", "png"]
//! Documents = [".pdf", "txt"]
//!
//! [filters]
//! include_hidden = true
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.part", "node_modules/**"]
//! extensions = ["tmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```
//!
//! Every key is optional. Without a `[categories]` table the built-in
//! category rules are used.

use crate::classifier::CategoryTable;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".declutterrc.toml";

const JOURNAL_FILE_NAME: &str = "journal.json";
const LOG_FILE_NAME: &str = "declutter.log";
const DEFAULT_RECENT_LOG_CAPACITY: usize = 100;

/// Errors that can occur during configuration loading.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided.
    InvalidRegexPattern { pattern: String, reason: String },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the undo journal is stored.
    pub journal_path: Option<PathBuf>,
    /// Append-only activity log file.
    pub log_file: Option<PathBuf>,
    /// Number of recent log lines kept in memory.
    pub recent_log_capacity: usize,
    /// Category label to extensions. Replaces the built-in table when present.
    pub categories: Option<BTreeMap<String, Vec<String>>>,
    pub filters: FilterRules,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            journal_path: None,
            log_file: None,
            recent_log_capacity: DEFAULT_RECENT_LOG_CAPACITY,
            categories: None,
            filters: FilterRules::default(),
        }
    }
}

/// Rules deciding which files are organized and deduplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    /// Whether files starting with "." are processed.
    pub include_hidden: bool,
    pub exclude: ExcludeRules,
    /// Whitelist that overrides every exclude rule.
    pub include: IncludeRules,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            include_hidden: true,
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

/// Rules for excluding files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcludeRules {
    /// Exact file names (e.g. ".DS_Store").
    pub filenames: Vec<String>,
    /// Glob patterns matched against the path relative to the root.
    pub patterns: Vec<String>,
    /// Extensions, case-insensitive, with or without the leading dot.
    pub extensions: Vec<String>,
    /// Regexes matched against the file name.
    pub regex: Vec<String>,
}

/// Rules for including files, overriding exclude rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IncludeRules {
    pub patterns: Vec<String>,
}

impl Config {
    /// Loads configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, when given (must exist)
    /// 2. `.declutterrc.toml` in the current directory
    /// 3. `~/.config/declutter/config.toml`
    /// 4. built-in defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(".config").join("declutter").join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Loads configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Builds the category table: configured rules or the built-in table.
    pub fn category_table(&self) -> CategoryTable {
        match &self.categories {
            Some(rules) => CategoryTable::from_rules(rules),
            None => CategoryTable::default(),
        }
    }

    /// Compiles the filter rules.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }

    /// Resolved journal location.
    pub fn journal_path(&self) -> PathBuf {
        self.journal_path
            .clone()
            .unwrap_or_else(|| default_state_file(JOURNAL_FILE_NAME))
    }

    /// Resolved log file location.
    pub fn log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| default_state_file(LOG_FILE_NAME))
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
}

/// `~/.local/state/declutter/<name>`, or `.declutter_<name>` in the current
/// directory when `HOME` is unset.
fn default_state_file(name: &str) -> PathBuf {
    match home_dir() {
        Some(home) => home
            .join(".local")
            .join("state")
            .join("declutter")
            .join(name),
        None => PathBuf::from(format!(".declutter_{}", name)),
    }
}

/// Pre-compiled filter rules.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    include_hidden: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        Ok(Self {
            include_hidden: rules.include_hidden,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns: compile_globs(&rules.exclude.patterns)?,
            exclude_regexes: rules
                .exclude
                .regex
                .iter()
                .map(|pattern| {
                    Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            include_patterns: compile_globs(&rules.include.patterns)?,
        })
    }

    /// Filters that accept every file.
    pub fn permissive() -> Self {
        Self {
            include_hidden: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }

    /// Checks whether a file should be processed.
    ///
    /// `relative_path` is the file's path relative to the root being
    /// processed. Include patterns win over everything; after that a file is
    /// rejected by the hidden-file switch, then exact names, extensions, glob
    /// patterns and regexes, in that order.
    pub fn should_include(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return true;
        }

        if !self.include_hidden && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(&*file_name) {
            return false;
        }

        if let Some(ext) = relative_path.extension()
            && self
                .exclude_extensions
                .contains(&ext.to_string_lossy().to_lowercase())
        {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}
