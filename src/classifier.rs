/// File classification for organizing files by type or by date.
///
/// A `CategoryTable` maps file extensions to category labels such as
/// "Images" or "Documents". The `Classifier` turns a file name or a
/// modification time into the name of the folder the file belongs in.
///
/// # Examples
///
/// ```
/// use declutter::classifier::Classifier;
///
/// let classifier = Classifier::default();
/// assert_eq!(classifier.classify_by_type("holiday.JPG"), "Images");
/// assert_eq!(classifier.classify_by_type("notes.pdf"), "Documents");
/// assert_eq!(classifier.classify_by_type("mystery.xyz"), "Others");
/// ```
use crate::error::{DeclutterError, DeclutterResult};
use chrono::{DateTime, Local, TimeZone};
use std::collections::{BTreeMap, HashMap};
use std::fs::Metadata;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Folder used for files whose extension matches no rule.
pub const FALLBACK_CATEGORY: &str = "Others";

/// How an organization pass chooses a destination folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OrganizeMethod {
    /// Group files by extension into category folders.
    #[default]
    Type,
    /// Group files into `YYYY-MM` folders by modification time.
    Date,
}

impl OrganizeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizeMethod::Type => "type",
            OrganizeMethod::Date => "date",
        }
    }
}

impl std::fmt::Display for OrganizeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps file extensions to category labels.
///
/// Extensions are stored lowercase and without the leading dot, so
/// `".JPG"`, `"jpg"` and `"Jpg"` all refer to the same rule.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    extension_map: HashMap<String, String>,
}

impl CategoryTable {
    /// Creates a table with no rules. Every file classifies as `Others`.
    pub fn empty() -> Self {
        Self {
            extension_map: HashMap::new(),
        }
    }

    /// Builds a table from `label -> [extensions]` rules, as found in the
    /// `[categories]` section of the configuration file.
    ///
    /// When an extension is listed under several labels, the label that
    /// sorts last wins.
    pub fn from_rules(rules: &BTreeMap<String, Vec<String>>) -> Self {
        let mut table = Self::empty();
        for (label, extensions) in rules {
            for ext in extensions {
                table.add_extension_mapping(ext, label);
            }
        }
        table
    }

    /// Adds a file extension to category mapping.
    pub fn add_extension_mapping(&mut self, ext: &str, label: &str) {
        self.extension_map
            .insert(normalize_extension(ext), label.to_string());
    }

    /// Maps a file extension to a category label.
    ///
    /// # Examples
    ///
    /// ```
    /// use declutter::classifier::CategoryTable;
    ///
    /// let table = CategoryTable::default();
    /// assert_eq!(table.extension_to_category("PDF"), Some("Documents"));
    /// assert_eq!(table.extension_to_category(".mp3"), Some("Audio"));
    /// assert_eq!(table.extension_to_category("xyz"), None);
    /// ```
    pub fn extension_to_category(&self, ext: &str) -> Option<&str> {
        self.extension_map
            .get(&normalize_extension(ext))
            .map(String::as_str)
    }

    fn populate_standard_mappings(&mut self) {
        const STANDARD: &[(&str, &[&str])] = &[
            (
                "Images",
                &[
                    "jpg", "jpeg", "png", "gif", "bmp", "webp", "svg", "tiff", "ico", "heic",
                ],
            ),
            ("Audio", &["mp3", "wav", "ogg", "flac", "aac", "m4a", "wma"]),
            (
                "Videos",
                &["mp4", "mkv", "avi", "mov", "flv", "wmv", "webm", "3gp"],
            ),
            (
                "Documents",
                &["pdf", "txt", "doc", "docx", "md", "rtf", "odt", "html", "htm"],
            ),
            ("Archives", &["zip", "rar", "7z", "tar", "gz", "bz2", "xz"]),
            (
                "Code",
                &[
                    "py", "java", "c", "cpp", "h", "hpp", "js", "ts", "rs", "go", "sh", "json",
                    "xml", "yaml", "yml", "toml", "css",
                ],
            ),
            ("Spreadsheets", &["csv", "xls", "xlsx", "ods"]),
            ("Presentations", &["ppt", "pptx", "odp", "key"]),
            ("Fonts", &["ttf", "otf", "woff", "woff2"]),
            ("Installers", &["dmg", "pkg", "exe", "msi", "deb", "rpm", "apk"]),
        ];

        for (label, extensions) in STANDARD {
            for ext in *extensions {
                self.add_extension_mapping(ext, label);
            }
        }
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.populate_standard_mappings();
        table
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Chooses destination folders for files.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    table: CategoryTable,
}

impl Classifier {
    pub fn new(table: CategoryTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    /// Returns the category for a file name, or `Others` if no rule matches.
    ///
    /// Only the last extension counts (`backup.tar.gz` is a `gz` file) and a
    /// name made of a leading dot alone (`.bashrc`) has no extension.
    pub fn classify_by_type(&self, file_name: impl AsRef<Path>) -> String {
        file_name
            .as_ref()
            .extension()
            .and_then(|ext| self.table.extension_to_category(&ext.to_string_lossy()))
            .unwrap_or(FALLBACK_CATEGORY)
            .to_string()
    }

    /// Formats a modification time as a `YYYY-MM` label in local time.
    ///
    /// Times that cannot be represented as a local date (filesystems with
    /// 64-bit timestamps can store mtimes far beyond year 262143) get the
    /// `Others` label, so the file is still moved and journaled.
    pub fn classify_by_date(&self, modified: SystemTime) -> String {
        match local_datetime(modified) {
            Some(local) => local.format("%Y-%m").to_string(),
            None => FALLBACK_CATEGORY.to_string(),
        }
    }

    /// Classifies a file with the given method.
    ///
    /// The date method reads the modification time from `metadata`; platforms
    /// that cannot report it produce a `Metadata` error for the item.
    pub fn classify(
        &self,
        method: OrganizeMethod,
        path: &Path,
        metadata: &Metadata,
    ) -> DeclutterResult<String> {
        match method {
            OrganizeMethod::Type => Ok(self.classify_by_type(path)),
            OrganizeMethod::Date => {
                let modified = metadata
                    .modified()
                    .map_err(|e| DeclutterError::Metadata {
                        path: path.to_path_buf(),
                        source: e,
                    })?;
                Ok(self.classify_by_date(modified))
            }
        }
    }
}

/// Converts a `SystemTime` to local time, or `None` when it is out of range.
fn local_datetime(time: SystemTime) -> Option<DateTime<Local>> {
    let (secs, nanos) = match time.duration_since(UNIX_EPOCH) {
        Ok(since) => (i64::try_from(since.as_secs()).ok()?, since.subsec_nanos()),
        Err(e) => {
            let before = e.duration();
            let secs = i64::try_from(before.as_secs()).ok()?;
            match before.subsec_nanos() {
                0 => (-secs, 0),
                nanos => (-secs - 1, 1_000_000_000 - nanos),
            }
        }
    };
    Local.timestamp_opt(secs, nanos).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_standard_categories() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify_by_type("a.jpg"), "Images");
        assert_eq!(classifier.classify_by_type("b.pdf"), "Documents");
        assert_eq!(classifier.classify_by_type("song.flac"), "Audio");
        assert_eq!(classifier.classify_by_type("clip.mkv"), "Videos");
        assert_eq!(classifier.classify_by_type("main.rs"), "Code");
        assert_eq!(classifier.classify_by_type("setup.exe"), "Installers");
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify_by_type("PHOTO.JPG"), "Images");
        assert_eq!(classifier.classify_by_type("Report.Pdf"), "Documents");
    }

    #[test]
    fn test_unknown_and_missing_extensions_fall_back() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify_by_type("c.xyz"), FALLBACK_CATEGORY);
        assert_eq!(classifier.classify_by_type("Makefile"), FALLBACK_CATEGORY);
        assert_eq!(classifier.classify_by_type(".bashrc"), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_only_last_extension_counts() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify_by_type("backup.tar.gz"), "Archives");
        assert_eq!(classifier.classify_by_type("photo.jpg.txt"), "Documents");
    }

    #[test]
    fn test_rules_accept_leading_dot() {
        let mut rules = BTreeMap::new();
        rules.insert(
            "Images".to_string(),
            vec![".JPG".to_string(), "png".to_string()],
        );
        rules.insert("Documents".to_string(), vec![".pdf".to_string()]);
        let classifier = Classifier::new(CategoryTable::from_rules(&rules));

        assert_eq!(classifier.classify_by_type("a.jpg"), "Images");
        assert_eq!(classifier.classify_by_type("b.PNG"), "Images");
        assert_eq!(classifier.classify_by_type("c.pdf"), "Documents");
        assert_eq!(classifier.classify_by_type("d.mp3"), FALLBACK_CATEGORY);
        assert_eq!(classifier.table().extension_to_category("jpg"), Some("Images"));
    }

    #[test]
    fn test_empty_table_classifies_everything_as_others() {
        let classifier = Classifier::new(CategoryTable::empty());
        assert_eq!(classifier.table().extension_to_category("jpg"), None);
        assert_eq!(classifier.classify_by_type("a.jpg"), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_classify_by_date_uses_local_year_month() {
        let classifier = Classifier::default();
        let local = Local
            .with_ymd_and_hms(2023, 7, 15, 12, 0, 0)
            .single()
            .expect("unambiguous local time");
        let modified: SystemTime = local.into();
        assert_eq!(classifier.classify_by_date(modified), "2023-07");
    }

    #[test]
    fn test_classify_by_date_before_epoch() {
        let classifier = Classifier::default();
        let local = Local
            .with_ymd_and_hms(1965, 2, 10, 8, 30, 0)
            .single()
            .expect("unambiguous local time");
        let modified: SystemTime = local.into();
        assert_eq!(classifier.classify_by_date(modified), "1965-02");
    }

    #[test]
    fn test_out_of_range_mtime_falls_back() {
        let classifier = Classifier::default();
        let far_future = UNIX_EPOCH + Duration::from_secs(1 << 50);
        assert_eq!(classifier.classify_by_date(far_future), FALLBACK_CATEGORY);

        if let Some(far_past) = UNIX_EPOCH.checked_sub(Duration::from_secs(1 << 50)) {
            assert_eq!(classifier.classify_by_date(far_past), FALLBACK_CATEGORY);
        }
    }

    #[test]
    fn test_method_display() {
        assert_eq!(OrganizeMethod::Type.to_string(), "type");
        assert_eq!(OrganizeMethod::Date.to_string(), "date");
        assert_eq!(OrganizeMethod::default(), OrganizeMethod::Type);
    }
}
