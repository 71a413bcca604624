use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File scanner for traversing Go source trees.
///
/// The `FileScanner` recursively walks a directory to find every package
/// directory, meaning a directory holding at least one `.go` file. Hidden
/// directories (those starting with `.`) are skipped. Entries are visited in
/// file-name order so the result is stable across runs.
///
/// # Example
///
/// ```no_run
/// use goas::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-service"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} packages", result.package_dirs.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// Result of directory scanning operation.
///
/// Contains the discovered package directories and any warnings encountered during scanning.
pub struct ScanResult {
    /// Directories containing at least one `.go` file, sorted
    pub package_dirs: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl FileScanner {
    /// Creates a new `FileScanner` for the specified root directory.
    ///
    /// # Arguments
    ///
    /// * `root_path` - The root directory to scan for Go packages
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scans the directory tree and collects all package directories.
    ///
    /// If any directories or files cannot be accessed, warnings are logged and added to
    /// the result, but scanning continues.
    ///
    /// # Errors
    ///
    /// Returns an error if the root path is not a directory.
    pub fn scan(&self) -> Result<ScanResult> {
        if !self.root_path.is_dir() {
            anyhow::bail!("Not a directory: {}", self.root_path.display());
        }

        let mut package_dirs = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.path() == self.root_path || !is_hidden(e.path()))
        {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_dir() && has_go_files(entry.path()) {
                        package_dirs.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        debug!(
            "Found {} package directories under {}",
            package_dirs.len(),
            self.root_path.display()
        );

        Ok(ScanResult {
            package_dirs,
            warnings,
        })
    }
}

/// Lists the parseable source files of one package directory.
///
/// Test files (`_test.go`) and hidden files are excluded. The result is
/// sorted by file name.
pub fn list_source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || is_hidden(&path) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(".go") && !name.ends_with("_test.go") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Whether a directory directly contains any `.go` file
pub fn has_go_files(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|entries| {
            entries.filter_map(|e| e.ok()).any(|e| {
                e.path().is_file() && e.path().extension().and_then(|s| s.to_str()) == Some("go")
            })
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}
