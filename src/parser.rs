use crate::error::{Error, Result};
use crate::syntax::{self, File};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// AST (Abstract Syntax Tree) parser for Go source files.
///
/// The `AstParser` reads a Go file and hands it to the declaration parser in
/// [`crate::syntax`], which keeps package clause, imports, type declarations
/// and doc comments. Function bodies are only searched for local type
/// declarations.
///
/// # Example
///
/// ```no_run
/// use goas::parser::AstParser;
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("main.go")).unwrap();
/// println!("Parsed {} declarations", parsed.syntax_tree.decls.len());
/// ```
pub struct AstParser;

/// A successfully parsed Go file with its declaration tree.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// The parsed declaration tree
    pub syntax_tree: File,
}

impl AstParser {
    /// Parses a single Go source file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the Go source file to parse
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file contains invalid Go syntax
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path)?;
        let syntax_tree = syntax::parse_source(&content).map_err(|message| Error::Parse {
            file: path.to_path_buf(),
            message,
        })?;

        Ok(ParsedFile {
            path: path.to_path_buf(),
            syntax_tree,
        })
    }

    /// Parses multiple Go source files, continuing even if some fail.
    ///
    /// Files that fail to parse are logged as warnings, but parsing continues
    /// for the remaining files so a single broken file does not hide a whole
    /// package.
    ///
    /// # Returns
    ///
    /// Returns a vector of `Result<ParsedFile>`, one for each input path.
    pub fn parse_files(paths: &[PathBuf]) -> Vec<Result<ParsedFile>> {
        debug!("Parsing {} files", paths.len());

        let results: Vec<Result<ParsedFile>> = paths
            .iter()
            .map(|path| match Self::parse_file(path) {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    Err(e)
                }
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    /// Helper function to create a temporary file with content
    fn create_temp_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let file_path = dir.path().join(name);
        let mut file = fs::File::create(&file_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file_path
    }

    #[test]
    fn test_parse_valid_go_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = create_temp_file(
            &temp_dir,
            "user.go",
            r#"
package models

type User struct {
    ID   int64  `json:"id"`
    Name string `json:"name"`
}

func (u *User) Valid() bool {
    return u.ID > 0
}
"#,
        );

        let parsed = AstParser::parse_file(&file_path).unwrap();
        assert_eq!(parsed.path, file_path);
        assert_eq!(parsed.syntax_tree.package, "models");
        assert_eq!(parsed.syntax_tree.decls.len(), 2);
    }

    #[test]
    fn test_parse_invalid_go_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = create_temp_file(&temp_dir, "broken.go", "package a\n\ntype A struct {\n");

        let err = AstParser::parse_file(&file_path).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_parse_missing_file() {
        let result = AstParser::parse_file(Path::new("/nonexistent/file.go"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_parse_files_continues_on_error() {
        let temp_dir = TempDir::new().unwrap();
        let good = create_temp_file(&temp_dir, "good.go", "package a\n");
        let bad = create_temp_file(&temp_dir, "bad.go", "package\n");

        let results = AstParser::parse_files(&[good, bad]);
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
