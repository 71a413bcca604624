use crate::error::{Error, Result};
use crate::parser::AstParser;
use crate::scanner;
use log::debug;
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for one generation run.
///
/// Built with [`GeneratorConfig::new`] and the `with_*` methods, then
/// checked and completed by [`GeneratorConfig::resolve`].
#[derive(Debug, Clone, Default)]
pub struct GeneratorConfig {
    /// Root of the Go module, the directory holding `go.mod`
    pub module_path: PathBuf,
    /// File carrying the general API info comments; discovered when absent
    pub main_file_path: Option<PathBuf>,
    /// Restricts operation scanning to packages under this directory
    pub handler_path: Option<PathBuf>,
    /// Turn every recoverable diagnostic into a hard error
    pub strict: bool,
    /// Use bare type names as schema ids
    pub schema_without_package: bool,
    /// Module download cache; falls back to the Go environment variables
    pub go_mod_cache: Option<PathBuf>,
    /// Standard library source tree (`$GOROOT/src`)
    pub go_root_src: Option<PathBuf>,
}

/// A configuration whose paths have been checked and canonicalized
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub module_root: PathBuf,
    pub go_mod_file: PathBuf,
    pub main_file: PathBuf,
    pub handler_root: Option<PathBuf>,
    pub strict: bool,
    pub schema_without_package: bool,
    pub go_mod_cache: Option<PathBuf>,
    pub go_root_src: Option<PathBuf>,
}

impl GeneratorConfig {
    pub fn new(module_path: impl Into<PathBuf>) -> Self {
        Self {
            module_path: module_path.into(),
            ..Default::default()
        }
    }

    pub fn with_main_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.main_file_path = Some(path.into());
        self
    }

    pub fn with_handler_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.handler_path = Some(path.into());
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_schema_without_package(mut self, enabled: bool) -> Self {
        self.schema_without_package = enabled;
        self
    }

    pub fn with_go_mod_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.go_mod_cache = Some(path.into());
        self
    }

    pub fn with_go_root_src(mut self, path: impl Into<PathBuf>) -> Self {
        self.go_root_src = Some(path.into());
        self
    }

    /// Validates paths and fills in environment defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` when the module path is not a
    /// directory, `go.mod` is missing, a given main file or handler path does
    /// not exist, or no main file can be discovered.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let module_root = canonical_dir(&self.module_path, "module path")?;

        let go_mod_file = module_root.join("go.mod");
        if !go_mod_file.is_file() {
            return Err(Error::InvalidArgument(format!(
                "cannot find go.mod in {}",
                module_root.display()
            )));
        }

        let main_file = match &self.main_file_path {
            Some(path) => {
                let path = relative_to(&module_root, path);
                if !path.is_file() {
                    return Err(Error::InvalidArgument(format!(
                        "main file {} is not a file",
                        path.display()
                    )));
                }
                fs::canonicalize(&path)?
            }
            None => find_main_file(&module_root)?.ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "cannot find a main file (package main with func main) under {}",
                    module_root.display()
                ))
            })?,
        };

        let handler_root = match &self.handler_path {
            Some(path) => Some(canonical_dir(&relative_to(&module_root, path), "handler path")?),
            None => None,
        };

        let go_mod_cache = self.go_mod_cache.clone().or_else(default_go_mod_cache);
        let go_root_src = self.go_root_src.clone().or_else(default_go_root_src);
        debug!(
            "Resolved module root {}, main file {}, module cache {:?}, go root {:?}",
            module_root.display(),
            main_file.display(),
            go_mod_cache,
            go_root_src
        );

        Ok(ResolvedConfig {
            module_root,
            go_mod_file,
            main_file,
            handler_root,
            strict: self.strict,
            schema_without_package: self.schema_without_package,
            go_mod_cache,
            go_root_src,
        })
    }
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    let joined = root.join(path);
    if path.is_absolute() || !joined.exists() {
        path.to_path_buf()
    } else {
        joined
    }
}

fn canonical_dir(path: &Path, what: &str) -> Result<PathBuf> {
    if !path.is_dir() {
        return Err(Error::InvalidArgument(format!(
            "{} {} is not a directory",
            what,
            path.display()
        )));
    }
    Ok(fs::canonicalize(path)?)
}

/// Finds the first file (in name order) of the module root declaring
/// `package main` with `func main()`.
pub fn find_main_file(module_root: &Path) -> Result<Option<PathBuf>> {
    let files = scanner::list_source_files(module_root)
        .map_err(|e| Error::InvalidArgument(e.to_string()))?;
    for file in files {
        // Unparseable files cannot be the entry point
        if let Ok(parsed) = AstParser::parse_file(&file) {
            if parsed.syntax_tree.is_main() {
                debug!("Discovered main file {}", file.display());
                return Ok(Some(file));
            }
        }
    }
    Ok(None)
}

/// `GOMODCACHE`, else the last `GOPATH` entry plus `pkg/mod`, else `~/go/pkg/mod`
pub fn default_go_mod_cache() -> Option<PathBuf> {
    if let Some(cache) = env::var_os("GOMODCACHE").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(cache));
    }
    if let Some(cache) = env::var_os("GOPATH").and_then(|gopath| gopath_mod_cache(&gopath)) {
        return Some(cache);
    }
    env::var_os("HOME").map(|home| PathBuf::from(home).join("go").join("pkg").join("mod"))
}

/// Module cache under the last entry of a `GOPATH` list
fn gopath_mod_cache(gopath: &OsStr) -> Option<PathBuf> {
    env::split_paths(gopath)
        .filter(|entry| !entry.as_os_str().is_empty())
        .last()
        .map(|entry| entry.join("pkg").join("mod"))
}

/// `$GOROOT/src` when `GOROOT` is set
pub fn default_go_root_src() -> Option<PathBuf> {
    env::var_os("GOROOT")
        .filter(|v| !v.is_empty())
        .map(|root| PathBuf::from(root).join("src"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn module(dir: &TempDir) {
        fs::write(dir.path().join("go.mod"), "module example.com/app\n").unwrap();
    }

    #[test]
    fn test_resolve_discovers_main_file() {
        let temp_dir = TempDir::new().unwrap();
        module(&temp_dir);
        fs::write(temp_dir.path().join("lib.go"), "package app\n").unwrap();
        fs::write(
            temp_dir.path().join("server.go"),
            "package main\n\nfunc main() {}\n",
        )
        .unwrap();

        let resolved = GeneratorConfig::new(temp_dir.path())
            .with_go_mod_cache("/tmp/cache")
            .resolve()
            .unwrap();
        assert!(resolved.main_file.ends_with("server.go"));
        assert_eq!(resolved.go_mod_cache, Some(PathBuf::from("/tmp/cache")));
    }

    #[test]
    fn test_main_file_is_only_searched_in_module_root() {
        let temp_dir = TempDir::new().unwrap();
        module(&temp_dir);
        fs::create_dir_all(temp_dir.path().join("cmd/server")).unwrap();
        fs::write(
            temp_dir.path().join("cmd/server/main.go"),
            "package main\n\nfunc main() {}\n",
        )
        .unwrap();

        assert_eq!(find_main_file(temp_dir.path()).unwrap(), None);
        let resolved = GeneratorConfig::new(temp_dir.path())
            .with_main_file("cmd/server/main.go")
            .resolve()
            .unwrap();
        assert!(resolved.main_file.ends_with("cmd/server/main.go"));
    }

    #[test]
    fn test_gopath_mod_cache_uses_last_entry() {
        let gopath = env::join_paths(["/first/go", "/second/go"]).unwrap();
        assert_eq!(
            gopath_mod_cache(&gopath),
            Some(PathBuf::from("/second/go/pkg/mod"))
        );
        assert_eq!(gopath_mod_cache(OsStr::new("")), None);
    }

    #[test]
    fn test_resolve_requires_go_mod() {
        let temp_dir = TempDir::new().unwrap();
        let err = GeneratorConfig::new(temp_dir.path()).resolve().unwrap_err();
        assert!(err.to_string().contains("go.mod"));
    }

    #[test]
    fn test_resolve_without_main_file() {
        let temp_dir = TempDir::new().unwrap();
        module(&temp_dir);
        fs::write(temp_dir.path().join("lib.go"), "package app\n").unwrap();
        let err = GeneratorConfig::new(temp_dir.path()).resolve().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_resolve_relative_main_and_handler() {
        let temp_dir = TempDir::new().unwrap();
        module(&temp_dir);
        fs::create_dir_all(temp_dir.path().join("handler")).unwrap();
        fs::write(temp_dir.path().join("app.go"), "package main\n").unwrap();

        let resolved = GeneratorConfig::new(temp_dir.path())
            .with_main_file("app.go")
            .with_handler_path("handler")
            .resolve()
            .unwrap();
        assert!(resolved.main_file.ends_with("app.go"));
        assert!(resolved.handler_root.unwrap().ends_with("handler"));
    }

    #[test]
    fn test_resolve_rejects_missing_handler_path() {
        let temp_dir = TempDir::new().unwrap();
        module(&temp_dir);
        fs::write(temp_dir.path().join("app.go"), "package main\n").unwrap();
        let result = GeneratorConfig::new(temp_dir.path())
            .with_main_file("app.go")
            .with_handler_path("missing")
            .resolve();
        assert!(result.is_err());
    }
}
