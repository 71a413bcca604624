use crate::error::{Error, Result};
use crate::gomod::GoMod;
use crate::scanner::{self, FileScanner};
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Where a package's sources come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageOrigin {
    /// The module being documented
    Module,
    /// A required module in the download cache or a local replacement
    Dependency,
    /// The standard library under `$GOROOT/src`
    Core,
}

/// A Go package: its import path and the directory holding its sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub path: PathBuf,
    pub origin: PackageOrigin,
}

impl Package {
    /// Last segment of the import path
    pub fn short_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Maps import paths to source directories.
///
/// Packages of the module itself are discovered eagerly by walking the module
/// tree. Dependency and standard library packages are found on demand:
/// search order is module tree, then each required module's source root,
/// then the standard library tree. Every answer, including "not found", is
/// memoized so a name is resolved at most once per run.
pub struct PackageLocator {
    module_root: PathBuf,
    manifest: GoMod,
    cache_root: Option<PathBuf>,
    core_root: Option<PathBuf>,
    /// Known packages by import path
    packages: BTreeMap<String, Package>,
    by_path: HashMap<PathBuf, String>,
    memo: HashMap<String, Option<Package>>,
}

impl PackageLocator {
    /// Walks the module tree and registers every package directory in it.
    ///
    /// # Arguments
    ///
    /// * `module_root` - Canonical module directory
    /// * `manifest` - The module's parsed `go.mod`
    /// * `cache_root` - Module download cache, if any
    /// * `core_root` - Standard library source tree, if any
    pub fn discover(
        module_root: &Path,
        manifest: GoMod,
        cache_root: Option<PathBuf>,
        core_root: Option<PathBuf>,
    ) -> Result<Self> {
        let mut locator = Self {
            module_root: module_root.to_path_buf(),
            manifest,
            cache_root,
            core_root,
            packages: BTreeMap::new(),
            by_path: HashMap::new(),
            memo: HashMap::new(),
        };

        let scan = FileScanner::new(module_root.to_path_buf())
            .scan()
            .map_err(|e| Error::InvalidArgument(e.to_string()))?;
        for dir in scan.package_dirs {
            let relative = dir
                .strip_prefix(module_root)
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            let name = if relative.is_empty() {
                locator.manifest.module.clone()
            } else {
                format!("{}/{}", locator.manifest.module, relative)
            };
            locator.register(name, dir, PackageOrigin::Module);
        }

        debug!(
            "Discovered {} packages in module {}",
            locator.packages.len(),
            locator.manifest.module
        );
        Ok(locator)
    }

    pub fn module_name(&self) -> &str {
        &self.manifest.module
    }

    pub fn module_root(&self) -> &Path {
        &self.module_root
    }

    fn register(&mut self, name: String, path: PathBuf, origin: PackageOrigin) -> Package {
        let package = Package {
            name: name.clone(),
            path: path.clone(),
            origin,
        };
        self.by_path.insert(path, name.clone());
        self.packages.insert(name, package.clone());
        package
    }

    /// Packages of the module itself, sorted by import path
    pub fn module_packages(&self) -> Vec<Package> {
        self.packages
            .values()
            .filter(|p| p.origin == PackageOrigin::Module)
            .cloned()
            .collect()
    }

    /// Every package registered so far, sorted by import path
    pub fn known_packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn package_by_path(&self, path: &Path) -> Option<&Package> {
        self.by_path
            .get(path)
            .and_then(|name| self.packages.get(name))
    }

    /// Resolves an import path to its package, memoizing the answer.
    pub fn locate(&mut self, import_path: &str) -> Option<Package> {
        if let Some(cached) = self.memo.get(import_path) {
            return cached.clone();
        }

        let found = self.search(import_path);
        match &found {
            Some(package) => debug!(
                "Located package {} at {}",
                import_path,
                package.path.display()
            ),
            None => debug!("Package {} not found", import_path),
        }
        self.memo.insert(import_path.to_string(), found.clone());
        found
    }

    fn search(&mut self, import_path: &str) -> Option<Package> {
        if let Some(package) = self.packages.get(import_path) {
            return Some(package.clone());
        }

        if let Some(dir) = self.dependency_dir(import_path) {
            if scanner::has_go_files(&dir) {
                return Some(self.register(import_path.to_string(), dir, PackageOrigin::Dependency));
            }
        }

        if is_standard_library_path(import_path) {
            if let Some(core_root) = &self.core_root {
                let dir = core_root.join(import_path);
                if scanner::has_go_files(&dir) {
                    return Some(self.register(import_path.to_string(), dir, PackageOrigin::Core));
                }
            }
        }

        None
    }

    /// Directory of `import_path` inside the longest matching required module
    fn dependency_dir(&self, import_path: &str) -> Option<PathBuf> {
        let requirement = self
            .manifest
            .requires
            .iter()
            .filter(|r| {
                import_path == r.path || import_path.starts_with(&format!("{}/", r.path))
            })
            .max_by_key(|r| r.path.len())?;

        let is_local_replacement = self
            .manifest
            .replaces
            .iter()
            .any(|r| r.from == requirement.path && r.is_local());
        let cache_root = match (&self.cache_root, is_local_replacement) {
            (Some(cache), _) => cache.clone(),
            (None, true) => PathBuf::new(),
            (None, false) => {
                warn!(
                    "No module cache configured, cannot look up {}",
                    requirement.path
                );
                return None;
            }
        };

        let root = self
            .manifest
            .dependency_root(requirement, &self.module_root, &cache_root);
        let rest = import_path[requirement.path.len()..].trim_start_matches('/');
        Some(if rest.is_empty() { root } else { root.join(rest) })
    }

    /// Whether the import path names a standard library package
    pub fn is_core(&mut self, import_path: &str) -> bool {
        self.locate(import_path)
            .map(|p| p.origin == PackageOrigin::Core)
            .unwrap_or(false)
    }

    /// Known packages whose import path ends with `/alias` or equals it
    pub fn find_by_suffix(&self, alias: &str) -> Vec<Package> {
        let suffix = format!("/{}", alias);
        self.packages
            .values()
            .filter(|p| p.name == alias || p.name.ends_with(&suffix))
            .cloned()
            .collect()
    }
}

/// Standard library import paths have no dot in their first element
pub fn is_standard_library_path(import_path: &str) -> bool {
    let first = import_path.split('/').next().unwrap_or("");
    !first.is_empty() && !first.contains('.')
}
