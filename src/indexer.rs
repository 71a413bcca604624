use crate::error::{Error, Result};
use crate::parser::{AstParser, ParsedFile};
use crate::scanner;
use crate::syntax::{CommentGroup, Decl, GenKeyword, TypeShape, TypeSpec};
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A named type declared in a package.
///
/// Types declared inside a function body are keyed `Func@Type`, or
/// `Recv@Func@Type` for methods, so they never collide with package-level
/// names.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDeclaration {
    /// Lookup key within the package
    pub key: String,
    /// Name as written in the source
    pub name: String,
    /// `Func` or `Recv@Func` for function-local types
    pub scope: Option<String>,
    pub type_params: Vec<String>,
    pub shape: TypeShape,
    pub doc: Option<CommentGroup>,
    pub file: PathBuf,
}

/// Everything known about one package directory after parsing it
#[derive(Debug, Default)]
pub struct PackageIndex {
    pub path: PathBuf,
    /// Parsed files, sorted by path
    pub files: Vec<ParsedFile>,
    pub types: HashMap<String, TypeDeclaration>,
    /// Import alias to the import paths bound to it, in first-seen order
    pub imports: BTreeMap<String, Vec<String>>,
}

impl PackageIndex {
    pub fn type_decl(&self, key: &str) -> Option<&TypeDeclaration> {
        self.types.get(key)
    }

    pub fn import_paths(&self, alias: &str) -> &[String] {
        self.imports.get(alias).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Parses package directories on demand and caches the result per directory
pub struct DeclarationIndexer {
    strict: bool,
    cache: HashMap<PathBuf, Rc<PackageIndex>>,
    diagnostics: Vec<Error>,
}

impl DeclarationIndexer {
    /// Create a new indexer; in strict mode unparseable files are errors
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            cache: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Returns the index for a package directory, parsing it on first use.
    ///
    /// Test files and hidden files are ignored. In lax mode a file that
    /// fails to parse is skipped and recorded as a diagnostic.
    pub fn index(&mut self, dir: &Path) -> Result<Rc<PackageIndex>> {
        if let Some(index) = self.cache.get(dir) {
            return Ok(Rc::clone(index));
        }

        debug!("Indexing package {}", dir.display());
        let paths = scanner::list_source_files(dir).map_err(|e| Error::Parse {
            file: dir.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut index = PackageIndex {
            path: dir.to_path_buf(),
            ..Default::default()
        };
        for result in AstParser::parse_files(&paths) {
            match result {
                Ok(parsed) => {
                    index_file(&mut index, &parsed);
                    index.files.push(parsed);
                }
                Err(err) if self.strict => return Err(err),
                Err(err) => self.diagnostics.push(err),
            }
        }

        debug!(
            "Indexed {} types from {} files in {}",
            index.types.len(),
            index.files.len(),
            dir.display()
        );
        let index = Rc::new(index);
        self.cache.insert(dir.to_path_buf(), Rc::clone(&index));
        Ok(index)
    }

    /// Drains diagnostics collected since the last call
    pub fn take_diagnostics(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.diagnostics)
    }
}

fn index_file(index: &mut PackageIndex, parsed: &ParsedFile) {
    for import in &parsed.syntax_tree.imports {
        let alias = match import.name.as_deref() {
            Some(".") | Some("_") => continue,
            Some(name) => name.to_string(),
            None => import
                .path
                .rsplit('/')
                .next()
                .unwrap_or(&import.path)
                .to_string(),
        };
        let paths = index.imports.entry(alias.clone()).or_default();
        if !paths.contains(&import.path) {
            if !paths.is_empty() {
                warn!(
                    "Import alias {} in {} is bound to several paths ({} and {}), using {}",
                    alias,
                    index.path.display(),
                    paths[0],
                    import.path,
                    paths[0]
                );
            }
            paths.push(import.path.clone());
        }
    }

    for decl in &parsed.syntax_tree.decls {
        match decl {
            Decl::Gen(gen) if gen.keyword == GenKeyword::Type => {
                for spec in &gen.types {
                    insert(index, spec, None, &parsed.path);
                }
            }
            Decl::Func(func) => {
                let scope = match &func.receiver {
                    Some(receiver) => format!("{}@{}", receiver, func.name),
                    None => func.name.clone(),
                };
                for spec in &func.local_types {
                    insert(index, spec, Some(scope.clone()), &parsed.path);
                }
            }
            Decl::Gen(_) => {}
        }
    }
}

fn insert(index: &mut PackageIndex, spec: &TypeSpec, scope: Option<String>, file: &Path) {
    let key = match &scope {
        Some(scope) => format!("{}@{}", scope, spec.name),
        None => spec.name.clone(),
    };
    // First declaration wins; Go forbids duplicates so this only matters for broken trees
    index.types.entry(key.clone()).or_insert_with(|| TypeDeclaration {
        key,
        name: spec.name.clone(),
        scope,
        type_params: spec.type_params.clone(),
        shape: spec.shape.clone(),
        doc: spec.doc.clone(),
        file: file.to_path_buf(),
    });
}
