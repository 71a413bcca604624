use crate::error::{Error, Result};
use crate::indexer::{DeclarationIndexer, PackageIndex, TypeDeclaration};
use crate::locator::{Package, PackageLocator, PackageOrigin};
use crate::syntax::{Field, TypeShape};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::rc::Rc;

/// Go's predeclared types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Bool,
    String,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Byte,
    Rune,
    Float32,
    Float64,
    Complex64,
    Complex128,
    Error,
}

impl PrimitiveType {
    pub fn parse(name: &str) -> Option<Self> {
        let primitive = match name {
            "bool" => PrimitiveType::Bool,
            "string" => PrimitiveType::String,
            "int" => PrimitiveType::Int,
            "int8" => PrimitiveType::Int8,
            "int16" => PrimitiveType::Int16,
            "int32" => PrimitiveType::Int32,
            "int64" => PrimitiveType::Int64,
            "uint" => PrimitiveType::Uint,
            "uint8" => PrimitiveType::Uint8,
            "uint16" => PrimitiveType::Uint16,
            "uint32" => PrimitiveType::Uint32,
            "uint64" => PrimitiveType::Uint64,
            "uintptr" => PrimitiveType::Uintptr,
            "byte" => PrimitiveType::Byte,
            "rune" => PrimitiveType::Rune,
            "float32" => PrimitiveType::Float32,
            "float64" => PrimitiveType::Float64,
            "complex64" => PrimitiveType::Complex64,
            "complex128" => PrimitiveType::Complex128,
            "error" => PrimitiveType::Error,
            _ => return None,
        };
        Some(primitive)
    }

    /// OpenAPI `type` and `format` for this primitive
    pub fn oas_type(&self) -> (&'static str, Option<&'static str>) {
        match self {
            PrimitiveType::Bool => ("boolean", None),
            PrimitiveType::String | PrimitiveType::Error => ("string", None),
            PrimitiveType::Int64 | PrimitiveType::Uint64 => ("integer", Some("int64")),
            PrimitiveType::Int
            | PrimitiveType::Int8
            | PrimitiveType::Int16
            | PrimitiveType::Int32
            | PrimitiveType::Uint
            | PrimitiveType::Uint8
            | PrimitiveType::Uint16
            | PrimitiveType::Uint32
            | PrimitiveType::Uintptr
            | PrimitiveType::Byte
            | PrimitiveType::Rune => ("integer", None),
            PrimitiveType::Float32 => ("number", Some("float")),
            PrimitiveType::Float64 => ("number", Some("double")),
            PrimitiveType::Complex64 | PrimitiveType::Complex128 => ("number", None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundOp {
    OneOf,
    AnyOf,
    AllOf,
    Not,
}

impl CompoundOp {
    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "oneof" => Some(CompoundOp::OneOf),
            "anyof" => Some(CompoundOp::AnyOf),
            "allof" => Some(CompoundOp::AllOf),
            "not" => Some(CompoundOp::Not),
            _ => None,
        }
    }
}

/// A normalized type reference, from annotation text or a field's type
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    Primitive(PrimitiveType),
    /// `time.Time`
    Time,
    /// `interface{}`, `any`, functions and channels
    Any,
    Array(Box<TypeRef>),
    /// `map[K]V`; only the value type is kept
    Map(Box<TypeRef>),
    Compound { op: CompoundOp, args: Vec<String> },
    /// Anonymous struct literal used as a field type
    Struct(Vec<Field>),
    /// `Name` or `pkg.Name`
    Named(String),
}

static COMPOUND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(oneOf|anyOf|allOf|not)\((.*)\)$").expect("valid compound regex")
});
static ARRAY_LEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[\w*]*\]").expect("valid array length regex"));

impl TypeRef {
    /// Normalizes a textual reference such as `*[]models.Pet` or `oneOf(A,B)`.
    ///
    /// Pointers are stripped and `[N]` is read as `[]`.
    ///
    /// # Errors
    ///
    /// Returns `Error::CompoundType` for a compound with no arguments or a
    /// `not` without exactly one, and `Error::InvalidReference` for empty
    /// input.
    pub fn parse(reference: &str) -> Result<TypeRef> {
        let reference = reference.trim().trim_start_matches('*');
        if reference.is_empty() {
            return Err(Error::InvalidReference(reference.to_string()));
        }

        if let Some(captures) = COMPOUND.captures(reference) {
            let op = CompoundOp::parse(&captures[1])
                .ok_or_else(|| Error::CompoundType(reference.to_string()))?;
            let args = split_arguments(&captures[2]);
            if args.is_empty() {
                return Err(Error::CompoundType(format!(
                    "{} requires at least one type",
                    reference
                )));
            }
            if op == CompoundOp::Not && args.len() != 1 {
                return Err(Error::CompoundType(format!(
                    "{} requires exactly one type",
                    reference
                )));
            }
            return Ok(TypeRef::Compound { op, args });
        }

        if let Some(rest) = reference.strip_prefix("map[") {
            let value = skip_bracketed(rest)
                .ok_or_else(|| Error::InvalidReference(reference.to_string()))?;
            return Ok(TypeRef::Map(Box::new(TypeRef::parse(value)?)));
        }
        if reference.starts_with('[') {
            let normalized = ARRAY_LEN.replace(reference, "[]");
            let elem = normalized
                .strip_prefix("[]")
                .ok_or_else(|| Error::InvalidReference(reference.to_string()))?;
            return Ok(TypeRef::Array(Box::new(TypeRef::parse(elem)?)));
        }

        Ok(match reference {
            "time.Time" => TypeRef::Time,
            "interface{}" | "any" => TypeRef::Any,
            other if other.starts_with("func(") || other.starts_with("chan ") => TypeRef::Any,
            other => match PrimitiveType::parse(other) {
                Some(primitive) => TypeRef::Primitive(primitive),
                None => TypeRef::Named(other.to_string()),
            },
        })
    }

    /// Converts a parsed type expression; names in `type_params` become `Any`
    pub fn from_shape(shape: &TypeShape, type_params: &[String]) -> TypeRef {
        match shape {
            TypeShape::Named(name) if type_params.contains(name) => TypeRef::Any,
            TypeShape::Named(name) if name == "any" => TypeRef::Any,
            TypeShape::Named(name) => match PrimitiveType::parse(name) {
                Some(primitive) => TypeRef::Primitive(primitive),
                None => TypeRef::Named(name.clone()),
            },
            TypeShape::Selector { package, name } if package == "time" && name == "Time" => {
                TypeRef::Time
            }
            TypeShape::Selector { package, name } => TypeRef::Named(format!("{}.{}", package, name)),
            TypeShape::Pointer(inner) => TypeRef::from_shape(inner, type_params),
            TypeShape::Array { elem, .. } => {
                TypeRef::Array(Box::new(TypeRef::from_shape(elem, type_params)))
            }
            TypeShape::Map { value, .. } => {
                TypeRef::Map(Box::new(TypeRef::from_shape(value, type_params)))
            }
            TypeShape::Struct(fields) => TypeRef::Struct(fields.clone()),
            TypeShape::Interface { .. } | TypeShape::Func | TypeShape::Chan(_) => TypeRef::Any,
        }
    }
}

/// Returns what follows the `]` closing an already opened bracket
fn skip_bracketed(text: &str) -> Option<&str> {
    let mut depth = 1;
    for (index, c) in text.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[index + 1..]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits compound arguments at top-level commas, trimming each
fn split_arguments(text: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in text.chars() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                args.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    args.push(current);
    args.into_iter()
        .map(|arg| arg.trim().to_string())
        .filter(|arg| !arg.is_empty())
        .collect()
}

/// Outcome of looking up a named type
#[derive(Debug)]
pub enum Resolution {
    Declared {
        package: Package,
        declaration: TypeDeclaration,
    },
    /// Could not be found; `core` is set when the owning package is part of
    /// the standard library
    Unresolved { reason: Error, core: bool },
}

/// Type resolver - finds Go type declarations and names their schemas.
///
/// Owns the package locator and the declaration indexer so that every
/// lookup in a run shares one set of caches.
pub struct TypeResolver {
    locator: PackageLocator,
    indexer: DeclarationIndexer,
    /// Last package path segment to replacement prefix, from `@PackageAlias`
    package_aliases: HashMap<String, String>,
    schema_without_package: bool,
}

impl TypeResolver {
    /// Create a new TypeResolver over a discovered module
    pub fn new(
        locator: PackageLocator,
        indexer: DeclarationIndexer,
        schema_without_package: bool,
    ) -> Self {
        debug!(
            "Initializing TypeResolver for module {}",
            locator.module_name()
        );
        Self {
            locator,
            indexer,
            package_aliases: HashMap::new(),
            schema_without_package,
        }
    }

    pub fn locator(&self) -> &PackageLocator {
        &self.locator
    }

    pub fn indexer_mut(&mut self) -> &mut DeclarationIndexer {
        &mut self.indexer
    }

    /// Parsed declarations of a package
    pub fn package_index(&mut self, package: &Package) -> Result<Rc<PackageIndex>> {
        self.indexer.index(&package.path)
    }

    pub fn set_package_alias(&mut self, original: &str, alias: &str) {
        self.package_aliases
            .insert(original.to_string(), alias.to_string());
    }

    /// Schema id for a type declared in `package_name`.
    ///
    /// Slashes in the package path become dots. When the last package path
    /// segment has a registered alias, the alias replaces the whole package
    /// part; an empty alias leaves just the type name.
    pub fn schema_id(&self, package_name: &str, type_key: &str) -> String {
        let type_name = type_key.replace('@', ".");
        if self.schema_without_package {
            return type_name;
        }
        let last = package_name.rsplit('/').next().unwrap_or(package_name);
        let package = match self.package_aliases.get(last) {
            Some(alias) => alias.as_str(),
            None => package_name,
        };
        if package.is_empty() {
            type_name
        } else {
            format!("{}.{}", package.replace('/', "."), type_name)
        }
    }

    /// Finds the declaration a (possibly qualified) type name refers to.
    ///
    /// * A bare name is looked up in `scope` first when given (types local to
    ///   the function being documented), then in `package`, then in the other
    ///   packages of the module. Failing all of these is fatal. Inside
    ///   dependency and standard-library packages only `package` itself is
    ///   searched, and a miss is [`Resolution::Unresolved`].
    /// * For `prefix.Name` the prefix is tried as an import path, then as an
    ///   import alias of `package`. Failures here are reported as
    ///   [`Resolution::Unresolved`] so callers may degrade.
    pub fn lookup(
        &mut self,
        package: &Package,
        scope: Option<&str>,
        name: &str,
    ) -> Result<Resolution> {
        match name.rsplit_once('.') {
            None => self.lookup_bare(package, scope, name),
            Some((prefix, type_name)) => self.lookup_qualified(package, prefix, type_name),
        }
    }

    fn lookup_bare(
        &mut self,
        package: &Package,
        scope: Option<&str>,
        name: &str,
    ) -> Result<Resolution> {
        let index = self.indexer.index(&package.path)?;
        if let Some(scope) = scope {
            if let Some(declaration) = index.type_decl(&format!("{}@{}", scope, name)) {
                return Ok(declared(package, declaration));
            }
        }
        if let Some(declaration) = index.type_decl(name) {
            return Ok(declared(package, declaration));
        }

        let reason = Error::TypeNotFound {
            package: package.name.clone(),
            type_name: name.to_string(),
        };
        if package.origin != PackageOrigin::Module {
            // Names inside dependencies never refer to the module's own types
            return Ok(Resolution::Unresolved {
                reason,
                core: package.origin == PackageOrigin::Core,
            });
        }

        for candidate in self.locator.module_packages() {
            if candidate.name == package.name {
                continue;
            }
            let index = self.indexer.index(&candidate.path)?;
            if let Some(declaration) = index.type_decl(name) {
                debug!(
                    "Type {} not in {}, found in {}",
                    name, package.name, candidate.name
                );
                return Ok(declared(&candidate, declaration));
            }
        }

        Err(reason)
    }

    fn lookup_qualified(
        &mut self,
        package: &Package,
        prefix: &str,
        type_name: &str,
    ) -> Result<Resolution> {
        let qualified = format!("{}.{}", prefix, type_name);

        // The prefix as an import path, also with dots read as separators
        let mut candidates = vec![prefix.to_string()];
        if prefix.contains('.') {
            candidates.push(prefix.replace('.', "/"));
        }
        for candidate in candidates {
            if let Some(target) = self.locator.locate(&candidate) {
                if let Some(resolution) = self.declared_in(&target, type_name)? {
                    return Ok(resolution);
                }
            }
        }

        let index = self.indexer.index(&package.path)?;
        let import_paths = index.import_paths(prefix).to_vec();
        let Some(import_path) = import_paths.first() else {
            return Ok(Resolution::Unresolved {
                reason: Error::PackageNotFound {
                    package: prefix.to_string(),
                    type_name: qualified,
                },
                core: false,
            });
        };
        if import_paths.len() > 1 {
            warn!(
                "Alias {} in {} is ambiguous, resolving {} through {}",
                prefix, package.name, qualified, import_path
            );
        }

        match self.locator.locate(import_path) {
            Some(target) => match self.declared_in(&target, type_name)? {
                Some(resolution) => Ok(resolution),
                None => Ok(Resolution::Unresolved {
                    reason: Error::TypeNotFound {
                        package: target.name.clone(),
                        type_name: type_name.to_string(),
                    },
                    core: self.locator.is_core(import_path),
                }),
            },
            None => Ok(Resolution::Unresolved {
                reason: Error::PackageNotFound {
                    package: import_path.clone(),
                    type_name: qualified,
                },
                core: crate::locator::is_standard_library_path(import_path),
            }),
        }
    }

    fn declared_in(&mut self, target: &Package, type_name: &str) -> Result<Option<Resolution>> {
        let index = self.indexer.index(&target.path)?;
        Ok(index
            .type_decl(type_name)
            .map(|declaration| declared(target, declaration)))
    }

    /// Looks `alias.type_name` up in every known package whose path ends with `alias`
    pub fn lookup_by_suffix(&mut self, alias: &str, type_name: &str) -> Result<Option<Resolution>> {
        for candidate in self.locator.find_by_suffix(alias) {
            if let Some(resolution) = self.declared_in(&candidate, type_name)? {
                return Ok(Some(resolution));
            }
        }
        Ok(None)
    }
}

fn declared(package: &Package, declaration: &TypeDeclaration) -> Resolution {
    Resolution::Declared {
        package: package.clone(),
        declaration: declaration.clone(),
    }
}
