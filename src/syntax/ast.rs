//! Declaration-level syntax tree for Go source files.
//!
//! Only what schema synthesis and annotation scanning need is modelled:
//! package clause, imports, type declarations (including those local to
//! function bodies), doc comments, and the shape of type expressions.
//! Function bodies and value expressions are skipped.

/// A run of adjacent comments, markers stripped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentGroup {
    /// One entry per source line, with `//` or `/* */` removed
    pub lines: Vec<String>,
    pub start_line: usize,
    pub end_line: usize,
    /// The group starts on a line with no preceding token
    pub own_line: bool,
}

/// A parsed Go source file
#[derive(Debug, Clone, Default)]
pub struct File {
    /// Name from the `package` clause
    pub package: String,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
    /// Every comment group in the file, in source order
    pub comments: Vec<CommentGroup>,
}

impl File {
    /// Whether the file declares `package main` with a `func main()`
    pub fn is_main(&self) -> bool {
        self.package == "main"
            && self.decls.iter().any(|decl| match decl {
                Decl::Func(func) => func.name == "main" && func.receiver.is_none(),
                Decl::Gen(_) => false,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit local name, including `.` and `_`
    pub name: Option<String>,
    pub path: String,
}

#[derive(Debug, Clone)]
pub enum Decl {
    Gen(GenDecl),
    Func(FuncDecl),
}

impl Decl {
    pub fn doc(&self) -> Option<&CommentGroup> {
        match self {
            Decl::Gen(decl) => decl.doc.as_ref(),
            Decl::Func(decl) => decl.doc.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenKeyword {
    Import,
    Const,
    Type,
    Var,
}

/// `import`, `const`, `type` or `var` declaration, possibly grouped
#[derive(Debug, Clone)]
pub struct GenDecl {
    pub keyword: GenKeyword,
    pub doc: Option<CommentGroup>,
    /// Type specs, populated for `type` declarations only
    pub types: Vec<TypeSpec>,
}

#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub doc: Option<CommentGroup>,
    pub name: String,
    /// Base type name of the receiver for methods
    pub receiver: Option<String>,
    /// Type declarations directly inside the function body
    pub local_types: Vec<TypeSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub name: String,
    /// Names of the declared type parameters for generic types
    pub type_params: Vec<String>,
    /// `type A = B` rather than `type A B`
    pub is_alias: bool,
    pub shape: TypeShape,
    pub doc: Option<CommentGroup>,
}

/// The structural form of a type expression
#[derive(Debug, Clone, PartialEq)]
pub enum TypeShape {
    /// A bare identifier: a predeclared type or a type in the same package
    Named(String),
    /// `pkg.Name`
    Selector { package: String, name: String },
    Pointer(Box<TypeShape>),
    /// Slice or fixed-size array
    Array {
        len: Option<String>,
        elem: Box<TypeShape>,
    },
    Map {
        key: Box<TypeShape>,
        value: Box<TypeShape>,
    },
    Struct(Vec<Field>),
    Interface { empty: bool },
    Func,
    Chan(Box<TypeShape>),
}

impl TypeShape {
    /// Renders the shape in Go notation, with `[N]T` written as `[]T`
    pub fn to_type_string(&self) -> String {
        match self {
            TypeShape::Named(name) => name.clone(),
            TypeShape::Selector { package, name } => format!("{}.{}", package, name),
            TypeShape::Pointer(inner) => format!("*{}", inner.to_type_string()),
            TypeShape::Array { elem, .. } => format!("[]{}", elem.to_type_string()),
            TypeShape::Map { key, value } => {
                format!("map[{}]{}", key.to_type_string(), value.to_type_string())
            }
            TypeShape::Struct(_) => "struct{}".to_string(),
            TypeShape::Interface { .. } => "interface{}".to_string(),
            TypeShape::Func => "func()".to_string(),
            TypeShape::Chan(elem) => format!("chan {}", elem.to_type_string()),
        }
    }

    /// Name of the type an embedded field contributes, e.g. `Base` for `*pkg.Base`
    pub fn embedded_name(&self) -> Option<&str> {
        match self {
            TypeShape::Named(name) => Some(name),
            TypeShape::Selector { name, .. } => Some(name),
            TypeShape::Pointer(inner) => inner.embedded_name(),
            _ => None,
        }
    }
}

/// A struct field; embedded fields have no names
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub names: Vec<String>,
    pub shape: TypeShape,
    /// Raw tag literal content, e.g. `json:"id"`
    pub tag: Option<String>,
}

impl Field {
    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }
}
