//! Go source syntax: tokenizer, declaration tree, and parser.

pub mod ast;
pub mod lexer;
pub mod parse;

pub use ast::{CommentGroup, Decl, Field, File, FuncDecl, GenDecl, GenKeyword, TypeShape, TypeSpec};
pub use parse::parse_source;
