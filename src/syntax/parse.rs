//! Recursive-descent parser producing the declaration tree in [`super::ast`].

use super::ast::{
    CommentGroup, Decl, Field, File, FuncDecl, GenDecl, GenKeyword, ImportSpec, TypeShape, TypeSpec,
};
use super::lexer::{is_keyword, tokenize, Token, TokenKind};

type ParseResult<T> = Result<T, String>;

/// Parses a Go source file into its declaration tree.
///
/// Errors carry the line number of the offending token.
pub fn parse_source(source: &str) -> ParseResult<File> {
    let lexed = tokenize(source)?;
    let mut parser = Parser {
        tokens: lexed.tokens,
        pos: 0,
        comments: lexed.comments,
    };
    parser.parse_file()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    comments: Vec<CommentGroup>,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.peek_n(0)
    }

    fn peek_n(&self, n: usize) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.pos + n).min(last)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn error<T>(&self, message: &str) -> ParseResult<T> {
        let token = self.peek();
        Err(format!(
            "line {}: {} (found {:?} {:?})",
            token.line, message, token.kind, token.text
        ))
    }

    fn expect_op(&mut self, op: &str) -> ParseResult<()> {
        if self.peek().is_op(op) {
            self.advance();
            Ok(())
        } else {
            self.error(&format!("expected '{}'", op))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        if self.peek().kind == TokenKind::Ident {
            Ok(self.advance().text)
        } else {
            self.error("expected identifier")
        }
    }

    fn skip_semicolons(&mut self) {
        while self.peek().kind == TokenKind::Semicolon {
            self.advance();
        }
    }

    /// The comment group ending on the line right above `line`
    fn doc_for(&self, line: usize) -> Option<CommentGroup> {
        self.comments
            .iter()
            .find(|group| group.own_line && group.end_line + 1 == line)
            .cloned()
    }

    /// Skips from an opening bracket to just past its matching closer
    fn skip_balanced(&mut self, open: &str, close: &str) -> ParseResult<Vec<Token>> {
        self.expect_op(open)?;
        let mut depth = 1;
        let mut inner = Vec::new();
        loop {
            let token = self.advance();
            if token.kind == TokenKind::Eof {
                return self.error(&format!("unbalanced '{}'", open));
            }
            if token.is_op(open) {
                depth += 1;
            } else if token.is_op(close) {
                depth -= 1;
                if depth == 0 {
                    return Ok(inner);
                }
            }
            inner.push(token);
        }
    }

    fn parse_file(&mut self) -> ParseResult<File> {
        self.skip_semicolons();
        if !self.peek().is_ident("package") {
            return self.error("expected package clause");
        }
        self.advance();
        let package = self.expect_ident()?;

        let mut file = File {
            package,
            comments: self.comments.clone(),
            ..Default::default()
        };

        loop {
            self.skip_semicolons();
            let token = self.peek().clone();
            if token.kind == TokenKind::Eof {
                break;
            }
            let doc = self.doc_for(token.line);
            match token.text.as_str() {
                "import" if token.kind == TokenKind::Ident => {
                    let imports = self.parse_import_decl()?;
                    file.imports.extend(imports);
                    file.decls.push(Decl::Gen(GenDecl {
                        keyword: GenKeyword::Import,
                        doc,
                        types: Vec::new(),
                    }));
                }
                "type" if token.kind == TokenKind::Ident => {
                    let types = self.parse_type_decl(doc.clone())?;
                    file.decls.push(Decl::Gen(GenDecl {
                        keyword: GenKeyword::Type,
                        doc,
                        types,
                    }));
                }
                "var" | "const" if token.kind == TokenKind::Ident => {
                    let keyword = if token.text == "var" {
                        GenKeyword::Var
                    } else {
                        GenKeyword::Const
                    };
                    self.skip_value_decl()?;
                    file.decls.push(Decl::Gen(GenDecl {
                        keyword,
                        doc,
                        types: Vec::new(),
                    }));
                }
                "func" if token.kind == TokenKind::Ident => {
                    let func = self.parse_func_decl(doc)?;
                    file.decls.push(Decl::Func(func));
                }
                _ => return self.error("unexpected token at top level"),
            }
        }

        Ok(file)
    }

    fn parse_import_decl(&mut self) -> ParseResult<Vec<ImportSpec>> {
        self.advance();
        let mut imports = Vec::new();
        if self.peek().is_op("(") {
            self.advance();
            loop {
                self.skip_semicolons();
                if self.peek().is_op(")") {
                    self.advance();
                    break;
                }
                imports.push(self.parse_import_spec()?);
            }
        } else {
            imports.push(self.parse_import_spec()?);
        }
        Ok(imports)
    }

    fn parse_import_spec(&mut self) -> ParseResult<ImportSpec> {
        let name = match self.peek().kind {
            TokenKind::Ident => Some(self.advance().text),
            TokenKind::Op if self.peek().is_op(".") => Some(self.advance().text),
            _ => None,
        };
        if self.peek().kind != TokenKind::String {
            return self.error("expected import path");
        }
        let path = self.advance().text;
        Ok(ImportSpec { name, path })
    }

    fn parse_type_decl(&mut self, doc: Option<CommentGroup>) -> ParseResult<Vec<TypeSpec>> {
        self.advance();
        let mut specs = Vec::new();
        if self.peek().is_op("(") {
            self.advance();
            loop {
                self.skip_semicolons();
                if self.peek().is_op(")") {
                    self.advance();
                    break;
                }
                let spec_doc = self.doc_for(self.peek().line);
                specs.push(self.parse_type_spec(spec_doc)?);
            }
        } else {
            specs.push(self.parse_type_spec(doc)?);
        }
        Ok(specs)
    }

    fn parse_type_spec(&mut self, doc: Option<CommentGroup>) -> ParseResult<TypeSpec> {
        let name = self.expect_ident()?;
        let type_params = if self.at_type_params() {
            self.parse_type_params()?
        } else {
            Vec::new()
        };
        let is_alias = if self.peek().is_op("=") {
            self.advance();
            true
        } else {
            false
        };
        let shape = self.parse_type()?;
        Ok(TypeSpec {
            name,
            type_params,
            is_alias,
            shape,
            doc,
        })
    }

    /// `[T any]` opens a type parameter list, `[N]T` an array type
    fn at_type_params(&self) -> bool {
        if !self.peek().is_op("[") || self.peek_n(1).kind != TokenKind::Ident {
            return false;
        }
        let third = self.peek_n(2);
        third.kind == TokenKind::Ident
            || third.is_op(",")
            || third.is_op("~")
            || third.is_op("[")
            || third.is_op("*")
    }

    fn parse_type_params(&mut self) -> ParseResult<Vec<String>> {
        let inner = self.skip_balanced("[", "]")?;
        let mut names = Vec::new();
        let mut depth = 0;
        let mut at_segment_start = true;
        for token in inner {
            if token.is_op("(") || token.is_op("[") || token.is_op("{") {
                depth += 1;
            } else if token.is_op(")") || token.is_op("]") || token.is_op("}") {
                depth -= 1;
            } else if depth == 0 && token.is_op(",") {
                at_segment_start = true;
                continue;
            }
            if at_segment_start && token.kind == TokenKind::Ident {
                names.push(token.text.clone());
            }
            at_segment_start = false;
        }
        Ok(names)
    }

    fn parse_type(&mut self) -> ParseResult<TypeShape> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Ident => match token.text.as_str() {
                "struct" => self.parse_struct(),
                "interface" => {
                    self.advance();
                    let inner = self.skip_balanced("{", "}")?;
                    let empty = inner.iter().all(|t| t.kind == TokenKind::Semicolon);
                    Ok(TypeShape::Interface { empty })
                }
                "map" => {
                    self.advance();
                    self.expect_op("[")?;
                    let key = self.parse_type()?;
                    self.expect_op("]")?;
                    let value = self.parse_type()?;
                    Ok(TypeShape::Map {
                        key: Box::new(key),
                        value: Box::new(value),
                    })
                }
                "chan" => {
                    self.advance();
                    if self.peek().is_op("<-") {
                        self.advance();
                    }
                    let elem = self.parse_type()?;
                    Ok(TypeShape::Chan(Box::new(elem)))
                }
                "func" => {
                    self.advance();
                    self.skip_signature()?;
                    Ok(TypeShape::Func)
                }
                _ => {
                    self.advance();
                    let shape = if self.peek().is_op(".") && self.peek_n(1).kind == TokenKind::Ident
                    {
                        self.advance();
                        let name = self.advance().text;
                        TypeShape::Selector {
                            package: token.text.clone(),
                            name,
                        }
                    } else {
                        TypeShape::Named(token.text.clone())
                    };
                    // Generic instantiation, the type arguments do not affect the shape
                    if self.peek().is_op("[") {
                        self.skip_balanced("[", "]")?;
                    }
                    Ok(shape)
                }
            },
            TokenKind::Op => match token.text.as_str() {
                "*" => {
                    self.advance();
                    Ok(TypeShape::Pointer(Box::new(self.parse_type()?)))
                }
                "[" => {
                    self.advance();
                    let len = if self.peek().is_op("]") {
                        None
                    } else {
                        let mut parts = Vec::new();
                        let mut depth = 0;
                        loop {
                            let t = self.peek().clone();
                            if t.kind == TokenKind::Eof {
                                return self.error("unterminated array length");
                            }
                            if t.is_op("]") && depth == 0 {
                                break;
                            }
                            if t.is_op("[") {
                                depth += 1;
                            } else if t.is_op("]") {
                                depth -= 1;
                            }
                            parts.push(self.advance().text);
                        }
                        Some(parts.join(""))
                    };
                    self.expect_op("]")?;
                    let elem = self.parse_type()?;
                    Ok(TypeShape::Array {
                        len,
                        elem: Box::new(elem),
                    })
                }
                "<-" => {
                    self.advance();
                    if !self.peek().is_ident("chan") {
                        return self.error("expected chan");
                    }
                    self.advance();
                    Ok(TypeShape::Chan(Box::new(self.parse_type()?)))
                }
                "(" => {
                    self.advance();
                    let inner = self.parse_type()?;
                    self.expect_op(")")?;
                    Ok(inner)
                }
                _ => self.error("expected type"),
            },
            _ => self.error("expected type"),
        }
    }

    fn parse_struct(&mut self) -> ParseResult<TypeShape> {
        self.advance();
        self.expect_op("{")?;
        let mut fields = Vec::new();
        loop {
            self.skip_semicolons();
            if self.peek().is_op("}") {
                self.advance();
                break;
            }
            fields.push(self.parse_field()?);
        }
        Ok(TypeShape::Struct(fields))
    }

    fn parse_field(&mut self) -> ParseResult<Field> {
        let mut names = Vec::new();
        if self.peek().kind == TokenKind::Ident && !is_keyword(&self.peek().text) {
            let next = self.peek_n(1).clone();
            let embedded = if next.is_op(".")
                || next.is_op("}")
                || next.kind == TokenKind::Semicolon
                || next.kind == TokenKind::String
            {
                true
            } else if next.is_op("[") {
                self.is_embedded_instantiation()
            } else {
                false
            };

            if !embedded {
                names.push(self.advance().text);
                while self.peek().is_op(",") {
                    self.advance();
                    names.push(self.expect_ident()?);
                }
            }
        }

        let shape = self.parse_type()?;
        let tag = if self.peek().kind == TokenKind::String {
            Some(self.advance().text)
        } else {
            None
        };
        Ok(Field { names, shape, tag })
    }

    /// `Base[T]` followed by the end of the field, rather than `name [N]T`
    fn is_embedded_instantiation(&self) -> bool {
        let mut depth = 0;
        let mut offset = 1;
        loop {
            let token = self.peek_n(offset);
            if token.kind == TokenKind::Eof {
                return false;
            }
            if token.is_op("[") {
                depth += 1;
            } else if token.is_op("]") {
                depth -= 1;
                if depth == 0 {
                    let after = self.peek_n(offset + 1);
                    return after.kind == TokenKind::Semicolon
                        || after.kind == TokenKind::String
                        || after.is_op("}");
                }
            }
            offset += 1;
        }
    }

    /// Skips parameters and results of a function signature
    fn skip_signature(&mut self) -> ParseResult<()> {
        self.skip_balanced("(", ")")?;
        let next = self.peek().clone();
        if next.is_op("(") {
            self.skip_balanced("(", ")")?;
        } else if self.starts_type(&next) {
            self.parse_type()?;
        }
        Ok(())
    }

    fn starts_type(&self, token: &Token) -> bool {
        match token.kind {
            TokenKind::Ident => {
                !is_keyword(&token.text)
                    || matches!(
                        token.text.as_str(),
                        "func" | "map" | "chan" | "struct" | "interface"
                    )
            }
            TokenKind::Op => token.is_op("*") || token.is_op("[") || token.is_op("<-"),
            _ => false,
        }
    }

    fn parse_func_decl(&mut self, doc: Option<CommentGroup>) -> ParseResult<FuncDecl> {
        self.advance();
        let receiver = if self.peek().is_op("(") {
            let inner = self.skip_balanced("(", ")")?;
            inner
                .iter()
                .take_while(|t| !t.is_op("["))
                .filter(|t| t.kind == TokenKind::Ident)
                .last()
                .map(|t| t.text.clone())
        } else {
            None
        };
        let name = self.expect_ident()?;
        if self.peek().is_op("[") {
            self.skip_balanced("[", "]")?;
        }
        self.skip_signature()?;

        let local_types = if self.peek().is_op("{") {
            self.parse_body_types()?
        } else {
            Vec::new()
        };

        Ok(FuncDecl {
            doc,
            name,
            receiver,
            local_types,
        })
    }

    /// Walks a function body, collecting `type` declarations at its top level
    fn parse_body_types(&mut self) -> ParseResult<Vec<TypeSpec>> {
        self.expect_op("{")?;
        let mut depth = 1;
        let mut specs = Vec::new();
        let mut statement_start = true;
        loop {
            let token = self.peek().clone();
            match token.kind {
                TokenKind::Eof => return self.error("unterminated function body"),
                TokenKind::Ident if token.text == "type" && depth == 1 && statement_start => {
                    let saved = self.pos;
                    let doc = self.doc_for(token.line);
                    match self.parse_type_decl(doc) {
                        Ok(local) => specs.extend(local),
                        Err(_) => self.pos = saved + 1,
                    }
                    statement_start = false;
                    continue;
                }
                _ => {}
            }
            self.advance();
            if token.is_op("{") {
                depth += 1;
            } else if token.is_op("}") {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            statement_start = token.kind == TokenKind::Semicolon || token.is_op("{");
        }
        Ok(specs)
    }

    fn skip_value_decl(&mut self) -> ParseResult<()> {
        self.advance();
        if self.peek().is_op("(") {
            self.skip_balanced("(", ")")?;
            return Ok(());
        }
        let mut depth = 0i32;
        loop {
            let token = self.peek().clone();
            match token.kind {
                TokenKind::Eof => return Ok(()),
                TokenKind::Semicolon if depth == 0 => return Ok(()),
                TokenKind::Op if matches!(token.text.as_str(), "(" | "[" | "{") => depth += 1,
                TokenKind::Op if matches!(token.text.as_str(), ")" | "]" | "}") => depth -= 1,
                _ => {}
            }
            self.advance();
        }
    }
}
