//! Tokenizer for Go source files.
//!
//! Produces the token stream the declaration parser consumes, applying Go's
//! automatic semicolon insertion at line ends. Comments are not part of the
//! token stream; they are collected into [`CommentGroup`]s so that doc
//! comments can be attached to declarations afterwards.

use super::ast::CommentGroup;

/// Category of a lexical token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Int,
    Float,
    Imag,
    Char,
    String,
    /// Operator or punctuation, the exact text is in `Token::text`
    Op,
    /// Explicit `;` or one inserted at a line end
    Semicolon,
    Eof,
}

/// A single token with its literal value and the line it starts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Identifier, operator text, or the unquoted content of a literal
    pub text: String,
    pub line: usize,
}

impl Token {
    pub fn is_op(&self, op: &str) -> bool {
        self.kind == TokenKind::Op && self.text == op
    }

    pub fn is_ident(&self, ident: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == ident
    }
}

/// Output of a lexing pass
#[derive(Debug, Default)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub comments: Vec<CommentGroup>,
}

/// Multi-character operators, longest first
const OPERATORS: &[&str] = &[
    "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^",
];

#[derive(Debug)]
struct RawComment {
    text: String,
    start_line: usize,
    end_line: usize,
    /// No token precedes the comment on its first line
    own_line: bool,
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    tokens: Vec<Token>,
    comments: Vec<RawComment>,
}

/// Tokenizes Go source text.
///
/// Returns an error message with the offending line for unterminated
/// literals and block comments.
pub fn tokenize(source: &str) -> Result<Lexed, String> {
    let mut lexer = Lexer {
        chars: source.chars().collect(),
        pos: 0,
        line: 1,
        tokens: Vec::new(),
        comments: Vec::new(),
    };
    lexer.run()?;

    let comments = group_comments(lexer.comments);
    Ok(Lexed {
        tokens: lexer.tokens,
        comments,
    })
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn push(&mut self, kind: TokenKind, text: String, line: usize) {
        self.tokens.push(Token { kind, text, line });
    }

    /// Go inserts a semicolon after a line's final token when it could end a statement
    fn needs_semicolon(&self) -> bool {
        match self.tokens.last() {
            Some(token) if token.line == self.line => match token.kind {
                TokenKind::Ident => {
                    !is_keyword(&token.text)
                        || matches!(
                            token.text.as_str(),
                            "break" | "continue" | "fallthrough" | "return"
                        )
                }
                TokenKind::Int
                | TokenKind::Float
                | TokenKind::Imag
                | TokenKind::Char
                | TokenKind::String => true,
                TokenKind::Op => matches!(token.text.as_str(), ")" | "]" | "}" | "++" | "--"),
                TokenKind::Semicolon | TokenKind::Eof => false,
            },
            _ => false,
        }
    }

    fn newline(&mut self) {
        if self.needs_semicolon() {
            let line = self.line;
            self.push(TokenKind::Semicolon, "\n".to_string(), line);
        }
        self.line += 1;
    }

    fn last_token_on_line(&self) -> bool {
        self.tokens
            .last()
            .map(|token| token.line == self.line && token.kind != TokenKind::Semicolon)
            .unwrap_or(false)
    }

    fn run(&mut self) -> Result<(), String> {
        while let Some(c) = self.peek() {
            match c {
                '\n' => {
                    self.pos += 1;
                    self.newline();
                }
                c if c.is_whitespace() => self.pos += 1,
                '/' if self.peek_at(1) == Some('/') => self.line_comment(),
                '/' if self.peek_at(1) == Some('*') => self.block_comment()?,
                '"' => self.interpreted_string()?,
                '`' => self.raw_string()?,
                '\'' => self.rune()?,
                c if c.is_ascii_digit() => self.number(),
                '.' if self.peek_at(1).map_or(false, |n| n.is_ascii_digit()) => self.number(),
                c if c == '_' || c.is_alphabetic() => self.identifier(),
                _ => self.operator(),
            }
        }
        if self.needs_semicolon() {
            let line = self.line;
            self.push(TokenKind::Semicolon, "\n".to_string(), line);
        }
        let line = self.line;
        self.push(TokenKind::Eof, String::new(), line);
        Ok(())
    }

    fn line_comment(&mut self) {
        let own_line = !self.last_token_on_line();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        self.comments.push(RawComment {
            text,
            start_line: self.line,
            end_line: self.line,
            own_line,
        });
    }

    fn block_comment(&mut self) -> Result<(), String> {
        let own_line = !self.last_token_on_line();
        let start = self.pos;
        let start_line = self.line;
        self.pos += 2;
        let mut had_newline = false;
        loop {
            match self.peek() {
                None => return Err(format!("line {}: comment not terminated", start_line)),
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.pos += 2;
                    break;
                }
                Some('\n') => {
                    had_newline = true;
                    self.line += 1;
                    self.pos += 1;
                }
                Some(_) => self.pos += 1,
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        self.comments.push(RawComment {
            text,
            start_line,
            end_line: self.line,
            own_line,
        });
        // A multi-line block comment acts like a newline
        if had_newline && self.tokens.last().map_or(false, |t| t.line == start_line) {
            let saved = self.line;
            self.line = start_line;
            if self.needs_semicolon() {
                self.push(TokenKind::Semicolon, "\n".to_string(), start_line);
            }
            self.line = saved;
        }
        Ok(())
    }

    fn interpreted_string(&mut self) -> Result<(), String> {
        let line = self.line;
        self.pos += 1;
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(format!("line {}: string literal not terminated", line))
                }
                Some('"') => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => {
                    let escaped = self.peek_at(1).unwrap_or('\\');
                    self.pos += 2;
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '"' => value.push('"'),
                        '\\' => value.push('\\'),
                        other => {
                            value.push('\\');
                            value.push(other);
                        }
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.pos += 1;
                }
            }
        }
        self.push(TokenKind::String, value, line);
        Ok(())
    }

    fn raw_string(&mut self) -> Result<(), String> {
        let line = self.line;
        self.pos += 1;
        let start = self.pos;
        loop {
            match self.peek() {
                None => return Err(format!("line {}: raw string literal not terminated", line)),
                Some('`') => break,
                Some('\n') => {
                    self.line += 1;
                    self.pos += 1;
                }
                Some(_) => self.pos += 1,
            }
        }
        let value: String = self.chars[start..self.pos].iter().collect();
        self.pos += 1;
        // Attributed to the line it ends on so semicolon insertion sees it
        let end_line = self.line;
        self.push(TokenKind::String, value.replace('\r', ""), end_line);
        Ok(())
    }

    fn rune(&mut self) -> Result<(), String> {
        let line = self.line;
        self.pos += 1;
        let start = self.pos;
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(format!("line {}: rune literal not terminated", line))
                }
                Some('\'') => break,
                Some('\\') => self.pos += 2,
                Some(_) => self.pos += 1,
            }
        }
        let value: String = self.chars[start..self.pos].iter().collect();
        self.pos += 1;
        self.push(TokenKind::Char, value, line);
        Ok(())
    }

    fn number(&mut self) {
        let line = self.line;
        let start = self.pos;
        let mut kind = TokenKind::Int;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                if c == '.' {
                    kind = TokenKind::Float;
                }
                self.pos += 1;
                let is_exponent = matches!(c, 'e' | 'E' | 'p' | 'P');
                let is_hex = self.chars[start..self.pos]
                    .iter()
                    .take(2)
                    .collect::<String>()
                    .eq_ignore_ascii_case("0x");
                if is_exponent && (!is_hex || matches!(c, 'p' | 'P')) {
                    if matches!(self.peek(), Some('+') | Some('-')) {
                        self.pos += 1;
                    }
                    kind = TokenKind::Float;
                }
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        if text.ends_with('i') {
            kind = TokenKind::Imag;
        }
        self.push(kind, text, line);
    }

    fn identifier(&mut self) {
        let line = self.line;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '_' || c.is_alphanumeric() {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        self.push(TokenKind::Ident, text, line);
    }

    fn operator(&mut self) {
        let line = self.line;
        for op in OPERATORS {
            let len = op.chars().count();
            if self.pos + len <= self.chars.len() {
                let candidate: String = self.chars[self.pos..self.pos + len].iter().collect();
                if candidate == *op {
                    self.pos += len;
                    self.push(TokenKind::Op, candidate, line);
                    return;
                }
            }
        }
        let c = self.chars[self.pos];
        self.pos += 1;
        if c == ';' {
            self.push(TokenKind::Semicolon, ";".to_string(), line);
        } else {
            self.push(TokenKind::Op, c.to_string(), line);
        }
    }
}

/// Reports whether `word` is a reserved Go keyword
pub fn is_keyword(word: &str) -> bool {
    matches!(
        word,
        "break"
            | "case"
            | "chan"
            | "const"
            | "continue"
            | "default"
            | "defer"
            | "else"
            | "fallthrough"
            | "for"
            | "func"
            | "go"
            | "goto"
            | "if"
            | "import"
            | "interface"
            | "map"
            | "package"
            | "range"
            | "return"
            | "select"
            | "struct"
            | "switch"
            | "type"
            | "var"
    )
}

/// Joins adjacent comments into groups the way `go/ast` does: comments on
/// consecutive lines with nothing but whitespace between them form one group.
fn group_comments(raw: Vec<RawComment>) -> Vec<CommentGroup> {
    let mut groups: Vec<CommentGroup> = Vec::new();
    let mut previous_end: Option<usize> = None;

    for comment in raw {
        let adjacent = comment.own_line
            && previous_end.map_or(false, |end| comment.start_line <= end + 1);
        let lines = comment_lines(&comment.text);
        match groups.last_mut() {
            Some(group) if adjacent && group.own_line => {
                group.lines.extend(lines);
                group.end_line = comment.end_line;
            }
            _ => groups.push(CommentGroup {
                lines,
                start_line: comment.start_line,
                end_line: comment.end_line,
                own_line: comment.own_line,
            }),
        }
        previous_end = Some(comment.end_line);
    }

    groups
}

/// Strips comment markers, keeping one entry per source line
fn comment_lines(text: &str) -> Vec<String> {
    if let Some(body) = text.strip_prefix("//") {
        return vec![body.to_string()];
    }
    let body = text
        .strip_prefix("/*")
        .and_then(|t| t.strip_suffix("*/"))
        .unwrap_or(text);
    body.lines().map(|line| line.to_string()).collect()
}
