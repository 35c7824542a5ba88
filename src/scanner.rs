//! Lightweight TypeScript tokenizer.
//!
//! Produces just enough structure for top-level statement classification:
//! identifiers (keywords included), string literals, and single-character
//! punctuation, each flagged with whether a line break precedes it. Comments
//! are dropped, except that line comments appearing before the first token
//! are kept so reference directives can be read from them.
//!
//! Template and regular-expression literals are skipped as opaque tokens.
//! JSX text in `.tsx` test files is not understood; an apostrophe there opens a
//! string literal that is closed at the end of the line, which bounds the
//! damage to one line.

use memchr::memchr2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    /// `text` holds the literal contents without quotes; escapes are not decoded.
    StringLiteral,
    NumericLiteral,
    TemplateLiteral,
    RegularExpression,
    Punctuation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub has_preceding_line_break: bool,
}

impl<'a> Token<'a> {
    pub fn is_punct(&self, ch: char) -> bool {
        self.kind == TokenKind::Punctuation && self.text.len() == 1 && self.text.starts_with(ch)
    }

    pub fn is_ident(&self, name: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == name
    }

    pub fn string_value(&self) -> Option<&'a str> {
        (self.kind == TokenKind::StringLiteral).then_some(self.text)
    }
}

#[derive(Debug, Default)]
pub struct ScanResult<'a> {
    pub tokens: Vec<Token<'a>>,
    /// Line comments (including the leading `//`) that precede the first token.
    pub leading_comments: Vec<&'a str>,
}

/// Keywords after which a `/` starts a regular expression rather than a division.
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "case",
    "do",
    "else",
    "in",
    "instanceof",
    "new",
    "delete",
    "void",
    "throw",
    "yield",
    "await",
    "of",
];

pub fn scan(source: &str) -> ScanResult<'_> {
    Scanner::new(source).run()
}

struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line_break: bool,
    result: ScanResult<'a>,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        // A BOM is not part of the token stream.
        let start = if source.starts_with('\u{feff}') { 3 } else { 0 };
        Self {
            source,
            bytes: source.as_bytes(),
            pos: start,
            line_break: false,
            result: ScanResult::default(),
        }
    }

    fn run(mut self) -> ScanResult<'a> {
        let len = self.bytes.len();
        while self.pos < len {
            let ch = self.bytes[self.pos];
            match ch {
                b'\n' | b'\r' => {
                    self.line_break = true;
                    self.pos += 1;
                }
                b' ' | b'\t' | 0x0B | 0x0C => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => self.line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.block_comment(),
                b'/' if self.regex_allowed() => {
                    let start = self.pos;
                    self.skip_regex();
                    self.push(TokenKind::RegularExpression, start, self.pos);
                }
                b'\'' | b'"' => self.string(ch),
                b'`' => {
                    let start = self.pos;
                    self.skip_template();
                    self.push(TokenKind::TemplateLiteral, start, self.pos);
                }
                b'0'..=b'9' => {
                    let start = self.pos;
                    while self.pos < len
                        && (self.bytes[self.pos].is_ascii_alphanumeric()
                            || self.bytes[self.pos] == b'.'
                            || self.bytes[self.pos] == b'_')
                    {
                        self.pos += 1;
                    }
                    self.push(TokenKind::NumericLiteral, start, self.pos);
                }
                _ if is_identifier_byte(ch) => {
                    let start = self.pos;
                    while self.pos < len && is_identifier_byte(self.bytes[self.pos]) {
                        self.pos += 1;
                    }
                    self.push(TokenKind::Identifier, start, self.pos);
                }
                _ => {
                    let start = self.pos;
                    self.pos += 1;
                    self.push(TokenKind::Punctuation, start, self.pos);
                }
            }
        }
        self.result
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.result.tokens.push(Token {
            kind,
            text: &self.source[start..end],
            has_preceding_line_break: std::mem::take(&mut self.line_break),
        });
    }

    fn line_comment(&mut self) {
        let start = self.pos;
        let rest = &self.bytes[self.pos..];
        let end = memchr2(b'\n', b'\r', rest).map_or(self.bytes.len(), |i| self.pos + i);
        self.pos = end;
        if self.result.tokens.is_empty() {
            self.result.leading_comments.push(&self.source[start..end]);
        }
    }

    fn block_comment(&mut self) {
        self.pos += 2;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'*' if self.peek(1) == Some(b'/') => {
                    self.pos += 2;
                    return;
                }
                b'\n' | b'\r' => {
                    self.line_break = true;
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
    }

    fn string(&mut self, quote: u8) {
        self.pos += 1;
        let start = self.pos;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                b'\n' | b'\r' => break,
                c if c == quote => {
                    let end = self.pos;
                    self.pos += 1;
                    self.push(TokenKind::StringLiteral, start, end);
                    return;
                }
                _ => self.pos += 1,
            }
        }
        // Unterminated: keep what we have up to the end of the line.
        self.pos = self.pos.min(self.bytes.len());
        let end = self.pos;
        self.push(TokenKind::StringLiteral, start, end);
    }

    fn skip_template(&mut self) {
        self.pos += 1;
        let mut depth = 0usize;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                b'$' if depth == 0 && self.peek(1) == Some(b'{') => {
                    depth = 1;
                    self.pos += 2;
                }
                b'{' if depth > 0 => {
                    depth += 1;
                    self.pos += 1;
                }
                b'}' if depth > 0 => {
                    depth -= 1;
                    self.pos += 1;
                }
                q @ (b'\'' | b'"') if depth > 0 => {
                    self.pos += 1;
                    while self.pos < self.bytes.len() && self.bytes[self.pos] != q {
                        if self.bytes[self.pos] == b'\\' {
                            self.pos += 1;
                        }
                        self.pos += 1;
                    }
                    self.pos += 1;
                }
                b'`' if depth == 0 => {
                    self.pos += 1;
                    break;
                }
                b'\n' | b'\r' => {
                    self.line_break = true;
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
        self.pos = self.pos.min(self.bytes.len());
    }

    fn regex_allowed(&self) -> bool {
        match self.result.tokens.last() {
            None => true,
            Some(tok) => match tok.kind {
                TokenKind::Punctuation => !matches!(tok.text, ")" | "]" | "}"),
                TokenKind::Identifier => REGEX_PRECEDING_KEYWORDS.contains(&tok.text),
                _ => false,
            },
        }
    }

    fn skip_regex(&mut self) {
        self.pos += 1;
        let mut in_class = false;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                b'[' => {
                    in_class = true;
                    self.pos += 1;
                }
                b']' => {
                    in_class = false;
                    self.pos += 1;
                }
                b'/' if !in_class => {
                    self.pos += 1;
                    while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_alphabetic() {
                        self.pos += 1;
                    }
                    return;
                }
                b'\n' | b'\r' => return,
                _ => self.pos += 1,
            }
        }
        self.pos = self.pos.min(self.bytes.len());
    }
}

/// Identifier bytes; every non-ASCII byte is accepted so multi-byte
/// characters are consumed whole.
fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

#[cfg(test)]
#[path = "tests/scanner_tests.rs"]
mod tests;
