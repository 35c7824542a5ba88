//! Structural parse of a declaration or test file.
//!
//! [`DeclarationFile::parse`] runs once per file and records everything the
//! resolver needs to know about it:
//! - reference directives from the leading `///` comments
//! - every module specifier the file imports, exports from, or requires
//! - whether the file is a module or a global script ([`FileKind`])
//! - ambient module names (`declare module "x"`), wherever they appear
//! - global identifiers the file contributes
//!
//! This is a statement-level skim, not a TypeScript parser: expressions and
//! type annotations are skipped by bracket balancing, and statement ends are
//! found from `;`, closing braces, or a line break before a declaration
//! keyword.

use crate::scanner::{Token, TokenKind, scan};
use indexmap::IndexSet;

/// Whether a file contributes to the global scope or is a module.
///
/// Decided once at parse time from the presence of any top-level import or
/// export construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Module,
    GlobalScript,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `/// <reference path="..." />`
    Path,
    /// `/// <reference types="..." />`
    Types,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDirective {
    pub kind: ReferenceKind,
    pub target: String,
}

#[derive(Debug, Clone)]
pub struct DeclarationFile {
    pub path: String,
    pub text: String,
    pub kind: FileKind,
    pub references: Vec<ReferenceDirective>,
    /// Module specifiers in order of first appearance.
    pub imports: Vec<String>,
    pub declared_modules: Vec<String>,
    pub globals: Vec<String>,
}

impl DeclarationFile {
    pub fn parse(path: impl Into<String>, text: impl Into<String>) -> Self {
        let path = path.into();
        let text = text.into();
        let scanned = scan(&text);

        let references: Vec<_> = scanned
            .leading_comments
            .iter()
            .filter_map(|comment| parse_reference_directive(comment))
            .collect();
        let imports = collect_imports(&scanned.tokens);

        let statements = StatementParser::new(&scanned.tokens).parse_statements(false);
        let kind = if statements.iter().any(Statement::is_module_indicator) {
            FileKind::Module
        } else {
            FileKind::GlobalScript
        };

        let mut declared_modules = IndexSet::new();
        collect_ambient_modules(&statements, &mut declared_modules);

        let mut globals = IndexSet::new();
        match kind {
            FileKind::GlobalScript => collect_value_declarations(&statements, &mut globals),
            FileKind::Module => collect_module_globals(&statements, &mut globals),
        }

        tracing::trace!(
            path = %path,
            ?kind,
            references = references.len(),
            imports = imports.len(),
            "parsed source file"
        );

        Self {
            path,
            kind,
            references,
            imports,
            declared_modules: declared_modules.into_iter().map(str::to_string).collect(),
            globals: globals.into_iter().map(str::to_string).collect(),
            text,
        }
    }

    pub fn is_module(&self) -> bool {
        self.kind == FileKind::Module
    }

    pub fn path_references(&self) -> impl Iterator<Item = &str> {
        self.references_of(ReferenceKind::Path)
    }

    pub fn type_references(&self) -> impl Iterator<Item = &str> {
        self.references_of(ReferenceKind::Types)
    }

    fn references_of(&self, kind: ReferenceKind) -> impl Iterator<Item = &str> {
        self.references
            .iter()
            .filter(move |r| r.kind == kind)
            .map(|r| r.target.as_str())
    }
}

// =============================================================================
// Reference directives
// =============================================================================

fn parse_reference_directive(comment: &str) -> Option<ReferenceDirective> {
    let trimmed = comment.trim();
    if !trimmed.starts_with("///") || !trimmed.contains("<reference") {
        return None;
    }
    if let Some(target) = extract_quoted_attr(trimmed, "path") {
        return Some(ReferenceDirective {
            kind: ReferenceKind::Path,
            target,
        });
    }
    extract_quoted_attr(trimmed, "types").map(|target| ReferenceDirective {
        kind: ReferenceKind::Types,
        target,
    })
}

/// Value of `attr="..."` (or single-quoted) in a directive line.
fn extract_quoted_attr(line: &str, attr: &str) -> Option<String> {
    let mut search_from = 0;
    while let Some(found) = line[search_from..].find(attr) {
        let idx = search_from + found;
        search_from = idx + attr.len();

        // Must be a whole attribute name, e.g. not the `path` inside `xpath`.
        let preceded_by_space = line[..idx].ends_with(|c: char| c.is_whitespace());
        let after_attr = line[idx + attr.len()..].trim_start();
        let Some(after_equals) = after_attr.strip_prefix('=') else {
            continue;
        };
        if !preceded_by_space {
            continue;
        }

        let after_equals = after_equals.trim_start();
        let quote = after_equals.chars().next()?;
        if quote != '"' && quote != '\'' {
            return None;
        }
        let value = &after_equals[1..];
        let end = value.find(quote)?;
        return Some(value[..end].to_string());
    }
    None
}

// =============================================================================
// Module specifiers
// =============================================================================

/// Tokens that may appear between `import`/`export` and `from`.
fn is_clause_token(tok: &Token<'_>) -> bool {
    match tok.kind {
        TokenKind::Identifier => true,
        TokenKind::Punctuation => matches!(tok.text, "*" | "{" | "}" | "," | "."),
        _ => false,
    }
}

fn collect_imports(tokens: &[Token<'_>]) -> Vec<String> {
    let mut found: IndexSet<&str> = IndexSet::new();
    let at = |i: usize| tokens.get(i);

    for (i, tok) in tokens.iter().enumerate() {
        if tok.kind != TokenKind::Identifier {
            continue;
        }
        // Member access such as `foo.import` / `module.require`.
        if i > 0 && tokens[i - 1].is_punct('.') {
            continue;
        }
        match tok.text {
            "import" => {
                match at(i + 1) {
                    // import("x"), typeof import("x")
                    Some(next) if next.is_punct('(') => {
                        if let Some(spec) = at(i + 2).and_then(Token::string_value) {
                            found.insert(spec);
                        }
                    }
                    // import "x";
                    Some(next) if next.kind == TokenKind::StringLiteral => {
                        found.insert(next.text);
                    }
                    _ => {
                        if let Some(spec) = scan_clause_for_specifier(tokens, i + 1) {
                            found.insert(spec);
                        }
                    }
                }
            }
            "export" => {
                let starts_reexport = match at(i + 1) {
                    Some(next) if next.is_punct('*') || next.is_punct('{') => true,
                    Some(next) if next.is_ident("type") => {
                        at(i + 2).is_some_and(|t| t.is_punct('{') || t.is_punct('*'))
                    }
                    _ => false,
                };
                if starts_reexport {
                    if let Some(spec) = scan_clause_for_specifier(tokens, i + 1) {
                        found.insert(spec);
                    }
                }
            }
            "require" => {
                if at(i + 1).is_some_and(|t| t.is_punct('(')) {
                    if let Some(spec) = at(i + 2).and_then(Token::string_value) {
                        if at(i + 3).is_some_and(|t| t.is_punct(')')) {
                            found.insert(spec);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    found.into_iter().map(str::to_string).collect()
}

/// Walk an import/export clause looking for `from "x"`. `require("x")` after
/// `=` is left to the `require` arm of [`collect_imports`].
fn scan_clause_for_specifier<'a>(tokens: &[Token<'a>], start: usize) -> Option<&'a str> {
    let mut i = start;
    let mut braces = 0usize;
    while let Some(tok) = tokens.get(i) {
        if tok.is_ident("from") {
            if let Some(spec) = tokens.get(i + 1).and_then(Token::string_value) {
                return Some(spec);
            }
        }
        if braces == 0 && i > start && tok.has_preceding_line_break && starts_declaration(tok) {
            return None;
        }
        if !is_clause_token(tok) {
            return None;
        }
        if tok.is_punct('{') {
            braces += 1;
        } else if tok.is_punct('}') {
            braces = braces.saturating_sub(1);
        }
        i += 1;
    }
    None
}

// =============================================================================
// Statements
// =============================================================================

#[derive(Debug)]
enum Statement<'a> {
    /// `import ... from "x"`, `import "x"`, `import x = require("x")`
    Import,
    /// `import x = A.B`
    ImportAlias,
    /// `export =`, `export { }`, `export * from`, `export default ...`
    Export,
    /// `export as namespace X`
    NamespaceExport(&'a str),
    Declaration {
        exported: bool,
        decl: Declaration<'a>,
    },
    Other,
}

impl Statement<'_> {
    fn is_module_indicator(&self) -> bool {
        matches!(
            self,
            Statement::Import
                | Statement::Export
                | Statement::NamespaceExport(_)
                | Statement::Declaration { exported: true, .. }
        )
    }
}

#[derive(Debug)]
enum Declaration<'a> {
    Variable(Vec<&'a str>),
    /// Name is absent for `export default function () {}` and friends.
    Function(Option<&'a str>),
    Class(Option<&'a str>),
    Enum(Option<&'a str>),
    Namespace {
        name: &'a str,
        body: Vec<Statement<'a>>,
    },
    AmbientModule {
        name: &'a str,
        body: Vec<Statement<'a>>,
    },
    Global {
        body: Vec<Statement<'a>>,
    },
    /// Interfaces and type aliases: no runtime presence.
    Type,
}

const DECLARATION_KEYWORDS: &[&str] = &[
    "export",
    "import",
    "declare",
    "var",
    "let",
    "const",
    "function",
    "class",
    "interface",
    "type",
    "enum",
    "namespace",
    "module",
    "abstract",
];

fn starts_declaration(tok: &Token<'_>) -> bool {
    tok.kind == TokenKind::Identifier && DECLARATION_KEYWORDS.contains(&tok.text)
}

struct StatementParser<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
}

impl<'t, 'a> StatementParser<'t, 'a> {
    fn new(tokens: &'t [Token<'a>]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'t Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&'t Token<'a>> {
        self.tokens.get(self.pos + offset)
    }

    fn eat_punct(&mut self, ch: char) -> bool {
        if self.peek().is_some_and(|t| t.is_punct(ch)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn ident_at(&self, offset: usize) -> Option<&'a str> {
        self.peek_at(offset)
            .filter(|t| t.kind == TokenKind::Identifier)
            .map(|t| t.text)
    }

    /// Parse statements until end of input or, when `nested`, the closing `}`
    /// (which is consumed).
    fn parse_statements(&mut self, nested: bool) -> Vec<Statement<'a>> {
        let mut out = Vec::new();
        while let Some(tok) = self.peek() {
            if tok.is_punct('}') {
                self.pos += 1;
                if nested {
                    return out;
                }
                continue;
            }
            let before = self.pos;
            let statement = self.parse_statement();
            if self.pos == before {
                self.pos += 1;
            }
            out.push(statement);
        }
        out
    }

    fn parse_statement(&mut self) -> Statement<'a> {
        let Some(tok) = self.peek() else {
            return Statement::Other;
        };
        if tok.is_punct(';') {
            self.pos += 1;
            return Statement::Other;
        }
        if tok.is_punct('{') {
            self.skip_balanced();
            return Statement::Other;
        }
        if tok.is_ident("import") {
            return self.parse_import();
        }
        if tok.is_ident("export") {
            return self.parse_export();
        }
        if let Some(decl) = self.try_parse_declaration() {
            return Statement::Declaration {
                exported: false,
                decl,
            };
        }
        self.skip_statement();
        Statement::Other
    }

    fn parse_import(&mut self) -> Statement<'a> {
        let Some(next) = self.peek_at(1) else {
            self.pos += 1;
            return Statement::Other;
        };
        if next.is_punct('(') || next.is_punct('.') {
            // Dynamic import or `import.meta`: an expression, not a declaration.
            self.skip_statement();
            return Statement::Other;
        }
        if next.kind == TokenKind::StringLiteral {
            self.pos += 2;
            self.eat_punct(';');
            return Statement::Import;
        }

        self.pos += 1;
        while let Some(tok) = self.peek() {
            if tok.is_ident("from") && self.peek_at(1).is_some_and(|t| t.kind == TokenKind::StringLiteral) {
                self.pos += 2;
                self.eat_punct(';');
                return Statement::Import;
            }
            if tok.is_punct('=') {
                let is_require = self.peek_at(1).is_some_and(|t| t.is_ident("require"))
                    && self.peek_at(2).is_some_and(|t| t.is_punct('('));
                self.skip_statement();
                return if is_require {
                    Statement::Import
                } else {
                    Statement::ImportAlias
                };
            }
            if !is_clause_token(tok) {
                break;
            }
            self.pos += 1;
        }
        self.skip_statement();
        Statement::Other
    }

    fn parse_export(&mut self) -> Statement<'a> {
        let next = self.peek_at(1);
        if next.is_some_and(|t| t.is_ident("as"))
            && self.peek_at(2).is_some_and(|t| t.is_ident("namespace"))
        {
            if let Some(name) = self.ident_at(3) {
                self.pos += 4;
                self.eat_punct(';');
                return Statement::NamespaceExport(name);
            }
        }
        if next.is_some_and(|t| t.is_ident("import")) {
            self.pos += 1;
            self.parse_import();
            return Statement::Export;
        }
        if next.is_some_and(|t| t.is_ident("default")) {
            self.pos += 2;
            if self.try_parse_declaration().is_none() {
                self.skip_statement();
            }
            return Statement::Export;
        }

        self.pos += 1;
        if let Some(decl) = self.try_parse_declaration() {
            return Statement::Declaration {
                exported: true,
                decl,
            };
        }
        // export =, export { }, export * from, export type { }
        self.skip_statement();
        Statement::Export
    }

    fn try_parse_declaration(&mut self) -> Option<Declaration<'a>> {
        let start = self.pos;
        while let Some(modifier) = self.ident_at(0) {
            let is_modifier = matches!(modifier, "declare" | "abstract" | "async")
                && self.peek_at(1).is_some_and(|t| {
                    t.kind == TokenKind::Identifier && !t.has_preceding_line_break
                });
            if !is_modifier {
                break;
            }
            self.pos += 1;
        }

        let decl = match self.ident_at(0) {
            Some("var" | "let") => {
                self.pos += 1;
                Some(Declaration::Variable(self.parse_variable_names()))
            }
            Some("const") => {
                if self.ident_at(1) == Some("enum") {
                    self.pos += 2;
                    Some(Declaration::Enum(self.parse_named_body()))
                } else {
                    self.pos += 1;
                    Some(Declaration::Variable(self.parse_variable_names()))
                }
            }
            Some("function") => {
                self.pos += 1;
                self.eat_punct('*');
                let name = self.ident_at(0);
                self.skip_statement();
                Some(Declaration::Function(name))
            }
            Some("class") => {
                self.pos += 1;
                let name = self.ident_at(0).filter(|n| !matches!(*n, "extends" | "implements"));
                self.skip_to_body_end();
                Some(Declaration::Class(name))
            }
            Some("enum") => {
                self.pos += 1;
                Some(Declaration::Enum(self.parse_named_body()))
            }
            Some("interface") if self.ident_at(1).is_some() => {
                self.pos += 1;
                self.skip_to_body_end();
                Some(Declaration::Type)
            }
            Some("type")
                if self.ident_at(1).is_some()
                    && !self.peek_at(1).is_some_and(|t| t.has_preceding_line_break) =>
            {
                self.pos += 1;
                self.skip_statement();
                Some(Declaration::Type)
            }
            Some("namespace" | "module") => self.parse_namespace(),
            Some("global") if self.peek_at(1).is_some_and(|t| t.is_punct('{')) => {
                self.pos += 2;
                let body = self.parse_statements(true);
                Some(Declaration::Global { body })
            }
            _ => None,
        };

        if decl.is_none() {
            self.pos = start;
        }
        decl
    }

    fn parse_namespace(&mut self) -> Option<Declaration<'a>> {
        let next = self.peek_at(1)?;
        match next.kind {
            TokenKind::StringLiteral => {
                let name = next.text;
                self.pos += 2;
                let body = if self.eat_punct('{') {
                    self.parse_statements(true)
                } else {
                    // Shorthand ambient module: `declare module "x";`
                    self.eat_punct(';');
                    Vec::new()
                };
                Some(Declaration::AmbientModule { name, body })
            }
            TokenKind::Identifier if !next.has_preceding_line_break => {
                let name = next.text;
                self.pos += 2;
                while self.peek().is_some_and(|t| t.is_punct('.'))
                    && self.peek_at(1).is_some_and(|t| t.kind == TokenKind::Identifier)
                {
                    self.pos += 2;
                }
                let body = if self.eat_punct('{') {
                    self.parse_statements(true)
                } else {
                    self.skip_statement();
                    Vec::new()
                };
                Some(Declaration::Namespace { name, body })
            }
            _ => None,
        }
    }

    fn parse_named_body(&mut self) -> Option<&'a str> {
        let name = self.ident_at(0);
        self.skip_to_body_end();
        name
    }

    /// Names in `var a: T = x, b, { c } = y;`. Destructuring patterns
    /// contribute nothing.
    fn parse_variable_names(&mut self) -> Vec<&'a str> {
        let mut names = Vec::new();
        loop {
            match self.peek() {
                Some(tok) if tok.kind == TokenKind::Identifier => {
                    names.push(tok.text);
                    self.pos += 1;
                }
                Some(tok) if tok.is_punct('{') || tok.is_punct('[') => self.skip_balanced(),
                _ => {}
            }
            if !self.skip_to_declarator_end() {
                return names;
            }
        }
    }

    /// Skip a type annotation / initializer. Returns true when a `,` starts
    /// another declarator.
    fn skip_to_declarator_end(&mut self) -> bool {
        let start = self.pos;
        let mut depth = 0usize;
        let mut angle = 0usize;
        while let Some(tok) = self.peek() {
            if depth == 0 && self.pos > start && tok.has_preceding_line_break && starts_declaration(tok) {
                return false;
            }
            if tok.kind == TokenKind::Punctuation {
                match tok.text {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => {
                        if depth == 0 {
                            return false;
                        }
                        depth -= 1;
                    }
                    "<" => angle += 1,
                    ">" => {
                        let arrow = self.pos > 0 && self.tokens[self.pos - 1].is_punct('=');
                        if !arrow {
                            angle = angle.saturating_sub(1);
                        }
                    }
                    ";" if depth == 0 => {
                        self.pos += 1;
                        return false;
                    }
                    "," if depth == 0 && angle == 0 => {
                        self.pos += 1;
                        return true;
                    }
                    _ => {}
                }
            }
            self.pos += 1;
        }
        false
    }

    /// Skip from an opening bracket to just past its matching closer.
    fn skip_balanced(&mut self) {
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            self.pos += 1;
            if tok.kind != TokenKind::Punctuation {
                continue;
            }
            match tok.text {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    /// Skip a class/interface/enum header and its `{ }` body.
    fn skip_to_body_end(&mut self) {
        let start = self.pos;
        let mut paren = 0usize;
        let mut angle = 0usize;
        while let Some(tok) = self.peek() {
            if self.pos > start && tok.has_preceding_line_break && paren == 0 && angle == 0 && starts_declaration(tok) {
                return;
            }
            if tok.kind == TokenKind::Punctuation {
                match tok.text {
                    "{" if paren == 0 && angle == 0 => {
                        self.skip_balanced();
                        return;
                    }
                    ";" if paren == 0 && angle == 0 => {
                        self.pos += 1;
                        return;
                    }
                    "(" => paren += 1,
                    ")" => paren = paren.saturating_sub(1),
                    "<" => angle += 1,
                    ">" => {
                        let arrow = self.pos > 0 && self.tokens[self.pos - 1].is_punct('=');
                        if !arrow {
                            angle = angle.saturating_sub(1);
                        }
                    }
                    "}" if paren == 0 && angle == 0 => return,
                    _ => {}
                }
            }
            self.pos += 1;
        }
    }

    /// Skip to the end of the current statement without consuming a `}` that
    /// closes the enclosing block.
    fn skip_statement(&mut self) {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            if depth == 0 && self.pos > start && tok.has_preceding_line_break && starts_declaration(tok) {
                return;
            }
            if tok.kind == TokenKind::Punctuation {
                match tok.text {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => {
                        if depth == 0 {
                            return;
                        }
                        depth -= 1;
                    }
                    ";" if depth == 0 => {
                        self.pos += 1;
                        return;
                    }
                    _ => {}
                }
            }
            self.pos += 1;
        }
    }
}

// =============================================================================
// Collection
// =============================================================================

fn collect_ambient_modules<'a>(statements: &[Statement<'a>], out: &mut IndexSet<&'a str>) {
    for statement in statements {
        let Statement::Declaration { decl, .. } = statement else {
            continue;
        };
        match decl {
            Declaration::AmbientModule { name, body } => {
                out.insert(*name);
                collect_ambient_modules(body, out);
            }
            Declaration::Namespace { body, .. } | Declaration::Global { body } => {
                collect_ambient_modules(body, out);
            }
            _ => {}
        }
    }
}

/// Top-level value declarations of a global script (or a `declare global`
/// block). Types and interfaces are not visible at runtime and are skipped.
fn collect_value_declarations<'a>(statements: &[Statement<'a>], out: &mut IndexSet<&'a str>) {
    for statement in statements {
        let Statement::Declaration { decl, .. } = statement else {
            continue;
        };
        match decl {
            Declaration::Variable(names) => out.extend(names.iter().copied()),
            Declaration::Function(Some(name))
            | Declaration::Class(Some(name))
            | Declaration::Enum(Some(name)) => {
                out.insert(*name);
            }
            Declaration::Namespace { name, body } if is_value_namespace(body) => {
                out.insert(*name);
            }
            Declaration::Global { body } => collect_value_declarations(body, out),
            _ => {}
        }
    }
}

fn collect_module_globals<'a>(statements: &[Statement<'a>], out: &mut IndexSet<&'a str>) {
    for statement in statements {
        match statement {
            Statement::NamespaceExport(name) => {
                out.insert(*name);
            }
            Statement::Declaration {
                decl: Declaration::Global { body },
                ..
            } => collect_value_declarations(body, out),
            Statement::Declaration {
                decl: Declaration::AmbientModule { body, .. },
                ..
            } => collect_module_globals(body, out),
            _ => {}
        }
    }
}

fn is_value_namespace(body: &[Statement<'_>]) -> bool {
    body.iter().any(|statement| match statement {
        Statement::Declaration { decl, .. } => match decl {
            Declaration::Variable(_)
            | Declaration::Function(_)
            | Declaration::Class(_)
            | Declaration::Enum(_) => true,
            Declaration::Namespace { body, .. } => is_value_namespace(body),
            _ => false,
        },
        _ => false,
    })
}

#[cfg(test)]
#[path = "tests/source_file_tests.rs"]
mod tests;
