//! Parser for script sources
//!
//! Builds the shallow [`Program`] tree from a token stream:
//!
//! - top-level import declarations are parsed fully (clause, specifier, attributes, terminator);
//! - all other top-level code is split into `Statement::Other` runs at top-level semicolons;
//! - every identifier token is recorded with its [`IdentifierRole`].
//!
//! Delimiter balance is already guaranteed by the lexer. The parser adds the import grammar and rejects import
//! declarations that are not at the top level. `import(...)` and `import.meta` are expressions and are left alone.
//!
//! ## Examples
//!
//! ```rust
//! use crossrun_syntax::parser;
//!
//! let program = parser::parse_source("import { a as b } from 'm';\nb(window.x);\n").unwrap();
//! let (decl, _) = program.imports().next().unwrap();
//! assert_eq!(decl.source, "m");
//! assert_eq!(decl.local_names(), vec!["b"]);
//! assert_eq!(program.references().count(), 3);
//! ```

use crate::ast::{Identifier, IdentifierRole, ImportDecl, ImportSpecifier, Program, Span, Spanned, Statement};
use crate::diagnostics::SyntaxError;
use crate::lexer::{self, Token, TokenKind};
use crossrun_core::lang::keywords::{self, KeywordId};
use crossrun_core::lang::punctuation::{self, PunctuationCategory, PunctuationId};

/// Parse a token stream (ending in `Eof`) into a program.
#[tracing::instrument(skip_all, fields(token_count = tokens.len()))]
pub fn parse(tokens: &[Token]) -> Result<Program, Vec<SyntaxError>> {
    Parser::new(tokens).parse_program()
}

/// Lex and parse a source string.
pub fn parse_source(source: &str) -> Result<Program, Vec<SyntaxError>> {
    let tokens = lexer::lex(source)?;
    parse(&tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// Nesting depth of brackets, braces and template substitutions.
    depth: usize,
    /// Span of the top-level statement currently being collected.
    pending: Option<Span>,
    program: Program,
    errors: Vec<SyntaxError>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            pending: None,
            program: Program::default(),
            errors: Vec::new(),
        }
    }

    fn parse_program(mut self) -> Result<Program, Vec<SyntaxError>> {
        while !self.at_end() {
            let token = self.peek();
            if token.kind.is_keyword(KeywordId::Import) && self.starts_import_declaration() {
                if self.depth == 0 {
                    self.flush_pending();
                    let start = self.pos;
                    match self.parse_import() {
                        Ok(stmt) => self.program.body.push(stmt),
                        Err(err) => {
                            self.errors.push(err);
                            // Resume after the offending token; the main loop keeps depth in sync.
                            self.pos = self.pos.max(start + 1);
                        }
                    }
                } else {
                    self.errors.push(SyntaxError::new(
                        "Import declarations may only appear at the top level",
                        token.span,
                    ));
                    self.pos += 1;
                }
                continue;
            }
            self.track(token);
            self.pos += 1;
        }
        self.flush_pending();

        if self.errors.is_empty() {
            Ok(self.program)
        } else {
            Err(self.errors)
        }
    }

    // ========================================================================
    // Token cursor
    // ========================================================================

    fn peek(&self) -> &'a Token {
        let tokens: &'a [Token] = self.tokens;
        &tokens[self.pos.min(tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &'a Token {
        let tokens: &'a [Token] = self.tokens;
        &tokens[(self.pos + offset).min(tokens.len() - 1)]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len() || matches!(self.peek().kind, TokenKind::Eof)
    }

    fn previous(&self) -> Option<&'a Token> {
        let tokens: &'a [Token] = self.tokens;
        self.pos.checked_sub(1).and_then(|i| tokens.get(i))
    }

    /// `import` at a statement start, not followed by `(`, `.`, `:` or `=`.
    ///
    /// A statement starts at the beginning of input, after `;`, `{` or `}`, or after a line break. `import` after
    /// `.`/`?.` is always a property name.
    fn starts_import_declaration(&self) -> bool {
        let token = self.peek();
        let at_statement_start = match self.previous().and_then(|prev| prev.punctuation_id()) {
            Some(PunctuationId::Dot | PunctuationId::OptionalChain) => false,
            Some(PunctuationId::Semicolon | PunctuationId::LBrace | PunctuationId::RBrace) => true,
            _ => self.previous().is_none() || token.newline_before,
        };

        let next = &self.peek_at(1).kind;
        let continues_expression = matches!(
            next.punctuation_id(),
            Some(PunctuationId::LParen | PunctuationId::Dot | PunctuationId::Colon)
        ) || next.is_operator("=");

        at_statement_start && !continues_expression
    }

    // ========================================================================
    // Generic statements
    // ========================================================================

    /// Account for a token outside import declarations.
    fn track(&mut self, token: &'a Token) {
        if let TokenKind::Ident(name) = &token.kind {
            let after_member_access = self.previous().is_some_and(|prev| {
                prev.kind.is_punctuation(PunctuationId::Dot) || prev.kind.is_punctuation(PunctuationId::OptionalChain)
            });
            let role = if after_member_access {
                IdentifierRole::PropertyName
            } else {
                IdentifierRole::Reference
            };
            self.record_identifier(name, role, token.span);
        }

        match &token.kind {
            TokenKind::Punctuation(p) => match punctuation::category(*p) {
                PunctuationCategory::Open => self.depth += 1,
                PunctuationCategory::Close => self.depth = self.depth.saturating_sub(1),
                _ => {}
            },
            TokenKind::TemplateHead => self.depth += 1,
            TokenKind::TemplateTail => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }

        self.pending = Some(match self.pending {
            Some(span) => span.merge(token.span),
            None => token.span,
        });

        if self.depth == 0 && token.kind.is_punctuation(PunctuationId::Semicolon) {
            self.flush_pending();
        }
    }

    fn flush_pending(&mut self) {
        if let Some(span) = self.pending.take() {
            self.program.body.push(Spanned::new(Statement::Other, span));
        }
    }

    fn record_identifier(&mut self, name: &str, role: IdentifierRole, span: Span) {
        self.program.identifiers.push(Spanned::new(
            Identifier {
                name: name.to_string(),
                role,
            },
            span,
        ));
    }

    // ========================================================================
    // Import declarations
    // ========================================================================

    fn parse_import(&mut self) -> Result<Spanned<Statement>, SyntaxError> {
        let start = self.peek().span.start;
        self.pos += 1;

        let mut decl = ImportDecl::default();

        if let TokenKind::String(source) = &self.peek().kind {
            decl.source = source.clone();
            self.pos += 1;
        } else {
            self.parse_import_clause(&mut decl)?;
            self.expect_contextual("from")?;
            decl.source = self.expect_string()?;
        }

        let attributes = self.peek();
        if attributes.kind.is_keyword(KeywordId::With)
            || (attributes.kind.is_ident("assert") && !attributes.newline_before)
        {
            self.pos += 1;
            self.skip_attribute_block()?;
            decl.has_attributes = true;
        }

        let end = self.finish_statement()?;
        Ok(Spanned::new(Statement::Import(decl), Span::new(start, end)))
    }

    /// `x`, `* as ns`, `{ a, b as c }`, `x, * as ns`, `x, { a }`
    fn parse_import_clause(&mut self, decl: &mut ImportDecl) -> Result<(), SyntaxError> {
        let token = self.peek();
        if let TokenKind::Ident(name) = &token.kind {
            decl.default = Some(name.clone());
            self.record_identifier(name, IdentifierRole::Reference, token.span);
            self.pos += 1;
            if !self.peek().kind.is_punctuation(PunctuationId::Comma) {
                return Ok(());
            }
            self.pos += 1;
        }

        let token = self.peek();
        if token.kind.is_operator("*") {
            self.pos += 1;
            self.expect_contextual("as")?;
            decl.namespace = Some(self.expect_binding()?);
            Ok(())
        } else if token.kind.is_punctuation(PunctuationId::LBrace) {
            self.pos += 1;
            decl.named = self.parse_named_imports()?;
            Ok(())
        } else {
            Err(self.unexpected("an import clause"))
        }
    }

    fn parse_named_imports(&mut self) -> Result<Vec<ImportSpecifier>, SyntaxError> {
        let mut specifiers = Vec::new();
        loop {
            let token = self.peek();
            if token.kind.is_punctuation(PunctuationId::RBrace) {
                self.pos += 1;
                return Ok(specifiers);
            }

            let (imported, needs_alias) = match &token.kind {
                TokenKind::Ident(name) => (name.clone(), false),
                TokenKind::Keyword(id) => (keywords::as_str(*id).to_string(), true),
                TokenKind::String(s) => (s.clone(), true),
                _ => return Err(self.unexpected("an imported name")),
            };
            self.pos += 1;

            let local = if self.peek().kind.is_ident("as") {
                self.pos += 1;
                self.expect_binding()?
            } else if needs_alias {
                return Err(SyntaxError::new(
                    format!("Imported name `{}` must be renamed with `as`", imported),
                    token.span,
                ));
            } else {
                self.record_identifier(&imported, IdentifierRole::Reference, token.span);
                imported.clone()
            };
            specifiers.push(ImportSpecifier { imported, local });

            let next = self.peek();
            if next.kind.is_punctuation(PunctuationId::Comma) {
                self.pos += 1;
            } else if !next.kind.is_punctuation(PunctuationId::RBrace) {
                return Err(self.unexpected("',' or '}'"));
            }
        }
    }

    fn skip_attribute_block(&mut self) -> Result<(), SyntaxError> {
        if !self.peek().kind.is_punctuation(PunctuationId::LBrace) {
            return Err(self.unexpected("'{' after import attributes keyword"));
        }
        let mut depth = 0usize;
        loop {
            let token = self.peek();
            match &token.kind {
                TokenKind::Eof => return Err(self.unexpected("'}'")),
                TokenKind::Punctuation(PunctuationId::LBrace) => depth += 1,
                TokenKind::Punctuation(PunctuationId::RBrace) => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos += 1;
                        return Ok(());
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    /// Consume an optional `;` and return the end offset of the declaration.
    ///
    /// Without a `;`, automatic semicolon insertion requires a line break or the end of input.
    fn finish_statement(&mut self) -> Result<usize, SyntaxError> {
        let last_end = self.previous().map(|t| t.span.end).unwrap_or(0);
        let token = self.peek();
        if token.kind.is_punctuation(PunctuationId::Semicolon) {
            self.pos += 1;
            Ok(token.span.end)
        } else if matches!(token.kind, TokenKind::Eof) || token.newline_before {
            Ok(last_end)
        } else {
            Err(SyntaxError::new(
                format!("Expected ';' after import declaration, found {}", describe(&token.kind)),
                token.span,
            ))
        }
    }

    fn expect_contextual(&mut self, word: &str) -> Result<(), SyntaxError> {
        if self.peek().kind.is_ident(word) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{}`", word)))
        }
    }

    fn expect_binding(&mut self) -> Result<String, SyntaxError> {
        let token = self.peek();
        match &token.kind {
            TokenKind::Ident(name) => {
                self.record_identifier(name, IdentifierRole::Reference, token.span);
                self.pos += 1;
                Ok(name.clone())
            }
            _ => Err(self.unexpected("a binding name")),
        }
    }

    fn expect_string(&mut self) -> Result<String, SyntaxError> {
        match &self.peek().kind {
            TokenKind::String(s) => {
                self.pos += 1;
                Ok(s.clone())
            }
            _ => Err(self.unexpected("a module specifier string")),
        }
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        let token = self.peek();
        SyntaxError::new(
            format!("Expected {} in import declaration, found {}", expected, describe(&token.kind)),
            token.span,
        )
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Keyword(id) => format!("keyword `{}`", keywords::as_str(*id)),
        TokenKind::Punctuation(p) => format!("'{}'", punctuation::as_str(*p)),
        TokenKind::Operator(op) => format!("'{}'", op),
        TokenKind::Ident(name) => format!("identifier `{}`", name),
        TokenKind::PrivateName(name) => format!("private name `#{}`", name),
        TokenKind::Number => "number".to_string(),
        TokenKind::String(_) => "string".to_string(),
        TokenKind::Regex => "regular expression".to_string(),
        TokenKind::Template | TokenKind::TemplateHead | TokenKind::TemplateMiddle | TokenKind::TemplateTail => {
            "template literal".to_string()
        }
        TokenKind::Eof => "end of input".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imports(source: &str) -> Vec<ImportDecl> {
        parse_source(source)
            .unwrap()
            .imports()
            .map(|(decl, _)| decl.clone())
            .collect()
    }

    #[test]
    fn test_import_forms() {
        let decls = imports(
            "import 'side';\n\
             import a from 'a';\n\
             import * as ns from 'ns';\n\
             import b, { c, d as e, default as f } from 'named';\n\
             import g, * as h from 'both';\n",
        );
        assert_eq!(decls.len(), 5);
        assert!(decls[0].is_side_effect());
        assert_eq!(decls[1].default.as_deref(), Some("a"));
        assert_eq!(decls[2].namespace.as_deref(), Some("ns"));
        assert_eq!(decls[3].local_names(), vec!["b", "c", "e", "f"]);
        assert_eq!(decls[3].named[2].imported, "default");
        assert_eq!(decls[4].local_names(), vec!["g", "h"]);
    }

    #[test]
    fn test_import_attributes_and_asi() {
        let program = parse_source("import data from './d.json' with { type: 'json' }\nrun(data)").unwrap();
        let (decl, span) = program.imports().next().unwrap();
        assert!(decl.has_attributes);
        assert_eq!(span, Span::new(0, 49));
    }

    #[test]
    fn test_import_span_includes_semicolon() {
        let program = parse_source("import x from 'y'; const z = 1;").unwrap();
        let (_, span) = program.imports().next().unwrap();
        assert_eq!(span, Span::new(0, 18));
        assert_eq!(program.body.len(), 2);
        assert_eq!(program.body[1].node, Statement::Other);
        assert_eq!(program.body[1].span, Span::new(19, 31));
    }

    #[test]
    fn test_dynamic_import_and_meta_are_expressions() {
        let program = parse_source("const m = import('m');\nconsole.log(import.meta.url);").unwrap();
        assert_eq!(program.imports().count(), 0);
    }

    #[test]
    fn test_import_as_member_or_key_is_not_a_declaration() {
        for source in [
            "a.import = 1;",
            "a?.import;",
            "({ import: 1 });",
            "const o = { import: 1 };",
            "class A { import() {} }",
            "a.\nimport = 2;",
        ] {
            let program = parse_source(source).unwrap_or_else(|e| panic!("{source}: {e:?}"));
            assert_eq!(program.imports().count(), 0, "{source}");
        }
    }

    #[test]
    fn test_import_after_line_break_is_a_declaration() {
        let program = parse_source("run()\nimport x from 'y'\nrun(x)").unwrap();
        assert_eq!(program.imports().count(), 1);
    }

    #[test]
    fn test_nested_import_declaration_is_rejected() {
        let errors = parse_source("function f() { import x from 'y'; }").unwrap_err();
        assert!(errors[0].message.contains("top level"));
    }

    #[test]
    fn test_malformed_import_is_rejected() {
        let errors = parse_source("import x 'y';").unwrap_err();
        assert!(errors[0].message.contains("Expected `from`"));

        let errors = parse_source("import { default } from 'y';").unwrap_err();
        assert!(errors[0].message.contains("must be renamed"));

        let errors = parse_source("import x from 'y' foo();").unwrap_err();
        assert!(errors[0].message.contains("';' after import declaration"));
    }

    #[test]
    fn test_identifier_roles() {
        let program = parse_source("window.a; a.window; a?.window; ({ window });").unwrap();
        let roles: Vec<(&str, IdentifierRole)> = program
            .identifiers
            .iter()
            .map(|id| (id.node.name.as_str(), id.node.role))
            .collect();
        assert_eq!(
            roles,
            vec![
                ("window", IdentifierRole::Reference),
                ("a", IdentifierRole::PropertyName),
                ("a", IdentifierRole::Reference),
                ("window", IdentifierRole::PropertyName),
                ("a", IdentifierRole::Reference),
                ("window", IdentifierRole::PropertyName),
                ("window", IdentifierRole::Reference),
            ]
        );
    }

    #[test]
    fn test_top_level_statements_split_on_semicolons() {
        let program = parse_source("a(); function f() { b(); c(); }\nd();").unwrap();
        assert_eq!(program.body.len(), 2);
        assert!(program.body.iter().all(|s| s.node == Statement::Other));
    }
}
