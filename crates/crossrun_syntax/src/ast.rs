//! Syntax tree for script sources.
//!
//! The tree is deliberately shallow: it models exactly what embedding needs. Top-level statements are split into
//! import declarations (fully parsed) and everything else; every identifier token in the source, at any nesting
//! depth, is recorded with its role.

/// Source location span (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// A parsed script.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Spanned<Statement>>,
    /// Every identifier in source order, including nested scopes.
    pub identifiers: Vec<Spanned<Identifier>>,
}

impl Program {
    /// Import declarations in source order.
    pub fn imports(&self) -> impl Iterator<Item = (&ImportDecl, Span)> {
        self.body.iter().filter_map(|stmt| match &stmt.node {
            Statement::Import(decl) => Some((decl, stmt.span)),
            Statement::Other => None,
        })
    }

    /// Identifiers that are references or bindings (not property names).
    pub fn references(&self) -> impl Iterator<Item = &Spanned<Identifier>> {
        self.identifiers.iter().filter(|id| id.node.role == IdentifierRole::Reference)
    }
}

/// Top-level statements
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Import(ImportDecl),
    /// A statement the rewrites do not look inside at the top level.
    Other,
}

/// `import ... from "source"` or `import "source"`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportDecl {
    /// Module specifier, escapes decoded.
    pub source: String,
    pub default: Option<String>,
    pub namespace: Option<String>,
    pub named: Vec<ImportSpecifier>,
    /// `with { ... }` / `assert { ... }` was present.
    pub has_attributes: bool,
}

impl ImportDecl {
    /// `import "source"` with no bindings.
    pub fn is_side_effect(&self) -> bool {
        self.default.is_none() && self.namespace.is_none() && self.named.is_empty()
    }

    /// Local names this declaration binds.
    pub fn local_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        if let Some(d) = &self.default {
            names.push(d.as_str());
        }
        if let Some(ns) = &self.namespace {
            names.push(ns.as_str());
        }
        names.extend(self.named.iter().map(|s| s.local.as_str()));
        names
    }
}

/// `imported as local` inside braces.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpecifier {
    pub imported: String,
    pub local: String,
}

/// An identifier occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub role: IdentifierRole,
}

/// How an identifier occurrence is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierRole {
    /// A variable reference or a binding (`window.x`, `const window`, `{ window }`).
    Reference,
    /// The property name of a member access (`a.window`, `a?.window`).
    PropertyName,
}
