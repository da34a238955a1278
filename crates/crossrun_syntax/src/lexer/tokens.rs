//! Token types for the script lexer.
//!
//! Keywords and structural punctuation carry registry ids from `crossrun_core::lang`; operators carry their
//! static spelling. Comments and whitespace never become tokens, but `newline_before` records whether a line
//! terminator preceded the token (needed for automatic semicolon insertion).

use crate::ast::Span;
use crossrun_core::lang::keywords::{self, KeywordId};
use crossrun_core::lang::punctuation::PunctuationId;

/// Kind of token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ========== Keyword / punctuation (ID-based) ==========
    Keyword(KeywordId),
    Punctuation(PunctuationId),
    Operator(&'static str),

    // ========== Identifiers and Literals ==========
    Ident(String),
    /// `#name` class member.
    PrivateName(String),
    Number,
    /// String literal with escapes decoded.
    String(String),
    Regex,

    // ========== Template literals ==========
    /// A template without substitutions: `` `text` ``.
    Template,
    /// `` `text${ ``
    TemplateHead,
    /// `}text${`
    TemplateMiddle,
    /// `` }text` ``
    TemplateTail,

    // ========== Special ==========
    Eof,
}

/// A token with its kind and source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub newline_before: bool,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, newline_before: bool) -> Self {
        Self {
            kind,
            span,
            newline_before,
        }
    }

    pub fn keyword_id(&self) -> Option<KeywordId> {
        self.kind.keyword_id()
    }

    pub fn punctuation_id(&self) -> Option<PunctuationId> {
        self.kind.punctuation_id()
    }
}

impl TokenKind {
    pub fn keyword_id(&self) -> Option<KeywordId> {
        match self {
            TokenKind::Keyword(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_keyword(&self, id: KeywordId) -> bool {
        matches!(self, TokenKind::Keyword(k) if *k == id)
    }

    pub fn punctuation_id(&self) -> Option<PunctuationId> {
        match self {
            TokenKind::Punctuation(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_punctuation(&self, id: PunctuationId) -> bool {
        matches!(self, TokenKind::Punctuation(p) if *p == id)
    }

    pub fn is_operator(&self, spelling: &str) -> bool {
        matches!(self, TokenKind::Operator(op) if *op == spelling)
    }

    /// `true` for an identifier with exactly this spelling (contextual keywords like `from`).
    pub fn is_ident(&self, name: &str) -> bool {
        matches!(self, TokenKind::Ident(s) if s == name)
    }

    /// Whether a `/` directly after this token starts a regular expression literal.
    ///
    /// A closing `}` is treated as ending a block, so `}\n/re/` lexes as a regex.
    /// Decided from this token alone: a `)` is division here and reserved words follow their own registry entry.
    /// The lexer refines both using the surrounding tokens.
    pub fn regex_may_follow(&self) -> bool {
        match self {
            TokenKind::Ident(_)
            | TokenKind::PrivateName(_)
            | TokenKind::Number
            | TokenKind::String(_)
            | TokenKind::Regex
            | TokenKind::Template
            | TokenKind::TemplateTail => false,
            TokenKind::TemplateHead | TokenKind::TemplateMiddle => true,
            TokenKind::Keyword(id) => keywords::expression_follows(*id),
            TokenKind::Punctuation(p) => !matches!(
                p,
                PunctuationId::RParen | PunctuationId::RBracket | PunctuationId::Dot | PunctuationId::OptionalChain
            ),
            TokenKind::Operator(op) => !crossrun_core::lang::operators::is_update(op),
            TokenKind::Eof => true,
        }
    }
}

/// Resolve an identifier spelling to a reserved word, if any.
pub fn keyword_id(name: &str) -> Option<KeywordId> {
    keywords::from_str(name)
}
