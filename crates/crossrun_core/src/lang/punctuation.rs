//! Structural punctuation of the script language.
//!
//! Only punctuation that the parser reasons about gets an id: delimiters, statement separators and member access
//! markers. Everything else is an operator (see [`crate::lang::operators`]).
//!
//! ## Examples
//! ```rust
//! use crossrun_core::lang::punctuation::{self, PunctuationId};
//!
//! assert_eq!(punctuation::from_str("?."), Some(PunctuationId::OptionalChain));
//! assert_eq!(punctuation::closing(PunctuationId::LBrace), Some(PunctuationId::RBrace));
//! ```

/// Stable identifier for structural punctuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PunctuationId {
    // Separators
    Semicolon,
    Comma,
    Colon,

    // Member access
    Dot,
    OptionalChain,

    // Markers
    Arrow,
    Ellipsis,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
}

/// Broad grouping for punctuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PunctuationCategory {
    Separator,
    Access,
    Marker,
    Open,
    Close,
}

/// Metadata for a punctuation token.
#[derive(Debug, Clone, Copy)]
pub struct PunctuationInfo {
    pub id: PunctuationId,
    pub canonical: &'static str,
    pub category: PunctuationCategory,
}

/// Registry of structural punctuation.
pub const PUNCTUATION: &[PunctuationInfo] = &[
    info(PunctuationId::Semicolon, ";", PunctuationCategory::Separator),
    info(PunctuationId::Comma, ",", PunctuationCategory::Separator),
    info(PunctuationId::Colon, ":", PunctuationCategory::Separator),
    info(PunctuationId::Dot, ".", PunctuationCategory::Access),
    info(PunctuationId::OptionalChain, "?.", PunctuationCategory::Access),
    info(PunctuationId::Arrow, "=>", PunctuationCategory::Marker),
    info(PunctuationId::Ellipsis, "...", PunctuationCategory::Marker),
    info(PunctuationId::LParen, "(", PunctuationCategory::Open),
    info(PunctuationId::RParen, ")", PunctuationCategory::Close),
    info(PunctuationId::LBracket, "[", PunctuationCategory::Open),
    info(PunctuationId::RBracket, "]", PunctuationCategory::Close),
    info(PunctuationId::LBrace, "{", PunctuationCategory::Open),
    info(PunctuationId::RBrace, "}", PunctuationCategory::Close),
];

const fn info(id: PunctuationId, canonical: &'static str, category: PunctuationCategory) -> PunctuationInfo {
    PunctuationInfo { id, canonical, category }
}

/// Return the registry metadata for a punctuation token.
pub fn info_for(id: PunctuationId) -> &'static PunctuationInfo {
    PUNCTUATION
        .iter()
        .find(|p| p.id == id)
        .expect("INVARIANT: every PunctuationId has a registry entry")
}

/// Return the canonical spelling for a punctuation token.
pub fn as_str(id: PunctuationId) -> &'static str {
    info_for(id).canonical
}

/// Return the category for a punctuation token.
pub fn category(id: PunctuationId) -> PunctuationCategory {
    info_for(id).category
}

/// Resolve a punctuation spelling (case-sensitive).
pub fn from_str(s: &str) -> Option<PunctuationId> {
    PUNCTUATION.iter().find(|p| p.canonical == s).map(|p| p.id)
}

/// Return the closing delimiter matching an opening one.
pub fn closing(open: PunctuationId) -> Option<PunctuationId> {
    match open {
        PunctuationId::LParen => Some(PunctuationId::RParen),
        PunctuationId::LBracket => Some(PunctuationId::RBracket),
        PunctuationId::LBrace => Some(PunctuationId::RBrace),
        _ => None,
    }
}
