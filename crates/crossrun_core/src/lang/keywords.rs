//! Reserved words of the script language.
//!
//! Contextual words (`from`, `as`, `of`, `async`, `get`, `set`, `let`, `static`) are deliberately absent: they are
//! valid identifiers and the parser recognises them by spelling where it needs to.
//!
//! ## Notes
//! - `expression_follows` records whether an expression (and therefore a regular expression literal) may start right
//!   after the keyword. The lexer uses it to decide between `/` as division and `/` as a regex delimiter.
//!
//! ## Examples
//! ```rust
//! use crossrun_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("import"), Some(KeywordId::Import));
//! assert_eq!(keywords::from_str("window"), None);
//! assert!(keywords::expression_follows(KeywordId::Return));
//! ```

/// Stable identifier for every reserved word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordId {
    Await,
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Export,
    Extends,
    False,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    New,
    Null,
    Return,
    Super,
    Switch,
    This,
    Throw,
    True,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,
    Yield,
}

/// Metadata for a reserved word.
#[derive(Debug, Clone, Copy)]
pub struct KeywordInfo {
    pub id: KeywordId,
    pub canonical: &'static str,
    pub expression_follows: bool,
}

/// Registry of all reserved words.
pub const KEYWORDS: &[KeywordInfo] = &[
    info(KeywordId::Await, "await", true),
    info(KeywordId::Break, "break", false),
    info(KeywordId::Case, "case", true),
    info(KeywordId::Catch, "catch", false),
    info(KeywordId::Class, "class", false),
    info(KeywordId::Const, "const", false),
    info(KeywordId::Continue, "continue", false),
    info(KeywordId::Debugger, "debugger", false),
    info(KeywordId::Default, "default", true),
    info(KeywordId::Delete, "delete", true),
    info(KeywordId::Do, "do", true),
    info(KeywordId::Else, "else", true),
    info(KeywordId::Export, "export", false),
    info(KeywordId::Extends, "extends", true),
    info(KeywordId::False, "false", false),
    info(KeywordId::Finally, "finally", false),
    info(KeywordId::For, "for", false),
    info(KeywordId::Function, "function", false),
    info(KeywordId::If, "if", false),
    info(KeywordId::Import, "import", false),
    info(KeywordId::In, "in", true),
    info(KeywordId::Instanceof, "instanceof", true),
    info(KeywordId::New, "new", true),
    info(KeywordId::Null, "null", false),
    info(KeywordId::Return, "return", true),
    info(KeywordId::Super, "super", false),
    info(KeywordId::Switch, "switch", false),
    info(KeywordId::This, "this", false),
    info(KeywordId::Throw, "throw", true),
    info(KeywordId::True, "true", false),
    info(KeywordId::Try, "try", false),
    info(KeywordId::Typeof, "typeof", true),
    info(KeywordId::Var, "var", false),
    info(KeywordId::Void, "void", true),
    info(KeywordId::While, "while", false),
    info(KeywordId::With, "with", false),
    info(KeywordId::Yield, "yield", true),
];

const fn info(id: KeywordId, canonical: &'static str, expression_follows: bool) -> KeywordInfo {
    KeywordInfo {
        id,
        canonical,
        expression_follows,
    }
}

/// Return the registry metadata for a keyword.
pub fn info_for(id: KeywordId) -> &'static KeywordInfo {
    KEYWORDS
        .iter()
        .find(|k| k.id == id)
        .expect("INVARIANT: every KeywordId has a registry entry")
}

/// Return the canonical spelling for a keyword.
pub fn as_str(id: KeywordId) -> &'static str {
    info_for(id).canonical
}

/// Whether an expression may begin directly after the keyword.
pub fn expression_follows(id: KeywordId) -> bool {
    info_for(id).expression_follows
}

/// Resolve a spelling to a reserved word (case-sensitive).
pub fn from_str(s: &str) -> Option<KeywordId> {
    KEYWORDS.iter().find(|k| k.canonical == s).map(|k| k.id)
}
