//! Operator spellings of the script language.
//!
//! The lexer needs operators only to split source correctly (maximal munch), so this registry is a flat list of
//! spellings ordered longest first.
//!
//! ## Examples
//! ```rust
//! use crossrun_core::lang::operators;
//!
//! assert_eq!(operators::longest_prefix(">>>= 1"), Some(">>>="));
//! assert_eq!(operators::longest_prefix("=== b"), Some("==="));
//! assert_eq!(operators::longest_prefix("x"), None);
//! ```

/// All operator spellings, longest first.
pub const OPERATORS: &[&str] = &[
    // 4
    ">>>=",
    // 3
    "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=",
    // 2
    "==", "!=", "<=", ">=", "&&", "||", "??", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "**", "<<",
    ">>",
    // 1
    "=", "<", ">", "+", "-", "*", "/", "%", "&", "|", "^", "!", "~", "?", "@",
];

/// Return the longest operator spelling that prefixes `rest`.
pub fn longest_prefix(rest: &str) -> Option<&'static str> {
    OPERATORS.iter().copied().find(|op| rest.starts_with(op))
}

/// Whether the operator is `++` or `--`, which may end an expression (`i++ / 2`).
pub fn is_update(op: &str) -> bool {
    op == "++" || op == "--"
}
