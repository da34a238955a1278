//! Syntax frontend for embedding test sources: lexer, top-level parser, rewrites, diagnostics.
//!
//! This crate is dependency-light. It understands just enough script grammar to validate a source file, find its
//! top-level import declarations and classify every identifier occurrence, which is what the embedding rewrites
//! need.
//!
//! ## Notes
//! - Parsing is shallow: statements other than imports are kept as opaque spans.
//! - Vocabulary identity (keywords/operators/punctuation) comes from `crossrun_core::lang` registries.
//!
//! ## Examples
//! ```rust
//! use crossrun_syntax::preprocess;
//!
//! let out = preprocess("import x from 'y'; window.run();").unwrap();
//! assert_eq!(out, "globalThis.run();");
//! ```

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod rewrite;

pub use diagnostics::{SyntaxError, format_error};
pub use rewrite::{Preprocessor, RewritePass, preprocess};
