//! Source rewrites for embedding foreign test sources.
//!
//! A rewrite never reprints the tree. Each [`RewritePass`] inspects a freshly parsed [`Program`] and returns
//! span edits, which are spliced into the original text. Comments and formatting outside the edited spans are
//! preserved byte for byte.
//!
//! The default [`Preprocessor`] runs two passes in order:
//!
//! 1. [`RenameIdentifier`] `window` → `globalThis` (every reference, scope-unaware);
//! 2. [`StripImports`] removes every top-level import declaration.

mod rename;
mod strip_imports;

pub use rename::RenameIdentifier;
pub use strip_imports::StripImports;

use crate::ast::{Program, Span};
use crate::diagnostics::SyntaxError;
use crate::parser;

/// Replace `span` of the source with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub span: Span,
    pub replacement: String,
}

impl Edit {
    pub fn replace(span: Span, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
        }
    }

    pub fn delete(span: Span) -> Self {
        Self::replace(span, "")
    }
}

/// Apply edits to `source`. Edits are applied in span order; an edit overlapping an earlier one is dropped.
pub fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| (e.span.start, e.span.end));

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in edits {
        if edit.span.start < cursor || edit.span.end > source.len() {
            tracing::debug!(start = edit.span.start, end = edit.span.end, "skipping overlapping edit");
            continue;
        }
        out.push_str(&source[cursor..edit.span.start]);
        out.push_str(&edit.replacement);
        cursor = edit.span.end;
    }
    out.push_str(&source[cursor..]);
    out
}

/// A single named rewrite over a parsed program.
pub trait RewritePass {
    /// Stable name used in logs.
    fn name(&self) -> &'static str;

    /// Compute the edits this pass makes to `source`, which `program` was parsed from.
    fn edits(&self, program: &Program, source: &str) -> Vec<Edit>;
}

/// Runs rewrite passes in order, re-parsing the source before each one.
pub struct Preprocessor {
    passes: Vec<Box<dyn RewritePass + Send + Sync>>,
}

impl Preprocessor {
    /// A preprocessor with no passes. Still validates syntax.
    pub fn empty() -> Self {
        Self { passes: Vec::new() }
    }

    pub fn with_pass(mut self, pass: impl RewritePass + Send + Sync + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run every pass over `source`.
    ///
    /// Fails on the first pass whose input does not parse. A source that parses is never rejected by a later
    /// pass unless an earlier pass produced invalid output.
    #[tracing::instrument(skip_all, fields(source_len = source.len(), passes = self.passes.len()))]
    pub fn run(&self, source: &str) -> Result<String, Vec<SyntaxError>> {
        if self.passes.is_empty() {
            parser::parse_source(source)?;
            return Ok(source.to_string());
        }

        let mut current = source.to_string();
        for pass in &self.passes {
            let program = parser::parse_source(&current)?;
            let edits = pass.edits(&program, &current);
            tracing::debug!(pass = pass.name(), edits = edits.len(), "applying rewrite pass");
            current = apply_edits(&current, edits);
        }
        Ok(current)
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::empty()
            .with_pass(RenameIdentifier::new("window", "globalThis"))
            .with_pass(StripImports)
    }
}

/// Make a test source embeddable: rename `window` to `globalThis` and drop top-level imports.
pub fn preprocess(source: &str) -> Result<String, Vec<SyntaxError>> {
    Preprocessor::default().run(source)
}
