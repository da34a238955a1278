//! Top-level import removal.

use super::{Edit, RewritePass};
use crate::ast::{Program, Span};

/// Remove every top-level import declaration together with the whitespace that follows it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StripImports;

impl RewritePass for StripImports {
    fn name(&self) -> &'static str {
        "strip-imports"
    }

    fn edits(&self, program: &Program, source: &str) -> Vec<Edit> {
        program
            .imports()
            .map(|(_, span)| {
                let trailing = source[span.end..].len() - source[span.end..].trim_start().len();
                Edit::delete(Span::new(span.start, span.end + trailing))
            })
            .collect()
    }
}
