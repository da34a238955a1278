//! Identifier renaming.

use super::{Edit, RewritePass};
use crate::ast::Program;

/// Rename every reference to `from` as `to`.
///
/// Renaming is lexical and scope-unaware: a local binding that shadows `from` is renamed together with its uses.
/// Property names after `.` and `?.` are never touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameIdentifier {
    from: String,
    to: String,
}

impl RenameIdentifier {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl RewritePass for RenameIdentifier {
    fn name(&self) -> &'static str {
        "rename-identifier"
    }

    fn edits(&self, program: &Program, _source: &str) -> Vec<Edit> {
        program
            .references()
            .filter(|id| id.node.name == self.from)
            .map(|id| Edit::replace(id.span, self.to.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use crate::rewrite::apply_edits;

    fn rename(source: &str, from: &str, to: &str) -> String {
        let program = parse_source(source).unwrap();
        let edits = RenameIdentifier::new(from, to).edits(&program, source);
        apply_edits(source, edits)
    }

    #[test]
    fn test_shadowed_binding_is_renamed() {
        assert_eq!(
            rename("function f(window) { return window; }", "window", "globalThis"),
            "function f(globalThis) { return globalThis; }"
        );
    }

    #[test]
    fn test_object_shorthand_and_keys() {
        assert_eq!(rename("({ window, window: 1 })", "window", "w"), "({ w, w: 1 })");
    }

    #[test]
    fn test_property_names_kept() {
        assert_eq!(rename("a.b; b.a; a?.b", "b", "c"), "a.c; b.a; a?.c");
    }

    #[test]
    fn test_escaped_identifier() {
        assert_eq!(rename("w\\u0069ndow.x", "window", "globalThis"), "globalThis.x");
    }
}
