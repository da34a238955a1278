//! Syntax diagnostics with source context.

use thiserror::Error;

use crate::ast::Span;

/// A syntax error with location information
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// Format an error with its source line and a caret underline.
///
/// ```text
/// syntax error: Unterminated string literal
///   --> spec.js:3:9
///    |
///  3 | const a = 'oops
///    |           ^^^^^
/// ```
pub fn format_error(file_name: &str, source: &str, error: &SyntaxError) -> String {
    let (line_num, col_num, line_text) = line_info(source, error.span.start);
    let width = line_num.to_string().len();

    let remaining = line_text.len().saturating_sub(col_num - 1);
    let underline_len = error.span.len().min(remaining).max(1);

    let mut out = String::new();
    out.push_str(&format!("syntax error: {}\n", error.message));
    out.push_str(&format!("{:>width$}--> {}:{}:{}\n", "", file_name, line_num, col_num, width = width + 1));
    out.push_str(&format!("{:>width$} |\n", "", width = width + 1));
    out.push_str(&format!(" {:>width$} | {}\n", line_num, line_text, width = width));
    out.push_str(&format!(
        "{:>width$} | {}{}\n",
        "",
        " ".repeat(col_num - 1),
        "^".repeat(underline_len),
        width = width + 1
    ));
    for note in &error.notes {
        out.push_str(&format!("{:>width$} = note: {}\n", "", note, width = width + 1));
    }
    out
}

/// Return (1-based line, 1-based byte column, line text) for an offset.
pub fn line_info(source: &str, offset: usize) -> (usize, usize, &str) {
    let offset = offset.min(source.len());
    let mut line_num = 1;
    let mut line_start = 0;

    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line_num += 1;
            line_start = i + 1;
        }
    }

    let line_end = source[line_start..]
        .find('\n')
        .map(|i| line_start + i)
        .unwrap_or(source.len());

    (line_num, offset - line_start + 1, source[line_start..line_end].trim_end_matches('\r'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_info() {
        let source = "a\nbc\nd";
        assert_eq!(line_info(source, 0), (1, 1, "a"));
        assert_eq!(line_info(source, 3), (2, 2, "bc"));
        assert_eq!(line_info(source, 5), (3, 1, "d"));
    }

    #[test]
    fn test_format_error_points_at_span() {
        let source = "let x = 1;\nlet y = 'oops\n";
        let err = SyntaxError::new("Unterminated string literal", Span::new(19, 24)).with_note("strings end at a newline");
        let rendered = format_error("spec.js", source, &err);
        assert!(rendered.contains("syntax error: Unterminated string literal"));
        assert!(rendered.contains("--> spec.js:2:9"));
        assert!(rendered.contains("2 | let y = 'oops"));
        assert!(rendered.contains("        ^^^^^"));
        assert!(rendered.contains("= note: strings end at a newline"));
    }
}
