//! String and template literal scanning.

use super::{Delimiter, Lexer, TokenKind};
use crate::ast::Span;

impl<'a> Lexer<'a> {
    /// Scan a quoted string literal. The opening quote is already consumed.
    pub(super) fn scan_string(&mut self, start: usize, quote: char) {
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n' | '\r') => {
                    self.error("Unterminated string literal", start);
                    return;
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    self.scan_escape(start, &mut value);
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }
        self.add_token(TokenKind::String(value), start);
    }

    /// Decode one escape sequence (the backslash is already consumed).
    fn scan_escape(&mut self, start: usize, value: &mut String) {
        let Some(c) = self.advance() else {
            return;
        };
        match c {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{c}'),
            'v' => value.push('\u{b}'),
            '0' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => value.push('\0'),
            // Line continuations contribute nothing.
            '\r' => {
                self.match_char('\n');
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            'x' => match self.read_hex(2) {
                Some(ch) => value.push(ch),
                None => self.error("Invalid hexadecimal escape sequence", start),
            },
            'u' => {
                let decoded = if self.match_char('{') {
                    let digits_start = self.current_pos;
                    self.consume_while(|c| c.is_ascii_hexdigit());
                    let digits = &self.source[digits_start..self.current_pos];
                    let ch = u32::from_str_radix(digits, 16).ok().and_then(char::from_u32);
                    if self.match_char('}') { ch } else { None }
                } else {
                    self.read_hex(4)
                };
                match decoded {
                    Some(ch) => value.push(ch),
                    None => self.error("Invalid Unicode escape sequence", start),
                }
            }
            other => value.push(other),
        }
    }

    fn read_hex(&mut self, count: usize) -> Option<char> {
        let digits_start = self.current_pos;
        for _ in 0..count {
            if !self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                return None;
            }
            self.advance();
        }
        u32::from_str_radix(&self.source[digits_start..self.current_pos], 16)
            .ok()
            .and_then(char::from_u32)
    }

    /// Scan template text after a backtick (`continuation == false`) or after the `}` closing a substitution.
    ///
    /// Stops at the closing backtick or at the next `${`, which pushes a substitution delimiter.
    pub(super) fn scan_template(&mut self, start: usize, continuation: bool) {
        loop {
            match self.advance() {
                None => {
                    self.error("Unterminated template literal", start);
                    return;
                }
                Some('\\') => {
                    self.advance();
                }
                Some('`') => {
                    let kind = if continuation {
                        TokenKind::TemplateTail
                    } else {
                        TokenKind::Template
                    };
                    self.add_token(kind, start);
                    return;
                }
                Some('$') if self.peek() == Some('{') => {
                    self.advance();
                    self.delimiters
                        .push((Delimiter::Substitution, Span::new(self.current_pos - 2, self.current_pos)));
                    let kind = if continuation {
                        TokenKind::TemplateMiddle
                    } else {
                        TokenKind::TemplateHead
                    };
                    self.add_token(kind, start);
                    return;
                }
                Some(_) => {}
            }
        }
    }
}
