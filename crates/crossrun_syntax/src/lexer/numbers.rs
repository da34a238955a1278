//! Numeric literal scanning.
//!
//! Numbers only need to be split off correctly; their values are never used.

use super::{Lexer, TokenKind, is_ident_start};

fn is_digit_or_separator(c: char) -> bool {
    c.is_ascii_digit() || c == '_'
}

impl<'a> Lexer<'a> {
    /// Scan a numeric literal whose first character (`first`, a digit or `.`) is already consumed.
    pub(super) fn scan_number(&mut self, start: usize, first: char) {
        if first == '0' && matches!(self.peek(), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B')) {
            self.advance();
            self.consume_while(|c| c.is_ascii_hexdigit() || c == '_');
        } else {
            self.consume_while(is_digit_or_separator);
            if first != '.' && self.peek() == Some('.') {
                self.advance();
                self.consume_while(is_digit_or_separator);
            }
            if matches!(self.peek(), Some('e' | 'E'))
                && self
                    .peek_next()
                    .is_some_and(|c| c.is_ascii_digit() || c == '+' || c == '-')
            {
                self.advance();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.advance();
                }
                self.consume_while(is_digit_or_separator);
            }
        }

        // BigInt suffix
        self.match_char('n');

        if self.peek().is_some_and(is_ident_start) {
            self.consume_while(super::is_ident_continue);
            self.error("Identifier starts immediately after numeric literal", start);
            return;
        }

        self.add_token(TokenKind::Number, start);
    }
}
