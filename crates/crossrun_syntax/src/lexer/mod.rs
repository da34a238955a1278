//! Lexer for script sources
//!
//! Handles tokenization including:
//! - Line, block and hashbang comments (skipped, but line breaks are recorded on the next token)
//! - Identifiers, private names and reserved words
//! - String, numeric, template and regular expression literals
//! - Operators (maximal munch) and structural punctuation
//! - Delimiter matching across `()`, `[]`, `{}` and template substitutions `${ }`
//!
//! ## Module Structure
//!
//! - `tokens` - Token types (TokenKind, Token)
//! - `strings` - String and template literal scanning
//! - `numbers` - Numeric literal scanning

mod numbers;
mod strings;
pub mod tokens;

pub use tokens::{Token, TokenKind, keyword_id};

use crate::ast::Span;
use crate::diagnostics::SyntaxError;
use crossrun_core::lang::keywords::KeywordId;
use crossrun_core::lang::operators;
use crossrun_core::lang::punctuation::PunctuationId;

// ============================================================================
// LEXER STATE
// ----------------------------------------------------------------------------
// Open delimiters live on one stack. A `}` pops it: a `Brace` entry produces an
// RBrace token, a `Substitution` entry resumes the enclosing template literal.
//
//   `a ${ {b: 1} } c`
//        ^ push Substitution
//          ^ push Brace
//               ^ pop Brace → RBrace
//                 ^ pop Substitution → TemplateTail
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Paren,
    /// Parenthesised head of `if`, `while`, `for` or `with`.
    Condition,
    Bracket,
    Brace,
    Substitution,
}

impl Delimiter {
    fn describe(self) -> &'static str {
        match self {
            Delimiter::Paren | Delimiter::Condition => "'('",
            Delimiter::Bracket => "'['",
            Delimiter::Brace => "'{'",
            Delimiter::Substitution => "template substitution '${'",
        }
    }

    /// The delimiter a closing token has to match.
    fn closer(self) -> Delimiter {
        match self {
            Delimiter::Condition => Delimiter::Paren,
            other => other,
        }
    }
}

/// Lexer for script source code.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    delimiters: Vec<(Delimiter, Span)>,
    /// The most recent `)` closed a statement condition, so a `/` after it starts a regex.
    condition_closed: bool,
    /// A line terminator was seen since the last token.
    newline_before: bool,
    tokens: Vec<Token>,
    errors: Vec<SyntaxError>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            delimiters: Vec::new(),
            condition_closed: false,
            newline_before: false,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Tokenize the entire source code.
    ///
    /// The token stream always ends with an `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<SyntaxError>> {
        if self.source.starts_with("#!") {
            self.skip_line_comment();
        }

        while !self.is_at_end() {
            self.scan_token();
        }

        for (delimiter, span) in std::mem::take(&mut self.delimiters) {
            self.errors
                .push(SyntaxError::new(format!("Unclosed {}", delimiter.describe()), span));
        }

        let end = self.current_pos;
        self.add_token(TokenKind::Eof, end);

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }

    // ========================================================================
    // Core character handling
    // ========================================================================

    fn is_at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.source[self.current_pos..].chars();
        iter.next();
        iter.next()
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((pos, c)) = self.chars.next() {
            self.current_pos = pos + c.len_utf8();
            Some(c)
        } else {
            None
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if pred(c) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn error(&mut self, message: impl Into<String>, start: usize) {
        self.errors
            .push(SyntaxError::new(message, Span::new(start, self.current_pos)));
    }

    // ========================================================================
    // Main scanning dispatch
    // ========================================================================

    fn scan_token(&mut self) {
        let start = self.current_pos;

        let Some(c) = self.advance() else {
            return;
        };

        match c {
            '\n' | '\r' | '\u{2028}' | '\u{2029}' => self.newline_before = true,
            c if c.is_whitespace() || c == '\u{feff}' => {}

            '/' => {
                if self.match_char('/') {
                    self.skip_line_comment();
                } else if self.match_char('*') {
                    self.skip_block_comment(start);
                } else if self.regex_allowed() {
                    self.scan_regex(start);
                } else if self.match_char('=') {
                    self.add_op("/=", start);
                } else {
                    self.add_op("/", start);
                }
            }

            '(' => {
                let delimiter = if self.opens_condition() {
                    Delimiter::Condition
                } else {
                    Delimiter::Paren
                };
                self.open(delimiter, PunctuationId::LParen, start)
            }
            ')' => self.close(Delimiter::Paren, PunctuationId::RParen, start),
            '[' => self.open(Delimiter::Bracket, PunctuationId::LBracket, start),
            ']' => self.close(Delimiter::Bracket, PunctuationId::RBracket, start),
            '{' => self.open(Delimiter::Brace, PunctuationId::LBrace, start),
            '}' => self.close_brace(start),

            ';' => self.add_punct(PunctuationId::Semicolon, start),
            ',' => self.add_punct(PunctuationId::Comma, start),
            ':' => self.add_punct(PunctuationId::Colon, start),

            '.' => {
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.scan_number(start, '.');
                } else if self.peek() == Some('.') && self.peek_next() == Some('.') {
                    self.advance();
                    self.advance();
                    self.add_punct(PunctuationId::Ellipsis, start);
                } else {
                    self.add_punct(PunctuationId::Dot, start);
                }
            }

            // `a?.b` but not `a?.5:1`
            '?' if self.peek() == Some('.') && !self.peek_next().is_some_and(|c| c.is_ascii_digit()) => {
                self.advance();
                self.add_punct(PunctuationId::OptionalChain, start);
            }

            '=' if self.peek() == Some('>') => {
                self.advance();
                self.add_punct(PunctuationId::Arrow, start);
            }

            '\'' | '"' => self.scan_string(start, c),
            '`' => self.scan_template(start, false),

            '#' => {
                if self.peek().is_some_and(is_ident_start) {
                    let name_start = self.current_pos;
                    self.consume_while(is_ident_continue);
                    let name = self.source[name_start..self.current_pos].to_string();
                    self.add_token(TokenKind::PrivateName(name), start);
                } else {
                    self.error("Unexpected character '#'", start);
                }
            }

            '0'..='9' => self.scan_number(start, c),

            '\\' => self.scan_identifier(start, true),
            _ if is_ident_start(c) => self.scan_identifier(start, false),

            _ => match operators::longest_prefix(&self.source[start..]) {
                Some(op) => {
                    // Operators are ASCII, so one char per byte.
                    for _ in 1..op.len() {
                        self.advance();
                    }
                    self.add_op(op, start);
                }
                None => self.error(format!("Unexpected character '{}'", c), start),
            },
        }
    }

    // ========================================================================
    // Token helpers
    // ========================================================================

    fn add_token(&mut self, kind: TokenKind, start: usize) {
        let newline_before = std::mem::take(&mut self.newline_before);
        self.tokens
            .push(Token::new(kind, Span::new(start, self.current_pos), newline_before));
    }

    fn add_op(&mut self, op: &'static str, start: usize) {
        self.add_token(TokenKind::Operator(op), start);
    }

    fn add_punct(&mut self, id: PunctuationId, start: usize) {
        self.add_token(TokenKind::Punctuation(id), start);
    }

    fn regex_allowed(&self) -> bool {
        let Some(last) = self.tokens.last() else {
            return true;
        };
        match &last.kind {
            TokenKind::Punctuation(PunctuationId::RParen) => self.condition_closed,
            // `a.default / 2`
            TokenKind::Keyword(_) if self.is_member_name(self.tokens.len() - 1) => false,
            kind => kind.regex_may_follow(),
        }
    }

    /// The token at `index` directly follows `.` or `?.`.
    fn is_member_name(&self, index: usize) -> bool {
        index
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .and_then(Token::punctuation_id)
            .is_some_and(|p| matches!(p, PunctuationId::Dot | PunctuationId::OptionalChain))
    }

    /// A `(` here opens the head of `if`, `while`, `for`, `for await` or `with`.
    fn opens_condition(&self) -> bool {
        let Some(last) = self.tokens.len().checked_sub(1) else {
            return false;
        };
        let keyword = match self.tokens[last].keyword_id() {
            Some(KeywordId::Await) if last > 0 && self.tokens[last - 1].kind.is_keyword(KeywordId::For) => {
                return !self.is_member_name(last - 1);
            }
            Some(id) => id,
            None => return false,
        };
        matches!(keyword, KeywordId::If | KeywordId::While | KeywordId::For | KeywordId::With)
            && !self.is_member_name(last)
    }

    // ========================================================================
    // Delimiters
    // ========================================================================

    fn open(&mut self, delimiter: Delimiter, punct: PunctuationId, start: usize) {
        self.delimiters
            .push((delimiter, Span::new(start, self.current_pos)));
        self.add_punct(punct, start);
    }

    fn close(&mut self, delimiter: Delimiter, punct: PunctuationId, start: usize) {
        self.condition_closed = false;
        match self.delimiters.pop() {
            Some((open, _)) if open.closer() == delimiter => {
                self.condition_closed = open == Delimiter::Condition;
            }
            Some((open, open_span)) => {
                let (line, col, _) = crate::diagnostics::line_info(self.source, open_span.start);
                self.errors.push(
                    SyntaxError::new(
                        format!("Mismatched closing delimiter '{}'", punct_char(punct)),
                        Span::new(start, self.current_pos),
                    )
                    .with_note(format!("{} opened at {}:{}", open.describe(), line, col)),
                );
            }
            None => self.error("Unmatched closing bracket", start),
        }
        self.add_punct(punct, start);
    }

    fn close_brace(&mut self, start: usize) {
        if let Some((Delimiter::Substitution, _)) = self.delimiters.last() {
            self.delimiters.pop();
            self.scan_template(start, true);
        } else {
            self.close(Delimiter::Brace, PunctuationId::RBrace, start);
        }
    }

    // ========================================================================
    // Comments
    // ========================================================================

    fn skip_line_comment(&mut self) {
        self.consume_while(|c| !matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}'));
    }

    fn skip_block_comment(&mut self, start: usize) {
        loop {
            match self.advance() {
                None => {
                    self.error("Unterminated block comment", start);
                    return;
                }
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    return;
                }
                Some('\n' | '\r' | '\u{2028}' | '\u{2029}') => self.newline_before = true,
                Some(_) => {}
            }
        }
    }

    // ========================================================================
    // Regular expressions
    // ========================================================================

    fn scan_regex(&mut self, start: usize) {
        let mut in_class = false;
        loop {
            match self.peek() {
                None | Some('\n' | '\r' | '\u{2028}' | '\u{2029}') => {
                    self.error("Unterminated regular expression literal", start);
                    return;
                }
                Some('\\') => {
                    self.advance();
                    if self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                Some('[') => {
                    self.advance();
                    in_class = true;
                }
                Some(']') => {
                    self.advance();
                    in_class = false;
                }
                Some('/') if !in_class => {
                    self.advance();
                    break;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
        // flags
        self.consume_while(is_ident_continue);
        self.add_token(TokenKind::Regex, start);
    }

    // ========================================================================
    // Identifier scanning
    // ========================================================================

    fn scan_identifier(&mut self, start: usize, escaped_start: bool) {
        if escaped_start {
            self.scan_identifier_escape(start);
        }
        loop {
            match self.peek() {
                Some(c) if is_ident_continue(c) => {
                    self.advance();
                }
                Some('\\') => {
                    self.advance();
                    self.scan_identifier_escape(start);
                }
                _ => break,
            }
        }

        let spelling = &self.source[start..self.current_pos];

        if let Some(id) = keyword_id(spelling) {
            self.add_token(TokenKind::Keyword(id), start);
        } else if spelling.contains('\\') {
            let name = decode_identifier(spelling);
            self.add_token(TokenKind::Ident(name), start);
        } else {
            self.add_token(TokenKind::Ident(spelling.to_string()), start);
        }
    }

    /// Consume the `uXXXX` / `u{X}` part of an identifier escape (after the backslash).
    fn scan_identifier_escape(&mut self, start: usize) {
        if !self.match_char('u') {
            self.error("Invalid escape in identifier", start);
            return;
        }
        if self.match_char('{') {
            self.consume_while(|c| c.is_ascii_hexdigit());
            if !self.match_char('}') {
                self.error("Invalid Unicode escape in identifier", start);
            }
        } else {
            for _ in 0..4 {
                if !self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                    self.error("Invalid Unicode escape in identifier", start);
                    return;
                }
                self.advance();
            }
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

fn punct_char(id: PunctuationId) -> &'static str {
    crossrun_core::lang::punctuation::as_str(id)
}

/// Decode `\uXXXX` and `\u{X}` escapes in an already validated identifier spelling.
fn decode_identifier(spelling: &str) -> String {
    let mut name = String::with_capacity(spelling.len());
    let mut rest = spelling;
    while let Some(idx) = rest.find("\\u") {
        name.push_str(&rest[..idx]);
        rest = &rest[idx + 2..];
        let (digits, consumed) = match rest.strip_prefix('{') {
            Some(braced) => {
                let close = braced.find('}').unwrap_or(braced.len());
                (&braced[..close], close + 2)
            }
            None => {
                let len = rest.chars().take(4).take_while(|c| c.is_ascii_hexdigit()).count();
                (&rest[..len], len)
            }
        };
        if let Some(ch) = u32::from_str_radix(digits, 16).ok().and_then(char::from_u32) {
            name.push(ch);
        }
        rest = &rest[consumed.min(rest.len())..];
    }
    name.push_str(rest);
    name
}

/// Check if a character can start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

/// Check if a character can continue an identifier.
fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '\u{200c}' || c == '\u{200d}'
}

/// Convenience function to lex a source string.
///
/// This is a shorthand for `Lexer::new(source).tokenize()`.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn lex(source: &str) -> Result<Vec<Token>, Vec<SyntaxError>> {
    Lexer::new(source).tokenize()
}
