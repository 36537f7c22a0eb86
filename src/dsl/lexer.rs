//! Lexer (tokenizer) for the operating point description language.

use crate::error::{ConvlossError, Result};

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The token's text
    pub text: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

/// Token types in the DSL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// An identifier (model name, keyword, parameter name)
    Identifier,
    /// A number (integer or floating point, possibly with SI suffix)
    Number,
    /// A directive (starts with '.')
    Directive,
    /// Open parenthesis '('
    OpenParen,
    /// Close parenthesis ')'
    CloseParen,
    /// Equals sign '='
    Equals,
    /// Newline
    Newline,
    /// End of file
    Eof,
}

/// SI suffixes accepted after a number, as powers of ten.
const SUFFIXES: [(char, i32); 9] = [
    ('p', -12),
    ('n', -9),
    ('u', -6),
    ('µ', -6),
    ('m', -3),
    ('k', 3),
    ('K', 3),
    ('M', 6),
    ('G', 9),
];

fn suffix_exponent(ch: char) -> Option<i32> {
    SUFFIXES.iter().find(|(s, _)| *s == ch).map(|(_, e)| *e)
}

/// Lexer for tokenizing description input.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given input.
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_blanks_and_comments();

        let line = self.line;
        let column = self.column;
        let token = |kind, text: String| Token {
            kind,
            text,
            line,
            column,
        };

        let Some(ch) = self.peek() else {
            return Ok(token(TokenKind::Eof, String::new()));
        };

        match ch {
            '\n' => {
                self.advance();
                Ok(token(TokenKind::Newline, "\n".to_string()))
            }
            '(' | ')' | '=' => {
                self.advance();
                let kind = match ch {
                    '(' => TokenKind::OpenParen,
                    ')' => TokenKind::CloseParen,
                    _ => TokenKind::Equals,
                };
                Ok(token(kind, ch.to_string()))
            }
            '.' if self.peek_at(1).is_some_and(|c| c.is_alphabetic()) => {
                self.advance();
                let name = self.read_word();
                Ok(token(TokenKind::Directive, format!(".{}", name)))
            }
            '-' | '+' | '.' | '0'..='9' => {
                let text = self.read_number();
                if parse_value(&text).is_none() {
                    return Err(ConvlossError::lexer(
                        line,
                        column,
                        format!("malformed number '{}'", text),
                    ));
                }
                Ok(token(TokenKind::Number, text))
            }
            _ if ch.is_alphabetic() || ch == '_' => {
                let text = self.read_word();
                Ok(token(TokenKind::Identifier, text))
            }
            _ => Err(ConvlossError::lexer(
                line,
                column,
                format!("unexpected character '{}'", ch),
            )),
        }
    }

    fn skip_blanks_and_comments(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                '#' | ';' => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_word(&mut self) -> String {
        let mut text = String::new();
        while let Some(ch) = self.peek().filter(|c| c.is_alphanumeric() || *c == '_') {
            text.push(ch);
            self.advance();
        }
        text
    }

    fn read_digits(&mut self, text: &mut String) {
        while let Some(ch) = self.peek().filter(|c| c.is_ascii_digit()) {
            text.push(ch);
            self.advance();
        }
    }

    fn read_number(&mut self) -> String {
        let mut text = String::new();

        if let Some(sign) = self.peek().filter(|c| *c == '-' || *c == '+') {
            text.push(sign);
            self.advance();
        }

        self.read_digits(&mut text);
        if self.peek() == Some('.') {
            text.push('.');
            self.advance();
            self.read_digits(&mut text);
        }

        // Exponent only when digits follow, so "5e" stays malformed
        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_at(1), Some('-' | '+'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    if let Some(c) = self.advance() {
                        text.push(c);
                    }
                }
                self.read_digits(&mut text);
            }
        }

        if let Some(suffix) = self.peek().filter(|c| suffix_exponent(*c).is_some()) {
            text.push(suffix);
            self.advance();
        }

        // Trailing letters make the token malformed rather than silently split
        while let Some(ch) = self.peek().filter(|c| c.is_alphanumeric() || *c == '_') {
            text.push(ch);
            self.advance();
        }

        text
    }
}

/// Parse a number string with optional SI suffix.
pub fn parse_value(text: &str) -> Option<f64> {
    let text = text.trim();
    let last = text.chars().last()?;

    let value = match suffix_exponent(last) {
        Some(exp) => {
            let digits = &text[..text.len() - last.len_utf8()];
            let (mantissa, given) = match digits.find(|c: char| c == 'e' || c == 'E') {
                Some(at) => (&digits[..at], digits[at + 1..].parse::<i32>().ok()?),
                None => (digits, 0),
            };
            // Folded into the exponent so "100n" reads as exactly 100e-9
            format!("{}e{}", mantissa, given + exp).parse::<f64>().ok()?
        }
        None => text.parse::<f64>().ok()?,
    };

    Some(value).filter(|v| v.is_finite())
}
