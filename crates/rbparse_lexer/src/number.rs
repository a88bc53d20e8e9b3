//! Numeric literals.

use crate::lexer::{LexResult, Lexer};
use crate::state::LexState;
use crate::token::{Token, TokenValue};
use rbparse_ast::TokenKind;
use rbparse_diagnostics::messages;

impl<'s> Lexer<'s> {
    /// Lex a number starting at the read position. A leading `+` has
    /// already been consumed by the caller.
    pub(crate) fn number(&mut self) -> LexResult<Token> {
        self.state = LexState::End;
        let mut text = String::new();

        if self.peek() == Some(b'0') {
            self.pos += 1;
            match self.peek() {
                Some(b'x' | b'X') => {
                    self.pos += 1;
                    let digits = self.radix_digits(16, false)?;
                    return Ok(self.integer(digits, 16));
                }
                Some(b'b' | b'B') => {
                    self.pos += 1;
                    let digits = self.radix_digits(2, false)?;
                    return Ok(self.integer(digits, 2));
                }
                Some(b'd' | b'D') => {
                    self.pos += 1;
                    let digits = self.radix_digits(10, false)?;
                    return Ok(self.integer(digits, 10));
                }
                Some(b'o' | b'O') => {
                    self.pos += 1;
                    let digits = self.radix_digits(8, false)?;
                    return Ok(self.integer(digits, 8));
                }
                Some(b'_' | b'0'..=b'7') => {
                    let digits = self.radix_digits(8, true)?;
                    if self.peek().is_some_and(|d| d.is_ascii_digit()) {
                        return Err(self.error(&messages::ILLEGAL_OCTAL_DIGIT, &[]));
                    }
                    return Ok(self.integer(digits, 8));
                }
                Some(b'8' | b'9') => return Err(self.error(&messages::ILLEGAL_OCTAL_DIGIT, &[])),
                Some(b'.' | b'e' | b'E') => text.push('0'),
                _ => return Ok(self.token_with(TokenKind::Integer, TokenValue::Integer(0))),
            }
        }

        let mut is_float = false;
        let mut seen_point = false;
        let mut seen_e = false;
        let mut nondigit: Option<u8> = None;
        loop {
            match self.peek() {
                Some(c @ b'0'..=b'9') => {
                    nondigit = None;
                    text.push(c as char);
                    self.pos += 1;
                }
                Some(b'.') => {
                    if let Some(nd) = nondigit {
                        return Err(self.trailing(nd));
                    }
                    if seen_point || seen_e {
                        break;
                    }
                    match self.peek_at(1) {
                        Some(d) if d.is_ascii_digit() => {
                            text.push('.');
                            text.push(d as char);
                            self.pos += 2;
                            is_float = true;
                            seen_point = true;
                        }
                        _ => break,
                    }
                }
                Some(c @ (b'e' | b'E')) => {
                    if let Some(nd) = nondigit {
                        return Err(self.trailing(nd));
                    }
                    if seen_e {
                        break;
                    }
                    text.push('e');
                    self.pos += 1;
                    seen_e = true;
                    is_float = true;
                    nondigit = Some(c);
                    if let Some(sign @ (b'+' | b'-')) = self.peek() {
                        text.push(sign as char);
                        self.pos += 1;
                        nondigit = Some(sign);
                    }
                }
                Some(b'_') => {
                    if nondigit.is_some() {
                        break;
                    }
                    nondigit = Some(b'_');
                    self.pos += 1;
                }
                _ => break,
            }
        }
        if let Some(nd) = nondigit {
            return Err(self.trailing(nd));
        }

        if is_float {
            let value: f64 = text.parse().unwrap_or(f64::INFINITY);
            if value.is_infinite() {
                self.warn(&messages::FLOAT_OUT_OF_RANGE, &[&text], false);
            }
            return Ok(self.token_with(TokenKind::Float, TokenValue::Float(value)));
        }
        Ok(self.integer(text, 10))
    }

    fn trailing(&self, c: u8) -> crate::LexError {
        let c = (c as char).to_string();
        self.error(&messages::TRAILING_CHARACTER_IN_NUMBER, &[&c])
    }

    /// Digits of `radix` with single `_` separators.
    fn radix_digits(&mut self, radix: u32, leading_underscore: bool) -> LexResult<String> {
        let first_is_digit = self.peek().is_some_and(|c| (c as char).is_digit(radix));
        if !first_is_digit && !(leading_underscore && self.peek() == Some(b'_')) {
            return Err(self.error(&messages::NUMERIC_LITERAL_WITHOUT_DIGITS, &[]));
        }
        let mut digits = String::new();
        let mut nondigit = false;
        loop {
            match self.peek() {
                Some(b'_') => {
                    if nondigit {
                        break;
                    }
                    nondigit = true;
                    self.pos += 1;
                }
                Some(c) if (c as char).is_digit(radix) => {
                    nondigit = false;
                    digits.push(c as char);
                    self.pos += 1;
                }
                _ => break,
            }
        }
        if nondigit {
            return Err(self.trailing(b'_'));
        }
        if digits.is_empty() {
            return Err(self.error(&messages::NUMERIC_LITERAL_WITHOUT_DIGITS, &[]));
        }
        Ok(digits)
    }

    fn integer(&self, digits: String, radix: u32) -> Token {
        let value = match i64::from_str_radix(&digits, radix) {
            Ok(value) => TokenValue::Integer(value),
            Err(_) => TokenValue::BigInteger { digits, radix },
        };
        self.token_with(TokenKind::Integer, value)
    }
}
