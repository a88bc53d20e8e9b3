//! String-like literals: quoted strings, `%` literals, regexps, symbols,
//! word lists and here-documents.

use crate::lexer::{is_space, HeredocSkip, LexResult, Lexer};
use crate::state::{StrFunc, StrTerm};
use crate::token::{Token, TokenValue};
use memchr::memchr;
use rbparse_ast::{RegexpOptions, TokenKind};
use rbparse_diagnostics::messages;

/// How scanning a string body stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    /// At the terminator, an interpolation or a word separator.
    Delimiter,
    EndOfInput,
}

impl<'s> Lexer<'s> {
    fn content_token(&self, buf: Vec<u8>) -> Token {
        let text = match String::from_utf8(buf) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        };
        self.token_with(TokenKind::StringContent, TokenValue::Str(text))
    }

    fn unterminated(&self, func: StrFunc) -> crate::LexError {
        if func.contains(StrFunc::REGEXP) {
            self.error(&messages::UNTERMINATED_REGEXP, &[])
        } else {
            self.error(&messages::UNTERMINATED_STRING, &[])
        }
    }

    /// `#{` or `#$`/`#@` at the read position, consuming it.
    fn interpolation_start(&mut self) -> Option<Token> {
        match self.peek_at(1) {
            Some(b'$' | b'@') => {
                self.bump();
                Some(self.token(TokenKind::StringDVar))
            }
            Some(b'{') => {
                self.bump();
                self.bump();
                Some(self.token(TokenKind::StringDBeg))
            }
            _ => None,
        }
    }

    /// Next token inside a delimited literal.
    pub(crate) fn parse_string(
        &mut self,
        func: StrFunc,
        term: u8,
        paren: u8,
        nest: &mut u32,
        finished: &mut bool,
    ) -> LexResult<Token> {
        if *finished {
            return Ok(self.token(TokenKind::StringEnd));
        }
        let mut space = false;
        if func.contains(StrFunc::QWORDS) && self.peek_is_space() {
            while self.peek_is_space() {
                self.bump();
            }
            space = true;
        }
        match self.peek() {
            None => return Err(self.unterminated(func)),
            Some(c) if c == term && *nest == 0 => {
                self.bump();
                if func.contains(StrFunc::QWORDS) {
                    *finished = true;
                    return Ok(self.token(TokenKind::Space));
                }
                if !func.contains(StrFunc::REGEXP) {
                    return Ok(self.token(TokenKind::StringEnd));
                }
                let options = self.regexp_options()?;
                return Ok(self.token_with(TokenKind::RegexpEnd, TokenValue::RegexpOptions(options)));
            }
            _ => {}
        }
        if space {
            return Ok(self.token(TokenKind::Space));
        }

        self.token_start = self.pos;
        self.token_line = self.line;
        let mut buf = Vec::new();
        if func.contains(StrFunc::EXPAND) && self.peek() == Some(b'#') {
            if let Some(token) = self.interpolation_start() {
                return Ok(token);
            }
            self.bump();
            buf.push(b'#');
        }
        if self.tokadd_string(func, term, paren, Some(nest), &mut buf)? == Stop::EndOfInput {
            return Err(self.unterminated(func));
        }
        Ok(self.content_token(buf))
    }

    /// Append literal body bytes to `buf` until a delimiter.
    fn tokadd_string(
        &mut self,
        func: StrFunc,
        term: u8,
        paren: u8,
        mut nest: Option<&mut u32>,
        buf: &mut Vec<u8>,
    ) -> LexResult<Stop> {
        loop {
            let Some(c) = self.peek() else {
                return Ok(Stop::EndOfInput);
            };
            if paren != 0 && c == paren {
                if let Some(n) = nest.as_deref_mut() {
                    *n += 1;
                }
            } else if c == term {
                match nest.as_deref_mut() {
                    Some(n) if *n > 0 => *n -= 1,
                    _ => return Ok(Stop::Delimiter),
                }
            } else if func.contains(StrFunc::EXPAND)
                && c == b'#'
                && matches!(self.peek_at(1), Some(b'$' | b'@' | b'{'))
            {
                return Ok(Stop::Delimiter);
            } else if c == b'\\' {
                self.bump();
                let Some(c) = self.peek() else {
                    return Ok(Stop::EndOfInput);
                };
                match c {
                    b'\n' => {
                        self.bump();
                        if func.contains(StrFunc::QWORDS) {
                            buf.push(b'\n');
                        } else if !func.contains(StrFunc::EXPAND) {
                            buf.extend_from_slice(b"\\\n");
                        }
                    }
                    b'\\' => {
                        self.bump();
                        if func.contains(StrFunc::ESCAPE) {
                            buf.push(b'\\');
                        }
                        buf.push(b'\\');
                    }
                    _ if func.contains(StrFunc::REGEXP) => {
                        self.bump();
                        buf.push(b'\\');
                        buf.push(c);
                    }
                    _ if func.contains(StrFunc::EXPAND) => {
                        if func.contains(StrFunc::ESCAPE) {
                            buf.push(b'\\');
                        }
                        let value = self.read_escape()?;
                        buf.push(value);
                    }
                    _ if func.contains(StrFunc::QWORDS) && is_space(c) => {
                        self.bump();
                        buf.push(c);
                    }
                    _ => {
                        self.bump();
                        if c != term && !(paren != 0 && c == paren) {
                            buf.push(b'\\');
                        }
                        buf.push(c);
                    }
                }
                continue;
            } else if func.contains(StrFunc::QWORDS) && is_space(c) {
                return Ok(Stop::Delimiter);
            }
            self.bump();
            buf.push(c);
        }
    }

    /// Decode one escape; the read position is just past the backslash.
    pub(crate) fn read_escape(&mut self) -> LexResult<u8> {
        let Some(c) = self.bump() else {
            return Err(self.error(&messages::INVALID_ESCAPE, &[]));
        };
        Ok(match c {
            b'n' => b'\n',
            b't' => b'\t',
            b'r' => b'\r',
            b'f' => 0x0c,
            b'v' => 0x0b,
            b'a' => 0x07,
            b'e' => 0x1b,
            b'b' => 0x08,
            b's' => b' ',
            b'0'..=b'7' => {
                let mut value = u32::from(c - b'0');
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'7') => {
                            self.bump();
                            value = value * 8 + u32::from(d - b'0');
                        }
                        _ => break,
                    }
                }
                (value & 0xff) as u8
            }
            b'x' => {
                let mut value = 0u32;
                let mut digits = 0;
                while digits < 2 {
                    match self.peek().and_then(|d| (d as char).to_digit(16)) {
                        Some(d) => {
                            self.bump();
                            value = value * 16 + d;
                            digits += 1;
                        }
                        None => break,
                    }
                }
                if digits == 0 {
                    return Err(self.error(&messages::INVALID_ESCAPE, &[]));
                }
                value as u8
            }
            b'M' => {
                if !self.eat(b'-') {
                    return Err(self.error(&messages::INVALID_ESCAPE, &[]));
                }
                match self.bump() {
                    Some(b'\\') => self.read_escape()? | 0x80,
                    Some(c) => c | 0x80,
                    None => return Err(self.error(&messages::INVALID_ESCAPE, &[])),
                }
            }
            b'C' => {
                if !self.eat(b'-') {
                    return Err(self.error(&messages::INVALID_ESCAPE, &[]));
                }
                self.read_control()?
            }
            b'c' => self.read_control()?,
            other => other,
        })
    }

    fn read_control(&mut self) -> LexResult<u8> {
        match self.bump() {
            Some(b'\\') => Ok(self.read_escape()? & 0x9f),
            Some(b'?') => Ok(0x7f),
            Some(c) => Ok(c & 0x9f),
            None => Err(self.error(&messages::INVALID_ESCAPE, &[])),
        }
    }

    fn regexp_options(&mut self) -> LexResult<RegexpOptions> {
        let mut options = RegexpOptions::empty();
        let mut unknown = String::new();
        while let Some(c) = self.peek().filter(u8::is_ascii_alphabetic) {
            self.bump();
            match RegexpOptions::from_letter(c) {
                Some(letter) => options = options.with_letter(letter),
                None => unknown.push(c as char),
            }
        }
        if !unknown.is_empty() {
            return Err(self.error(&messages::UNKNOWN_REGEXP_OPTIONS, &[&unknown]));
        }
        Ok(options)
    }

    /// `%` literals; the read position is just past the `%`.
    pub(crate) fn percent_literal(&mut self) -> LexResult<Token> {
        use TokenKind as T;
        let Some(c) = self.peek() else {
            return Err(self.error(&messages::UNTERMINATED_QUOTED_STRING, &[]));
        };
        let (kind, open) = if c.is_ascii_alphanumeric() {
            self.bump();
            match self.peek() {
                None => return Err(self.error(&messages::UNTERMINATED_QUOTED_STRING, &[])),
                Some(t) if t.is_ascii_alphanumeric() || t >= 0x80 => {
                    return Err(self.error(&messages::UNKNOWN_PERCENT_STRING, &[]));
                }
                Some(t) => (c, t),
            }
        } else {
            (b'Q', c)
        };
        self.bump();
        let (term, paren) = match open {
            b'(' => (b')', b'('),
            b'[' => (b']', b'['),
            b'{' => (b'}', b'{'),
            b'<' => (b'>', b'<'),
            other => (other, 0),
        };
        let (func, token) = match kind {
            b'Q' => (StrFunc::DQUOTE, T::StringBeg),
            b'q' => (StrFunc::SQUOTE, T::StringBeg),
            b'W' => (StrFunc::DWORD, T::WordsBeg),
            b'w' => (StrFunc::SWORD, T::QWordsBeg),
            b'x' => (StrFunc::XQUOTE, T::XStringBeg),
            b'r' => (StrFunc::REGEXP_LITERAL, T::RegexpBeg),
            b's' => {
                self.state = crate::LexState::Fname;
                (StrFunc::SSYM, T::SymBeg)
            }
            _ => return Err(self.error(&messages::UNKNOWN_PERCENT_STRING, &[])),
        };
        let tok = self.token(token);
        if func.contains(StrFunc::QWORDS) {
            while self.peek_is_space() {
                self.bump();
            }
        }
        self.str_term = Some(StrTerm::literal(func, term, paren));
        Ok(tok)
    }

    // ------------------------------------------------------------------
    // Here-documents
    // ------------------------------------------------------------------

    /// Read a here-document opener after `<<`. Returns `None`, leaving the
    /// read position alone, when no identifier follows.
    pub(crate) fn heredoc_identifier(&mut self) -> LexResult<Option<Token>> {
        let mut func = StrFunc::empty();
        let mut p = self.pos;
        if self.src.get(p) == Some(&b'-') {
            p += 1;
            func |= StrFunc::INDENT;
        }
        let (id, after, command) = match self.src.get(p).copied() {
            Some(quote @ (b'\'' | b'"' | b'`')) => {
                func |= match quote {
                    b'\'' => StrFunc::SQUOTE,
                    _ => StrFunc::DQUOTE,
                };
                let start = p + 1;
                let Some(len) = memchr(quote, &self.src[start..]) else {
                    self.pos = self.src.len();
                    return Err(self.error(&messages::UNTERMINATED_HEREDOC_IDENTIFIER, &[]));
                };
                (self.text[start..start + len].to_string(), start + len + 1, quote == b'`')
            }
            _ if self.is_identchar(p) => {
                func |= StrFunc::DQUOTE;
                let saved = self.pos;
                self.pos = p;
                self.scan_ident();
                let end = self.pos;
                self.pos = saved;
                (self.text[p..end].to_string(), end, false)
            }
            _ => return Ok(None),
        };

        self.pos = after;
        let token = self.token(if command { TokenKind::XStringBeg } else { TokenKind::StringBeg });
        let newline_at = memchr(b'\n', &self.src[after..]).map(|i| after + i);
        let (body_start, body_line) = match (self.heredoc_skip, newline_at) {
            (Some(skip), Some(at)) if skip.at == at => (skip.to, skip.to_line),
            (_, Some(at)) => (at + 1, self.line + 1),
            (_, None) => (self.src.len(), self.line),
        };
        self.str_term = Some(StrTerm::Heredoc {
            func,
            id,
            resume_pos: after,
            resume_line: self.line,
        });
        self.pos = body_start;
        self.line = body_line;
        Ok(Some(token))
    }

    fn heredoc_terminator_at(&self, at: usize, id: &str, indent: bool) -> bool {
        let mut i = at;
        if indent {
            while matches!(self.src.get(i), Some(b' ' | b'\t')) {
                i += 1;
            }
        }
        let rest = &self.src[i.min(self.src.len())..];
        if !rest.starts_with(id.as_bytes()) {
            return false;
        }
        matches!(
            rest.get(id.len()..),
            Some([]) | Some([b'\n', ..]) | Some([b'\r', b'\n', ..])
        )
    }

    /// Next token of a here-document body.
    pub(crate) fn here_document(
        &mut self,
        func: StrFunc,
        id: &str,
        resume_pos: usize,
        resume_line: u32,
    ) -> LexResult<Token> {
        let indent = func.contains(StrFunc::INDENT);
        if self.pos >= self.src.len() {
            return Err(self.error(&messages::UNTERMINATED_HEREDOC, &[id]));
        }
        if self.at_bol() && self.heredoc_terminator_at(self.pos, id, indent) {
            return Ok(self.finish_heredoc(resume_pos, resume_line));
        }

        let mut buf = Vec::new();
        if !func.contains(StrFunc::EXPAND) {
            loop {
                let end = memchr(b'\n', &self.src[self.pos..]).map_or(self.src.len(), |i| self.pos + i + 1);
                buf.extend_from_slice(&self.src[self.pos..end]);
                if self.src[end - 1] == b'\n' {
                    self.line += 1;
                }
                self.pos = end;
                if self.pos >= self.src.len() {
                    return Err(self.error(&messages::UNTERMINATED_HEREDOC, &[id]));
                }
                if self.heredoc_terminator_at(self.pos, id, indent) {
                    break;
                }
            }
            return Ok(self.content_token(buf));
        }

        if self.peek() == Some(b'#') {
            if let Some(token) = self.interpolation_start() {
                return Ok(token);
            }
            self.bump();
            buf.push(b'#');
        }
        loop {
            if self.tokadd_string(func, b'\n', 0, None, &mut buf)? == Stop::EndOfInput {
                return Err(self.error(&messages::UNTERMINATED_HEREDOC, &[id]));
            }
            if self.peek() != Some(b'\n') {
                return Ok(self.content_token(buf));
            }
            self.bump();
            buf.push(b'\n');
            if self.pos >= self.src.len() {
                return Err(self.error(&messages::UNTERMINATED_HEREDOC, &[id]));
            }
            if self.heredoc_terminator_at(self.pos, id, indent) {
                return Ok(self.content_token(buf));
            }
        }
    }

    /// Consume the terminator line, then resume after the opener. The body
    /// is skipped when the opener's line ends.
    fn finish_heredoc(&mut self, resume_pos: usize, resume_line: u32) -> Token {
        let line_end = memchr(b'\n', &self.src[self.pos..]).map(|i| self.pos + i);
        self.pos = line_end.unwrap_or(self.src.len());
        let token = self.token(TokenKind::StringEnd);
        let (to, to_line) = match line_end {
            Some(i) => (i + 1, self.line + 1),
            None => (self.src.len(), self.line),
        };
        match memchr(b'\n', &self.src[resume_pos..]) {
            Some(i) => {
                self.heredoc_skip = Some(HeredocSkip {
                    at: resume_pos + i,
                    to,
                    to_line,
                });
                self.pos = resume_pos;
                self.line = resume_line;
            }
            None => {
                self.pos = to;
                self.line = to_line;
            }
        }
        token
    }
}
