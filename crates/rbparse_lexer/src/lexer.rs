//! The state-driven tokenizer.
//!
//! `next_token` dispatches on the first byte of the next token, consulting
//! the current `LexState`, whitespace seen before the token and the
//! condition/command-argument stacks. String bodies are scanned by
//! [`crate::literal`] and numeric literals by [`crate::number`].

use crate::keywords::keyword;
use crate::state::{LexState, StackState, StrFunc, StrTerm};
use crate::token::{Token, TokenValue};
use memchr::memchr;
use rbparse_ast::TokenKind;
use rbparse_core::{InternedString, SourceSpan};
use rbparse_diagnostics::{messages, DiagnosticMessage};
use unicode_xid::UnicodeXID;

/// A fatal lexical error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct LexError {
    pub message: String,
    pub span: SourceSpan,
}

/// A warning produced while lexing; drained by the parser.
#[derive(Debug, Clone)]
pub struct LexWarning {
    pub message: &'static DiagnosticMessage,
    pub args: Vec<String>,
    pub span: SourceSpan,
    /// Only reported in verbose mode.
    pub verbose_only: bool,
}

pub(crate) type LexResult<T> = Result<T, LexError>;

/// A here-document body already consumed: reading the newline at `at`
/// continues at `to` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HeredocSkip {
    pub(crate) at: usize,
    pub(crate) to: usize,
    pub(crate) to_line: u32,
}

pub struct Lexer<'s> {
    pub(crate) text: &'s str,
    pub(crate) src: &'s [u8],
    pub(crate) file: InternedString,
    pub(crate) pos: usize,
    /// 0-based line of `pos`.
    pub(crate) line: u32,
    pub(crate) token_start: usize,
    pub(crate) token_line: u32,
    pub(crate) state: LexState,
    cond: StackState,
    cmdarg: StackState,
    command_start: bool,
    paren_nest: i32,
    pub(crate) str_term: Option<StrTerm>,
    pub(crate) heredoc_skip: Option<HeredocSkip>,
    end_seen: bool,
    warnings: Vec<LexWarning>,
}

#[inline]
pub(crate) fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

impl<'s> Lexer<'s> {
    /// Create a lexer over `source`; `start_line` is the 0-based line
    /// number of its first line.
    pub fn new(source: &'s str, file: InternedString, start_line: u32) -> Self {
        Self {
            text: source,
            src: source.as_bytes(),
            file,
            pos: 0,
            line: start_line,
            token_start: 0,
            token_line: start_line,
            state: LexState::Beg,
            cond: StackState::new(),
            cmdarg: StackState::new(),
            command_start: true,
            paren_nest: 0,
            str_term: None,
            heredoc_skip: None,
            end_seen: false,
            warnings: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // State shared with the parser
    // ------------------------------------------------------------------

    pub fn state(&self) -> LexState {
        self.state
    }

    pub fn set_state(&mut self, state: LexState) {
        self.state = state;
    }

    pub fn cond_push(&mut self, value: bool) {
        self.cond.push(value);
    }

    pub fn cond_pop(&mut self) {
        self.cond.pop();
    }

    pub fn cond_lexpop(&mut self) {
        self.cond.lexpop();
    }

    pub fn cmdarg_push(&mut self, value: bool) {
        self.cmdarg.push(value);
    }

    pub fn cmdarg_pop(&mut self) {
        self.cmdarg.pop();
    }

    pub fn cmdarg_lexpop(&mut self) {
        self.cmdarg.lexpop();
    }

    /// Raw command-argument stack, saved by the parser around call arguments.
    pub fn cmdarg_state(&self) -> u64 {
        self.cmdarg.bits()
    }

    pub fn set_cmdarg_state(&mut self, bits: u64) {
        self.cmdarg = StackState::from_bits(bits);
    }

    pub fn cond_state(&self) -> u64 {
        self.cond.bits()
    }

    /// Remove the active string terminator, leaving the lexer in code mode.
    pub fn take_str_term(&mut self) -> Option<StrTerm> {
        self.str_term.take()
    }

    pub fn set_str_term(&mut self, term: Option<StrTerm>) {
        self.str_term = term;
    }

    pub fn take_warnings(&mut self) -> Vec<LexWarning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn paren_nest(&self) -> i32 {
        self.paren_nest
    }

    /// Whether lexing stopped at a `__END__` line.
    pub fn end_seen(&self) -> bool {
        self.end_seen
    }

    pub fn file(&self) -> InternedString {
        self.file
    }

    /// 0-based line of the read position.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// An empty span at the read position.
    pub fn current_span(&self) -> SourceSpan {
        SourceSpan::empty(self.file, self.line, self.pos as u32)
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    #[inline]
    pub(crate) fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    #[inline]
    pub(crate) fn peek_at(&self, n: usize) -> Option<u8> {
        self.src.get(self.pos + n).copied()
    }

    /// Consume one byte, tracking lines and jumping over here-document
    /// bodies that were already read.
    pub(crate) fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        if c == b'\n' {
            if let Some(skip) = self.heredoc_skip {
                if skip.at == self.pos {
                    self.heredoc_skip = None;
                    self.pos = skip.to;
                    self.line = skip.to_line;
                    return Some(c);
                }
            }
            self.line += 1;
        }
        self.pos += 1;
        Some(c)
    }

    #[inline]
    pub(crate) fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    #[inline]
    pub(crate) fn peek_is_space(&self) -> bool {
        self.peek().is_some_and(is_space)
    }

    /// At the first byte of a line.
    pub(crate) fn at_bol(&self) -> bool {
        self.pos == 0 || self.src[self.pos - 1] == b'\n'
    }

    /// Byte length of the identifier character at `at`, if there is one.
    pub(crate) fn ident_char_len(&self, at: usize) -> Option<usize> {
        let b = *self.src.get(at)?;
        if b.is_ascii_alphanumeric() || b == b'_' {
            return Some(1);
        }
        if b < 0x80 {
            return None;
        }
        let ch = self.text.get(at..)?.chars().next()?;
        ch.is_xid_continue().then(|| ch.len_utf8())
    }

    pub(crate) fn is_identchar(&self, at: usize) -> bool {
        self.ident_char_len(at).is_some()
    }

    /// Consume identifier characters starting at the read position.
    pub(crate) fn scan_ident(&mut self) {
        while let Some(n) = self.ident_char_len(self.pos) {
            self.pos += n;
        }
    }

    // ------------------------------------------------------------------
    // Token construction
    // ------------------------------------------------------------------

    pub(crate) fn span(&self) -> SourceSpan {
        SourceSpan::new(
            self.file,
            self.token_line,
            self.line.max(self.token_line),
            self.token_start as u32,
            self.pos.max(self.token_start) as u32,
        )
    }

    pub(crate) fn token(&self, kind: TokenKind) -> Token {
        Token::new(kind, TokenValue::None, self.span())
    }

    pub(crate) fn token_with(&self, kind: TokenKind, value: TokenValue) -> Token {
        Token::new(kind, value, self.span())
    }

    fn name_token(&self, kind: TokenKind, name: impl Into<String>) -> Token {
        self.token_with(kind, TokenValue::Name(name.into()))
    }

    fn op_asgn(&mut self, op: &str) -> Token {
        self.state = LexState::Beg;
        self.name_token(TokenKind::OpAsgn, op)
    }

    pub(crate) fn error(&self, message: &DiagnosticMessage, args: &[&str]) -> LexError {
        LexError {
            message: message.format(args),
            span: self.span(),
        }
    }

    pub(crate) fn warn(&mut self, message: &'static DiagnosticMessage, args: &[&str], verbose_only: bool) {
        self.warnings.push(LexWarning {
            message,
            args: args.iter().map(|a| a.to_string()).collect(),
            span: self.span(),
            verbose_only,
        });
    }

    fn eof_token(&mut self) -> Token {
        self.token_start = self.pos;
        self.token_line = self.line;
        self.token(TokenKind::EndOfInput)
    }

    // ------------------------------------------------------------------
    // Lexing
    // ------------------------------------------------------------------

    /// Produce the next token. `is_local` answers whether an identifier is a
    /// known local variable, which makes `foo [1]` index rather than call.
    pub fn next_token(&mut self, is_local: &dyn Fn(&str) -> bool) -> LexResult<Token> {
        if self.end_seen {
            return Ok(self.eof_token());
        }
        if let Some(mut term) = self.str_term.take() {
            self.token_start = self.pos;
            self.token_line = self.line;
            let token = match &mut term {
                StrTerm::Heredoc {
                    func,
                    id,
                    resume_pos,
                    resume_line,
                } => self.here_document(*func, id, *resume_pos, *resume_line)?,
                StrTerm::Literal {
                    func,
                    term,
                    paren,
                    nest,
                    finished,
                } => self.parse_string(*func, *term, *paren, nest, finished)?,
            };
            match token.kind {
                TokenKind::StringEnd | TokenKind::RegexpEnd => self.state = LexState::End,
                _ => self.str_term = Some(term),
            }
            return Ok(token);
        }
        self.yylex(is_local)
    }

    fn yylex(&mut self, is_local: &dyn Fn(&str) -> bool) -> LexResult<Token> {
        let cmd_state = self.command_start;
        self.command_start = false;
        let mut space_seen = false;

        loop {
            self.token_start = self.pos;
            self.token_line = self.line;
            let Some(c) = self.peek() else {
                return Ok(self.token(TokenKind::EndOfInput));
            };

            match c {
                0 | 0x04 | 0x1a => return Ok(self.token(TokenKind::EndOfInput)),
                b' ' | b'\t' | 0x0b | 0x0c | b'\r' => {
                    self.bump();
                    space_seen = true;
                }
                b'#' => {
                    self.pos = memchr(b'\n', &self.src[self.pos..]).map_or(self.src.len(), |i| self.pos + i);
                }
                b'\n' => {
                    let span = SourceSpan::new(self.file, self.line, self.line, self.pos as u32, self.pos as u32 + 1);
                    self.bump();
                    if matches!(
                        self.state,
                        LexState::Beg | LexState::Fname | LexState::Dot | LexState::Class
                    ) {
                        continue;
                    }
                    self.command_start = true;
                    self.state = LexState::Beg;
                    return Ok(Token::new(TokenKind::Newline, TokenValue::None, span));
                }
                b'\\' => {
                    self.bump();
                    if self.eat(b'\n') {
                        space_seen = true;
                        continue;
                    }
                    return Err(self.error(&messages::INVALID_CHAR, &["\\"]));
                }
                b'=' if self.at_bol() && self.at_embedded_document_start() => {
                    self.skip_embedded_document()?;
                }
                b'_' if self.at_bol() && self.at_end_marker() => {
                    self.end_seen = true;
                    return Ok(self.token(TokenKind::EndOfInput));
                }
                _ => return self.dispatch(c, cmd_state, space_seen, is_local),
            }
        }
    }

    fn at_embedded_document_start(&self) -> bool {
        self.src[self.pos..].starts_with(b"=begin")
            && self.src.get(self.pos + 6).map_or(true, |c| is_space(*c))
    }

    fn at_end_marker(&self) -> bool {
        let rest = &self.src[self.pos..];
        rest.starts_with(b"__END__")
            && matches!(rest.get(7..), Some([]) | Some([b'\n', ..]) | Some([b'\r', b'\n', ..]))
    }

    /// Skip `=begin` through the end of the `=end` line.
    fn skip_embedded_document(&mut self) -> LexResult<()> {
        loop {
            match memchr(b'\n', &self.src[self.pos..]) {
                Some(i) => {
                    self.pos += i + 1;
                    self.line += 1;
                }
                None => {
                    self.pos = self.src.len();
                    return Err(self.error(&messages::EMBEDDED_DOCUMENT_MEETS_EOF, &[]));
                }
            }
            let rest = &self.src[self.pos..];
            if rest.starts_with(b"=end") && rest.get(4).map_or(true, |c| is_space(*c)) {
                match memchr(b'\n', rest) {
                    Some(i) => {
                        self.pos += i + 1;
                        self.line += 1;
                    }
                    None => self.pos = self.src.len(),
                }
                return Ok(());
            }
        }
    }

    fn dispatch(
        &mut self,
        c: u8,
        cmd_state: bool,
        space_seen: bool,
        is_local: &dyn Fn(&str) -> bool,
    ) -> LexResult<Token> {
        use TokenKind as T;
        let state = self.state;
        // Whether this token opens an argument: `foo *a`, `foo -1`.
        let arg_prefix = |lexer: &Self| state.is_arg() && space_seen && !lexer.peek_is_space();

        match c {
            b'*' => {
                self.bump();
                let kind = if self.eat(b'*') {
                    if self.eat(b'=') {
                        return Ok(self.op_asgn("**"));
                    }
                    T::Pow
                } else {
                    if self.eat(b'=') {
                        return Ok(self.op_asgn("*"));
                    }
                    if arg_prefix(self) {
                        self.warn(&messages::ARGUMENT_PREFIX, &["*"], true);
                        T::Star
                    } else if matches!(state, LexState::Beg | LexState::Mid) {
                        T::Star
                    } else {
                        T::Asterisk
                    }
                };
                self.state = state.after_operator();
                Ok(self.token(kind))
            }
            b'!' => {
                self.bump();
                self.state = LexState::Beg;
                let kind = if self.eat(b'=') {
                    T::Neq
                } else if self.eat(b'~') {
                    T::NMatch
                } else {
                    T::Bang
                };
                Ok(self.token(kind))
            }
            b'=' => {
                self.bump();
                self.state = state.after_operator();
                let kind = if self.eat(b'=') {
                    if self.eat(b'=') {
                        T::Eqq
                    } else {
                        T::Eq
                    }
                } else if self.eat(b'~') {
                    T::Match
                } else if self.eat(b'>') {
                    T::Assoc
                } else {
                    T::Assign
                };
                Ok(self.token(kind))
            }
            b'<' => {
                self.bump();
                if self.peek() == Some(b'<')
                    && !matches!(
                        state,
                        LexState::End | LexState::Dot | LexState::EndArg | LexState::Class
                    )
                    && (!state.is_arg() || space_seen)
                {
                    let save = self.pos;
                    self.bump();
                    if let Some(token) = self.heredoc_identifier()? {
                        return Ok(token);
                    }
                    self.pos = save;
                }
                self.state = state.after_operator();
                let kind = if self.eat(b'=') {
                    if self.eat(b'>') {
                        T::Cmp
                    } else {
                        T::Leq
                    }
                } else if self.eat(b'<') {
                    if self.eat(b'=') {
                        return Ok(self.op_asgn("<<"));
                    }
                    T::LShift
                } else {
                    T::Lt
                };
                Ok(self.token(kind))
            }
            b'>' => {
                self.bump();
                self.state = state.after_operator();
                let kind = if self.eat(b'=') {
                    T::Geq
                } else if self.eat(b'>') {
                    if self.eat(b'=') {
                        return Ok(self.op_asgn(">>"));
                    }
                    T::RShift
                } else {
                    T::Gt
                };
                Ok(self.token(kind))
            }
            b'"' => {
                self.bump();
                self.str_term = Some(StrTerm::literal(StrFunc::DQUOTE, b'"', 0));
                Ok(self.token(T::StringBeg))
            }
            b'\'' => {
                self.bump();
                self.str_term = Some(StrTerm::literal(StrFunc::SQUOTE, b'\'', 0));
                Ok(self.token(T::StringBeg))
            }
            b'`' => {
                self.bump();
                match state {
                    LexState::Fname => {
                        self.state = LexState::End;
                        Ok(self.token(T::Backtick))
                    }
                    LexState::Dot => {
                        self.state = if cmd_state { LexState::CmdArg } else { LexState::Arg };
                        Ok(self.token(T::Backtick))
                    }
                    _ => {
                        self.str_term = Some(StrTerm::literal(StrFunc::XQUOTE, b'`', 0));
                        Ok(self.token(T::XStringBeg))
                    }
                }
            }
            b'?' => self.char_literal(),
            b'&' => {
                self.bump();
                if self.eat(b'&') {
                    self.state = LexState::Beg;
                    if self.eat(b'=') {
                        return Ok(self.op_asgn("&&"));
                    }
                    return Ok(self.token(T::AndOp));
                }
                if self.eat(b'=') {
                    return Ok(self.op_asgn("&"));
                }
                let kind = if arg_prefix(self) {
                    self.warn(&messages::ARGUMENT_PREFIX, &["&"], true);
                    T::Amper
                } else if matches!(state, LexState::Beg | LexState::Mid) {
                    T::Amper
                } else {
                    T::Amp
                };
                self.state = state.after_operator();
                Ok(self.token(kind))
            }
            b'|' => {
                self.bump();
                if self.eat(b'|') {
                    self.state = LexState::Beg;
                    if self.eat(b'=') {
                        return Ok(self.op_asgn("||"));
                    }
                    return Ok(self.token(T::OrOp));
                }
                if self.eat(b'=') {
                    return Ok(self.op_asgn("|"));
                }
                self.state = state.after_operator();
                Ok(self.token(T::Pipe))
            }
            b'+' | b'-' => self.plus_minus(c, state, space_seen),
            b'.' => {
                self.bump();
                self.state = LexState::Beg;
                if self.eat(b'.') {
                    let kind = if self.eat(b'.') { T::Dot3 } else { T::Dot2 };
                    return Ok(self.token(kind));
                }
                if self.peek().is_some_and(|d| d.is_ascii_digit()) {
                    return Err(self.error(&messages::NO_DOT_DIGIT_FLOAT, &[]));
                }
                self.state = LexState::Dot;
                Ok(self.token(T::Dot))
            }
            b'0'..=b'9' => self.number(),
            b')' | b']' | b'}' => {
                self.bump();
                self.cond.lexpop();
                self.cmdarg.lexpop();
                self.state = LexState::End;
                self.paren_nest -= 1;
                let kind = match c {
                    b')' => T::RParen,
                    b']' => T::RBracket,
                    _ => T::RBrace,
                };
                Ok(self.token(kind))
            }
            b':' => {
                self.bump();
                if self.eat(b':') {
                    if matches!(state, LexState::Beg | LexState::Mid | LexState::Class)
                        || (state.is_arg() && space_seen)
                    {
                        self.state = LexState::Beg;
                        return Ok(self.token(T::Colon3));
                    }
                    self.state = LexState::Dot;
                    return Ok(self.token(T::Colon2));
                }
                if matches!(state, LexState::End | LexState::EndArg) || self.peek().map_or(true, is_space) {
                    self.state = LexState::Beg;
                    return Ok(self.token(T::Colon));
                }
                match self.peek() {
                    Some(b'"') => {
                        self.bump();
                        self.str_term = Some(StrTerm::literal(StrFunc::DSYM, b'"', 0));
                    }
                    Some(b'\'') => {
                        self.bump();
                        self.str_term = Some(StrTerm::literal(StrFunc::SSYM, b'\'', 0));
                    }
                    _ => {}
                }
                self.state = LexState::Fname;
                Ok(self.token(T::SymBeg))
            }
            b'/' => {
                self.bump();
                if matches!(state, LexState::Beg | LexState::Mid) {
                    self.str_term = Some(StrTerm::literal(StrFunc::REGEXP_LITERAL, b'/', 0));
                    return Ok(self.token(T::RegexpBeg));
                }
                if self.eat(b'=') {
                    return Ok(self.op_asgn("/"));
                }
                if arg_prefix(self) {
                    self.warn(&messages::AMBIGUOUS_FIRST_ARGUMENT, &[], true);
                    self.str_term = Some(StrTerm::literal(StrFunc::REGEXP_LITERAL, b'/', 0));
                    return Ok(self.token(T::RegexpBeg));
                }
                self.state = state.after_operator();
                Ok(self.token(T::Slash))
            }
            b'^' => {
                self.bump();
                if self.eat(b'=') {
                    return Ok(self.op_asgn("^"));
                }
                self.state = state.after_operator();
                Ok(self.token(T::Caret))
            }
            b';' => {
                self.bump();
                self.state = LexState::Beg;
                self.command_start = true;
                Ok(self.token(T::Semicolon))
            }
            b',' => {
                self.bump();
                self.state = LexState::Beg;
                Ok(self.token(T::Comma))
            }
            b'~' => {
                self.bump();
                if matches!(state, LexState::Fname | LexState::Dot) {
                    self.eat(b'@');
                }
                self.state = state.after_operator();
                Ok(self.token(T::Tilde))
            }
            b'(' => {
                self.bump();
                let kind = if matches!(state, LexState::Beg | LexState::Mid) {
                    T::LParen
                } else if space_seen && state == LexState::CmdArg {
                    T::LParenArg
                } else if space_seen && state == LexState::Arg {
                    self.warn(&messages::SPACE_BEFORE_PARENTHESES, &[], false);
                    T::LParenPlain
                } else {
                    T::LParenPlain
                };
                self.open_paren();
                self.command_start = true;
                Ok(self.token(kind))
            }
            b'[' => {
                self.bump();
                if matches!(state, LexState::Fname | LexState::Dot) {
                    self.state = LexState::Arg;
                    if self.peek() == Some(b']') {
                        self.bump();
                        let kind = if self.eat(b'=') { T::Aset } else { T::Aref };
                        return Ok(self.token(kind));
                    }
                    return Ok(self.token(T::LBracket));
                }
                let kind = if matches!(state, LexState::Beg | LexState::Mid) || (state.is_arg() && space_seen) {
                    T::LBrack
                } else {
                    T::LBracket
                };
                self.open_paren();
                Ok(self.token(kind))
            }
            b'{' => {
                self.bump();
                let kind = if state.is_arg() || state == LexState::End {
                    T::LBracePlain
                } else if state == LexState::EndArg {
                    T::LBraceArg
                } else {
                    T::LBrace
                };
                self.open_paren();
                Ok(self.token(kind))
            }
            b'%' => {
                self.bump();
                if matches!(state, LexState::Beg | LexState::Mid) {
                    return self.percent_literal();
                }
                if self.eat(b'=') {
                    return Ok(self.op_asgn("%"));
                }
                if state.is_arg() && space_seen && !self.peek_is_space() {
                    return self.percent_literal();
                }
                self.state = state.after_operator();
                Ok(self.token(T::Percent))
            }
            b'$' => self.global_variable(),
            b'@' => self.instance_variable(),
            _ if self.is_identchar(self.pos) => self.identifier(cmd_state, is_local),
            _ => {
                let ch = self.text.get(self.pos..).and_then(|s| s.chars().next()).unwrap_or('?');
                self.pos += ch.len_utf8().min(self.src.len() - self.pos).max(1);
                Err(self.error(&messages::INVALID_CHAR, &[&ch.to_string()]))
            }
        }
    }

    fn open_paren(&mut self) {
        self.cond.push(false);
        self.cmdarg.push(false);
        self.state = LexState::Beg;
        self.paren_nest += 1;
    }

    fn plus_minus(&mut self, c: u8, state: LexState, space_seen: bool) -> LexResult<Token> {
        use TokenKind as T;
        self.bump();
        let (unary, binary) = if c == b'+' { (T::UPlus, T::Plus) } else { (T::UMinus, T::Minus) };
        if matches!(state, LexState::Fname | LexState::Dot) {
            self.state = LexState::Arg;
            let kind = if self.eat(b'@') { unary } else { binary };
            return Ok(self.token(kind));
        }
        if self.eat(b'=') {
            return Ok(self.op_asgn(if c == b'+' { "+" } else { "-" }));
        }
        if matches!(state, LexState::Beg | LexState::Mid)
            || (state.is_arg() && space_seen && !self.peek_is_space())
        {
            if state.is_arg() {
                self.warn(&messages::AMBIGUOUS_FIRST_ARGUMENT, &[], true);
            }
            self.state = LexState::Beg;
            if self.peek().is_some_and(|d| d.is_ascii_digit()) {
                if c == b'+' {
                    return self.number();
                }
                return Ok(self.token(T::UMinusNum));
            }
            return Ok(self.token(unary));
        }
        self.state = LexState::Beg;
        Ok(self.token(binary))
    }

    fn char_literal(&mut self) -> LexResult<Token> {
        use TokenKind as T;
        self.bump();
        if matches!(self.state, LexState::End | LexState::EndArg) {
            self.state = LexState::Beg;
            return Ok(self.token(T::Question));
        }
        let Some(c) = self.peek() else {
            return Err(self.error(&messages::INCOMPLETE_CHARACTER_SYNTAX, &[]));
        };
        if is_space(c) {
            if !self.state.is_arg() {
                let escape = match c {
                    b' ' => Some("s"),
                    b'\n' => Some("n"),
                    b'\t' => Some("t"),
                    0x0b => Some("v"),
                    b'\r' => Some("r"),
                    0x0c => Some("f"),
                    _ => None,
                };
                if let Some(escape) = escape {
                    self.warn(&messages::INVALID_CHARACTER_SYNTAX, &[escape], false);
                }
            }
            self.state = LexState::Beg;
            return Ok(self.token(T::Question));
        }
        if (c.is_ascii_alphanumeric() || c == b'_') && self.is_identchar(self.pos + 1) {
            self.state = LexState::Beg;
            return Ok(self.token(T::Question));
        }
        let value = if c == b'\\' {
            self.bump();
            self.read_escape()?
        } else {
            let width = self
                .text
                .get(self.pos..)
                .and_then(|s| s.chars().next())
                .map_or(1, char::len_utf8);
            self.pos += width;
            c
        };
        self.state = LexState::End;
        Ok(self.token_with(T::Integer, TokenValue::Integer(i64::from(value))))
    }

    fn global_variable(&mut self) -> LexResult<Token> {
        let last_state = self.state;
        self.state = LexState::End;
        self.bump();
        let start = self.token_start;
        match self.peek() {
            Some(b'_') if !self.is_identchar(self.pos + 1) => {
                self.bump();
            }
            Some(
                b'~' | b'*' | b'$' | b'?' | b'!' | b'@' | b'/' | b'\\' | b';' | b',' | b'.' | b'='
                | b':' | b'<' | b'>' | b'"',
            ) => {
                self.bump();
            }
            Some(b'-') => {
                self.bump();
                if let Some(n) = self.ident_char_len(self.pos) {
                    self.pos += n;
                }
            }
            Some(c @ (b'&' | b'`' | b'\'' | b'+')) => {
                self.bump();
                if last_state != LexState::Fname {
                    return Ok(self.token_with(TokenKind::BackRef, TokenValue::BackRef(c as char)));
                }
            }
            Some(b'1'..=b'9') => {
                while self.peek().is_some_and(|d| d.is_ascii_digit()) {
                    self.pos += 1;
                }
                if last_state != LexState::Fname {
                    let n = self.text[start + 1..self.pos].parse().unwrap_or(u32::MAX);
                    return Ok(self.token_with(TokenKind::NthRef, TokenValue::NthRef(n)));
                }
            }
            _ if self.is_identchar(self.pos) => self.scan_ident(),
            _ => return Err(self.error(&messages::INVALID_CHAR, &["$"])),
        }
        let name = &self.text[start..self.pos];
        Ok(self.name_token(TokenKind::GlobalVar, name))
    }

    fn instance_variable(&mut self) -> LexResult<Token> {
        let start = self.token_start;
        self.bump();
        let class_var = self.eat(b'@');
        match self.peek() {
            Some(d) if d.is_ascii_digit() => {
                self.pos += 1;
                let name = &self.text[start..self.pos];
                let message = if class_var {
                    &messages::INVALID_CVAR_NAME
                } else {
                    &messages::INVALID_IVAR_NAME
                };
                return Err(self.error(message, &[name]));
            }
            _ if !self.is_identchar(self.pos) => {
                let message = if class_var {
                    &messages::CVAR_WITHOUT_IDENTIFIER
                } else {
                    &messages::IVAR_WITHOUT_IDENTIFIER
                };
                return Err(self.error(message, &[]));
            }
            _ => {}
        }
        self.scan_ident();
        self.state = LexState::End;
        let kind = if class_var { TokenKind::ClassVar } else { TokenKind::InstVar };
        let name = &self.text[start..self.pos];
        Ok(self.name_token(kind, name))
    }

    fn identifier(&mut self, cmd_state: bool, is_local: &dyn Fn(&str) -> bool) -> LexResult<Token> {
        use TokenKind as T;
        let start = self.pos;
        self.scan_ident();

        let mut kind = if self.src[start].is_ascii_uppercase() {
            T::Constant
        } else {
            T::Identifier
        };
        if matches!(self.peek(), Some(b'!' | b'?')) && self.peek_at(1) != Some(b'=') {
            self.pos += 1;
            kind = T::Fid;
        } else if self.state == LexState::Fname
            && self.peek() == Some(b'=')
            && !matches!(self.peek_at(1), Some(b'~' | b'>'))
            && (self.peek_at(1) != Some(b'=') || self.peek_at(2) == Some(b'>'))
        {
            self.pos += 1;
            kind = T::Identifier;
        }
        let name = &self.text[start..self.pos];

        let last_state = self.state;
        if last_state != LexState::Dot {
            if let Some(kw) = keyword(name) {
                self.state = kw.state;
                if last_state == LexState::Fname {
                    return Ok(self.name_token(kw.token, kw.name));
                }
                if kw.token == T::KDo {
                    let kind = if self.cond.is_set() {
                        T::KDoCond
                    } else if (self.cmdarg.is_set() && last_state != LexState::CmdArg)
                        || last_state == LexState::EndArg
                    {
                        T::KDoBlock
                    } else {
                        T::KDo
                    };
                    return Ok(self.name_token(kind, kw.name));
                }
                if last_state == LexState::Beg {
                    return Ok(self.name_token(kw.token, kw.name));
                }
                if kw.token != kw.modifier {
                    self.state = LexState::Beg;
                }
                return Ok(self.name_token(kw.modifier, kw.name));
            }
        }

        self.state = if matches!(
            last_state,
            LexState::Beg | LexState::Mid | LexState::Dot | LexState::Arg | LexState::CmdArg
        ) {
            if cmd_state {
                LexState::CmdArg
            } else {
                LexState::Arg
            }
        } else {
            LexState::End
        };
        if kind == T::Identifier && last_state != LexState::Dot && !name.ends_with('=') && is_local(name) {
            self.state = LexState::End;
        }
        Ok(self.name_token(kind, name))
    }
}
