//! Tokens produced by the lexer.

use rbparse_ast::{RegexpOptions, TokenKind};
use rbparse_core::text::SourceSpan;

/// Semantic payload of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    None,
    /// Identifiers, variable names, keywords and `tOP_ASGN` operators.
    Name(String),
    /// Contents of `tSTRING_CONTENT`.
    Str(String),
    Integer(i64),
    /// Integer literal too large for `i64`: digits without prefix or underscores.
    BigInteger { digits: String, radix: u32 },
    Float(f64),
    NthRef(u32),
    BackRef(char),
    RegexpOptions(RegexpOptions),
}

/// One token with its payload and position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: TokenValue,
    pub span: SourceSpan,
}

impl Token {
    pub fn new(kind: TokenKind, value: TokenValue, span: SourceSpan) -> Self {
        Self { kind, value, span }
    }

    /// The name or string payload, if any.
    pub fn text(&self) -> Option<&str> {
        match &self.value {
            TokenValue::Name(s) | TokenValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The text naming this token in source: its payload, else its method
    /// name, else its grammar name.
    pub fn name(&self) -> &str {
        if let Some(text) = self.text() {
            return text;
        }
        self.kind
            .method_name()
            .unwrap_or_else(|| self.kind.grammar_name())
    }
}
