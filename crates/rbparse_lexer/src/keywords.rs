//! Reserved words.

use crate::state::LexState;
use rbparse_ast::TokenKind;

/// A reserved word entry.
#[derive(Debug, Clone, Copy)]
pub struct Keyword {
    pub name: &'static str,
    /// Token at the beginning of an expression.
    pub token: TokenKind,
    /// Token elsewhere; differs for modifier forms (`x if y`).
    pub modifier: TokenKind,
    /// Lexer state after the keyword.
    pub state: LexState,
}

const fn kw(name: &'static str, token: TokenKind, modifier: TokenKind, state: LexState) -> Keyword {
    Keyword {
        name,
        token,
        modifier,
        state,
    }
}

static KEYWORDS: &[Keyword] = &[
    kw("end", TokenKind::KEnd, TokenKind::KEnd, LexState::End),
    kw("else", TokenKind::KElse, TokenKind::KElse, LexState::Beg),
    kw("case", TokenKind::KCase, TokenKind::KCase, LexState::Beg),
    kw("ensure", TokenKind::KEnsure, TokenKind::KEnsure, LexState::Beg),
    kw("module", TokenKind::KModule, TokenKind::KModule, LexState::Beg),
    kw("elsif", TokenKind::KElsif, TokenKind::KElsif, LexState::Beg),
    kw("def", TokenKind::KDef, TokenKind::KDef, LexState::Fname),
    kw("rescue", TokenKind::KRescue, TokenKind::KRescueMod, LexState::Mid),
    kw("not", TokenKind::KNot, TokenKind::KNot, LexState::Beg),
    kw("then", TokenKind::KThen, TokenKind::KThen, LexState::Beg),
    kw("yield", TokenKind::KYield, TokenKind::KYield, LexState::Arg),
    kw("for", TokenKind::KFor, TokenKind::KFor, LexState::Beg),
    kw("self", TokenKind::KSelf, TokenKind::KSelf, LexState::End),
    kw("false", TokenKind::KFalse, TokenKind::KFalse, LexState::End),
    kw("retry", TokenKind::KRetry, TokenKind::KRetry, LexState::End),
    kw("return", TokenKind::KReturn, TokenKind::KReturn, LexState::Mid),
    kw("true", TokenKind::KTrue, TokenKind::KTrue, LexState::End),
    kw("if", TokenKind::KIf, TokenKind::KIfMod, LexState::Beg),
    kw("defined?", TokenKind::KDefined, TokenKind::KDefined, LexState::Arg),
    kw("super", TokenKind::KSuper, TokenKind::KSuper, LexState::Arg),
    kw("undef", TokenKind::KUndef, TokenKind::KUndef, LexState::Fname),
    kw("break", TokenKind::KBreak, TokenKind::KBreak, LexState::Mid),
    kw("in", TokenKind::KIn, TokenKind::KIn, LexState::Beg),
    kw("do", TokenKind::KDo, TokenKind::KDo, LexState::Beg),
    kw("nil", TokenKind::KNil, TokenKind::KNil, LexState::End),
    kw("until", TokenKind::KUntil, TokenKind::KUntilMod, LexState::Beg),
    kw("unless", TokenKind::KUnless, TokenKind::KUnlessMod, LexState::Beg),
    kw("or", TokenKind::KOr, TokenKind::KOr, LexState::Beg),
    kw("next", TokenKind::KNext, TokenKind::KNext, LexState::Mid),
    kw("when", TokenKind::KWhen, TokenKind::KWhen, LexState::Beg),
    kw("redo", TokenKind::KRedo, TokenKind::KRedo, LexState::End),
    kw("and", TokenKind::KAnd, TokenKind::KAnd, LexState::Beg),
    kw("begin", TokenKind::KBegin, TokenKind::KBegin, LexState::Beg),
    kw("__LINE__", TokenKind::KLine, TokenKind::KLine, LexState::End),
    kw("class", TokenKind::KClass, TokenKind::KClass, LexState::Class),
    kw("__FILE__", TokenKind::KFile, TokenKind::KFile, LexState::End),
    kw("END", TokenKind::KLEnd, TokenKind::KLEnd, LexState::End),
    kw("BEGIN", TokenKind::KLBegin, TokenKind::KLBegin, LexState::End),
    kw("while", TokenKind::KWhile, TokenKind::KWhileMod, LexState::Beg),
    kw("alias", TokenKind::KAlias, TokenKind::KAlias, LexState::Fname),
];

/// Look up a reserved word.
pub fn keyword(name: &str) -> Option<&'static Keyword> {
    KEYWORDS.iter().find(|k| k.name == name)
}
