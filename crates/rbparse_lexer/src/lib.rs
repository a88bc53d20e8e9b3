//! rbparse_lexer: Token source for the Ruby parser.
//!
//! The lexer is state driven: the parser adjusts its `LexState`, condition
//! and command-argument stacks, and string terminator while parsing, which
//! is how Ruby's context-sensitive tokens get disambiguated.

mod keywords;
mod lexer;
mod literal;
mod number;
mod state;
mod token;

pub use keywords::{keyword, Keyword};
pub use lexer::{LexError, LexWarning, Lexer};
pub use state::{LexState, StackState, StrFunc, StrTerm};
pub use token::{Token, TokenValue};
