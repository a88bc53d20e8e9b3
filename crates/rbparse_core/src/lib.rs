//! rbparse_core: Core utilities shared by the rbparse Ruby front end.
//!
//! Provides the parse arena, string interning, and source spans used by
//! the lexer, scope table and parser.

pub mod arena;
pub mod intern;
pub mod text;

// Re-export commonly used types
pub use arena::ParserArena;
pub use intern::{DisplayInterned, InternedString, StringInterner};
pub use text::{LineMap, SourceSpan};
