//! rbparse_ast: Syntax tree definitions for the Ruby front end.
//!
//! Defines the terminal vocabulary shared by the lexer and the grammar
//! (`TokenKind`), the arena-allocated `Node` tree, and tree utilities.

pub mod dump;
pub mod node;
pub mod token_kind;
pub mod types;
pub mod visitor;

// Re-export key types
pub use node::*;
pub use token_kind::TokenKind;
pub use types::*;
