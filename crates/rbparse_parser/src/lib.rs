//! rbparse_parser: Table-driven LALR(1) parser for Ruby 1.8.
//!
//! The grammar is compiled into action and goto tables once per process;
//! each reduction dispatches to a semantic action that builds the
//! arena-allocated tree through [`support::ParserSupport`].

mod actions;
pub mod config;
pub mod lalr;
mod parser;
mod result;
pub mod rules;
pub mod support;
pub mod value;

pub use config::ParserConfiguration;
pub use parser::{ParserPool, RubyParser};
pub use result::ParseResult;
pub use rules::{Act, RubyTables};
