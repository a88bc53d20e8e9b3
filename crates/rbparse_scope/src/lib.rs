//! rbparse_scope: Parse-time lexical scopes.
//!
//! A `ScopeTable` owns every `StaticScope` created while parsing one
//! source. Scopes link to their enclosing scope by `ScopeId`, so the chain
//! is navigation only. `DynamicScope` is the owned snapshot handed in for
//! `eval`-style parses and handed back in the parse result.

mod dynamic;
mod scope;
mod table;

pub use dynamic::DynamicScope;
pub use scope::{Arity, ScopeKind, StaticScope};
pub use table::{Binding, ScopeTable};
