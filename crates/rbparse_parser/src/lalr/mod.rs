//! A small LALR(1) parser generator and the engine that runs its tables.

mod bitset;
mod engine;
mod grammar;
mod states;
mod tables;

pub use bitset::BitSet;
pub use engine::{Driver, Engine, Rhs};
pub use grammar::{Assoc, Grammar, GrammarBuilder, GrammarError, Precedence, Production, SymbolId, END, ERROR};
pub use states::Automaton;
pub use tables::{ParseTables, TableStats};
