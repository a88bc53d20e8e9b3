//! One lexical scope.

use indexmap::IndexSet;
use rbparse_ast::ScopeId;
use std::fmt;

/// Whether lookups stop at this scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScopeKind {
    /// Method bodies, class bodies and the top level. Lookups end here.
    #[default]
    Local,
    /// Blocks. Lookups continue into the enclosing scope.
    Block,
}

/// How many arguments a method or block accepts.
///
/// Encoded the Ruby way: `n` for exactly `n`, `-(n + 1)` for at least `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Arity(i32);

impl Arity {
    pub const NONE: Arity = Arity(0);
    /// Any number of arguments.
    pub const OPTIONAL: Arity = Arity(-1);

    pub fn fixed(n: u32) -> Self {
        Arity(n as i32)
    }

    /// At least `n` arguments.
    pub fn required(n: u32) -> Self {
        Arity(-(n as i32) - 1)
    }

    pub fn value(self) -> i32 {
        self.0
    }

    pub fn is_fixed(self) -> bool {
        self.0 >= 0
    }

    /// The minimum number of arguments.
    pub fn required_count(self) -> u32 {
        if self.0 >= 0 {
            self.0 as u32
        } else {
            (-1 - self.0) as u32
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Names declared in one scope, in slot order.
#[derive(Debug, Clone)]
pub struct StaticScope {
    kind: ScopeKind,
    enclosing: Option<ScopeId>,
    variables: IndexSet<String>,
    captured: Vec<bool>,
    required_args: u32,
    optional_args: u32,
    /// Slot of the rest argument.
    rest_arg: Option<u32>,
    /// A bare `*` rest argument, which has no slot.
    anonymous_rest: bool,
    /// Receives the implicit arguments of a bare `super`.
    argument_scope: bool,
}

impl StaticScope {
    pub(crate) fn new(kind: ScopeKind, enclosing: Option<ScopeId>) -> Self {
        Self {
            kind,
            enclosing,
            variables: IndexSet::new(),
            captured: Vec::new(),
            required_args: 0,
            optional_args: 0,
            rest_arg: None,
            anonymous_rest: false,
            argument_scope: false,
        }
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn enclosing(&self) -> Option<ScopeId> {
        self.enclosing
    }

    pub fn is_block(&self) -> bool {
        self.kind == ScopeKind::Block
    }

    /// Declare `name` here, returning its slot. An already declared name
    /// keeps its slot.
    pub fn add_variable(&mut self, name: &str) -> u32 {
        if let Some(slot) = self.exists(name) {
            return slot;
        }
        let (slot, _) = self.variables.insert_full(name.to_string());
        self.captured.push(false);
        slot as u32
    }

    /// Slot of `name` in this scope only.
    pub fn exists(&self, name: &str) -> Option<u32> {
        self.variables.get_index_of(name).map(|i| i as u32)
    }

    pub fn variable_name(&self, slot: u32) -> Option<&str> {
        self.variables.get_index(slot as usize).map(String::as_str)
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(String::as_str)
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Mark a slot as referenced from a nested scope.
    pub fn capture(&mut self, slot: u32) {
        if let Some(flag) = self.captured.get_mut(slot as usize) {
            *flag = true;
        }
    }

    pub fn is_captured(&self, slot: u32) -> bool {
        self.captured.get(slot as usize).copied().unwrap_or(false)
    }

    pub fn set_arities(&mut self, required: u32, optional: u32, rest: Option<u32>) {
        self.required_args = required;
        self.optional_args = optional;
        self.rest_arg = rest;
    }

    pub fn required_args(&self) -> u32 {
        self.required_args
    }

    pub fn optional_args(&self) -> u32 {
        self.optional_args
    }

    pub fn rest_arg(&self) -> Option<u32> {
        self.rest_arg
    }

    pub fn set_anonymous_rest(&mut self, value: bool) {
        self.anonymous_rest = value;
    }

    /// Whether any number of trailing arguments is accepted.
    pub fn has_rest(&self) -> bool {
        self.rest_arg.is_some() || self.anonymous_rest
    }

    pub fn arity(&self) -> Arity {
        if self.optional_args > 0 || self.has_rest() {
            Arity::required(self.required_args)
        } else {
            Arity::fixed(self.required_args)
        }
    }

    pub fn is_argument_scope(&self) -> bool {
        self.argument_scope
    }

    pub fn set_argument_scope(&mut self, value: bool) {
        self.argument_scope = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_variable_is_idempotent() {
        let mut scope = StaticScope::new(ScopeKind::Local, None);
        assert_eq!(scope.add_variable("a"), 0);
        assert_eq!(scope.add_variable("b"), 1);
        assert_eq!(scope.add_variable("a"), 0);
        assert_eq!(scope.variable_count(), 2);
        assert_eq!(scope.variable_name(1), Some("b"));
    }

    #[test]
    fn test_capture_flags() {
        let mut scope = StaticScope::new(ScopeKind::Block, None);
        let slot = scope.add_variable("x");
        assert!(!scope.is_captured(slot));
        scope.capture(slot);
        assert!(scope.is_captured(slot));
        assert!(!scope.is_captured(7));
    }

    #[test]
    fn test_arity() {
        let mut scope = StaticScope::new(ScopeKind::Local, None);
        assert_eq!(scope.arity(), Arity::NONE);
        scope.set_arities(2, 0, None);
        assert_eq!(scope.arity(), Arity::fixed(2));
        scope.set_arities(1, 1, Some(2));
        assert_eq!(scope.arity().value(), -2);
        assert_eq!(scope.arity().required_count(), 1);
        assert!(!scope.arity().is_fixed());
    }

    #[test]
    fn test_anonymous_rest_makes_arity_open() {
        let mut scope = StaticScope::new(ScopeKind::Local, None);
        scope.set_arities(1, 0, None);
        scope.set_anonymous_rest(true);
        assert!(scope.has_rest());
        assert_eq!(scope.arity(), Arity::required(1));
        assert_eq!(scope.variable_count(), 0);
    }
}
