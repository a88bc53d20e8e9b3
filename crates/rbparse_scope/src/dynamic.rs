//! Owned scope snapshots passed across parses.

use crate::scope::ScopeKind;

/// The variables of a scope chain at the time of a parse.
///
/// Passed in as the existing scope of an `eval` parse so its variables stay
/// visible, and returned in the result describing the parsed top level.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DynamicScope {
    kind: ScopeKind,
    names: Vec<String>,
    parent: Option<Box<DynamicScope>>,
}

impl DynamicScope {
    /// A top-level (method-like) scope with the given variables.
    pub fn new_local<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: ScopeKind::Local,
            names: names.into_iter().map(Into::into).collect(),
            parent: None,
        }
    }

    /// A block scope nested in `parent`.
    pub fn new_block<I, S>(names: I, parent: DynamicScope) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: ScopeKind::Block,
            names: names.into_iter().map(Into::into).collect(),
            parent: Some(Box::new(parent)),
        }
    }

    pub(crate) fn from_parts(kind: ScopeKind, names: Vec<String>, parent: Option<DynamicScope>) -> Self {
        Self {
            kind,
            names,
            parent: parent.map(Box::new),
        }
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn parent(&self) -> Option<&DynamicScope> {
        self.parent.as_deref()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether `name` is visible from this scope.
    pub fn is_defined(&self, name: &str) -> bool {
        if self.names.iter().any(|n| n == name) {
            return true;
        }
        match (&self.kind, &self.parent) {
            (ScopeKind::Block, Some(parent)) => parent.is_defined(name),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_sees_parent_names() {
        let top = DynamicScope::new_local(["a"]);
        let block = DynamicScope::new_block(["b"], top);
        assert!(block.is_defined("a"));
        assert!(block.is_defined("b"));
        assert!(!block.is_defined("c"));
        assert_eq!(block.parent().map(DynamicScope::len), Some(1));
    }
}
