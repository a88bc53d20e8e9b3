//! The arena of scopes created during one parse.

use crate::dynamic::DynamicScope;
use crate::scope::{ScopeKind, StaticScope};
use rbparse_ast::{Location, ScopeId};

/// Where a name resolved to, and whether the owning scope is a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Binding {
    pub kind: ScopeKind,
    pub location: Location,
}

impl Binding {
    /// Resolved in a block scope (a dynamic variable).
    pub fn is_block(&self) -> bool {
        self.kind == ScopeKind::Block
    }
}

/// Every static scope of a parse, indexed by `ScopeId`.
#[derive(Debug, Clone, Default)]
pub struct ScopeTable {
    scopes: Vec<StaticScope>,
}

impl ScopeTable {
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Drop every scope. Previously issued ids become invalid.
    pub fn clear(&mut self) {
        self.scopes.clear();
    }

    fn push(&mut self, kind: ScopeKind, enclosing: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(StaticScope::new(kind, enclosing));
        log::trace!("scope {} ({:?}) opened in {:?}", id.0, kind, enclosing.map(|e| e.0));
        id
    }

    /// Open a method, class or top-level scope.
    pub fn new_local(&mut self, enclosing: Option<ScopeId>) -> ScopeId {
        self.push(ScopeKind::Local, enclosing)
    }

    /// Open a block scope inside `enclosing`.
    pub fn new_block(&mut self, enclosing: ScopeId) -> ScopeId {
        self.push(ScopeKind::Block, Some(enclosing))
    }

    /// Recreate a snapshot chain as static scopes, outermost first, and
    /// return the innermost.
    pub fn seed(&mut self, scope: &DynamicScope) -> ScopeId {
        let parent = scope.parent().map(|p| self.seed(p));
        let id = self.push(scope.kind(), parent);
        for name in scope.names() {
            self.scopes[id.index()].add_variable(name);
        }
        id
    }

    pub fn get(&self, id: ScopeId) -> &StaticScope {
        &self.scopes[id.index()]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut StaticScope {
        &mut self.scopes[id.index()]
    }

    pub fn enclosing(&self, id: ScopeId) -> Option<ScopeId> {
        self.get(id).enclosing()
    }

    /// The nearest non-block scope, with the number of blocks crossed.
    pub fn local_scope(&self, id: ScopeId) -> (ScopeId, u32) {
        let mut current = id;
        let mut depth = 0;
        loop {
            let scope = self.get(current);
            match (scope.kind(), scope.enclosing()) {
                (ScopeKind::Block, Some(parent)) => {
                    current = parent;
                    depth += 1;
                }
                _ => return (current, depth),
            }
        }
    }

    pub fn add_variable(&mut self, id: ScopeId, name: &str) -> u32 {
        self.get_mut(id).add_variable(name)
    }

    /// Slot of `name` in `id` alone.
    pub fn exists(&self, id: ScopeId, name: &str) -> Option<u32> {
        self.get(id).exists(name)
    }

    /// Search outward through block scopes, stopping after the first
    /// local scope.
    fn find(&self, id: ScopeId, name: &str) -> Option<(ScopeId, ScopeKind, Location)> {
        let mut current = id;
        let mut depth = 0;
        loop {
            let scope = self.get(current);
            if let Some(slot) = scope.exists(name) {
                return Some((current, scope.kind(), Location::new(depth, slot)));
            }
            match (scope.kind(), scope.enclosing()) {
                (ScopeKind::Block, Some(parent)) => {
                    current = parent;
                    depth += 1;
                }
                _ => return None,
            }
        }
    }

    /// Where `name` is visible from `id`, if anywhere.
    pub fn is_defined(&self, id: ScopeId, name: &str) -> Option<Location> {
        self.find(id, name).map(|(_, _, location)| location)
    }

    /// Resolve an assignment to `name` from `id`. A name not visible yet is
    /// declared in the nearest local scope.
    pub fn assign(&mut self, id: ScopeId, name: &str) -> Binding {
        if let Some(binding) = self.declare(id, name) {
            return binding;
        }
        let (local, depth) = self.local_scope(id);
        let slot = self.add_variable(local, name);
        Binding {
            kind: self.get(local).kind(),
            location: Location::new(depth, slot),
        }
    }

    /// Resolve a read of `name` from `id`. `None` means no scope declares
    /// it, so the identifier is a method call.
    pub fn declare(&mut self, id: ScopeId, name: &str) -> Option<Binding> {
        let (owner, kind, location) = self.find(id, name)?;
        if location.depth > 0 {
            self.get_mut(owner).capture(location.index);
        }
        Some(Binding { kind, location })
    }

    pub fn capture(&mut self, id: ScopeId, slot: u32) {
        self.get_mut(id).capture(slot);
    }

    /// Names visible from `id`: enclosing block chain first, then its own.
    pub fn all_names_in_scope(&self, id: ScopeId) -> Vec<String> {
        let scope = self.get(id);
        let mut names = match (scope.kind(), scope.enclosing()) {
            (ScopeKind::Block, Some(parent)) => self.all_names_in_scope(parent),
            _ => Vec::new(),
        };
        names.extend(scope.variables().map(str::to_string));
        names
    }

    /// Snapshot `id` and the block chain it sees.
    pub fn to_dynamic(&self, id: ScopeId) -> DynamicScope {
        let scope = self.get(id);
        let parent = match (scope.kind(), scope.enclosing()) {
            (ScopeKind::Block, Some(parent)) => Some(self.to_dynamic(parent)),
            _ => None,
        };
        DynamicScope::from_parts(scope.kind(), scope.variables().map(str::to_string).collect(), parent)
    }
}
