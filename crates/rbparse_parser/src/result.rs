//! What a successful parse hands back besides the tree.

use rbparse_ast::{NodeRef, ScopeId};
use rbparse_scope::{DynamicScope, ScopeTable};

/// The tree of one source and the out-of-band results of parsing it.
#[derive(Debug)]
pub struct ParseResult<'a> {
    /// The `Root` node. `BEGIN` blocks already run first inside it.
    pub ast: NodeRef<'a>,
    /// `BEGIN { }` blocks, in source order.
    pub begin_nodes: Vec<NodeRef<'a>>,
    /// `END { }` blocks, in source order.
    pub end_nodes: Vec<NodeRef<'a>>,
    /// Every scope created by the parse; node scope ids index into it.
    pub scopes: ScopeTable,
    /// The top-level scope.
    pub root_scope: ScopeId,
    /// Snapshot of the top-level scope chain.
    pub scope: DynamicScope,
    /// Names in the local scope owning the top level, in slot order. For an
    /// eval inside a block this is the block chain's enclosing local scope.
    pub local_variable_names: Vec<String>,
    /// Whether the source ended at `__END__`.
    pub end_seen: bool,
    seeded: usize,
}

impl<'a> ParseResult<'a> {
    pub(crate) fn new(
        ast: NodeRef<'a>,
        begin_nodes: Vec<NodeRef<'a>>,
        end_nodes: Vec<NodeRef<'a>>,
        scopes: ScopeTable,
        root_scope: ScopeId,
        seeded: usize,
        end_seen: bool,
    ) -> Self {
        let scope = scopes.to_dynamic(root_scope);
        let (local, _) = scopes.local_scope(root_scope);
        let local_variable_names = scopes.get(local).variables().map(str::to_string).collect();
        Self {
            ast,
            begin_nodes,
            end_nodes,
            scopes,
            root_scope,
            scope,
            local_variable_names,
            end_seen,
            seeded,
        }
    }

    /// Top-level names the parse declared beyond those of the existing
    /// scope, for merging back into an `eval` or interactive binding.
    pub fn new_local_variables(&self) -> &[String] {
        self.local_variable_names
            .get(self.seeded..)
            .unwrap_or_default()
    }

    /// Every name visible at the top level: the enclosing local scope's
    /// first, then each block of the chain outward-in.
    pub fn visible_variable_names(&self) -> Vec<String> {
        self.scopes.all_names_in_scope(self.root_scope)
    }
}
