//! Scope table integration tests.

use rbparse_ast::Location;
use rbparse_scope::{DynamicScope, ScopeKind, ScopeTable};

// ============================================================================
// Lookup
// ============================================================================

#[test]
fn test_exists_is_local_only() {
    let mut table = ScopeTable::new();
    let top = table.new_local(None);
    let block = table.new_block(top);
    table.add_variable(top, "a");
    assert_eq!(table.exists(top, "a"), Some(0));
    assert_eq!(table.exists(block, "a"), None);
}

#[test]
fn test_is_defined_walks_block_chain() {
    let mut table = ScopeTable::new();
    let top = table.new_local(None);
    table.add_variable(top, "a");
    let outer = table.new_block(top);
    table.add_variable(outer, "b");
    let inner = table.new_block(outer);

    assert_eq!(table.is_defined(inner, "a"), Some(Location::new(2, 0)));
    assert_eq!(table.is_defined(inner, "b"), Some(Location::new(1, 0)));
    assert_eq!(table.is_defined(inner, "c"), None);
}

#[test]
fn test_local_scope_is_a_lookup_boundary() {
    let mut table = ScopeTable::new();
    let top = table.new_local(None);
    table.add_variable(top, "outer");
    let method = table.new_local(Some(top));
    assert_eq!(table.is_defined(method, "outer"), None);
    assert!(table.declare(method, "outer").is_none());
}

#[test]
fn test_declare_marks_capture_from_nested_scope() {
    let mut table = ScopeTable::new();
    let top = table.new_local(None);
    let slot = table.add_variable(top, "x");
    let block = table.new_block(top);

    let binding = table.declare(block, "x").unwrap();
    assert_eq!(binding.kind, ScopeKind::Local);
    assert_eq!(binding.location, Location::new(1, slot));
    assert!(table.get(top).is_captured(slot));
}

#[test]
fn test_declare_in_own_scope_does_not_capture() {
    let mut table = ScopeTable::new();
    let top = table.new_local(None);
    let slot = table.add_variable(top, "x");
    table.declare(top, "x").unwrap();
    assert!(!table.get(top).is_captured(slot));
}

// ============================================================================
// Assignment
// ============================================================================

#[test]
fn test_assign_in_block_promotes_to_local_scope() {
    let mut table = ScopeTable::new();
    let top = table.new_local(None);
    let outer = table.new_block(top);
    let inner = table.new_block(outer);

    let binding = table.assign(inner, "v");
    assert_eq!(binding.kind, ScopeKind::Local);
    assert_eq!(binding.location, Location::new(2, 0));
    assert_eq!(table.exists(top, "v"), Some(0));
    assert_eq!(table.exists(inner, "v"), None);
}

#[test]
fn test_repeated_assign_resolves_to_one_variable() {
    let mut table = ScopeTable::new();
    let top = table.new_local(None);
    let block = table.new_block(top);

    let first = table.assign(block, "v");
    let second = table.assign(block, "v");
    let third = table.assign(block, "v");
    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(table.get(top).variable_count(), 1);
}

#[test]
fn test_assign_prefers_block_variable() {
    let mut table = ScopeTable::new();
    let top = table.new_local(None);
    table.add_variable(top, "x");
    let block = table.new_block(top);
    table.add_variable(block, "x");

    let binding = table.assign(block, "x");
    assert!(binding.is_block());
    assert_eq!(binding.location, Location::new(0, 0));
}

#[test]
fn test_slots_are_append_only() {
    let mut table = ScopeTable::new();
    let top = table.new_local(None);
    let slots: Vec<u32> = ["a", "b", "a", "c", "b"]
        .iter()
        .map(|name| table.assign(top, name).location.index)
        .collect();
    assert_eq!(slots, vec![0, 1, 0, 2, 1]);
    let names: Vec<&str> = table.get(top).variables().collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

// ============================================================================
// Snapshots
// ============================================================================

#[test]
fn test_seed_from_existing_scope() {
    let existing = DynamicScope::new_block(["y"], DynamicScope::new_local(["x"]));
    let mut table = ScopeTable::new();
    let id = table.seed(&existing);

    assert_eq!(table.get(id).kind(), ScopeKind::Block);
    assert_eq!(table.is_defined(id, "x"), Some(Location::new(1, 0)));
    assert_eq!(table.is_defined(id, "y"), Some(Location::new(0, 0)));
    assert_eq!(table.all_names_in_scope(id), vec!["x", "y"]);
}

#[test]
fn test_snapshot_round_trip() {
    let mut table = ScopeTable::new();
    let top = table.new_local(None);
    table.assign(top, "a");
    table.assign(top, "b");
    let snapshot = table.to_dynamic(top);
    assert_eq!(snapshot.kind(), ScopeKind::Local);
    assert_eq!(snapshot.names(), &["a".to_string(), "b".to_string()]);
    assert!(snapshot.parent().is_none());
}
