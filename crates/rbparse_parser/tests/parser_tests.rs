//! Parser integration tests.
//!
//! Verifies the trees, scopes and errors the parser produces for Ruby source.

use rbparse_ast::visitor::{walk, Visitor};
use rbparse_ast::{Location, NodeKind, NodeRef};
use rbparse_core::ParserArena;
use rbparse_diagnostics::{messages, Diagnostic, ProblemId, SyntaxError, Warnings};
use rbparse_parser::{ParseResult, ParserConfiguration, ParserPool, RubyParser, RubyTables};
use rbparse_scope::{Arity, DynamicScope};

/// Helper: parse `source` with `config`, failing the test on a syntax error.
fn parse_with<'a>(arena: &'a ParserArena, source: &str, config: &ParserConfiguration) -> ParseResult<'a> {
    let mut sink = Warnings::new(false);
    let mut parser = RubyParser::new();
    match parser.parse("test.rb", source, config, &mut sink, arena) {
        Ok(result) => result,
        Err(err) => panic!("unexpected error for {source:?}: {}", err.message),
    }
}

/// Helper: parse `source` with the default configuration.
fn parse<'a>(arena: &'a ParserArena, source: &str) -> ParseResult<'a> {
    parse_with(arena, source, &ParserConfiguration::default())
}

/// Helper: the error `source` fails with.
fn parse_error(source: &str) -> SyntaxError {
    let arena = ParserArena::new();
    let mut sink = Warnings::new(false);
    let mut parser = RubyParser::new();
    match parser.parse("test.rb", source, &ParserConfiguration::default(), &mut sink, &arena) {
        Ok(_) => panic!("expected {source:?} to fail"),
        Err(err) => err,
    }
}

/// Helper: parse `source` into a sink of the given verbosity, returning the
/// tree and everything reported to the sink.
fn parse_reporting<'a>(
    arena: &'a ParserArena,
    source: &str,
    config: &ParserConfiguration,
    verbose: bool,
) -> (ParseResult<'a>, Vec<Diagnostic>) {
    let mut sink = Warnings::new(verbose);
    let mut parser = RubyParser::new();
    match parser.parse("test.rb", source, config, &mut sink, arena) {
        Ok(result) => (result, sink.into_collection().into_diagnostics()),
        Err(err) => panic!("unexpected error for {source:?}: {}", err.message),
    }
}

/// Helper: the messages a verbose parse of `source` reports.
fn warnings_for(source: &str) -> Vec<String> {
    let arena = ParserArena::new();
    let (_, diagnostics) = parse_reporting(&arena, source, &ParserConfiguration::default(), true);
    diagnostics.into_iter().map(|d| d.message_text).collect()
}

/// Helper: the top-level statements, newline markers removed.
fn statements<'a>(result: &ParseResult<'a>) -> Vec<NodeRef<'a>> {
    match result.ast.kind {
        NodeKind::Root { body: None, .. } => Vec::new(),
        NodeKind::Root { body: Some(body), .. } => match body.unwrap_newlines().kind {
            NodeKind::Block(items) => items.iter().map(|n| n.unwrap_newlines()).collect(),
            _ => vec![body.unwrap_newlines()],
        },
        _ => panic!("tree is not rooted"),
    }
}

/// Helper: the only top-level statement.
fn single<'a>(result: &ParseResult<'a>) -> NodeRef<'a> {
    let stmts = statements(result);
    assert_eq!(stmts.len(), 1, "expected one statement");
    stmts[0]
}

/// Helper: every node in the tree `pred` accepts, in depth-first order.
fn find_all<'a>(root: NodeRef<'a>, pred: fn(&NodeKind<'a>) -> bool) -> Vec<NodeRef<'a>> {
    struct Finder<'a> {
        pred: fn(&NodeKind<'a>) -> bool,
        found: Vec<NodeRef<'a>>,
    }
    impl<'a> Visitor<'a> for Finder<'a> {
        fn visit(&mut self, node: NodeRef<'a>) {
            if (self.pred)(&node.kind) {
                self.found.push(node);
            }
            walk(self, node);
        }
    }
    let mut finder = Finder { pred, found: Vec::new() };
    finder.visit(root);
    finder.found
}

// ============================================================================
// Tables
// ============================================================================

#[test]
fn test_tables_build() {
    let tables = RubyTables::get().unwrap();
    assert!(tables.tables.stats.states > 0);
    assert!(tables.tables.stats.productions > 0);
    assert_eq!(tables.tables.stats.reduce_reduce, 0);
}

#[test]
fn test_empty_program() {
    let arena = ParserArena::new();
    let result = parse(&arena, "");
    assert!(matches!(result.ast.kind, NodeKind::Root { body: None, .. }));
    assert!(statements(&result).is_empty());
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_adjacent_strings_concatenate() {
    let arena = ParserArena::new();
    let result = parse(&arena, "\"a\" \"b\"\n");
    assert!(matches!(single(&result).kind, NodeKind::Str("ab")));
}

#[test]
fn test_interpolation_builds_dstr() {
    let arena = ParserArena::new();
    let result = parse(&arena, "\"a#{1}b\"\n");
    match single(&result).kind {
        NodeKind::DStr(parts) => {
            assert_eq!(parts.len(), 3);
            assert!(matches!(parts[0].kind, NodeKind::Str("a")));
            assert!(matches!(parts[1].kind, NodeKind::EvStr(Some(_))));
            assert!(matches!(parts[2].kind, NodeKind::Str("b")));
        }
        other => panic!("expected dstr, got {other:?}"),
    }
}

#[test]
fn test_negative_literal_is_folded() {
    let arena = ParserArena::new();
    let result = parse(&arena, "-5\n");
    assert!(matches!(single(&result).kind, NodeKind::Fixnum(-5)));
}

#[test]
fn test_symbol_literal() {
    let arena = ParserArena::new();
    let result = parse(&arena, ":foo\n");
    assert!(matches!(single(&result).kind, NodeKind::Symbol("foo")));
}

// ============================================================================
// Variables and Assignment
// ============================================================================

#[test]
fn test_local_assignment() {
    let arena = ParserArena::new();
    let result = parse(&arena, "a = 1\n");
    match single(&result).kind {
        NodeKind::LocalAsgn { name, location, value } => {
            assert_eq!(name, "a");
            assert_eq!(location, Location::new(0, 0));
            assert!(matches!(value.map(|v| v.kind), Some(NodeKind::Fixnum(1))));
        }
        other => panic!("expected lasgn, got {other:?}"),
    }
    assert_eq!(result.local_variable_names, vec!["a".to_string()]);
}

#[test]
fn test_repeated_references_share_one_slot() {
    let arena = ParserArena::new();
    let result = parse(&arena, "a = 1\na\na\n");
    let reads = find_all(result.ast, |kind| matches!(kind, NodeKind::LocalVar { .. }));
    assert_eq!(reads.len(), 2);
    for read in reads {
        assert!(matches!(read.kind, NodeKind::LocalVar { name: "a", location } if location == Location::new(0, 0)));
    }
    assert_eq!(result.scopes.get(result.root_scope).variable_count(), 1);
}

#[test]
fn test_unknown_identifier_is_a_call() {
    let arena = ParserArena::new();
    let result = parse(&arena, "foo\n");
    assert!(matches!(single(&result).kind, NodeKind::VCall("foo")));
}

#[test]
fn test_assign_to_self_fails() {
    let err = parse_error("self = 1\n");
    assert_eq!(err.pid, ProblemId::CannotChangeSelf);
    assert_eq!(err.message, "Can't change the value of self");
}

#[test]
fn test_assign_to_keyword_literals_fails() {
    for (source, name) in [("nil = 1\n", "nil"), ("true = 1\n", "true"), ("__FILE__ = 1\n", "__FILE__")] {
        let err = parse_error(source);
        assert_eq!(err.pid, ProblemId::InvalidAssignment);
        assert_eq!(err.message, format!("Can't assign to {name}"));
    }
}

#[test]
fn test_assign_to_nth_ref_fails() {
    let err = parse_error("$1 = 2\n");
    assert_eq!(err.message, "Can't set variable $1");
}

#[test]
fn test_constant_assignment_in_method_fails() {
    let err = parse_error("def foo\n  A = 1\nend\n");
    assert_eq!(err.pid, ProblemId::DynamicConstantAssignment);
}

#[test]
fn test_multiple_assignment() {
    let arena = ParserArena::new();
    let result = parse(&arena, "a, b = 1, 2\n");
    match single(&result).kind {
        NodeKind::MultipleAsgn {
            head: Some(head),
            rest: None,
            value: Some(value),
        } => {
            match head.kind {
                NodeKind::Array(targets) => {
                    assert_eq!(targets.len(), 2);
                    assert!(matches!(targets[0].kind, NodeKind::LocalAsgn { name: "a", value: None, .. }));
                    assert!(matches!(targets[1].kind, NodeKind::LocalAsgn { name: "b", value: None, .. }));
                }
                other => panic!("expected target array, got {other:?}"),
            }
            assert!(matches!(value.kind, NodeKind::Array(items) if items.len() == 2));
        }
        other => panic!("expected masgn, got {other:?}"),
    }
    assert_eq!(result.local_variable_names, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_block_parameter_reuses_visible_local() {
    let arena = ParserArena::new();
    let result = parse(&arena, "x = 1\n[1].each { |x| x }\n");
    let iters = find_all(result.ast, |kind| matches!(kind, NodeKind::Iter { .. }));
    assert_eq!(iters.len(), 1);
    match iters[0].kind {
        NodeKind::Iter { var: Some(var), .. } => {
            assert!(matches!(var.kind, NodeKind::LocalAsgn { name: "x", .. }));
        }
        other => panic!("expected block variable, got {other:?}"),
    }
}

#[test]
fn test_block_local_lives_in_block_scope() {
    let arena = ParserArena::new();
    let result = parse(&arena, "[1].each { |y| y }\n");
    let reads = find_all(result.ast, |kind| matches!(kind, NodeKind::DVar { .. }));
    assert_eq!(reads.len(), 1);
    assert!(result.local_variable_names.is_empty());
}

// ============================================================================
// Control Flow
// ============================================================================

#[test]
fn test_if_else() {
    let arena = ParserArena::new();
    let result = parse(&arena, "if a\n  1\nelse\n  2\nend\n");
    match single(&result).kind {
        NodeKind::If {
            condition,
            then_body: Some(then_body),
            else_body: Some(else_body),
        } => {
            assert!(matches!(condition.kind, NodeKind::VCall("a")));
            assert!(matches!(then_body.unwrap_newlines().kind, NodeKind::Fixnum(1)));
            assert!(matches!(else_body.unwrap_newlines().kind, NodeKind::Fixnum(2)));
        }
        other => panic!("expected if, got {other:?}"),
    }
}

#[test]
fn test_unless_swaps_branches() {
    let arena = ParserArena::new();
    let result = parse(&arena, "unless a\n  1\nend\n");
    assert!(matches!(
        single(&result).kind,
        NodeKind::If {
            then_body: None,
            else_body: Some(_),
            ..
        }
    ));
}

#[test]
fn test_begin_while_runs_body_first() {
    let arena = ParserArena::new();
    let result = parse(&arena, "begin\n  x\nend while y\n");
    assert!(matches!(single(&result).kind, NodeKind::While { do_first: true, .. }));

    let result = parse(&arena, "x while y\n");
    assert!(matches!(single(&result).kind, NodeKind::While { do_first: false, .. }));
}

#[test]
fn test_case_when() {
    let arena = ParserArena::new();
    let result = parse(&arena, "case x\nwhen 1, 2 then :a\nelse :b\nend\n");
    match single(&result).kind {
        NodeKind::Case {
            subject: Some(_),
            first_when: Some(when),
        } => match when.kind {
            NodeKind::When { expressions, next, .. } => {
                assert!(matches!(expressions.kind, NodeKind::Array(items) if items.len() == 2));
                assert!(next.is_some());
            }
            other => panic!("expected when, got {other:?}"),
        },
        other => panic!("expected case, got {other:?}"),
    }
}

#[test]
fn test_flip_flop_keeps_integer_ends_in_files() {
    let arena = ParserArena::new();
    let (result, diagnostics) = parse_reporting(&arena, "if 1..x\nend\n", &ParserConfiguration::default(), true);
    let flips = find_all(result.ast, |kind| matches!(kind, NodeKind::Flip { .. }));
    assert_eq!(flips.len(), 1);
    match flips[0].kind {
        NodeKind::Flip { begin, .. } => assert!(matches!(begin.kind, NodeKind::Fixnum(1))),
        other => panic!("expected flip, got {other:?}"),
    }
    assert!(diagnostics.iter().all(|d| !d.message_text.contains("integer")));
}

#[test]
fn test_flip_flop_compares_integer_ends_with_line_number_inline() {
    let arena = ParserArena::new();
    let config = ParserConfiguration::default().with_inline_source(true);
    let (result, _) = parse_reporting(&arena, "if 1..x\nend\n", &config, true);
    let flips = find_all(result.ast, |kind| matches!(kind, NodeKind::Flip { .. }));
    assert_eq!(flips.len(), 1);
    match flips[0].kind {
        NodeKind::Flip { begin, .. } => match begin.kind {
            NodeKind::Call {
                receiver,
                name: "==",
                args: Some(args),
                ..
            } => {
                assert!(matches!(receiver.kind, NodeKind::Fixnum(1)));
                let line_vars = find_all(args, |kind| matches!(kind, NodeKind::GlobalVar("$.")));
                assert_eq!(line_vars.len(), 1);
            }
            other => panic!("expected == call, got {other:?}"),
        },
        other => panic!("expected flip, got {other:?}"),
    }
}

// ============================================================================
// Definitions
// ============================================================================

#[test]
fn test_def_records_arity() {
    let arena = ParserArena::new();
    let result = parse(&arena, "def foo(a, b = 1, *c)\nend\n");
    match single(&result).kind {
        NodeKind::Defn { name, args, scope, .. } => {
            assert_eq!(name, "foo");
            assert!(matches!(args.kind, NodeKind::Args { rest: 2, .. }));
            let scope = result.scopes.get(scope);
            assert_eq!(scope.arity(), Arity::required(1));
            assert_eq!(scope.required_args(), 1);
            assert_eq!(scope.optional_args(), 1);
            assert!(scope.has_rest());
            assert_eq!(scope.variables().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        }
        other => panic!("expected defn, got {other:?}"),
    }
}

#[test]
fn test_def_with_fixed_arguments() {
    let arena = ParserArena::new();
    let result = parse(&arena, "def add(a, b)\n  a + b\nend\n");
    match single(&result).kind {
        NodeKind::Defn { scope, .. } => assert_eq!(result.scopes.get(scope).arity(), Arity::fixed(2)),
        other => panic!("expected defn, got {other:?}"),
    }
}

#[test]
fn test_duplicate_argument_fails() {
    let err = parse_error("def foo(a, a)\nend\n");
    assert_eq!(err.pid, ProblemId::DuplicateArgumentName);
}

#[test]
fn test_class_name_must_be_constant() {
    let err = parse_error("class foo\nend\n");
    assert_eq!(err.message, "class/module name must be CONSTANT");
}

#[test]
fn test_class_with_superclass() {
    let arena = ParserArena::new();
    let result = parse(&arena, "class Foo < Bar\n  def baz\n  end\nend\n");
    match single(&result).kind {
        NodeKind::Class {
            cpath,
            superclass: Some(superclass),
            ..
        } => {
            assert!(matches!(cpath.kind, NodeKind::Const("Foo")));
            assert!(matches!(superclass.unwrap_newlines().kind, NodeKind::Const("Bar")));
        }
        other => panic!("expected class, got {other:?}"),
    }
}

// ============================================================================
// BEGIN, END and __END__
// ============================================================================

#[test]
fn test_begin_and_end_blocks_are_collected() {
    let arena = ParserArena::new();
    let result = parse(&arena, "BEGIN { a }\nEND { b }\nc\n");
    assert_eq!(result.begin_nodes.len(), 1);
    assert_eq!(result.end_nodes.len(), 1);
    assert!(matches!(statements(&result)[0].kind, NodeKind::PreExe { .. }));
}

#[test]
fn test_data_section_ends_source() {
    let arena = ParserArena::new();
    let result = parse(&arena, "x = 1\n__END__\nnot ruby (\n");
    assert!(result.end_seen);
    assert_eq!(statements(&result).len(), 1);
}

// ============================================================================
// Warnings
// ============================================================================

#[test]
fn test_assignment_in_condition_warns() {
    let arena = ParserArena::new();
    let (_, diagnostics) = parse_reporting(&arena, "if a = 1\nend\n", &ParserConfiguration::default(), false);
    let found: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.code == messages::ASSIGNMENT_IN_CONDITIONAL.code)
        .collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].message_text, "Found '=' in conditional, should be '=='.");
}

#[test]
fn test_plain_assignment_does_not_warn() {
    assert!(warnings_for("a = b\n").is_empty());
    assert!(!warnings_for("if a == 1\nend\n")
        .iter()
        .any(|m| m.starts_with("Found '='")));
}

#[test]
fn test_statement_after_return_is_not_reached() {
    let warnings = warnings_for("def f\n  return 1\n  2\nend\n");
    assert_eq!(warnings, vec!["Statement not reached.".to_string()]);
}

#[test]
fn test_useless_literal_in_void_context() {
    let warnings = warnings_for("1\nfoo\n");
    assert_eq!(warnings, vec!["Useless use of a literal in void context.".to_string()]);
}

#[test]
fn test_verbose_only_warnings_stay_quiet() {
    let arena = ParserArena::new();
    let (_, diagnostics) = parse_reporting(&arena, "1\nfoo\n", &ParserConfiguration::default(), false);
    assert!(diagnostics.is_empty());
}

#[test]
fn test_warnings_leave_the_tree_unchanged() {
    let source = "if a = 1\n  b\nend\n1\ndef f\n  return\n  2\nend\n";
    let config = ParserConfiguration::default();
    let quiet_arena = ParserArena::new();
    let (quiet, quiet_diagnostics) = parse_reporting(&quiet_arena, source, &config, false);
    let loud_arena = ParserArena::new();
    let (loud, loud_diagnostics) = parse_reporting(&loud_arena, source, &config, true);
    assert!(loud_diagnostics.len() > quiet_diagnostics.len());
    assert_eq!(
        rbparse_ast::dump::to_sexp(quiet.ast),
        rbparse_ast::dump::to_sexp(loud.ast)
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unmatched_end_reports_its_line() {
    let err = parse_error("x = 1\nend\n");
    assert_eq!(err.pid, ProblemId::Syntax);
    assert_eq!(err.line, 2);
    assert!(err.message.starts_with("syntax error, unexpected kEND"), "{}", err.message);
    assert_eq!(err.found.as_deref(), Some("kEND"));
}

#[test]
fn test_recovering_parse_reports_and_still_fails() {
    let arena = ParserArena::new();
    let mut sink = Warnings::new(false);
    let config = ParserConfiguration::default().with_recover_errors(true);
    let mut parser = RubyParser::new();
    let result = parser.parse("test.rb", "foo(1, ]\nbar\n", &config, &mut sink, &arena);
    assert!(result.is_err());
    assert!(!sink.is_empty());
}

#[test]
fn test_error_carries_start_line_offset() {
    let arena = ParserArena::new();
    let mut sink = Warnings::new(false);
    let config = ParserConfiguration::default().with_line_number(9);
    let mut parser = RubyParser::new();
    let err = parser.parse("test.rb", "end\n", &config, &mut sink, &arena).unwrap_err();
    assert_eq!(err.line, 10);
    assert_eq!(err.file, "test.rb");
}

#[test]
fn test_multiple_assignment_in_condition_fails() {
    let err = parse_error("if (a, b = 1, 2)\nend\n");
    assert_eq!(err.pid, ProblemId::MultipleAssignmentInConditional);
    assert_eq!(err.message, "multiple assignment in conditional");
}

#[test]
fn test_begin_block_in_method_fails() {
    let err = parse_error("def f\n  BEGIN { }\nend\n");
    assert_eq!(err.pid, ProblemId::BeginInMethod);
    assert_eq!(err.message, "BEGIN in method");
    assert_eq!(err.line, 2);
}

#[test]
fn test_alias_of_nth_ref_fails() {
    let err = parse_error("alias $a $1\n");
    assert_eq!(err.pid, ProblemId::NthRefAlias);
    assert_eq!(err.message, "can't make alias for the number variables");
}

#[test]
fn test_class_definition_in_method_fails() {
    let err = parse_error("def f\n  class A\n  end\nend\n");
    assert_eq!(err.pid, ProblemId::ClassInMethod);
    assert_eq!(err.message, "class definition in method body");
}

// ============================================================================
// Eval and Reuse
// ============================================================================

#[test]
fn test_eval_sees_existing_locals() {
    let arena = ParserArena::new();
    let config = ParserConfiguration::for_eval(DynamicScope::new_local(["a"]));
    let result = parse_with(&arena, "b = a\n", &config);
    match single(&result).kind {
        NodeKind::LocalAsgn { name: "b", value: Some(value), .. } => {
            assert!(matches!(value.kind, NodeKind::LocalVar { name: "a", .. }));
        }
        other => panic!("expected lasgn, got {other:?}"),
    }
    assert_eq!(result.new_local_variables(), ["b".to_string()]);
    assert_eq!(result.scope.names(), ["a".to_string(), "b".to_string()]);
}

#[test]
fn test_eval_in_block_adds_locals_to_enclosing_scope() {
    let arena = ParserArena::new();
    let existing = DynamicScope::new_block(["x"], DynamicScope::new_local(["a"]));
    let config = ParserConfiguration::for_eval(existing);
    let result = parse_with(&arena, "b = 1\nb\n", &config);
    assert_eq!(result.new_local_variables(), ["b".to_string()]);
    assert_eq!(result.local_variable_names, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(result.visible_variable_names(), vec!["a", "b", "x"]);
    assert!(!matches!(statements(&result)[1].kind, NodeKind::VCall(_)));
}

#[test]
fn test_parser_reuse_starts_fresh() {
    let pool = ParserPool::new();
    let arena = ParserArena::new();
    let mut sink = Warnings::new(false);
    let config = ParserConfiguration::default();

    let mut parser = pool.acquire();
    let first = parser.parse("a.rb", "a = 1\n", &config, &mut sink, &arena).unwrap();
    assert_eq!(first.local_variable_names, vec!["a".to_string()]);
    pool.release(parser);
    assert_eq!(pool.idle_count(), 1);

    let mut parser = pool.acquire();
    assert_eq!(pool.idle_count(), 0);
    let second = parser.parse("b.rb", "a\n", &config, &mut sink, &arena).unwrap();
    assert!(matches!(single(&second).kind, NodeKind::VCall("a")));
}
