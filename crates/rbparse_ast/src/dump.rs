//! S-expression rendering of syntax trees.
//!
//! `Newline` wrappers are transparent. Scalar attributes print before the
//! children; absent optional children are omitted.

use crate::node::*;
use crate::visitor::for_each_child;
use std::fmt::Write;

/// Render `node` as a single-line s-expression.
pub fn to_sexp(node: NodeRef<'_>) -> String {
    let mut out = String::new();
    write_node(&mut out, node);
    out
}

fn write_node(out: &mut String, node: NodeRef<'_>) {
    let node = node.unwrap_newlines();
    out.push('(');
    out.push_str(node.kind.name());
    write_attributes(out, &node.kind);
    for_each_child(node, |child| {
        out.push(' ');
        write_node(out, child);
    });
    out.push(')');
}

fn write_attributes(out: &mut String, kind: &NodeKind<'_>) {
    // Writing to a String cannot fail.
    let _ = match *kind {
        NodeKind::Fixnum(v) => write!(out, " {}", v),
        NodeKind::Bignum {
            digits,
            radix,
            negative,
        } => write!(out, " {}{}r{}", if negative { "-" } else { "" }, digits, radix),
        NodeKind::Float(v) => write!(out, " {:?}", v),
        NodeKind::Str(s) | NodeKind::XStr(s) => write!(out, " {:?}", s),
        NodeKind::Regexp { source, options } => write!(out, " {:?} {}", source, options.bits()),
        NodeKind::DRegexp { options, once, .. } => {
            write!(out, " {}{}", options.bits(), if once { " once" } else { "" })
        }
        NodeKind::Symbol(name)
        | NodeKind::InstVar(name)
        | NodeKind::ClassVar(name)
        | NodeKind::GlobalVar(name)
        | NodeKind::Const(name)
        | NodeKind::VCall(name)
        | NodeKind::Colon2 { name, .. }
        | NodeKind::Colon3(name)
        | NodeKind::InstAsgn { name, .. }
        | NodeKind::GlobalAsgn { name, .. }
        | NodeKind::ClassVarAsgn { name, .. }
        | NodeKind::ClassVarDecl { name, .. }
        | NodeKind::ConstDecl { name, .. }
        | NodeKind::AttrAssign { name, .. }
        | NodeKind::Call { name, .. }
        | NodeKind::FCall { name, .. }
        | NodeKind::Defn { name, .. }
        | NodeKind::Defs { name, .. }
        | NodeKind::Undef(name) => write!(out, " {}", name),
        NodeKind::LocalVar { name, location }
        | NodeKind::DVar { name, location }
        | NodeKind::LocalAsgn { name, location, .. }
        | NodeKind::DAsgn { name, location, .. } => write!(out, " {} {}", name, location),
        NodeKind::Argument { name, index } | NodeKind::BlockArg { name, index } => {
            write!(out, " {} {}", name, index)
        }
        NodeKind::NthRef(n) => write!(out, " {}", n),
        NodeKind::BackRef(c) => write!(out, " {}", c),
        NodeKind::OpAsgn {
            attribute,
            operator,
            ..
        } => write!(out, " {} {}", attribute, operator),
        NodeKind::OpElementAsgn { operator, .. } => write!(out, " {}", operator),
        NodeKind::Yield { expand: true, .. } => write!(out, " expand"),
        NodeKind::Args { rest, .. } if rest != -1 => write!(out, " rest={}", rest),
        NodeKind::While { do_first: true, .. } | NodeKind::Until { do_first: true, .. } => {
            write!(out, " do_first")
        }
        NodeKind::Flip {
            exclusive,
            location,
            ..
        } => write!(out, " {} {}", if exclusive { "3" } else { "2" }, location),
        NodeKind::Alias { new_name, old_name } | NodeKind::VAlias { new_name, old_name } => {
            write!(out, " {} {}", new_name, old_name)
        }
        _ => Ok(()),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use rbparse_core::{ParserArena, SourceSpan, StringInterner};

    #[test]
    fn test_sexp_of_small_tree() {
        let arena = ParserArena::new();
        let interner = StringInterner::new();
        let span = SourceSpan::empty(interner.intern("t.rb"), 0, 0);
        let one = arena.alloc(Node::new(span, NodeKind::Fixnum(1)));
        let two = arena.alloc(Node::new(span, NodeKind::Fixnum(2)));
        let cond = arena.alloc(Node::new(span, NodeKind::True));
        let wrapped = arena.alloc(Node::new(span, NodeKind::Newline(one)));
        let node = arena.alloc(Node::new(
            span,
            NodeKind::If {
                condition: cond,
                then_body: Some(wrapped),
                else_body: Some(two),
            },
        ));
        assert_eq!(to_sexp(node), "(if (true) (fixnum 1) (fixnum 2))");
        assert_eq!(crate::visitor::count_nodes(node), 5);
    }
}
