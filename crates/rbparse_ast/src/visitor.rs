//! Tree traversal.
//!
//! `for_each_child` enumerates the direct children of a node in source
//! order; `Visitor` builds a depth-first walk on top of it.

use crate::node::*;

/// A visitor over a syntax tree. The default `visit` walks into children.
pub trait Visitor<'a> {
    fn visit(&mut self, node: NodeRef<'a>) {
        walk(self, node);
    }
}

/// Visit every child of `node`.
pub fn walk<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, node: NodeRef<'a>) {
    for_each_child(node, |child| visitor.visit(child));
}

/// Call `f` on each direct child of `node`.
pub fn for_each_child<'a>(node: NodeRef<'a>, mut f: impl FnMut(NodeRef<'a>)) {
    let f: &mut dyn FnMut(NodeRef<'a>) = &mut f;
    match node.kind {
        NodeKind::Nil
        | NodeKind::True
        | NodeKind::False
        | NodeKind::SelfRef
        | NodeKind::Fixnum(_)
        | NodeKind::Bignum { .. }
        | NodeKind::Float(_)
        | NodeKind::Str(_)
        | NodeKind::XStr(_)
        | NodeKind::Regexp { .. }
        | NodeKind::Symbol(_)
        | NodeKind::ZArray
        | NodeKind::LocalVar { .. }
        | NodeKind::DVar { .. }
        | NodeKind::InstVar(_)
        | NodeKind::ClassVar(_)
        | NodeKind::GlobalVar(_)
        | NodeKind::Const(_)
        | NodeKind::NthRef(_)
        | NodeKind::BackRef(_)
        | NodeKind::VCall(_)
        | NodeKind::Colon3(_)
        | NodeKind::Star
        | NodeKind::Argument { .. }
        | NodeKind::BlockArg { .. }
        | NodeKind::ZeroArg
        | NodeKind::Redo
        | NodeKind::Retry
        | NodeKind::Alias { .. }
        | NodeKind::VAlias { .. }
        | NodeKind::Undef(_) => {}

        NodeKind::DStr(parts)
        | NodeKind::DXStr(parts)
        | NodeKind::DSymbol(parts)
        | NodeKind::Array(parts)
        | NodeKind::Hash(parts)
        | NodeKind::Block(parts)
        | NodeKind::DRegexp { parts, .. } => each(parts, f),

        NodeKind::EvStr(body)
        | NodeKind::Begin(body)
        | NodeKind::Break(body)
        | NodeKind::Next(body)
        | NodeKind::Return(body)
        | NodeKind::ZSuper { iter: body }
        | NodeKind::PreExe { body, .. }
        | NodeKind::PostExe { body, .. }
        | NodeKind::Root { body, .. } => opt(body, f),

        NodeKind::Newline(n)
        | NodeKind::Splat(n)
        | NodeKind::SValue(n)
        | NodeKind::ToAry(n)
        | NodeKind::Not(n)
        | NodeKind::Defined(n)
        | NodeKind::Match(n)
        | NodeKind::BlockPass { body: n } => f(n),

        NodeKind::Dot { begin, end, .. } | NodeKind::Flip { begin, end, .. } => {
            f(begin);
            f(end);
        }
        NodeKind::Colon2 { left, .. } => f(left),

        NodeKind::LocalAsgn { value, .. }
        | NodeKind::DAsgn { value, .. }
        | NodeKind::InstAsgn { value, .. }
        | NodeKind::GlobalAsgn { value, .. }
        | NodeKind::ClassVarAsgn { value, .. }
        | NodeKind::ClassVarDecl { value, .. } => opt(value, f),
        NodeKind::ConstDecl { path, value, .. } => {
            opt(path, f);
            opt(value, f);
        }
        NodeKind::AttrAssign { receiver, args, .. } => {
            f(receiver);
            opt(args, f);
        }
        NodeKind::MultipleAsgn { head, rest, value } => {
            opt(head, f);
            opt(rest, f);
            opt(value, f);
        }
        NodeKind::OpAsgn { receiver, value, .. } => {
            f(receiver);
            f(value);
        }
        NodeKind::OpElementAsgn {
            receiver,
            args,
            value,
            ..
        } => {
            f(receiver);
            opt(args, f);
            f(value);
        }
        NodeKind::OpAsgnOr { first, second }
        | NodeKind::OpAsgnAnd { first, second }
        | NodeKind::ArgsCat { first, second }
        | NodeKind::ArgsPush { first, second }
        | NodeKind::And { first, second }
        | NodeKind::Or { first, second } => {
            f(first);
            f(second);
        }

        NodeKind::Call {
            receiver,
            args,
            iter,
            ..
        } => {
            f(receiver);
            opt(args, f);
            opt(iter, f);
        }
        NodeKind::FCall { args, iter, .. } | NodeKind::Super { args, iter } => {
            opt(args, f);
            opt(iter, f);
        }
        NodeKind::Yield { args, .. } => opt(args, f),
        NodeKind::Iter { var, body, .. } => {
            opt(var, f);
            opt(body, f);
        }

        NodeKind::Args {
            pre,
            optional,
            block,
            ..
        } => {
            each(pre, f);
            each(optional, f);
            opt(block, f);
        }

        NodeKind::Rescue {
            body,
            rescue,
            else_body,
        } => {
            opt(body, f);
            opt(rescue, f);
            opt(else_body, f);
        }
        NodeKind::RescueBody {
            exceptions,
            body,
            next,
        } => {
            opt(exceptions, f);
            opt(body, f);
            opt(next, f);
        }
        NodeKind::Ensure { body, ensure } => {
            opt(body, f);
            opt(ensure, f);
        }

        NodeKind::If {
            condition,
            then_body,
            else_body,
        } => {
            f(condition);
            opt(then_body, f);
            opt(else_body, f);
        }
        NodeKind::While {
            condition, body, ..
        }
        | NodeKind::Until {
            condition, body, ..
        } => {
            f(condition);
            opt(body, f);
        }
        NodeKind::Case {
            subject,
            first_when,
        } => {
            opt(subject, f);
            opt(first_when, f);
        }
        NodeKind::When {
            expressions,
            body,
            next,
        } => {
            f(expressions);
            opt(body, f);
            opt(next, f);
        }
        NodeKind::For { var, body, iter } => {
            f(var);
            opt(body, f);
            f(iter);
        }
        NodeKind::Match2 { receiver, value } | NodeKind::Match3 { receiver, value } => {
            f(receiver);
            f(value);
        }

        NodeKind::Defn { args, body, .. } => {
            f(args);
            opt(body, f);
        }
        NodeKind::Defs {
            receiver,
            args,
            body,
            ..
        } => {
            f(receiver);
            f(args);
            opt(body, f);
        }
        NodeKind::Class {
            cpath,
            superclass,
            body,
            ..
        } => {
            f(cpath);
            opt(superclass, f);
            opt(body, f);
        }
        NodeKind::SClass { receiver, body, .. } => {
            f(receiver);
            opt(body, f);
        }
        NodeKind::Module { cpath, body, .. } => {
            f(cpath);
            opt(body, f);
        }
    }
}

fn opt<'a>(node: Option<NodeRef<'a>>, f: &mut dyn FnMut(NodeRef<'a>)) {
    if let Some(node) = node {
        f(node);
    }
}

fn each<'a>(nodes: NodeList<'a>, f: &mut dyn FnMut(NodeRef<'a>)) {
    for &node in nodes {
        f(node);
    }
}

/// Count the nodes in a tree, `root` included.
pub fn count_nodes<'a>(root: NodeRef<'a>) -> usize {
    struct Counter(usize);
    impl<'a> Visitor<'a> for Counter {
        fn visit(&mut self, node: NodeRef<'a>) {
            self.0 += 1;
            walk(self, node);
        }
    }
    let mut counter = Counter(0);
    counter.visit(root);
    counter.0
}
