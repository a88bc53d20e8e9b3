//! Syntax tree node definitions.
//!
//! Nodes are allocated in a `ParserArena` and refer to their children by
//! shared reference, so a whole tree is `Copy`-cheap to pass around and is
//! freed with its arena. Child lists are arena slices.

use crate::types::{Location, RegexpOptions, ScopeId};
use rbparse_core::text::SourceSpan;

/// A reference to an arena-allocated node.
pub type NodeRef<'a> = &'a Node<'a>;

/// An arena-allocated list of nodes.
pub type NodeList<'a> = &'a [NodeRef<'a>];

/// One syntax tree node.
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    pub span: SourceSpan,
    pub kind: NodeKind<'a>,
}

impl<'a> Node<'a> {
    #[inline]
    pub fn new(span: SourceSpan, kind: NodeKind<'a>) -> Self {
        Self { span, kind }
    }

    /// This node with any `Newline` wrappers removed.
    pub fn unwrap_newlines(&'a self) -> &'a Node<'a> {
        let mut node = self;
        while let NodeKind::Newline(next) = node.kind {
            node = next;
        }
        node
    }
}

/// Every kind of node, with its children.
///
/// Assignment kinds carry `value: None` while they are targets of a multiple
/// assignment, a `for` loop or block parameters; the value is filled in by
/// the element being assigned.
#[derive(Debug, Clone, Copy)]
pub enum NodeKind<'a> {
    // ========================================================================
    // Literals
    // ========================================================================
    Nil,
    True,
    False,
    SelfRef,
    Fixnum(i64),
    /// An integer outside the `i64` range, kept as its digit text.
    Bignum {
        digits: &'a str,
        radix: u32,
        negative: bool,
    },
    Float(f64),
    Str(&'a str),
    /// String with interpolation; parts are `Str` and `EvStr` nodes.
    DStr(NodeList<'a>),
    XStr(&'a str),
    DXStr(NodeList<'a>),
    /// One `#{...}` interpolation.
    EvStr(Option<NodeRef<'a>>),
    Regexp {
        source: &'a str,
        options: RegexpOptions,
    },
    DRegexp {
        parts: NodeList<'a>,
        options: RegexpOptions,
        once: bool,
    },
    Symbol(&'a str),
    DSymbol(NodeList<'a>),
    Array(NodeList<'a>),
    ZArray,
    /// Hash literal; elements alternate key, value.
    Hash(NodeList<'a>),
    Dot {
        begin: NodeRef<'a>,
        end: NodeRef<'a>,
        exclusive: bool,
    },

    // ========================================================================
    // Variable references
    // ========================================================================
    LocalVar {
        name: &'a str,
        location: Location,
    },
    DVar {
        name: &'a str,
        location: Location,
    },
    InstVar(&'a str),
    ClassVar(&'a str),
    GlobalVar(&'a str),
    Const(&'a str),
    NthRef(u32),
    BackRef(char),
    /// A bare identifier that names no variable: a call without receiver or arguments.
    VCall(&'a str),
    Colon2 {
        left: NodeRef<'a>,
        name: &'a str,
    },
    Colon3(&'a str),

    // ========================================================================
    // Assignments
    // ========================================================================
    LocalAsgn {
        name: &'a str,
        location: Location,
        value: Option<NodeRef<'a>>,
    },
    DAsgn {
        name: &'a str,
        location: Location,
        value: Option<NodeRef<'a>>,
    },
    InstAsgn {
        name: &'a str,
        value: Option<NodeRef<'a>>,
    },
    GlobalAsgn {
        name: &'a str,
        value: Option<NodeRef<'a>>,
    },
    /// Class variable assignment inside a method body.
    ClassVarAsgn {
        name: &'a str,
        value: Option<NodeRef<'a>>,
    },
    /// Class variable assignment at class-body level.
    ClassVarDecl {
        name: &'a str,
        value: Option<NodeRef<'a>>,
    },
    ConstDecl {
        name: &'a str,
        /// `Colon2`/`Colon3` target for scoped assignments.
        path: Option<NodeRef<'a>>,
        value: Option<NodeRef<'a>>,
    },
    /// `recv.name = v` and `recv[args] = v`.
    AttrAssign {
        receiver: NodeRef<'a>,
        name: &'a str,
        args: Option<NodeRef<'a>>,
    },
    MultipleAsgn {
        head: Option<NodeRef<'a>>,
        rest: Option<NodeRef<'a>>,
        value: Option<NodeRef<'a>>,
    },
    /// Anonymous splat target (`a, * = ...`).
    Star,
    /// `recv.attr op= value`.
    OpAsgn {
        receiver: NodeRef<'a>,
        attribute: &'a str,
        operator: &'a str,
        value: NodeRef<'a>,
    },
    /// `recv[args] op= value`.
    OpElementAsgn {
        receiver: NodeRef<'a>,
        args: Option<NodeRef<'a>>,
        operator: &'a str,
        value: NodeRef<'a>,
    },
    OpAsgnOr {
        first: NodeRef<'a>,
        second: NodeRef<'a>,
    },
    OpAsgnAnd {
        first: NodeRef<'a>,
        second: NodeRef<'a>,
    },

    // ========================================================================
    // Calls
    // ========================================================================
    Call {
        receiver: NodeRef<'a>,
        name: &'a str,
        args: Option<NodeRef<'a>>,
        iter: Option<NodeRef<'a>>,
    },
    FCall {
        name: &'a str,
        args: Option<NodeRef<'a>>,
        iter: Option<NodeRef<'a>>,
    },
    Super {
        args: Option<NodeRef<'a>>,
        iter: Option<NodeRef<'a>>,
    },
    ZSuper {
        iter: Option<NodeRef<'a>>,
    },
    Yield {
        args: Option<NodeRef<'a>>,
        expand: bool,
    },
    /// A literal block (`{ |x| ... }` or `do ... end`).
    Iter {
        var: Option<NodeRef<'a>>,
        body: Option<NodeRef<'a>>,
        scope: ScopeId,
    },
    /// `&blk` argument.
    BlockPass {
        body: NodeRef<'a>,
    },
    Splat(NodeRef<'a>),
    /// A splat on the right of a single assignment.
    SValue(NodeRef<'a>),
    /// Wraps a single right-hand side of a multiple assignment.
    ToAry(NodeRef<'a>),
    /// `args, *splat`.
    ArgsCat {
        first: NodeRef<'a>,
        second: NodeRef<'a>,
    },
    /// `args..., value` when `args` ends in a splat.
    ArgsPush {
        first: NodeRef<'a>,
        second: NodeRef<'a>,
    },

    // ========================================================================
    // Parameters
    // ========================================================================
    Args {
        /// Required parameters (`Argument` nodes).
        pre: NodeList<'a>,
        /// Optional parameters (assignment nodes holding the default).
        optional: NodeList<'a>,
        /// Slot of the rest parameter; -1 for none, -2 for an anonymous `*`.
        rest: i32,
        block: Option<NodeRef<'a>>,
    },
    Argument {
        name: &'a str,
        index: u32,
    },
    BlockArg {
        name: &'a str,
        index: u32,
    },
    /// Explicitly empty block parameters (`||`).
    ZeroArg,

    // ========================================================================
    // Statements
    // ========================================================================
    Block(NodeList<'a>),
    /// Marks the start of a new source line.
    Newline(NodeRef<'a>),
    Begin(Option<NodeRef<'a>>),
    Rescue {
        body: Option<NodeRef<'a>>,
        rescue: Option<NodeRef<'a>>,
        else_body: Option<NodeRef<'a>>,
    },
    RescueBody {
        exceptions: Option<NodeRef<'a>>,
        body: Option<NodeRef<'a>>,
        next: Option<NodeRef<'a>>,
    },
    Ensure {
        body: Option<NodeRef<'a>>,
        ensure: Option<NodeRef<'a>>,
    },

    // ========================================================================
    // Control flow
    // ========================================================================
    If {
        condition: NodeRef<'a>,
        then_body: Option<NodeRef<'a>>,
        else_body: Option<NodeRef<'a>>,
    },
    While {
        condition: NodeRef<'a>,
        body: Option<NodeRef<'a>>,
        do_first: bool,
    },
    Until {
        condition: NodeRef<'a>,
        body: Option<NodeRef<'a>>,
        do_first: bool,
    },
    Case {
        subject: Option<NodeRef<'a>>,
        first_when: Option<NodeRef<'a>>,
    },
    When {
        expressions: NodeRef<'a>,
        body: Option<NodeRef<'a>>,
        /// The following `When`, or the `else` body.
        next: Option<NodeRef<'a>>,
    },
    For {
        var: NodeRef<'a>,
        body: Option<NodeRef<'a>>,
        iter: NodeRef<'a>,
    },
    Break(Option<NodeRef<'a>>),
    Next(Option<NodeRef<'a>>),
    Redo,
    Retry,
    Return(Option<NodeRef<'a>>),
    And {
        first: NodeRef<'a>,
        second: NodeRef<'a>,
    },
    Or {
        first: NodeRef<'a>,
        second: NodeRef<'a>,
    },
    Not(NodeRef<'a>),
    Defined(NodeRef<'a>),
    /// A regexp literal used as a condition, matched against `$_`.
    Match(NodeRef<'a>),
    /// `/re/ =~ value`.
    Match2 {
        receiver: NodeRef<'a>,
        value: NodeRef<'a>,
    },
    /// `value =~ /re/`.
    Match3 {
        receiver: NodeRef<'a>,
        value: NodeRef<'a>,
    },
    /// A range used as a condition; state lives in a hidden local slot.
    Flip {
        begin: NodeRef<'a>,
        end: NodeRef<'a>,
        exclusive: bool,
        location: Location,
    },

    // ========================================================================
    // Definitions
    // ========================================================================
    Defn {
        name: &'a str,
        args: NodeRef<'a>,
        body: Option<NodeRef<'a>>,
        scope: ScopeId,
    },
    Defs {
        receiver: NodeRef<'a>,
        name: &'a str,
        args: NodeRef<'a>,
        body: Option<NodeRef<'a>>,
        scope: ScopeId,
    },
    Class {
        cpath: NodeRef<'a>,
        superclass: Option<NodeRef<'a>>,
        body: Option<NodeRef<'a>>,
        scope: ScopeId,
    },
    SClass {
        receiver: NodeRef<'a>,
        body: Option<NodeRef<'a>>,
        scope: ScopeId,
    },
    Module {
        cpath: NodeRef<'a>,
        body: Option<NodeRef<'a>>,
        scope: ScopeId,
    },
    Alias {
        new_name: &'a str,
        old_name: &'a str,
    },
    /// Global variable alias.
    VAlias {
        new_name: &'a str,
        old_name: &'a str,
    },
    Undef(&'a str),
    /// `BEGIN { ... }`.
    PreExe {
        body: Option<NodeRef<'a>>,
        scope: ScopeId,
    },
    /// `END { ... }`.
    PostExe {
        body: Option<NodeRef<'a>>,
        scope: ScopeId,
    },
    Root {
        body: Option<NodeRef<'a>>,
        scope: ScopeId,
    },
}

impl<'a> NodeKind<'a> {
    /// Short name of this kind, used by the tree dump.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Nil => "nil",
            NodeKind::True => "true",
            NodeKind::False => "false",
            NodeKind::SelfRef => "self",
            NodeKind::Fixnum(_) => "fixnum",
            NodeKind::Bignum { .. } => "bignum",
            NodeKind::Float(_) => "float",
            NodeKind::Str(_) => "str",
            NodeKind::DStr(_) => "dstr",
            NodeKind::XStr(_) => "xstr",
            NodeKind::DXStr(_) => "dxstr",
            NodeKind::EvStr(_) => "evstr",
            NodeKind::Regexp { .. } => "regexp",
            NodeKind::DRegexp { .. } => "dregexp",
            NodeKind::Symbol(_) => "symbol",
            NodeKind::DSymbol(_) => "dsymbol",
            NodeKind::Array(_) => "array",
            NodeKind::ZArray => "zarray",
            NodeKind::Hash(_) => "hash",
            NodeKind::Dot { exclusive: false, .. } => "dot2",
            NodeKind::Dot { exclusive: true, .. } => "dot3",
            NodeKind::LocalVar { .. } => "lvar",
            NodeKind::DVar { .. } => "dvar",
            NodeKind::InstVar(_) => "ivar",
            NodeKind::ClassVar(_) => "cvar",
            NodeKind::GlobalVar(_) => "gvar",
            NodeKind::Const(_) => "const",
            NodeKind::NthRef(_) => "nth_ref",
            NodeKind::BackRef(_) => "back_ref",
            NodeKind::VCall(_) => "vcall",
            NodeKind::Colon2 { .. } => "colon2",
            NodeKind::Colon3(_) => "colon3",
            NodeKind::LocalAsgn { .. } => "lasgn",
            NodeKind::DAsgn { .. } => "dasgn",
            NodeKind::InstAsgn { .. } => "iasgn",
            NodeKind::GlobalAsgn { .. } => "gasgn",
            NodeKind::ClassVarAsgn { .. } => "cvasgn",
            NodeKind::ClassVarDecl { .. } => "cvdecl",
            NodeKind::ConstDecl { .. } => "cdecl",
            NodeKind::AttrAssign { .. } => "attrasgn",
            NodeKind::MultipleAsgn { .. } => "masgn",
            NodeKind::Star => "star",
            NodeKind::OpAsgn { .. } => "op_asgn",
            NodeKind::OpElementAsgn { .. } => "op_element_asgn",
            NodeKind::OpAsgnOr { .. } => "op_asgn_or",
            NodeKind::OpAsgnAnd { .. } => "op_asgn_and",
            NodeKind::Call { .. } => "call",
            NodeKind::FCall { .. } => "fcall",
            NodeKind::Super { .. } => "super",
            NodeKind::ZSuper { .. } => "zsuper",
            NodeKind::Yield { .. } => "yield",
            NodeKind::Iter { .. } => "iter",
            NodeKind::BlockPass { .. } => "block_pass",
            NodeKind::Splat(_) => "splat",
            NodeKind::SValue(_) => "svalue",
            NodeKind::ToAry(_) => "to_ary",
            NodeKind::ArgsCat { .. } => "argscat",
            NodeKind::ArgsPush { .. } => "argspush",
            NodeKind::Args { .. } => "args",
            NodeKind::Argument { .. } => "arg",
            NodeKind::BlockArg { .. } => "block_arg",
            NodeKind::ZeroArg => "zero_arg",
            NodeKind::Block(_) => "block",
            NodeKind::Newline(_) => "newline",
            NodeKind::Begin(_) => "begin",
            NodeKind::Rescue { .. } => "rescue",
            NodeKind::RescueBody { .. } => "resbody",
            NodeKind::Ensure { .. } => "ensure",
            NodeKind::If { .. } => "if",
            NodeKind::While { .. } => "while",
            NodeKind::Until { .. } => "until",
            NodeKind::Case { .. } => "case",
            NodeKind::When { .. } => "when",
            NodeKind::For { .. } => "for",
            NodeKind::Break(_) => "break",
            NodeKind::Next(_) => "next",
            NodeKind::Redo => "redo",
            NodeKind::Retry => "retry",
            NodeKind::Return(_) => "return",
            NodeKind::And { .. } => "and",
            NodeKind::Or { .. } => "or",
            NodeKind::Not(_) => "not",
            NodeKind::Defined(_) => "defined",
            NodeKind::Match(_) => "match",
            NodeKind::Match2 { .. } => "match2",
            NodeKind::Match3 { .. } => "match3",
            NodeKind::Flip { .. } => "flip",
            NodeKind::Defn { .. } => "defn",
            NodeKind::Defs { .. } => "defs",
            NodeKind::Class { .. } => "class",
            NodeKind::SClass { .. } => "sclass",
            NodeKind::Module { .. } => "module",
            NodeKind::Alias { .. } => "alias",
            NodeKind::VAlias { .. } => "valias",
            NodeKind::Undef(_) => "undef",
            NodeKind::PreExe { .. } => "preexe",
            NodeKind::PostExe { .. } => "postexe",
            NodeKind::Root { .. } => "root",
        }
    }

    /// Whether this kind can receive a value as an assignment target.
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            NodeKind::LocalAsgn { .. }
                | NodeKind::DAsgn { .. }
                | NodeKind::InstAsgn { .. }
                | NodeKind::GlobalAsgn { .. }
                | NodeKind::ClassVarAsgn { .. }
                | NodeKind::ClassVarDecl { .. }
                | NodeKind::ConstDecl { .. }
                | NodeKind::AttrAssign { .. }
                | NodeKind::MultipleAsgn { .. }
        )
    }

    /// Whether this kind is a literal value with no side effects.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            NodeKind::Fixnum(_)
                | NodeKind::Bignum { .. }
                | NodeKind::Float(_)
                | NodeKind::Str(_)
                | NodeKind::Symbol(_)
                | NodeKind::Regexp { .. }
                | NodeKind::ZArray
                | NodeKind::Nil
                | NodeKind::True
                | NodeKind::False
                | NodeKind::SelfRef
        )
    }
}
