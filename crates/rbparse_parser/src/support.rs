//! Tree construction and checks shared by the grammar actions.
//!
//! `ParserSupport` is the per-parse context: the arena nodes are allocated
//! in, the scope table and the scope currently open, the definition
//! counters that decide what is legal where, and the warning sink.

use crate::config::ParserConfiguration;
use crate::value::Value;
use rbparse_ast::{Location, Node, NodeKind, NodeList, NodeRef, ScopeId, TokenKind};
use rbparse_core::text::SourceSpan;
use rbparse_core::ParserArena;
use rbparse_diagnostics::{messages, DiagnosticMessage, ProblemId, SyntaxError, WarningSink};
use rbparse_lexer::{Token, TokenValue};
use rbparse_scope::ScopeTable;

pub type SupportResult<T> = Result<T, SyntaxError>;

/// Operator methods whose result is pointless when discarded.
const VOID_OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "**", "+@", "-@", "|", "^", "&", "<=>", ">", ">=", "<", "<=", "==", "!=",
];

pub struct ParserSupport<'a, 's> {
    arena: &'a ParserArena,
    scopes: &'s mut ScopeTable,
    current: ScopeId,
    /// Inside a `def` body.
    pub in_def: bool,
    /// Depth of singleton method definitions (`def obj.name`).
    pub in_single: u32,
    /// Depth of class, module and singleton class bodies.
    pub class_nest: u32,
    /// Reading the `|...|` parameters of a block.
    pub in_block_params: bool,
    config: &'s ParserConfiguration,
    file: &'s str,
    sink: &'s mut dyn WarningSink,
    begin_nodes: Vec<NodeRef<'a>>,
    end_nodes: Vec<NodeRef<'a>>,
    flip_count: u32,
}

impl<'a, 's> ParserSupport<'a, 's> {
    pub fn new(
        arena: &'a ParserArena,
        scopes: &'s mut ScopeTable,
        root: ScopeId,
        config: &'s ParserConfiguration,
        file: &'s str,
        sink: &'s mut dyn WarningSink,
    ) -> Self {
        Self {
            arena,
            scopes,
            current: root,
            in_def: false,
            in_single: 0,
            class_nest: 0,
            in_block_params: false,
            config,
            file,
            sink,
            begin_nodes: Vec::new(),
            end_nodes: Vec::new(),
            flip_count: 0,
        }
    }

    pub fn config(&self) -> &ParserConfiguration {
        self.config
    }

    pub fn file(&self) -> &str {
        self.file
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    pub fn scopes(&self) -> &ScopeTable {
        &*self.scopes
    }

    pub fn take_begin_nodes(&mut self) -> Vec<NodeRef<'a>> {
        std::mem::take(&mut self.begin_nodes)
    }

    pub fn take_end_nodes(&mut self) -> Vec<NodeRef<'a>> {
        std::mem::take(&mut self.end_nodes)
    }

    pub fn add_begin_node(&mut self, node: NodeRef<'a>) {
        self.begin_nodes.push(node);
    }

    pub fn add_end_node(&mut self, node: NodeRef<'a>) {
        self.end_nodes.push(node);
    }

    /// Whether a definition body, plain or singleton, is open.
    pub fn in_method(&self) -> bool {
        self.in_def || self.in_single > 0
    }

    // ========================================================================
    // Scopes
    // ========================================================================

    pub fn push_local_scope(&mut self) -> ScopeId {
        self.current = self.scopes.new_local(Some(self.current));
        self.current
    }

    pub fn push_block_scope(&mut self) -> ScopeId {
        self.current = self.scopes.new_block(self.current);
        self.current
    }

    pub fn pop_scope(&mut self) {
        if let Some(parent) = self.scopes.enclosing(self.current) {
            self.current = parent;
        }
    }

    /// Whether `name` reads as a local variable from the open scope.
    pub fn is_local(&self, name: &str) -> bool {
        self.scopes.is_defined(self.current, name).is_some()
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    #[inline]
    pub fn node(&self, span: SourceSpan, kind: NodeKind<'a>) -> NodeRef<'a> {
        self.arena.alloc(Node::new(span, kind))
    }

    pub fn list(&self, items: &[NodeRef<'a>]) -> NodeList<'a> {
        self.arena.alloc_slice_copy(items)
    }

    pub fn str(&self, text: &str) -> &'a str {
        self.arena.alloc_str(text)
    }

    /// The source text a name token stands for.
    pub fn token_name(&self, token: &Token) -> &'a str {
        match &token.value {
            TokenValue::BackRef(c) => self.str(&format!("${c}")),
            TokenValue::NthRef(n) => self.str(&format!("${n}")),
            _ => self.str(token.name()),
        }
    }

    pub fn array(&self, span: SourceSpan, items: &[NodeRef<'a>]) -> NodeRef<'a> {
        self.node(span, NodeKind::Array(self.list(items)))
    }

    /// `items` as an array node spanning its elements.
    pub fn array_of(&self, fallback: SourceSpan, items: &[NodeRef<'a>]) -> NodeRef<'a> {
        let span = items
            .iter()
            .map(|n| n.span)
            .reduce(|a, b| a.union(&b))
            .unwrap_or(fallback);
        self.array(span, items)
    }

    pub fn newline_node(&self, node: NodeRef<'a>) -> NodeRef<'a> {
        if matches!(node.kind, NodeKind::Newline(_)) && !self.config.extra_position_information {
            return node;
        }
        self.node(node.span, NodeKind::Newline(node))
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// The node a value stands for. Collected argument lists become array
    /// nodes; a `&block` argument is dropped, callers that accept one use
    /// [`ParserSupport::split_call_args`].
    pub fn opt_node(&self, value: Value<'a>) -> Option<NodeRef<'a>> {
        match value {
            Value::Node(node) => Some(node),
            Value::List(span, items) => Some(self.array(span, &items)),
            Value::CallArgs { args, .. } => args,
            _ => None,
        }
    }

    pub fn expect_node(&self, value: Value<'a>, span: SourceSpan) -> SupportResult<NodeRef<'a>> {
        self.opt_node(value).ok_or_else(|| {
            SyntaxError::from_message(
                ProblemId::Irrecoverable,
                self.file,
                span,
                &messages::IRRECOVERABLE_SYNTAX_ERROR,
                &[],
            )
        })
    }

    pub fn into_list(&self, value: Value<'a>) -> Vec<NodeRef<'a>> {
        match value {
            Value::List(_, items) => items,
            Value::Node(node) => vec![node],
            _ => Vec::new(),
        }
    }

    /// Arguments and block pass of a call argument value.
    pub fn split_call_args(&self, value: Value<'a>) -> (Option<NodeRef<'a>>, Option<NodeRef<'a>>) {
        match value {
            Value::CallArgs { args, block } => (args, Some(block)),
            other => (self.opt_node(other), None),
        }
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    pub fn error(
        &self,
        pid: ProblemId,
        span: SourceSpan,
        message: &DiagnosticMessage,
        args: &[&str],
    ) -> SyntaxError {
        SyntaxError::from_message(pid, self.file, span, message, args)
    }

    pub fn is_verbose(&self) -> bool {
        self.config.verbose || self.sink.is_verbose()
    }

    /// Report a warning unconditionally.
    pub fn warn(&mut self, span: SourceSpan, message: &DiagnosticMessage, args: &[&str]) {
        self.sink.warn(self.file, span, message, args);
    }

    /// Report a warning only in verbose mode.
    pub fn warning(&mut self, span: SourceSpan, message: &DiagnosticMessage, args: &[&str]) {
        if self.is_verbose() {
            self.sink.warn(self.file, span, message, args);
        }
    }

    fn warning_unless_inline(&mut self, span: SourceSpan, message: &DiagnosticMessage) {
        if !self.config.inline_source {
            self.warning(span, message, &[]);
        }
    }

    pub fn report(&mut self, error: &SyntaxError) {
        self.sink.report(error.to_diagnostic());
    }

    // ========================================================================
    // Variables
    // ========================================================================

    /// The node reading the variable, literal or constant a token names.
    pub fn gettable(&mut self, token: &Token) -> SupportResult<NodeRef<'a>> {
        let span = token.span;
        let kind = match token.kind {
            TokenKind::KSelf => NodeKind::SelfRef,
            TokenKind::KNil => NodeKind::Nil,
            TokenKind::KTrue => NodeKind::True,
            TokenKind::KFalse => NodeKind::False,
            TokenKind::KFile => NodeKind::Str(self.str(self.file)),
            TokenKind::KLine => NodeKind::Fixnum(i64::from(span.start_line) + 1),
            TokenKind::Identifier => {
                let name = self.token_name(token);
                match self.scopes.declare(self.current, name) {
                    Some(binding) if binding.is_block() => NodeKind::DVar {
                        name,
                        location: binding.location,
                    },
                    Some(binding) => NodeKind::LocalVar {
                        name,
                        location: binding.location,
                    },
                    None => NodeKind::VCall(name),
                }
            }
            TokenKind::Constant => NodeKind::Const(self.token_name(token)),
            TokenKind::InstVar => NodeKind::InstVar(self.token_name(token)),
            TokenKind::ClassVar => NodeKind::ClassVar(self.token_name(token)),
            TokenKind::GlobalVar => NodeKind::GlobalVar(self.token_name(token)),
            _ => return Err(self.bad_identifier(token)),
        };
        Ok(self.node(span, kind))
    }

    /// The assignment node, still without a value, for a token that names
    /// an assignment target.
    pub fn assignable(&mut self, token: &Token) -> SupportResult<NodeRef<'a>> {
        let span = token.span;
        let kind = match token.kind {
            TokenKind::KSelf => {
                return Err(self.error(ProblemId::CannotChangeSelf, span, &messages::CANNOT_CHANGE_SELF, &[]))
            }
            TokenKind::KNil | TokenKind::KTrue | TokenKind::KFalse | TokenKind::KFile | TokenKind::KLine => {
                return Err(self.error(
                    ProblemId::InvalidAssignment,
                    span,
                    &messages::CANNOT_ASSIGN_TO,
                    &[token.name()],
                ))
            }
            TokenKind::Identifier => {
                let name = self.token_name(token);
                self.assign_local(name)
            }
            TokenKind::Constant => {
                if self.in_method() {
                    return Err(self.error(
                        ProblemId::DynamicConstantAssignment,
                        span,
                        &messages::DYNAMIC_CONSTANT_ASSIGNMENT,
                        &[],
                    ));
                }
                NodeKind::ConstDecl {
                    name: self.token_name(token),
                    path: None,
                    value: None,
                }
            }
            TokenKind::InstVar => NodeKind::InstAsgn {
                name: self.token_name(token),
                value: None,
            },
            TokenKind::ClassVar if self.in_method() => NodeKind::ClassVarAsgn {
                name: self.token_name(token),
                value: None,
            },
            TokenKind::ClassVar => NodeKind::ClassVarDecl {
                name: self.token_name(token),
                value: None,
            },
            TokenKind::GlobalVar => NodeKind::GlobalAsgn {
                name: self.token_name(token),
                value: None,
            },
            _ => return Err(self.bad_identifier(token)),
        };
        Ok(self.node(span, kind))
    }

    fn assign_local(&mut self, name: &'a str) -> NodeKind<'a> {
        // Block parameters shadow nothing new: a visible name is reused,
        // anything else belongs to the block itself.
        if self.in_block_params && self.scopes.get(self.current).is_block() {
            let location = match self.scopes.declare(self.current, name) {
                Some(binding) if !binding.is_block() => {
                    return NodeKind::LocalAsgn {
                        name,
                        location: binding.location,
                        value: None,
                    }
                }
                Some(binding) => binding.location,
                None => Location::new(0, self.scopes.add_variable(self.current, name)),
            };
            return NodeKind::DAsgn {
                name,
                location,
                value: None,
            };
        }
        let binding = self.scopes.assign(self.current, name);
        if binding.is_block() {
            NodeKind::DAsgn {
                name,
                location: binding.location,
                value: None,
            }
        } else {
            NodeKind::LocalAsgn {
                name,
                location: binding.location,
                value: None,
            }
        }
    }

    fn bad_identifier(&self, token: &Token) -> SyntaxError {
        SyntaxError::new(
            ProblemId::BadIdentifier,
            self.file,
            token.span,
            format!("identifier {} is not valid", token.name()),
        )
    }

    /// Error for assigning to `$1` or `$&`.
    pub fn backref_assign_error(&self, node: NodeRef<'a>) -> SyntaxError {
        let name = match node.kind {
            NodeKind::NthRef(n) => format!("${n}"),
            NodeKind::BackRef(c) => format!("${c}"),
            _ => node.kind.name().to_string(),
        };
        self.error(ProblemId::InvalidAssignment, node.span, &messages::CANNOT_SET_VARIABLE, &[&name])
    }

    /// The read of the variable an assignment node writes.
    pub fn gettable2(&self, node: NodeRef<'a>) -> NodeRef<'a> {
        let kind = match node.kind {
            NodeKind::LocalAsgn { name, location, .. } => NodeKind::LocalVar { name, location },
            NodeKind::DAsgn { name, location, .. } => NodeKind::DVar { name, location },
            NodeKind::InstAsgn { name, .. } => NodeKind::InstVar(name),
            NodeKind::GlobalAsgn { name, .. } => NodeKind::GlobalVar(name),
            NodeKind::ClassVarAsgn { name, .. } | NodeKind::ClassVarDecl { name, .. } => NodeKind::ClassVar(name),
            NodeKind::ConstDecl { name, .. } => NodeKind::Const(name),
            _ => return node,
        };
        self.node(node.span, kind)
    }

    /// A copy of an assignment node carrying `value`.
    pub fn with_value(&self, node: NodeRef<'a>, value: NodeRef<'a>) -> NodeRef<'a> {
        let value = Some(value);
        let kind = match node.kind {
            NodeKind::LocalAsgn { name, location, .. } => NodeKind::LocalAsgn { name, location, value },
            NodeKind::DAsgn { name, location, .. } => NodeKind::DAsgn { name, location, value },
            NodeKind::InstAsgn { name, .. } => NodeKind::InstAsgn { name, value },
            NodeKind::GlobalAsgn { name, .. } => NodeKind::GlobalAsgn { name, value },
            NodeKind::ClassVarAsgn { name, .. } => NodeKind::ClassVarAsgn { name, value },
            NodeKind::ClassVarDecl { name, .. } => NodeKind::ClassVarDecl { name, value },
            NodeKind::ConstDecl { name, path, .. } => NodeKind::ConstDecl { name, path, value },
            NodeKind::MultipleAsgn { head, rest, .. } => NodeKind::MultipleAsgn { head, rest, value },
            _ => return node,
        };
        let span = value.map_or(node.span, |v| node.span.union(&v.span));
        self.node(span, kind)
    }

    /// `lhs = rhs` for any assignment target.
    pub fn node_assign(&self, lhs: NodeRef<'a>, rhs: NodeRef<'a>) -> SupportResult<NodeRef<'a>> {
        self.value_expr(rhs)?;
        match lhs.kind {
            NodeKind::AttrAssign { receiver, name, args } => {
                let args = self.arg_add(args, rhs);
                Ok(self.node(
                    lhs.span.union(&rhs.span),
                    NodeKind::AttrAssign {
                        receiver,
                        name,
                        args: Some(args),
                    },
                ))
            }
            _ => Ok(self.with_value(lhs, rhs)),
        }
    }

    pub fn aryset(&self, receiver: NodeRef<'a>, args: Option<NodeRef<'a>>) -> SupportResult<NodeRef<'a>> {
        self.value_expr(receiver)?;
        let span = args.map_or(receiver.span, |a| receiver.span.union(&a.span));
        Ok(self.node(
            span,
            NodeKind::AttrAssign {
                receiver,
                name: "[]=",
                args,
            },
        ))
    }

    pub fn attrset(&self, receiver: NodeRef<'a>, name: &str, span: SourceSpan) -> SupportResult<NodeRef<'a>> {
        self.value_expr(receiver)?;
        Ok(self.node(
            receiver.span.union(&span),
            NodeKind::AttrAssign {
                receiver,
                name: self.str(&format!("{name}=")),
                args: None,
            },
        ))
    }

    /// `Scope::NAME = ...` and `::NAME = ...` targets.
    pub fn const_path(&self, span: SourceSpan, name: &'a str, path: NodeRef<'a>) -> SupportResult<NodeRef<'a>> {
        if self.in_method() {
            return Err(self.error(
                ProblemId::DynamicConstantAssignment,
                span,
                &messages::DYNAMIC_CONSTANT_ASSIGNMENT,
                &[],
            ));
        }
        Ok(self.node(
            span,
            NodeKind::ConstDecl {
                name,
                path: Some(path),
                value: None,
            },
        ))
    }

    /// Declare a formal argument of the method being defined.
    pub fn formal_argument(&mut self, name: &str, span: SourceSpan) -> SupportResult<u32> {
        if self.scopes.exists(self.current, name).is_some() {
            return Err(self.error(
                ProblemId::DuplicateArgumentName,
                span,
                &messages::DUPLICATED_ARGUMENT_NAME,
                &[],
            ));
        }
        Ok(self.scopes.add_variable(self.current, name))
    }

    /// The parameter list node; also records arity on the method scope.
    pub fn new_args(
        &mut self,
        span: SourceSpan,
        pre: &[NodeRef<'a>],
        optional: &[NodeRef<'a>],
        rest: i32,
        block: Option<NodeRef<'a>>,
    ) -> NodeRef<'a> {
        let rest_slot = u32::try_from(rest).ok();
        let (local, _) = self.scopes.local_scope(self.current);
        let scope = self.scopes.get_mut(local);
        scope.set_arities(pre.len() as u32, optional.len() as u32, rest_slot);
        scope.set_anonymous_rest(rest == -2);
        scope.set_argument_scope(true);
        self.node(
            span,
            NodeKind::Args {
                pre: self.list(pre),
                optional: self.list(optional),
                rest,
                block,
            },
        )
    }

    // ========================================================================
    // Argument lists
    // ========================================================================

    /// Append `item` to an argument list.
    pub fn arg_add(&self, args: Option<NodeRef<'a>>, item: NodeRef<'a>) -> NodeRef<'a> {
        match args {
            None => self.array(item.span, &[item]),
            Some(Node {
                kind: NodeKind::Array(items),
                span,
            }) => {
                let mut all = items.to_vec();
                all.push(item);
                self.array(span.union(&item.span), &all)
            }
            Some(other) => self.node(
                other.span.union(&item.span),
                NodeKind::ArgsPush {
                    first: other,
                    second: item,
                },
            ),
        }
    }

    /// Call arguments from leading values, an optional splat and an
    /// optional block pass.
    pub fn call_args(
        &self,
        span: SourceSpan,
        items: &[NodeRef<'a>],
        splat: Option<NodeRef<'a>>,
        block: Value<'a>,
    ) -> SupportResult<Value<'a>> {
        if let Some(splat) = splat {
            self.value_expr(splat)?;
        }
        let args = match (items.is_empty(), splat) {
            (true, None) => None,
            (true, Some(splat)) => Some(self.node(splat.span, NodeKind::Splat(splat))),
            (false, None) => Some(self.array_of(span, items)),
            (false, Some(splat)) => {
                let head = self.array_of(span, items);
                Some(self.node(
                    head.span.union(&splat.span),
                    NodeKind::ArgsCat {
                        first: head,
                        second: splat,
                    },
                ))
            }
        };
        Ok(match (block, args) {
            (Value::Node(block), args) => Value::CallArgs { args, block },
            (_, Some(args)) => Value::Node(args),
            (_, None) => Value::Empty,
        })
    }

    /// The value of `return`, `break` and `next` arguments.
    pub fn ret_args(&self, value: Value<'a>, span: SourceSpan) -> SupportResult<Option<NodeRef<'a>>> {
        if let Value::CallArgs { block, .. } = value {
            return Err(self.error(
                ProblemId::BlockArgUnexpected,
                block.span,
                &messages::BLOCK_ARG_UNEXPECTED,
                &[],
            ));
        }
        Ok(self.opt_node(value).map(|node| match node.kind {
            NodeKind::Array([single]) => *single,
            NodeKind::Splat(_) => self.node(span, NodeKind::SValue(node)),
            _ => node,
        }))
    }

    pub fn new_yield(&self, span: SourceSpan, value: Value<'a>) -> SupportResult<NodeRef<'a>> {
        if let Value::CallArgs { block, .. } = value {
            return Err(self.error(
                ProblemId::BlockArgUnexpected,
                block.span,
                &messages::BLOCK_ARG_UNEXPECTED,
                &[],
            ));
        }
        let kind = match self.opt_node(value) {
            None => NodeKind::Yield {
                args: None,
                expand: false,
            },
            Some(Node {
                kind: NodeKind::Array([single]),
                ..
            }) => NodeKind::Yield {
                args: Some(*single),
                expand: false,
            },
            Some(node) => NodeKind::Yield {
                args: Some(node),
                expand: true,
            },
        };
        Ok(self.node(span, kind))
    }

    fn block_conflict(&self, span: SourceSpan) -> SyntaxError {
        self.error(
            ProblemId::BlockArgAndBlockGiven,
            span,
            &messages::BLOCK_ARG_AND_BLOCK_GIVEN,
            &[],
        )
    }

    pub fn new_call(
        &self,
        span: SourceSpan,
        receiver: NodeRef<'a>,
        name: &'a str,
        args: Value<'a>,
        iter: Option<NodeRef<'a>>,
    ) -> SupportResult<NodeRef<'a>> {
        let (args, block) = self.split_call_args(args);
        if block.is_some() && iter.is_some() {
            return Err(self.block_conflict(span));
        }
        Ok(self.node(
            span,
            NodeKind::Call {
                receiver,
                name,
                args,
                iter: iter.or(block),
            },
        ))
    }

    pub fn new_fcall(
        &self,
        span: SourceSpan,
        name: &'a str,
        args: Value<'a>,
        iter: Option<NodeRef<'a>>,
    ) -> SupportResult<NodeRef<'a>> {
        let (args, block) = self.split_call_args(args);
        if block.is_some() && iter.is_some() {
            return Err(self.block_conflict(span));
        }
        Ok(self.node(
            span,
            NodeKind::FCall {
                name,
                args,
                iter: iter.or(block),
            },
        ))
    }

    pub fn new_super(
        &self,
        span: SourceSpan,
        args: Value<'a>,
        iter: Option<NodeRef<'a>>,
    ) -> SupportResult<NodeRef<'a>> {
        let (args, block) = self.split_call_args(args);
        if block.is_some() && iter.is_some() {
            return Err(self.block_conflict(span));
        }
        Ok(self.node(
            span,
            NodeKind::Super {
                args,
                iter: iter.or(block),
            },
        ))
    }

    /// Give a call its literal block.
    pub fn attach_block(&self, call: NodeRef<'a>, iter: NodeRef<'a>) -> SupportResult<NodeRef<'a>> {
        let span = call.span.union(&iter.span);
        let kind = match call.kind {
            NodeKind::Call { iter: Some(_), .. }
            | NodeKind::FCall { iter: Some(_), .. }
            | NodeKind::Super { iter: Some(_), .. } => return Err(self.block_conflict(span)),
            NodeKind::Call { receiver, name, args, .. } => NodeKind::Call {
                receiver,
                name,
                args,
                iter: Some(iter),
            },
            NodeKind::FCall { name, args, .. } => NodeKind::FCall {
                name,
                args,
                iter: Some(iter),
            },
            NodeKind::Super { args, .. } => NodeKind::Super { args, iter: Some(iter) },
            NodeKind::ZSuper { .. } => NodeKind::ZSuper { iter: Some(iter) },
            NodeKind::VCall(name) => NodeKind::FCall {
                name,
                args: None,
                iter: Some(iter),
            },
            _ => {
                return Err(self.error(
                    ProblemId::BlockGivenToYield,
                    span,
                    &messages::BLOCK_GIVEN_TO_YIELD,
                    &[],
                ))
            }
        };
        Ok(self.node(span, kind))
    }

    // ========================================================================
    // Operators
    // ========================================================================

    /// `a op b` as a call of method `op` on `a`.
    pub fn operator_call(&self, a: NodeRef<'a>, op: &'a str, b: NodeRef<'a>) -> SupportResult<NodeRef<'a>> {
        self.value_expr(a)?;
        self.value_expr(b)?;
        let span = a.span.union(&b.span);
        Ok(self.node(
            span,
            NodeKind::Call {
                receiver: a,
                name: op,
                args: Some(self.array(b.span, &[b])),
                iter: None,
            },
        ))
    }

    /// `op a` as a call of method `op` on `a`, with no arguments.
    pub fn unary_call(&self, span: SourceSpan, a: NodeRef<'a>, op: &'a str) -> SupportResult<NodeRef<'a>> {
        self.value_expr(a)?;
        Ok(self.node(
            span.union(&a.span),
            NodeKind::Call {
                receiver: a,
                name: op,
                args: None,
                iter: None,
            },
        ))
    }

    /// `a =~ b`, specialised when either side is a regexp literal.
    pub fn match_node(&self, a: NodeRef<'a>, b: NodeRef<'a>) -> SupportResult<NodeRef<'a>> {
        let span = a.span.union(&b.span);
        if is_regexp(a) {
            return Ok(self.node(span, NodeKind::Match2 { receiver: a, value: b }));
        }
        if is_regexp(b) {
            return Ok(self.node(span, NodeKind::Match3 { receiver: b, value: a }));
        }
        self.operator_call(a, "=~", b)
    }

    pub fn new_and(&self, first: NodeRef<'a>, second: NodeRef<'a>) -> SupportResult<NodeRef<'a>> {
        self.value_expr(first)?;
        Ok(self.node(first.span.union(&second.span), NodeKind::And { first, second }))
    }

    pub fn new_or(&self, first: NodeRef<'a>, second: NodeRef<'a>) -> SupportResult<NodeRef<'a>> {
        self.value_expr(first)?;
        Ok(self.node(first.span.union(&second.span), NodeKind::Or { first, second }))
    }

    // ========================================================================
    // Checks
    // ========================================================================

    /// Fail when `node` can never produce a value.
    pub fn value_expr(&self, node: NodeRef<'a>) -> SupportResult<()> {
        if is_void_value(node) {
            return Err(self.error(
                ProblemId::VoidValueExpression,
                node.span,
                &messages::VOID_VALUE_EXPRESSION,
                &[],
            ));
        }
        Ok(())
    }

    /// Warn about a statement whose value is computed and thrown away.
    pub fn check_useless_statement(&mut self, node: NodeRef<'a>) {
        if !self.is_verbose() {
            return;
        }
        let node = node.unwrap_newlines();
        let useless = match node.kind {
            NodeKind::Call { name, .. } if VOID_OPERATORS.iter().any(|&op| op == name) => name,
            NodeKind::LocalVar { .. }
            | NodeKind::DVar { .. }
            | NodeKind::GlobalVar(_)
            | NodeKind::InstVar(_)
            | NodeKind::ClassVar(_)
            | NodeKind::NthRef(_)
            | NodeKind::BackRef(_) => "a variable",
            NodeKind::Bignum { .. }
            | NodeKind::DRegexp { .. }
            | NodeKind::DStr(_)
            | NodeKind::DSymbol(_)
            | NodeKind::Fixnum(_)
            | NodeKind::Float(_)
            | NodeKind::Regexp { .. }
            | NodeKind::Str(_)
            | NodeKind::Symbol(_) => "a literal",
            NodeKind::Dot { exclusive: false, .. } => "..",
            NodeKind::Dot { exclusive: true, .. } => "...",
            NodeKind::Defined(_) => "defined?",
            NodeKind::False => "false",
            NodeKind::Nil => "nil",
            NodeKind::True => "true",
            _ => return,
        };
        self.warning(node.span, &messages::USELESS_USE_IN_VOID_CONTEXT, &[useless]);
    }

    fn check_assignment_in_condition(&mut self, node: NodeRef<'a>) -> SupportResult<()> {
        match node.kind {
            NodeKind::MultipleAsgn { .. } => Err(self.error(
                ProblemId::MultipleAssignmentInConditional,
                node.span,
                &messages::MULTIPLE_ASSIGNMENT_IN_CONDITIONAL,
                &[],
            )),
            NodeKind::LocalAsgn { value: Some(value), .. }
            | NodeKind::DAsgn { value: Some(value), .. }
            | NodeKind::GlobalAsgn { value: Some(value), .. }
            | NodeKind::InstAsgn { value: Some(value), .. } => {
                if value.kind.is_literal() && !matches!(value.kind, NodeKind::SelfRef) {
                    self.warn(node.span, &messages::ASSIGNMENT_IN_CONDITIONAL, &[]);
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn cond0(&mut self, node: NodeRef<'a>) -> SupportResult<NodeRef<'a>> {
        self.check_assignment_in_condition(node)?;
        match node.kind {
            NodeKind::DRegexp { .. } => {
                let last_line = self.node(node.span, NodeKind::GlobalVar("$_"));
                Ok(self.node(
                    node.span,
                    NodeKind::Match2 {
                        receiver: node,
                        value: last_line,
                    },
                ))
            }
            NodeKind::And { first, second } => {
                let first = self.cond0(first)?;
                let second = self.cond0(second)?;
                Ok(self.node(node.span, NodeKind::And { first, second }))
            }
            NodeKind::Or { first, second } => {
                let first = self.cond0(first)?;
                let second = self.cond0(second)?;
                Ok(self.node(node.span, NodeKind::Or { first, second }))
            }
            NodeKind::Dot { begin, end, exclusive } => {
                if begin.kind.is_literal() && end.kind.is_literal() {
                    self.warning_unless_inline(node.span, &messages::RANGE_LITERAL_IN_CONDITION);
                    return Ok(node);
                }
                self.flip_count += 1;
                let label = format!("%flip{}", self.flip_count);
                let (local, _) = self.scopes.local_scope(self.current);
                self.scopes.add_variable(local, &label);
                let location = self
                    .scopes
                    .is_defined(self.current, &label)
                    .unwrap_or_else(|| Location::new(0, 0));
                let begin = self.flip_condition(begin)?;
                let end = self.flip_condition(end)?;
                Ok(self.node(
                    node.span,
                    NodeKind::Flip {
                        begin,
                        end,
                        exclusive,
                        location,
                    },
                ))
            }
            NodeKind::Regexp { .. } => {
                self.warning_unless_inline(node.span, &messages::REGEX_LITERAL_IN_CONDITION);
                Ok(self.node(node.span, NodeKind::Match(node)))
            }
            _ => Ok(node),
        }
    }

    /// One end of a flip-flop. Only inline sources rewrite their ends as
    /// conditions, with an integer end comparing against `$.`.
    fn flip_condition(&mut self, node: NodeRef<'a>) -> SupportResult<NodeRef<'a>> {
        if !self.config.inline_source {
            return Ok(node);
        }
        let node = self.cond0(node.unwrap_newlines())?;
        if let NodeKind::Fixnum(_) = node.kind {
            let line_no = self.node(node.span, NodeKind::GlobalVar("$."));
            return self.operator_call(node, "==", line_no);
        }
        Ok(node)
    }

    /// Rewrite an expression used as a condition.
    pub fn cond(&mut self, node: Option<NodeRef<'a>>, span: SourceSpan) -> SupportResult<NodeRef<'a>> {
        let Some(node) = node else {
            return Ok(self.node(span, NodeKind::Nil));
        };
        if let NodeKind::Newline(inner) = node.kind {
            let inner = self.cond0(inner)?;
            return Ok(self.node(node.span, NodeKind::Newline(inner)));
        }
        self.cond0(node)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Add `stmt` to a statement list under construction.
    pub fn append_statement(&mut self, head: Value<'a>, stmt: Value<'a>, span: SourceSpan) -> Value<'a> {
        let Some(stmt) = self.opt_node(stmt) else {
            return head;
        };
        let stmt = self.newline_node(stmt);
        match head {
            Value::List(list_span, mut items) => {
                if let Some(last) = items.last() {
                    if is_break_statement(last) {
                        self.warning(stmt.span, &messages::STATEMENT_NOT_REACHED, &[]);
                    }
                }
                items.push(stmt);
                Value::List(list_span.union(&stmt.span), items)
            }
            Value::Node(node) => Value::List(node.span.union(&stmt.span), vec![node, stmt]),
            _ => Value::List(span.union(&stmt.span), vec![stmt]),
        }
    }

    /// A finished statement list: nothing, the only statement, or a block.
    pub fn finish_statements(&mut self, value: Value<'a>) -> Value<'a> {
        match value {
            Value::List(span, items) => match items.as_slice() {
                [] => Value::Empty,
                [single] => Value::Node(*single),
                all => {
                    for &stmt in &all[..all.len() - 1] {
                        self.check_useless_statement(stmt);
                    }
                    Value::Node(self.node(span, NodeKind::Block(self.list(all))))
                }
            },
            other => other,
        }
    }

    /// `head` followed by `tail` as one block.
    pub fn append_to_block(&mut self, head: Option<NodeRef<'a>>, tail: Option<NodeRef<'a>>) -> Option<NodeRef<'a>> {
        let (head, tail) = match (head, tail) {
            (None, tail) => return tail,
            (head, None) => return head,
            (Some(head), Some(tail)) => (head, tail),
        };
        let head = head.unwrap_newlines();
        let mut items = match head.kind {
            NodeKind::Block(items) => items.to_vec(),
            _ => vec![head],
        };
        if items.last().is_some_and(|last| is_break_statement(last)) {
            self.warning(tail.span, &messages::STATEMENT_NOT_REACHED, &[]);
        }
        match tail.kind {
            NodeKind::Block(more) => items.extend_from_slice(more),
            _ => items.push(tail),
        }
        Some(self.node(head.span.union(&tail.span), NodeKind::Block(self.list(&items))))
    }

    /// The root of the tree, with BEGIN blocks run first.
    pub fn add_root_node(&mut self, body: Option<NodeRef<'a>>, scope: ScopeId, span: SourceSpan) -> NodeRef<'a> {
        let body = if self.begin_nodes.is_empty() {
            body
        } else {
            let mut items = self.begin_nodes.clone();
            items.extend(body);
            let span = items
                .iter()
                .map(|n| n.span)
                .reduce(|a, b| a.union(&b))
                .unwrap_or(span);
            Some(self.node(span, NodeKind::Block(self.list(&items))))
        };
        let span = body.map_or(span, |b| b.span);
        self.node(span, NodeKind::Root { body, scope })
    }

    // ========================================================================
    // Strings
    // ========================================================================

    /// Join two adjacent pieces of a string literal.
    pub fn literal_concat(&self, head: Option<NodeRef<'a>>, tail: Option<NodeRef<'a>>) -> Option<NodeRef<'a>> {
        let (head, tail) = match (head, tail) {
            (None, tail) => return tail,
            (head, None) => return head,
            (Some(head), Some(tail)) => (head, tail),
        };
        let span = head.span.union(&tail.span);
        let parts = |node: NodeRef<'a>| -> Vec<NodeRef<'a>> {
            match node.kind {
                NodeKind::DStr(parts) => parts.to_vec(),
                _ => vec![node],
            }
        };
        let joined = match (head.kind, tail.kind) {
            (NodeKind::Str(a), NodeKind::Str(b)) => {
                return Some(self.node(span, NodeKind::Str(self.str(&format!("{a}{b}")))))
            }
            // An empty leading string adds nothing to an interpolation.
            (NodeKind::Str(""), NodeKind::EvStr(_)) => vec![tail],
            (NodeKind::Str(_), NodeKind::DStr(rest)) => {
                let mut all = vec![head];
                all.extend_from_slice(rest);
                all
            }
            _ => {
                let mut all = parts(head);
                all.extend(parts(tail));
                all
            }
        };
        Some(self.node(span, NodeKind::DStr(self.list(&joined))))
    }

    /// The node for `#{...}`; string pieces stand for themselves.
    pub fn new_evstr(&self, span: SourceSpan, node: Option<NodeRef<'a>>) -> NodeRef<'a> {
        if let Some(inner) = node.map(|n| n.unwrap_newlines()) {
            if matches!(inner.kind, NodeKind::Str(_) | NodeKind::DStr(_) | NodeKind::EvStr(_)) {
                return inner;
            }
        }
        self.node(span, NodeKind::EvStr(node.map(|n| n.unwrap_newlines())))
    }
}

fn is_regexp(node: NodeRef<'_>) -> bool {
    matches!(node.kind, NodeKind::Regexp { .. } | NodeKind::DRegexp { .. })
}

/// A jump that leaves the current expression.
pub fn is_break_statement(node: NodeRef<'_>) -> bool {
    matches!(
        node.unwrap_newlines().kind,
        NodeKind::Break(_) | NodeKind::Next(_) | NodeKind::Redo | NodeKind::Retry | NodeKind::Return(_)
    )
}

/// Whether evaluating `node` always jumps away instead of producing a value.
pub fn is_void_value(node: NodeRef<'_>) -> bool {
    let node = node.unwrap_newlines();
    match node.kind {
        NodeKind::Return(_) | NodeKind::Break(_) | NodeKind::Next(_) | NodeKind::Redo | NodeKind::Retry => true,
        NodeKind::Block(items) => items.last().is_some_and(|last| is_void_value(last)),
        NodeKind::Begin(Some(body)) => is_void_value(body),
        NodeKind::If {
            then_body: Some(then_body),
            else_body: Some(else_body),
            ..
        } => is_void_value(then_body) && is_void_value(else_body),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rbparse_core::StringInterner;
    use rbparse_diagnostics::Warnings;

    struct Fixture {
        arena: ParserArena,
        scopes: ScopeTable,
        config: ParserConfiguration,
        sink: Warnings,
        span: SourceSpan,
    }

    impl Fixture {
        fn new() -> Self {
            let interner = StringInterner::new();
            Self {
                arena: ParserArena::new(),
                scopes: ScopeTable::new(),
                config: ParserConfiguration::default(),
                sink: Warnings::new(true),
                span: SourceSpan::empty(interner.intern("t.rb"), 0, 0),
            }
        }
    }

    fn token(kind: TokenKind, name: &str, span: SourceSpan) -> Token {
        Token::new(kind, TokenValue::Name(name.to_string()), span)
    }

    #[test]
    fn test_literal_concat_merges_plain_strings() {
        let mut f = Fixture::new();
        let root = f.scopes.new_local(None);
        let support = ParserSupport::new(&f.arena, &mut f.scopes, root, &f.config, "t.rb", &mut f.sink);
        let a = support.node(f.span, NodeKind::Str("a"));
        let b = support.node(f.span, NodeKind::Str("b"));
        let joined = support.literal_concat(Some(a), Some(b)).unwrap();
        assert!(matches!(joined.kind, NodeKind::Str("ab")));
        assert!(support.literal_concat(None, Some(b)).is_some());
    }

    #[test]
    fn test_literal_concat_with_interpolation_builds_dstr() {
        let mut f = Fixture::new();
        let root = f.scopes.new_local(None);
        let support = ParserSupport::new(&f.arena, &mut f.scopes, root, &f.config, "t.rb", &mut f.sink);
        let a = support.node(f.span, NodeKind::Str("a"));
        let one = support.node(f.span, NodeKind::Fixnum(1));
        let ev = support.new_evstr(f.span, Some(one));
        let b = support.node(f.span, NodeKind::Str("b"));
        let head = support.literal_concat(Some(a), Some(ev));
        let all = support.literal_concat(head, Some(b)).unwrap();
        match all.kind {
            NodeKind::DStr(parts) => {
                assert_eq!(parts.len(), 3);
                assert!(matches!(parts[1].kind, NodeKind::EvStr(Some(Node { kind: NodeKind::Fixnum(1), .. }))));
            }
            other => panic!("expected dstr, got {other:?}"),
        }
    }

    #[test]
    fn test_gettable_falls_back_to_vcall() {
        let mut f = Fixture::new();
        let root = f.scopes.new_local(None);
        let span = f.span;
        let mut support = ParserSupport::new(&f.arena, &mut f.scopes, root, &f.config, "t.rb", &mut f.sink);
        let read = support.gettable(&token(TokenKind::Identifier, "x", span)).unwrap();
        assert!(matches!(read.kind, NodeKind::VCall("x")));
        support.assignable(&token(TokenKind::Identifier, "x", span)).unwrap();
        let read = support.gettable(&token(TokenKind::Identifier, "x", span)).unwrap();
        assert!(matches!(read.kind, NodeKind::LocalVar { name: "x", .. }));
    }

    #[test]
    fn test_assignable_rejects_keywords() {
        let mut f = Fixture::new();
        let root = f.scopes.new_local(None);
        let span = f.span;
        let mut support = ParserSupport::new(&f.arena, &mut f.scopes, root, &f.config, "t.rb", &mut f.sink);
        let err = support.assignable(&token(TokenKind::KSelf, "self", span)).unwrap_err();
        assert_eq!(err.pid, ProblemId::CannotChangeSelf);
        let err = support.assignable(&token(TokenKind::KNil, "nil", span)).unwrap_err();
        assert_eq!(err.message, "Can't assign to nil");
    }

    #[test]
    fn test_constant_assignment_in_method_is_dynamic() {
        let mut f = Fixture::new();
        let root = f.scopes.new_local(None);
        let span = f.span;
        let mut support = ParserSupport::new(&f.arena, &mut f.scopes, root, &f.config, "t.rb", &mut f.sink);
        support.in_def = true;
        let err = support.assignable(&token(TokenKind::Constant, "A", span)).unwrap_err();
        assert_eq!(err.pid, ProblemId::DynamicConstantAssignment);
        support.in_def = false;
        let node = support.assignable(&token(TokenKind::ClassVar, "@@a", span)).unwrap();
        assert!(matches!(node.kind, NodeKind::ClassVarDecl { .. }));
    }

    #[test]
    fn test_void_value_detection() {
        let f = Fixture::new();
        let ret = f.arena.alloc(Node::new(f.span, NodeKind::Return(None)));
        let one = f.arena.alloc(Node::new(f.span, NodeKind::Fixnum(1)));
        let items = f.arena.alloc_slice_copy(&[one as NodeRef<'_>, ret]);
        let block = f.arena.alloc(Node::new(f.span, NodeKind::Block(items)));
        assert!(is_void_value(block));
        assert!(!is_void_value(one));
        let half = f.arena.alloc(Node::new(
            f.span,
            NodeKind::If {
                condition: one,
                then_body: Some(ret),
                else_body: None,
            },
        ));
        assert!(!is_void_value(half));
    }

    #[test]
    fn test_condition_with_regexp_literal_matches_last_line() {
        let mut f = Fixture::new();
        let root = f.scopes.new_local(None);
        let span = f.span;
        let mut support = ParserSupport::new(&f.arena, &mut f.scopes, root, &f.config, "t.rb", &mut f.sink);
        let re = support.node(
            span,
            NodeKind::Regexp {
                source: "x",
                options: Default::default(),
            },
        );
        let cond = support.cond(Some(re), span).unwrap();
        assert!(matches!(cond.kind, NodeKind::Match(_)));
        let nil = support.cond(None, span).unwrap();
        assert!(matches!(nil.kind, NodeKind::Nil));
        drop(support);
        assert_eq!(f.sink.len(), 1);
    }

    #[test]
    fn test_flip_flop_takes_hidden_slot() {
        let mut f = Fixture::new();
        let root = f.scopes.new_local(None);
        let span = f.span;
        let mut support = ParserSupport::new(&f.arena, &mut f.scopes, root, &f.config, "t.rb", &mut f.sink);
        let a = support.node(span, NodeKind::VCall("a"));
        let b = support.node(span, NodeKind::VCall("b"));
        let dot = support.node(
            span,
            NodeKind::Dot {
                begin: a,
                end: b,
                exclusive: false,
            },
        );
        let flip = support.cond(Some(dot), span).unwrap();
        match flip.kind {
            NodeKind::Flip { location, .. } => assert_eq!(location, Location::new(0, 0)),
            other => panic!("expected flip, got {other:?}"),
        }
        drop(support);
        assert_eq!(f.scopes.get(root).variable_count(), 1);
    }
}
