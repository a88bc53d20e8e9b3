//! Semantic actions of the Ruby grammar.
//!
//! Each production of [`crate::rules::RUBY_GRAMMAR`] names one [`Act`];
//! `run_action` builds the value of its left-hand side from the values of
//! its right-hand side. Indexes into `rhs` follow the rule text, counting
//! mid-rule actions as symbols.

use crate::lalr::Rhs;
use crate::parser::RubyDriver;
use crate::rules::Act;
use crate::support::SupportResult;
use crate::value::{covering_span, Value};
use rbparse_ast::{NodeKind, NodeRef, RegexpOptions, TokenKind};
use rbparse_core::text::SourceSpan;
use rbparse_diagnostics::{messages, ProblemId, SyntaxError};
use rbparse_lexer::{LexState, Token, TokenValue};

type Values<'r, 'a> = Rhs<'r, Value<'a>>;

impl<'a, 's> RubyDriver<'a, 's> {
    pub(crate) fn run_action(&mut self, act: Act, mut rhs: Values<'_, 'a>) -> Result<Value<'a>, SyntaxError> {
        let span = covering_span((0..rhs.len()).map(|i| rhs.get(i))).unwrap_or_else(|| self.lexer.current_span());
        let rhs = &mut rhs;
        let value = match act {
            Act::Default => {
                if rhs.is_empty() {
                    Value::Empty
                } else {
                    rhs.take(0)
                }
            }
            Act::Empty => Value::Empty,
            Act::Second => rhs.take(1),

            // ================================================================
            // Program and statement lists
            // ================================================================
            Act::ProgramEnter => {
                self.lexer.set_state(LexState::Beg);
                Value::Empty
            }
            Act::Program => {
                let body = self.opt_at(rhs, 1);
                if let Some(body) = body {
                    if !self.support.config().eval_parse {
                        let last = match body.kind {
                            NodeKind::Block(items) => items.last().copied().unwrap_or(body),
                            _ => body,
                        };
                        self.support.check_useless_statement(last);
                    }
                }
                let scope = self.support.current_scope();
                Value::Node(self.support.add_root_node(body, scope, span))
            }
            Act::CompStmt => {
                let stmts = rhs.take(0);
                self.support.finish_statements(stmts)
            }
            Act::StmtsNone => Value::Empty,
            Act::StmtsOne => {
                let stmt = rhs.take(0);
                self.support.append_statement(Value::Empty, stmt, span)
            }
            Act::StmtsAppend => {
                let head = rhs.take(0);
                let stmt = rhs.take(2);
                self.support.append_statement(head, stmt, span)
            }
            Act::StmtsRecover => {
                let stmt = rhs.take(1);
                self.support.append_statement(Value::Empty, stmt, span)
            }
            Act::BodyStmt => self.body_stmt(rhs, span)?,

            // ================================================================
            // Statements
            // ================================================================
            Act::Fname => {
                self.lexer.set_state(LexState::Fname);
                Value::Empty
            }
            Act::Alias => {
                let new_name = self.name_at(rhs, 1);
                let old_name = self.name_at(rhs, 3);
                self.node(span, NodeKind::Alias { new_name, old_name })
            }
            Act::VAlias => {
                let new_name = self.name_at(rhs, 1);
                let old_name = self.name_at(rhs, 2);
                self.node(span, NodeKind::VAlias { new_name, old_name })
            }
            Act::VAliasNthRef => {
                return Err(self
                    .support
                    .error(ProblemId::NthRefAlias, span, &messages::NTH_REF_ALIAS, &[]))
            }
            Act::Undef => {
                let list = self.list_at(rhs, 1);
                match list.as_slice() {
                    [single] => Value::Node(*single),
                    all => self.node(span, NodeKind::Block(self.support.list(all))),
                }
            }
            Act::UndefFirst => {
                let name = self.name_at(rhs, 0);
                let undef = self.support.node(span, NodeKind::Undef(name));
                Value::List(span, vec![undef])
            }
            Act::UndefAppend => {
                let mut list = self.list_at(rhs, 0);
                let name = self.name_at(rhs, 3);
                let item_span = rhs.get(3).span().unwrap_or(span);
                list.push(self.support.node(item_span, NodeKind::Undef(name)));
                Value::List(span, list)
            }
            Act::IfMod | Act::UnlessMod => {
                let body = self.opt_at(rhs, 0);
                let condition = self.cond_at(rhs, 2, span)?;
                let (then_body, else_body) = if act == Act::IfMod { (body, None) } else { (None, body) };
                self.node(
                    span,
                    NodeKind::If {
                        condition,
                        then_body,
                        else_body,
                    },
                )
            }
            Act::WhileMod | Act::UntilMod => {
                let body = self.opt_at(rhs, 0);
                let condition = self.cond_at(rhs, 2, span)?;
                // `begin ... end while cond` runs its body before the first test.
                let (body, do_first) = match body.map(|b| b.unwrap_newlines().kind) {
                    Some(NodeKind::Begin(inner)) => (inner, true),
                    _ => (body, false),
                };
                let kind = if act == Act::WhileMod {
                    NodeKind::While {
                        condition,
                        body,
                        do_first,
                    }
                } else {
                    NodeKind::Until {
                        condition,
                        body,
                        do_first,
                    }
                };
                self.node(span, kind)
            }
            Act::RescueMod => {
                let body = self.opt_at(rhs, 0);
                let fallback = self.opt_at(rhs, 2);
                self.rescue_modifier(span, body, fallback)
            }
            Act::BeginEnter => {
                if self.support.in_method() {
                    return Err(self
                        .support
                        .error(ProblemId::BeginInMethod, span, &messages::BEGIN_IN_METHOD, &[]));
                }
                self.support.push_local_scope();
                Value::Empty
            }
            Act::BeginBlock => {
                let body = self.opt_at(rhs, 3);
                let scope = self.support.current_scope();
                self.support.pop_scope();
                let node = self.support.node(span, NodeKind::PreExe { body, scope });
                self.support.add_begin_node(node);
                Value::Empty
            }
            Act::EndBlock => {
                if self.support.in_method() {
                    return Err(self
                        .support
                        .error(ProblemId::EndInMethod, span, &messages::END_IN_METHOD, &[]));
                }
                let body = self.opt_at(rhs, 2);
                let scope = self.support.current_scope();
                let node = self.support.node(span, NodeKind::PostExe { body, scope });
                self.support.add_end_node(node);
                Value::Node(node)
            }

            // ================================================================
            // Assignment
            // ================================================================
            Act::Assign => {
                let lhs = self.node_at(rhs, 0, span)?;
                let value = self.node_at(rhs, 2, span)?;
                Value::Node(self.support.node_assign(lhs, value)?)
            }
            Act::AssignRescue => {
                let lhs = self.node_at(rhs, 0, span)?;
                let body = self.opt_at(rhs, 2);
                let fallback = self.opt_at(rhs, 4);
                let value_span = covering_span([rhs.get(2), rhs.get(4)]).unwrap_or(span);
                let value = self.rescue_modifier(value_span, body, fallback);
                let value = self.support.expect_node(value, span)?;
                Value::Node(self.support.node_assign(lhs, value)?)
            }
            Act::AssignSValue => {
                let lhs = self.node_at(rhs, 0, span)?;
                let value = self.node_at(rhs, 2, span)?;
                let value = self.support.node(value.span, NodeKind::SValue(value));
                Value::Node(self.support.node_assign(lhs, value)?)
            }
            Act::MultiAssignValue => {
                let lhs = self.node_at(rhs, 0, span)?;
                let value = self.node_at(rhs, 2, span)?;
                self.support.value_expr(value)?;
                let has_head = matches!(lhs.kind, NodeKind::MultipleAsgn { head: Some(_), .. });
                let value = if has_head {
                    self.support.node(value.span, NodeKind::ToAry(value))
                } else {
                    self.support.array(value.span, &[value])
                };
                Value::Node(self.support.with_value(lhs, value))
            }
            Act::MultiAssign => {
                let lhs = self.node_at(rhs, 0, span)?;
                let value = self.node_at(rhs, 2, span)?;
                Value::Node(self.support.with_value(lhs, value))
            }
            Act::OpAssign => {
                let target = self.node_at(rhs, 0, span)?;
                let op = self.name_at(rhs, 1);
                let value = self.node_at(rhs, 2, span)?;
                let read = self.support.gettable2(target);
                let kind = match op {
                    "||" => NodeKind::OpAsgnOr {
                        first: read,
                        second: self.support.with_value(target, value),
                    },
                    "&&" => NodeKind::OpAsgnAnd {
                        first: read,
                        second: self.support.with_value(target, value),
                    },
                    _ => {
                        let call = self.support.operator_call(read, op, value)?;
                        return Ok(Value::Node(self.support.with_value(target, call)));
                    }
                };
                self.node(span, kind)
            }
            Act::OpElementAssign => {
                let receiver = self.node_at(rhs, 0, span)?;
                let args = self.opt_at(rhs, 2);
                let operator = self.name_at(rhs, 4);
                let value = self.node_at(rhs, 5, span)?;
                self.support.value_expr(value)?;
                self.node(
                    span,
                    NodeKind::OpElementAsgn {
                        receiver,
                        args,
                        operator,
                        value,
                    },
                )
            }
            Act::OpAttrAssign => {
                let receiver = self.node_at(rhs, 0, span)?;
                let attribute = self.name_at(rhs, 2);
                let operator = self.name_at(rhs, 3);
                let value = self.node_at(rhs, 4, span)?;
                self.support.value_expr(value)?;
                self.node(
                    span,
                    NodeKind::OpAsgn {
                        receiver,
                        attribute,
                        operator,
                        value,
                    },
                )
            }
            Act::ConstReassign => {
                return Err(self.support.error(
                    ProblemId::ConstantReassignment,
                    span,
                    &messages::CONSTANT_REASSIGNMENT,
                    &[],
                ))
            }
            Act::BackrefAssign | Act::BackrefAssignError => {
                let node = self.node_at(rhs, 0, span)?;
                return Err(self.support.backref_assign_error(node));
            }
            Act::Assignable => {
                let token = self.token_at(rhs, 0, span)?;
                Value::Node(self.support.assignable(&token)?)
            }
            Act::AttrIndex => {
                let receiver = self.node_at(rhs, 0, span)?;
                let args = self.opt_at(rhs, 2);
                Value::Node(self.support.aryset(receiver, args)?)
            }
            Act::AttrSet => {
                let receiver = self.node_at(rhs, 0, span)?;
                let name = self.name_at(rhs, 2);
                Value::Node(self.support.attrset(receiver, name, span)?)
            }
            Act::ConstPath => {
                let left = self.node_at(rhs, 0, span)?;
                let name = self.name_at(rhs, 2);
                let path = self.support.node(span, NodeKind::Colon2 { left, name });
                Value::Node(self.support.const_path(span, name, path)?)
            }
            Act::ConstTop => {
                let name = self.name_at(rhs, 1);
                let path = self.support.node(span, NodeKind::Colon3(name));
                Value::Node(self.support.const_path(span, name, path)?)
            }

            // ================================================================
            // Multiple assignment targets
            // ================================================================
            Act::MlhsWrap => {
                let inner = self.node_at(rhs, 1, span)?;
                let head = Some(self.support.array(inner.span, &[inner]));
                self.multiple_asgn(span, head, None)
            }
            Act::MlhsHead => {
                let head = self.array_at(rhs, 0, span);
                self.multiple_asgn(span, Some(head), None)
            }
            Act::MlhsHeadItem => {
                let mut items = self.list_at(rhs, 0);
                items.push(self.node_at(rhs, 1, span)?);
                let head = self.support.array(span, &items);
                self.multiple_asgn(span, Some(head), None)
            }
            Act::MlhsHeadStar => {
                let head = self.array_at(rhs, 0, span);
                let rest = self.node_at(rhs, 2, span)?;
                self.multiple_asgn(span, Some(head), Some(rest))
            }
            Act::MlhsHeadStarAnon => {
                let head = self.array_at(rhs, 0, span);
                let star = self.star_at(rhs, 1, span);
                self.multiple_asgn(span, Some(head), Some(star))
            }
            Act::MlhsStar => {
                let rest = self.node_at(rhs, 1, span)?;
                self.multiple_asgn(span, None, Some(rest))
            }
            Act::MlhsStarAnon => {
                let star = self.star_at(rhs, 0, span);
                self.multiple_asgn(span, None, Some(star))
            }
            Act::ListNew => {
                let item = self.node_at(rhs, 0, span)?;
                Value::List(span, vec![item])
            }
            Act::MlhsAppend => {
                let mut items = self.list_at(rhs, 0);
                items.push(self.node_at(rhs, 1, span)?);
                Value::List(span, items)
            }
            Act::ArgsAppend => {
                let mut items = self.list_at(rhs, 0);
                items.push(self.node_at(rhs, 2, span)?);
                Value::List(span, items)
            }
            Act::ListConcat => {
                let mut items = self.list_at(rhs, 0);
                items.extend(self.list_at(rhs, 2));
                Value::List(span, items)
            }

            // ================================================================
            // Names and paths
            // ================================================================
            Act::ClassNameError => {
                return Err(self.support.error(
                    ProblemId::Syntax,
                    span,
                    &messages::CLASS_NAME_MUST_BE_CONSTANT,
                    &[],
                ))
            }
            Act::CpathTop => {
                let name = self.name_at(rhs, 1);
                self.node(span, NodeKind::Colon3(name))
            }
            Act::CpathName => {
                let name = self.name_at(rhs, 0);
                self.node(span, NodeKind::Const(name))
            }
            Act::CpathScoped => {
                let left = self.node_at(rhs, 0, span)?;
                let name = self.name_at(rhs, 2);
                self.node(span, NodeKind::Colon2 { left, name })
            }
            Act::FnameOp => {
                self.lexer.set_state(LexState::End);
                rhs.take(0)
            }

            // ================================================================
            // Expressions
            // ================================================================
            Act::And => {
                let first = self.node_at(rhs, 0, span)?;
                let second = self.node_at(rhs, 2, span)?;
                Value::Node(self.support.new_and(first, second)?)
            }
            Act::Or => {
                let first = self.node_at(rhs, 0, span)?;
                let second = self.node_at(rhs, 2, span)?;
                Value::Node(self.support.new_or(first, second)?)
            }
            Act::Not => {
                let operand = self.cond_at(rhs, 1, span)?;
                self.node(span, NodeKind::Not(operand))
            }
            Act::ExprValue | Act::ArgValue => {
                let node = self.node_at(rhs, 0, span)?;
                self.support.value_expr(node)?;
                Value::Node(node)
            }
            Act::PrimaryValue => {
                // `()` is a primary without a node; it reads as nil.
                let node = match self.opt_at(rhs, 0) {
                    Some(node) => node,
                    None => self.support.node(span, NodeKind::Nil),
                };
                self.support.value_expr(node)?;
                Value::Node(node)
            }
            Act::Dot2 | Act::Dot3 => {
                let begin = self.node_at(rhs, 0, span)?;
                let end = self.node_at(rhs, 2, span)?;
                self.support.value_expr(begin)?;
                self.support.value_expr(end)?;
                self.node(
                    span,
                    NodeKind::Dot {
                        begin,
                        end,
                        exclusive: act == Act::Dot3,
                    },
                )
            }
            Act::BinOp => {
                let a = self.node_at(rhs, 0, span)?;
                let op = self.name_at(rhs, 1);
                let b = self.node_at(rhs, 2, span)?;
                Value::Node(self.support.operator_call(a, op, b)?)
            }
            Act::NegPow => {
                let token = self.token_at(rhs, 1, span)?;
                let literal = self.support.node(token.span, self.numeric(&token, false));
                let exponent = self.node_at(rhs, 3, span)?;
                let power = self.support.operator_call(literal, "**", exponent)?;
                Value::Node(self.support.unary_call(span, power, "-@")?)
            }
            Act::UPlus => {
                let operand = self.node_at(rhs, 1, span)?;
                if matches!(
                    operand.kind,
                    NodeKind::Fixnum(_) | NodeKind::Bignum { .. } | NodeKind::Float(_)
                ) {
                    Value::Node(operand)
                } else {
                    Value::Node(self.support.unary_call(span, operand, "+@")?)
                }
            }
            Act::UMinus => {
                let operand = self.node_at(rhs, 1, span)?;
                Value::Node(self.support.unary_call(span, operand, "-@")?)
            }
            Act::UnaryOp => {
                let operand = self.node_at(rhs, 1, span)?;
                Value::Node(self.support.unary_call(span, operand, "~")?)
            }
            Act::Neq => {
                let a = self.node_at(rhs, 0, span)?;
                let b = self.node_at(rhs, 2, span)?;
                let eq = self.support.operator_call(a, "==", b)?;
                self.node(span, NodeKind::Not(eq))
            }
            Act::MatchOp => {
                let a = self.node_at(rhs, 0, span)?;
                let b = self.node_at(rhs, 2, span)?;
                Value::Node(self.support.match_node(a, b)?)
            }
            Act::NMatch => {
                let a = self.node_at(rhs, 0, span)?;
                let b = self.node_at(rhs, 2, span)?;
                let matched = self.support.match_node(a, b)?;
                self.node(span, NodeKind::Not(matched))
            }
            Act::Defined => {
                let operand = self.node_at(rhs, 2, span)?;
                self.node(span, NodeKind::Defined(operand))
            }
            Act::DefinedParen => {
                let operand = self.node_at(rhs, 3, span)?;
                self.node(span, NodeKind::Defined(operand))
            }
            Act::Ternary => {
                let condition = self.cond_at(rhs, 0, span)?;
                let then_body = self.opt_at(rhs, 2);
                let else_body = self.opt_at(rhs, 4);
                self.node(
                    span,
                    NodeKind::If {
                        condition,
                        then_body,
                        else_body,
                    },
                )
            }

            // ================================================================
            // Jumps
            // ================================================================
            Act::ReturnArgs => {
                let value = self.support.ret_args(rhs.take(1), span)?;
                self.node(span, NodeKind::Return(value))
            }
            Act::BreakArgs => {
                let value = self.support.ret_args(rhs.take(1), span)?;
                self.node(span, NodeKind::Break(value))
            }
            Act::NextArgs => {
                let value = self.support.ret_args(rhs.take(1), span)?;
                self.node(span, NodeKind::Next(value))
            }
            Act::ReturnBare => self.node(span, NodeKind::Return(None)),
            Act::BreakBare => self.node(span, NodeKind::Break(None)),
            Act::NextBare => self.node(span, NodeKind::Next(None)),
            Act::Redo => self.node(span, NodeKind::Redo),
            Act::Retry => self.node(span, NodeKind::Retry),

            // ================================================================
            // Calls
            // ================================================================
            Act::CallArgs => {
                let receiver = self.node_at(rhs, 0, span)?;
                let name = self.name_at(rhs, 2);
                let args = rhs.take(3);
                Value::Node(self.support.new_call(span, receiver, name, args, None)?)
            }
            Act::CallArgsBlock => {
                let receiver = self.node_at(rhs, 0, span)?;
                let name = self.name_at(rhs, 2);
                let args = rhs.take(3);
                let iter = self.opt_at(rhs, 4);
                Value::Node(self.support.new_call(span, receiver, name, args, iter)?)
            }
            Act::CallNoArgs => {
                let receiver = self.node_at(rhs, 0, span)?;
                let name = self.name_at(rhs, 2);
                Value::Node(self.support.new_call(span, receiver, name, Value::Empty, None)?)
            }
            Act::FCallArgs => {
                let name = self.name_at(rhs, 0);
                let args = rhs.take(1);
                Value::Node(self.support.new_fcall(span, name, args, None)?)
            }
            Act::FCallArgsBlock => {
                let name = self.name_at(rhs, 0);
                let args = rhs.take(1);
                let iter = self.opt_at(rhs, 2);
                Value::Node(self.support.new_fcall(span, name, args, iter)?)
            }
            Act::FCallBlock => {
                let name = self.name_at(rhs, 0);
                let iter = self.opt_at(rhs, 1);
                Value::Node(self.support.new_fcall(span, name, Value::Empty, iter)?)
            }
            Act::FidCall => {
                let name = self.name_at(rhs, 0);
                Value::Node(self.support.new_fcall(span, name, Value::Empty, None)?)
            }
            Act::SuperArgs => {
                let args = rhs.take(1);
                Value::Node(self.support.new_super(span, args, None)?)
            }
            Act::ZSuper => self.node(span, NodeKind::ZSuper { iter: None }),
            Act::YieldArgs => {
                let args = rhs.take(1);
                Value::Node(self.support.new_yield(span, args)?)
            }
            Act::YieldParen => {
                let args = rhs.take(2);
                Value::Node(self.support.new_yield(span, args)?)
            }
            Act::YieldBare => self.node(
                span,
                NodeKind::Yield {
                    args: None,
                    expand: false,
                },
            ),
            Act::MethodCallBlock | Act::CommandDoBlock => {
                let call = self.node_at(rhs, 0, span)?;
                let iter = self.node_at(rhs, 1, span)?;
                Value::Node(self.support.attach_block(call, iter)?)
            }
            Act::Aref => {
                let receiver = self.node_at(rhs, 0, span)?;
                let args = rhs.take(2);
                if matches!(receiver.kind, NodeKind::SelfRef) {
                    Value::Node(self.support.new_fcall(span, "[]", args, None)?)
                } else {
                    Value::Node(self.support.new_call(span, receiver, "[]", args, None)?)
                }
            }

            // ================================================================
            // Blocks
            // ================================================================
            Act::BlockEnter => {
                self.support.push_block_scope();
                self.support.in_block_params = true;
                Value::Empty
            }
            Act::BlockVarNone => {
                self.support.in_block_params = false;
                Value::Empty
            }
            Act::BlockVarZero => {
                self.support.in_block_params = false;
                self.node(span, NodeKind::ZeroArg)
            }
            Act::BlockVarSecond => {
                self.support.in_block_params = false;
                rhs.take(1)
            }
            Act::BraceBlock => {
                let var = self.opt_at(rhs, 2);
                let body = self.opt_at(rhs, 3);
                let scope = self.support.current_scope();
                self.support.pop_scope();
                self.node(span, NodeKind::Iter { var, body, scope })
            }

            // ================================================================
            // Argument lists
            // ================================================================
            Act::ArefCommand => {
                let command = self.node_at(rhs, 0, span)?;
                self.support.warn(span, &messages::PARENTHESIZE_ARGUMENTS, &[]);
                Value::List(span, vec![command])
            }
            Act::ArefSplat => {
                let head = self.array_at(rhs, 0, span);
                let splat = self.node_at(rhs, 3, span)?;
                self.support.value_expr(splat)?;
                self.node(span, NodeKind::ArgsCat { first: head, second: splat })
            }
            Act::ArefAssocs => {
                let hash = self.hash_at(rhs, 0, span);
                Value::List(span, vec![hash])
            }
            Act::ArefStar => {
                let splat = self.node_at(rhs, 1, span)?;
                self.support.value_expr(splat)?;
                self.node(span, NodeKind::Splat(splat))
            }
            Act::ParenBlockCall => {
                let call = self.node_at(rhs, 1, span)?;
                self.support.warn(span, &messages::PARENTHESIZE_ARGUMENTS, &[]);
                Value::List(span, vec![call])
            }
            Act::ParenArgsBlockCall => {
                let mut items = self.list_at(rhs, 1);
                items.push(self.node_at(rhs, 3, span)?);
                self.support.warn(span, &messages::PARENTHESIZE_ARGUMENTS, &[]);
                Value::List(span, items)
            }
            Act::CallArgsCommand => {
                let command = self.node_at(rhs, 0, span)?;
                self.support.warn(span, &messages::PARENTHESIZE_ARGUMENTS, &[]);
                Value::List(span, vec![command])
            }
            Act::ArgsBlockPass => {
                let items = self.list_at(rhs, 0);
                let block = rhs.take(1);
                self.support.call_args(span, &items, None, block)?
            }
            Act::ArgsSplatBlockPass => {
                let items = self.list_at(rhs, 0);
                let splat = self.opt_at(rhs, 3);
                let block = rhs.take(4);
                self.support.call_args(span, &items, splat, block)?
            }
            Act::AssocsBlockPass => {
                let hash = self.hash_at(rhs, 0, span);
                let block = rhs.take(1);
                self.support.call_args(span, &[hash], None, block)?
            }
            Act::AssocsSplatBlockPass => {
                let hash = self.hash_at(rhs, 0, span);
                let splat = self.opt_at(rhs, 3);
                let block = rhs.take(4);
                self.support.call_args(span, &[hash], splat, block)?
            }
            Act::ArgsAssocsBlockPass => {
                let mut items = self.list_at(rhs, 0);
                items.push(self.hash_at(rhs, 2, span));
                let block = rhs.take(3);
                self.support.call_args(span, &items, None, block)?
            }
            Act::ArgsAssocsSplatBlockPass => {
                let mut items = self.list_at(rhs, 0);
                items.push(self.hash_at(rhs, 2, span));
                let splat = self.opt_at(rhs, 5);
                let block = rhs.take(6);
                self.support.call_args(span, &items, splat, block)?
            }
            Act::SplatBlockPass => {
                let splat = self.opt_at(rhs, 1);
                let block = rhs.take(2);
                self.support.call_args(span, &[], splat, block)?
            }
            Act::BlockArgOnly => {
                let block = self.node_at(rhs, 0, span)?;
                Value::CallArgs { args: None, block }
            }
            Act::Args2BlockPass => {
                let mut items = vec![self.node_at(rhs, 0, span)?];
                items.extend(self.list_at(rhs, 2));
                let block = rhs.take(3);
                self.support.call_args(span, &items, None, block)?
            }
            Act::Arg2Block => {
                let first = self.node_at(rhs, 0, span)?;
                let block = rhs.take(2);
                self.support.call_args(span, &[first], None, block)?
            }
            Act::Arg2SplatBlockPass => {
                let first = self.node_at(rhs, 0, span)?;
                let splat = self.opt_at(rhs, 3);
                let block = rhs.take(4);
                self.support.call_args(span, &[first], splat, block)?
            }
            Act::Args2SplatBlockPass => {
                let mut items = vec![self.node_at(rhs, 0, span)?];
                items.extend(self.list_at(rhs, 2));
                let splat = self.opt_at(rhs, 5);
                let block = rhs.take(6);
                self.support.call_args(span, &items, splat, block)?
            }
            Act::Arg2AssocsBlockPass => {
                let items = vec![self.node_at(rhs, 0, span)?, self.hash_at(rhs, 2, span)];
                let block = rhs.take(3);
                self.support.call_args(span, &items, None, block)?
            }
            Act::Args2AssocsBlockPass => {
                let mut items = vec![self.node_at(rhs, 0, span)?];
                items.extend(self.list_at(rhs, 2));
                items.push(self.hash_at(rhs, 4, span));
                let block = rhs.take(5);
                self.support.call_args(span, &items, None, block)?
            }
            Act::Arg2AssocsSplatBlockPass => {
                let items = vec![self.node_at(rhs, 0, span)?, self.hash_at(rhs, 2, span)];
                let splat = self.opt_at(rhs, 5);
                let block = rhs.take(6);
                self.support.call_args(span, &items, splat, block)?
            }
            Act::Args2AssocsSplatBlockPass => {
                let mut items = vec![self.node_at(rhs, 0, span)?];
                items.extend(self.list_at(rhs, 2));
                items.push(self.hash_at(rhs, 4, span));
                let splat = self.opt_at(rhs, 7);
                let block = rhs.take(8);
                self.support.call_args(span, &items, splat, block)?
            }
            Act::BlockArg => {
                let body = self.node_at(rhs, 1, span)?;
                self.node(span, NodeKind::BlockPass { body })
            }
            Act::CmdargPush => {
                let saved = self.lexer.cmdarg_state();
                self.lexer.cmdarg_push(true);
                Value::Int(saved as i64)
            }
            Act::CommandArgs => {
                let saved = rhs.get(0).int();
                self.lexer.set_cmdarg_state(saved as u64);
                rhs.take(1)
            }
            Act::EndArg => {
                self.lexer.set_state(LexState::EndArg);
                Value::Empty
            }
            Act::OpenArgsEmpty => {
                self.support.warn(span, &messages::SPACE_BEFORE_PARENTHESES, &[]);
                Value::Empty
            }
            Act::OpenArgsParen => {
                self.support.warn(span, &messages::SPACE_BEFORE_PARENTHESES, &[]);
                rhs.take(1)
            }
            Act::ArgsSplat => {
                let head = self.array_at(rhs, 0, span);
                let splat = self.node_at(rhs, 3, span)?;
                self.support.value_expr(splat)?;
                self.node(span, NodeKind::ArgsCat { first: head, second: splat })
            }
            Act::Splat => {
                let splat = self.node_at(rhs, 1, span)?;
                self.support.value_expr(splat)?;
                self.node(span, NodeKind::Splat(splat))
            }

            // ================================================================
            // Primaries
            // ================================================================
            Act::BeginBody => {
                let body = self.opt_at(rhs, 1);
                self.node(span, NodeKind::Begin(body))
            }
            Act::GroupedExpr => {
                self.support.warning(span, &messages::GROUPED_EXPRESSION, &[]);
                rhs.take(1)
            }
            Act::Colon2 => {
                let left = self.node_at(rhs, 0, span)?;
                let name = self.name_at(rhs, 2);
                self.node(span, NodeKind::Colon2 { left, name })
            }
            Act::Colon3 => {
                let name = self.name_at(rhs, 1);
                self.node(span, NodeKind::Colon3(name))
            }
            Act::ArrayLiteral => match rhs.take(1) {
                Value::Empty => self.node(span, NodeKind::ZArray),
                Value::List(_, items) => Value::Node(self.support.array(span, &items)),
                other => other,
            },
            Act::HashLiteral => {
                let hash = self.hash_at(rhs, 1, span);
                Value::Node(hash)
            }
            Act::If | Act::Elsif => {
                let condition = self.cond_at(rhs, 1, span)?;
                let then_body = self.opt_at(rhs, 3);
                let else_body = self.opt_at(rhs, 4);
                self.node(
                    span,
                    NodeKind::If {
                        condition,
                        then_body,
                        else_body,
                    },
                )
            }
            Act::Unless => {
                let condition = self.cond_at(rhs, 1, span)?;
                let else_body = self.opt_at(rhs, 3);
                let then_body = self.opt_at(rhs, 4);
                self.node(
                    span,
                    NodeKind::If {
                        condition,
                        then_body,
                        else_body,
                    },
                )
            }
            Act::CondPush => {
                self.lexer.cond_push(true);
                Value::Empty
            }
            Act::CondPop => {
                self.lexer.cond_pop();
                Value::Empty
            }
            Act::While | Act::Until => {
                let condition = self.cond_at(rhs, 2, span)?;
                let body = self.opt_at(rhs, 5);
                let kind = if act == Act::While {
                    NodeKind::While {
                        condition,
                        body,
                        do_first: false,
                    }
                } else {
                    NodeKind::Until {
                        condition,
                        body,
                        do_first: false,
                    }
                };
                self.node(span, kind)
            }
            Act::Case => {
                let subject = self.opt_at(rhs, 1);
                let first_when = self.opt_at(rhs, 3);
                self.node(span, NodeKind::Case { subject, first_when })
            }
            Act::CaseNoSubject => {
                let first_when = self.opt_at(rhs, 2);
                self.node(
                    span,
                    NodeKind::Case {
                        subject: None,
                        first_when,
                    },
                )
            }
            Act::CaseElseOnly => rhs.take(3),
            Act::When => {
                let expressions = self.array_at(rhs, 1, span);
                let body = self.opt_at(rhs, 3);
                let next = self.opt_at(rhs, 4);
                self.node(
                    span,
                    NodeKind::When {
                        expressions,
                        body,
                        next,
                    },
                )
            }
            Act::WhenArgsSplat => {
                let mut items = self.list_at(rhs, 0);
                let splat = self.node_at(rhs, 3, span)?;
                items.push(self.support.node(splat.span, NodeKind::Splat(splat)));
                Value::List(span, items)
            }
            Act::WhenSplat => {
                let splat = self.node_at(rhs, 1, span)?;
                let splat = self.support.node(splat.span, NodeKind::Splat(splat));
                Value::List(span, vec![splat])
            }
            Act::For => {
                let var = self.node_at(rhs, 1, span)?;
                let iter = self.node_at(rhs, 4, span)?;
                let body = self.opt_at(rhs, 7);
                self.node(span, NodeKind::For { var, body, iter })
            }
            Act::RescueClause => {
                let exceptions = self.opt_at(rhs, 1);
                let var = self.opt_at(rhs, 2);
                let body = self.opt_at(rhs, 4);
                let next = self.opt_at(rhs, 5);
                let body = match var {
                    Some(var) => {
                        let error_info = self.support.node(var.span, NodeKind::GlobalVar("$!"));
                        let assign = self.support.node_assign(var, error_info)?;
                        self.support.append_to_block(Some(assign), body)
                    }
                    None => body,
                };
                self.node(
                    span,
                    NodeKind::RescueBody {
                        exceptions,
                        body,
                        next,
                    },
                )
            }

            // ================================================================
            // Definitions
            // ================================================================
            Act::ClassEnter => {
                if self.support.in_method() {
                    return Err(self.support.error(
                        ProblemId::ClassInMethod,
                        span,
                        &messages::CLASS_DEFINITION_IN_METHOD,
                        &[],
                    ));
                }
                self.support.class_nest += 1;
                self.support.push_local_scope();
                Value::Empty
            }
            Act::Class => {
                let cpath = self.node_at(rhs, 1, span)?;
                let superclass = self.opt_at(rhs, 2);
                let body = self.opt_at(rhs, 4);
                let scope = self.close_class_scope();
                self.node(
                    span,
                    NodeKind::Class {
                        cpath,
                        superclass,
                        body,
                        scope,
                    },
                )
            }
            Act::Superclass => rhs.take(2),
            Act::SClassSaveDef => {
                let saved = self.support.in_def;
                self.support.in_def = false;
                Value::Int(i64::from(saved))
            }
            Act::SClassEnter => {
                let saved = self.support.in_single;
                self.support.in_single = 0;
                self.support.class_nest += 1;
                self.support.push_local_scope();
                Value::Int(i64::from(saved))
            }
            Act::SClass => {
                let receiver = self.node_at(rhs, 2, span)?;
                let body = self.opt_at(rhs, 6);
                let scope = self.close_class_scope();
                self.support.in_def = rhs.get(3).int() != 0;
                self.support.in_single = rhs.get(5).int() as u32;
                self.node(span, NodeKind::SClass { receiver, body, scope })
            }
            Act::ModuleEnter => {
                if self.support.in_method() {
                    return Err(self.support.error(
                        ProblemId::ModuleInMethod,
                        span,
                        &messages::MODULE_DEFINITION_IN_METHOD,
                        &[],
                    ));
                }
                self.support.class_nest += 1;
                self.support.push_local_scope();
                Value::Empty
            }
            Act::Module => {
                let cpath = self.node_at(rhs, 1, span)?;
                let body = self.opt_at(rhs, 3);
                let scope = self.close_class_scope();
                self.node(span, NodeKind::Module { cpath, body, scope })
            }
            Act::DefEnter => {
                let saved = self.support.in_def;
                self.support.in_def = true;
                self.support.push_local_scope();
                Value::Int(i64::from(saved))
            }
            Act::Def => {
                let name = self.name_at(rhs, 1);
                let args = self.node_at(rhs, 3, span)?;
                let body = self.opt_at(rhs, 4);
                let scope = self.support.current_scope();
                self.support.pop_scope();
                self.support.in_def = rhs.get(2).int() != 0;
                self.node(
                    span,
                    NodeKind::Defn {
                        name,
                        args,
                        body,
                        scope,
                    },
                )
            }
            Act::DefsEnter => {
                self.support.in_single += 1;
                self.lexer.set_state(LexState::End);
                self.support.push_local_scope();
                Value::Empty
            }
            Act::Defs => {
                let receiver = self.node_at(rhs, 1, span)?;
                let name = self.name_at(rhs, 4);
                let args = self.node_at(rhs, 6, span)?;
                let body = self.opt_at(rhs, 7);
                let scope = self.support.current_scope();
                self.support.pop_scope();
                self.support.in_single = self.support.in_single.saturating_sub(1);
                self.node(
                    span,
                    NodeKind::Defs {
                        receiver,
                        name,
                        args,
                        body,
                        scope,
                    },
                )
            }
            Act::Singleton => {
                let node = self.node_at(rhs, 0, span)?;
                self.support.value_expr(node)?;
                Value::Node(node)
            }
            Act::SingletonExpr => {
                let Some(node) = self.opt_at(rhs, 2) else {
                    return Err(self.support.error(
                        ProblemId::SingletonLiteral,
                        span,
                        &messages::SINGLETON_FOR_EMPTY,
                        &[],
                    ));
                };
                if is_singleton_literal(node) {
                    return Err(self.support.error(
                        ProblemId::SingletonLiteral,
                        span,
                        &messages::SINGLETON_FOR_LITERAL,
                        &[],
                    ));
                }
                self.support.value_expr(node)?;
                Value::Node(node)
            }

            // ================================================================
            // Formal parameters
            // ================================================================
            Act::ParenArgs => {
                self.lexer.set_state(LexState::Beg);
                rhs.take(1)
            }
            Act::ArgsFull => {
                let pre = self.list_at(rhs, 0);
                let optional = self.list_at(rhs, 2);
                let rest = rhs.get(4).int();
                let block = self.opt_at(rhs, 5);
                self.new_args(span, &pre, &optional, rest, block)
            }
            Act::ArgsPreOpt => {
                let pre = self.list_at(rhs, 0);
                let optional = self.list_at(rhs, 2);
                let block = self.opt_at(rhs, 3);
                self.new_args(span, &pre, &optional, -1, block)
            }
            Act::ArgsPreRest => {
                let pre = self.list_at(rhs, 0);
                let rest = rhs.get(2).int();
                let block = self.opt_at(rhs, 3);
                self.new_args(span, &pre, &[], rest, block)
            }
            Act::ArgsPre => {
                let pre = self.list_at(rhs, 0);
                let block = self.opt_at(rhs, 1);
                self.new_args(span, &pre, &[], -1, block)
            }
            Act::ArgsOptRest => {
                let optional = self.list_at(rhs, 0);
                let rest = rhs.get(2).int();
                let block = self.opt_at(rhs, 3);
                self.new_args(span, &[], &optional, rest, block)
            }
            Act::ArgsOpt => {
                let optional = self.list_at(rhs, 0);
                let block = self.opt_at(rhs, 1);
                self.new_args(span, &[], &optional, -1, block)
            }
            Act::ArgsRest => {
                let rest = rhs.get(0).int();
                let block = self.opt_at(rhs, 1);
                self.new_args(span, &[], &[], rest, block)
            }
            Act::ArgsBlock => {
                let block = self.opt_at(rhs, 0);
                self.new_args(span, &[], &[], -1, block)
            }
            Act::ArgsEmpty => self.new_args(span, &[], &[], -1, None),
            Act::FormalConstant => {
                return Err(self.formal_error(span, &messages::FORMAL_ARGUMENT_CONSTANT))
            }
            Act::FormalIvar => return Err(self.formal_error(span, &messages::FORMAL_ARGUMENT_IVAR)),
            Act::FormalGvar => return Err(self.formal_error(span, &messages::FORMAL_ARGUMENT_GVAR)),
            Act::FormalCvar => return Err(self.formal_error(span, &messages::FORMAL_ARGUMENT_CVAR)),
            Act::FormalArg => {
                let name = self.name_at(rhs, 0);
                let index = self.support.formal_argument(name, span)?;
                self.node(span, NodeKind::Argument { name, index })
            }
            Act::OptArg => {
                let token = self.token_at(rhs, 0, span)?;
                if self.support.scopes().exists(self.support.current_scope(), token.name()).is_some() {
                    return Err(self.support.error(
                        ProblemId::DuplicateArgumentName,
                        token.span,
                        &messages::DUPLICATED_ARGUMENT_NAME,
                        &[],
                    ));
                }
                let target = self.support.assignable(&token)?;
                let value = self.node_at(rhs, 2, span)?;
                Value::Node(self.support.with_value(target, value))
            }
            Act::RestArg => {
                let name = self.name_at(rhs, 1);
                let slot = self.support.formal_argument(name, span)?;
                Value::Int(i64::from(slot))
            }
            Act::RestAnon => Value::Int(-2),
            Act::BlockParam => {
                let name = self.name_at(rhs, 1);
                let index = self.support.formal_argument(name, span)?;
                self.node(span, NodeKind::BlockArg { name, index })
            }

            // ================================================================
            // Hashes
            // ================================================================
            Act::AssocArgs => {
                let items = self.list_at(rhs, 0);
                if items.len() % 2 != 0 {
                    return Err(self.support.error(
                        ProblemId::OddHashList,
                        span,
                        &messages::ODD_NUMBER_LIST_FOR_HASH,
                        &[],
                    ));
                }
                Value::List(span, items)
            }
            Act::Assoc => {
                let key = self.node_at(rhs, 0, span)?;
                let value = self.node_at(rhs, 2, span)?;
                Value::List(span, vec![key, value])
            }

            // ================================================================
            // Strings and literals
            // ================================================================
            Act::Strings => match self.opt_at(rhs, 0) {
                None => self.node(span, NodeKind::Str("")),
                Some(node) if matches!(node.kind, NodeKind::EvStr(_)) => {
                    self.node(span, NodeKind::DStr(self.support.list(&[node])))
                }
                Some(node) => Value::Node(node),
            },
            Act::LiteralConcat => {
                let head = self.opt_at(rhs, 0);
                let tail = self.opt_at(rhs, 1);
                self.support.literal_concat(head, tail).map_or(Value::Empty, Value::Node)
            }
            Act::XString => match self.opt_at(rhs, 1) {
                None => self.node(span, NodeKind::XStr("")),
                Some(node) => match node.kind {
                    NodeKind::Str(text) => self.node(span, NodeKind::XStr(text)),
                    NodeKind::DStr(parts) => self.node(span, NodeKind::DXStr(parts)),
                    _ => self.node(span, NodeKind::DXStr(self.support.list(&[node]))),
                },
            },
            Act::Regexp => {
                let contents = self.opt_at(rhs, 1);
                let options = match rhs.get(2) {
                    Value::Token(Token {
                        value: TokenValue::RegexpOptions(options),
                        ..
                    }) => *options,
                    _ => RegexpOptions::empty(),
                };
                let once = options.contains(RegexpOptions::ONCE);
                let kind = match contents {
                    None => NodeKind::Regexp { source: "", options },
                    Some(node) => match node.kind {
                        NodeKind::Str(source) => NodeKind::Regexp { source, options },
                        NodeKind::DStr(parts) => NodeKind::DRegexp { parts, options, once },
                        _ => NodeKind::DRegexp {
                            parts: self.support.list(&[node]),
                            options,
                            once,
                        },
                    },
                };
                self.node(span, kind)
            }
            Act::EmptyArray => self.node(span, NodeKind::ZArray),
            Act::Words => match rhs.take(1) {
                Value::List(_, items) if !items.is_empty() => Value::Node(self.support.array(span, &items)),
                _ => self.node(span, NodeKind::ZArray),
            },
            Act::WordAppend => {
                let mut items = self.list_at(rhs, 0);
                if let Some(word) = self.opt_at(rhs, 1) {
                    let word = match word.kind {
                        NodeKind::EvStr(_) => self.support.node(word.span, NodeKind::DStr(self.support.list(&[word]))),
                        _ => word,
                    };
                    items.push(word);
                }
                Value::List(span, items)
            }
            Act::QWordAppend => {
                let mut items = self.list_at(rhs, 0);
                let token = self.token_at(rhs, 1, span)?;
                let text = self.support.str(token.text().unwrap_or_default());
                items.push(self.support.node(token.span, NodeKind::Str(text)));
                Value::List(span, items)
            }
            Act::StrContent => {
                let token = self.token_at(rhs, 0, span)?;
                let text = self.support.str(token.text().unwrap_or_default());
                self.node(span, NodeKind::Str(text))
            }
            Act::DVarEnter => {
                let term = self.lexer.take_str_term();
                self.lexer.set_state(LexState::Beg);
                Value::StrTerm(term)
            }
            Act::DVarEnd => {
                self.restore_str_term(rhs, 1);
                let node = self.opt_at(rhs, 2);
                self.node(span, NodeKind::EvStr(node))
            }
            Act::DBegEnter => {
                let term = self.lexer.take_str_term();
                self.lexer.set_state(LexState::Beg);
                self.lexer.cond_push(false);
                self.lexer.cmdarg_push(false);
                Value::StrTerm(term)
            }
            Act::DBegEnd => {
                self.restore_str_term(rhs, 1);
                self.lexer.cond_lexpop();
                self.lexer.cmdarg_lexpop();
                let body = self.opt_at(rhs, 2);
                Value::Node(self.support.new_evstr(span, body))
            }
            Act::VarRef => {
                let token = self.token_at(rhs, 0, span)?;
                Value::Node(self.support.gettable(&token)?)
            }
            Act::Symbol => {
                self.lexer.set_state(LexState::End);
                let name = self.name_at(rhs, 1);
                self.node(span, NodeKind::Symbol(name))
            }
            Act::DSymbol => {
                self.lexer.set_state(LexState::End);
                let kind = match self.opt_at(rhs, 1) {
                    None
                    | Some(rbparse_ast::Node {
                        kind: NodeKind::Str(""),
                        ..
                    }) => {
                        return Err(self.support.error(
                            ProblemId::Syntax,
                            span,
                            &messages::EMPTY_SYMBOL_LITERAL,
                            &[],
                        ))
                    }
                    Some(node) => match node.kind {
                        NodeKind::Str(name) => NodeKind::Symbol(name),
                        NodeKind::DStr(parts) => NodeKind::DSymbol(parts),
                        _ => NodeKind::DSymbol(self.support.list(&[node])),
                    },
                };
                self.node(span, kind)
            }
            Act::IntLiteral | Act::FloatLiteral => {
                let token = self.token_at(rhs, 0, span)?;
                self.node(span, self.numeric(&token, false))
            }
            Act::NegInt | Act::NegFloat => {
                let token = self.token_at(rhs, 1, span)?;
                self.node(span, self.numeric(&token, true))
            }
            Act::NthRef => match rhs.get(0) {
                Value::Token(Token {
                    value: TokenValue::NthRef(n),
                    ..
                }) => self.node(span, NodeKind::NthRef(*n)),
                _ => Value::Empty,
            },
            Act::BackRef => match rhs.get(0) {
                Value::Token(Token {
                    value: TokenValue::BackRef(c),
                    ..
                }) => self.node(span, NodeKind::BackRef(*c)),
                _ => Value::Empty,
            },
            Act::Beg => {
                self.lexer.set_state(LexState::Beg);
                Value::Empty
            }
        };
        Ok(value)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn node(&self, span: SourceSpan, kind: NodeKind<'a>) -> Value<'a> {
        Value::Node(self.support.node(span, kind))
    }

    fn node_at(&self, rhs: &mut Values<'_, 'a>, i: usize, span: SourceSpan) -> SupportResult<NodeRef<'a>> {
        let value = rhs.take(i);
        self.support.expect_node(value, span)
    }

    fn opt_at(&self, rhs: &mut Values<'_, 'a>, i: usize) -> Option<NodeRef<'a>> {
        let value = rhs.take(i);
        self.support.opt_node(value)
    }

    fn list_at(&self, rhs: &mut Values<'_, 'a>, i: usize) -> Vec<NodeRef<'a>> {
        let value = rhs.take(i);
        self.support.into_list(value)
    }

    fn array_at(&self, rhs: &mut Values<'_, 'a>, i: usize, span: SourceSpan) -> NodeRef<'a> {
        let span = rhs.get(i).span().unwrap_or(span);
        let items = self.list_at(rhs, i);
        self.support.array(span, &items)
    }

    fn hash_at(&self, rhs: &mut Values<'_, 'a>, i: usize, span: SourceSpan) -> NodeRef<'a> {
        let span = rhs.get(i).span().unwrap_or(span);
        let items = self.list_at(rhs, i);
        self.support.node(span, NodeKind::Hash(self.support.list(&items)))
    }

    fn star_at(&self, rhs: &Values<'_, 'a>, i: usize, span: SourceSpan) -> NodeRef<'a> {
        let span = rhs.get(i).span().unwrap_or(span);
        self.support.node(span, NodeKind::Star)
    }

    fn token_at(&self, rhs: &mut Values<'_, 'a>, i: usize, span: SourceSpan) -> SupportResult<Token> {
        rhs.take(i).token().ok_or_else(|| {
            self.support
                .error(ProblemId::Irrecoverable, span, &messages::IRRECOVERABLE_SYNTAX_ERROR, &[])
        })
    }

    /// The name a token or symbol value carries, in the arena.
    fn name_at(&self, rhs: &Values<'_, 'a>, i: usize) -> &'a str {
        match rhs.get(i) {
            Value::Token(token) => self.support.token_name(token),
            Value::Node(node) => match node.kind {
                NodeKind::Symbol(name) => name,
                NodeKind::NthRef(n) => self.support.str(&format!("${n}")),
                NodeKind::BackRef(c) => self.support.str(&format!("${c}")),
                _ => "",
            },
            _ => "",
        }
    }

    fn cond_at(&mut self, rhs: &mut Values<'_, 'a>, i: usize, span: SourceSpan) -> SupportResult<NodeRef<'a>> {
        let node = self.opt_at(rhs, i);
        self.support.cond(node, span)
    }

    fn restore_str_term(&mut self, rhs: &mut Values<'_, 'a>, i: usize) {
        if let Value::StrTerm(term) = rhs.take(i) {
            self.lexer.set_str_term(term);
        }
    }

    fn multiple_asgn(&self, span: SourceSpan, head: Option<NodeRef<'a>>, rest: Option<NodeRef<'a>>) -> Value<'a> {
        self.node(span, NodeKind::MultipleAsgn { head, rest, value: None })
    }

    fn rescue_modifier(&self, span: SourceSpan, body: Option<NodeRef<'a>>, fallback: Option<NodeRef<'a>>) -> Value<'a> {
        let fallback_span = fallback.map_or(span, |f| f.span);
        let rescue = self.support.node(
            fallback_span,
            NodeKind::RescueBody {
                exceptions: None,
                body: fallback,
                next: None,
            },
        );
        self.node(
            span,
            NodeKind::Rescue {
                body,
                rescue: Some(rescue),
                else_body: None,
            },
        )
    }

    fn body_stmt(&mut self, rhs: &mut Values<'_, 'a>, span: SourceSpan) -> SupportResult<Value<'a>> {
        let mut body = self.opt_at(rhs, 0);
        let rescue = self.opt_at(rhs, 1);
        let else_span = rhs.get(2).span().unwrap_or(span);
        let else_body = self.opt_at(rhs, 2);
        let ensure = self.opt_at(rhs, 3);
        if rescue.is_some() {
            body = Some(self.support.node(span, NodeKind::Rescue { body, rescue, else_body }));
        } else if else_body.is_some() {
            self.support.warn(else_span, &messages::ELSE_WITHOUT_RESCUE, &[]);
            body = self.support.append_to_block(body, else_body);
        }
        if ensure.is_some() {
            body = Some(self.support.node(span, NodeKind::Ensure { body, ensure }));
        }
        Ok(body.map_or(Value::Empty, Value::Node))
    }

    /// Leave a class, module or singleton class body.
    fn close_class_scope(&mut self) -> rbparse_ast::ScopeId {
        let scope = self.support.current_scope();
        self.support.pop_scope();
        self.support.class_nest = self.support.class_nest.saturating_sub(1);
        scope
    }

    fn new_args(
        &mut self,
        span: SourceSpan,
        pre: &[NodeRef<'a>],
        optional: &[NodeRef<'a>],
        rest: i64,
        block: Option<NodeRef<'a>>,
    ) -> Value<'a> {
        let rest = i32::try_from(rest).unwrap_or(-1);
        Value::Node(self.support.new_args(span, pre, optional, rest, block))
    }

    fn formal_error(&self, span: SourceSpan, message: &rbparse_diagnostics::DiagnosticMessage) -> SyntaxError {
        self.support.error(ProblemId::FormalArgument, span, message, &[])
    }

    fn numeric(&self, token: &Token, negative: bool) -> NodeKind<'a> {
        match &token.value {
            TokenValue::Integer(n) if negative => NodeKind::Fixnum(-n),
            TokenValue::Integer(n) => NodeKind::Fixnum(*n),
            TokenValue::BigInteger { digits, radix } => NodeKind::Bignum {
                digits: self.support.str(digits),
                radix: *radix,
                negative,
            },
            TokenValue::Float(f) if negative => NodeKind::Float(-f),
            TokenValue::Float(f) => NodeKind::Float(*f),
            _ if token.kind == TokenKind::Float => NodeKind::Float(0.0),
            _ => NodeKind::Fixnum(0),
        }
    }
}

/// Receivers `def obj.name` may not use.
fn is_singleton_literal(node: NodeRef<'_>) -> bool {
    matches!(
        node.unwrap_newlines().kind,
        NodeKind::Str(_)
            | NodeKind::DStr(_)
            | NodeKind::XStr(_)
            | NodeKind::DXStr(_)
            | NodeKind::Regexp { .. }
            | NodeKind::DRegexp { .. }
            | NodeKind::Fixnum(_)
            | NodeKind::Bignum { .. }
            | NodeKind::Float(_)
            | NodeKind::Symbol(_)
            | NodeKind::DSymbol(_)
            | NodeKind::Array(_)
            | NodeKind::ZArray
            | NodeKind::Hash(_)
    )
}
