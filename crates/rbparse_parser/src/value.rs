//! Values carried on the parser's value stack.

use rbparse_ast::{NodeKind, NodeRef};
use rbparse_core::text::SourceSpan;
use rbparse_lexer::{StrTerm, Token};

/// The semantic value of one grammar symbol.
#[derive(Debug, Clone, Default)]
pub enum Value<'a> {
    /// Empty rules, separators, and symbols whose value is never read.
    #[default]
    Empty,
    Token(Token),
    Node(NodeRef<'a>),
    /// A list still being collected. Argument lists become array nodes once
    /// complete; statement and parameter lists become slices.
    List(SourceSpan, Vec<NodeRef<'a>>),
    /// Call arguments that end in a `&block` argument.
    CallArgs {
        args: Option<NodeRef<'a>>,
        block: NodeRef<'a>,
    },
    /// A lexer string terminator saved around an interpolation.
    StrTerm(Option<StrTerm>),
    /// Saved parser or lexer state.
    Int(i64),
}

impl<'a> Value<'a> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    pub fn token(self) -> Option<Token> {
        match self {
            Value::Token(token) => Some(token),
            _ => None,
        }
    }

    /// The node this value holds. Lists and call arguments need the
    /// support layer to become nodes and are not handled here.
    pub fn node(&self) -> Option<NodeRef<'a>> {
        match self {
            Value::Node(node) => Some(*node),
            _ => None,
        }
    }

    pub fn int(&self) -> i64 {
        match self {
            Value::Int(n) => *n,
            _ => 0,
        }
    }

    /// The source range this value covers, when it covers one.
    pub fn span(&self) -> Option<SourceSpan> {
        match self {
            Value::Token(token) => Some(token.span),
            Value::Node(node) => Some(node.span),
            Value::List(span, _) => Some(*span),
            Value::CallArgs { args, block } => Some(match args {
                Some(args) => args.span.union(&block.span),
                None => block.span,
            }),
            Value::Empty | Value::StrTerm(_) | Value::Int(_) => None,
        }
    }

    /// Method or variable name carried by a name token or a symbol node.
    pub fn name(&self) -> Option<&str> {
        match self {
            Value::Token(token) => Some(token.name()),
            Value::Node(node) => match node.kind {
                NodeKind::Symbol(name) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Union of every span among `values`.
pub fn covering_span<'v, 'a: 'v>(values: impl IntoIterator<Item = &'v Value<'a>>) -> Option<SourceSpan> {
    values
        .into_iter()
        .filter_map(Value::span)
        .reduce(|acc, span| acc.union(&span))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rbparse_ast::{Node, TokenKind};
    use rbparse_core::{ParserArena, StringInterner};
    use rbparse_lexer::TokenValue;

    #[test]
    fn test_covering_span_skips_spanless_values() {
        let interner = StringInterner::new();
        let file = interner.intern("t.rb");
        let arena = ParserArena::new();
        let node = arena.alloc(Node::new(SourceSpan::new(file, 1, 1, 10, 12), NodeKind::Nil));
        let values = vec![
            Value::Int(3),
            Value::Token(Token::new(TokenKind::KIf, TokenValue::Name("if".into()), SourceSpan::new(file, 0, 0, 0, 2))),
            Value::Empty,
            Value::Node(node),
        ];
        let span = covering_span(&values).unwrap();
        assert_eq!((span.start_offset, span.end_offset), (0, 12));
        assert_eq!(span.end_line, 1);
        assert!(covering_span(&[Value::Empty]).is_none());
    }

    #[test]
    fn test_name_of_symbol_and_token() {
        let interner = StringInterner::new();
        let span = SourceSpan::empty(interner.intern("t.rb"), 0, 0);
        let arena = ParserArena::new();
        let sym = Value::Node(arena.alloc(Node::new(span, NodeKind::Symbol("to_s"))));
        assert_eq!(sym.name(), Some("to_s"));
        let op = Value::Token(Token::new(TokenKind::Cmp, TokenValue::None, span));
        assert_eq!(op.name(), Some("<=>"));
        assert_eq!(Value::Int(1).name(), None);
    }
}
